//! Pretty-printer that serializes a schema AST back into source text.
//!
//! Produces tab-indented output with one declaration per line. Parentheses
//! are emitted only where the tree could not be recovered without them.

use std::fmt::{self, Write as _};

use crate::ast::{BinaryOp, Block, Decl, Expr, Field, PrototypeDef, Schema};
use crate::lexer::PUNCTUATIONS;
use crate::parser::PRECEDENCE;
use crate::token::{Token, TokenTag};

// Binding strength of an expression in operand position. Binary operators
// take 1..=9 from their precedence table level.
const PROTOTYPE: usize = 0;
const UNARY: usize = PRECEDENCE.len() + 1;
const LOOKUP: usize = UNARY + 1;
const POSTFIX: usize = LOOKUP + 1;
const ATOM: usize = POSTFIX + 1;

/// Format a `Schema` into source text that parses back to the same tree.
///
/// Declarations spanning several lines are separated from their
/// neighbours by a blank line. Comments are not part of the tree and are
/// not reproduced.
#[must_use]
pub fn format(schema: &Schema) -> String {
    let mut out = String::new();
    let mut prev_multiline = false;

    for (i, decl) in schema.decls.iter().enumerate() {
        let mut entry = String::new();
        format_decl(&mut entry, decl, 0);

        let multiline = entry.matches('\n').count() > 1;
        if i > 0 && (multiline || prev_multiline) {
            out.push('\n');
        }
        out.push_str(&entry);
        prev_multiline = multiline;
    }

    out
}

/// Format a single expression. Aggregate bodies are written one entry
/// per line, indented with tabs.
#[must_use]
pub fn format_expr(expr: &Expr) -> String {
    let mut out = String::new();
    format_expr_into(&mut out, expr, 0);
    out
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format(self))
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_expr(self))
    }
}

fn push_indent(out: &mut String, indent: usize) {
    for _ in 0..indent {
        out.push('\t');
    }
}

fn format_decl(out: &mut String, decl: &Decl, indent: usize) {
    push_indent(out, indent);

    match decl {
        Decl::Field(field) => format_field(out, field, indent),
        Decl::Options(options) => {
            out.push_str("options ");
            format_block(out, &options.block, indent);
        }
        Decl::Module(module) => {
            out.push_str("module ");
            out.push_str(&module.name.name());
        }
        Decl::Type(ty) => {
            out.push_str("type ");
            out.push_str(&ty.name.name());
            out.push(' ');
            format_expr_into(out, &ty.ty, indent);
        }
        Decl::Proc(proc) => {
            out.push_str("proc ");
            out.push_str(&proc.name.name());
            format_signature(out, &proc.ty, indent);
        }
        Decl::Annotated(annotated) => {
            // stacked lists merge when parsed, so write them as one
            let mut inner = annotated;
            let mut annotations = annotated.annotations.iter().collect::<Vec<_>>();
            while let Decl::Annotated(next) = inner.decl.as_ref() {
                annotations.extend(&next.annotations);
                inner = next;
            }

            out.push_str("[[");
            for (i, annotation) in annotations.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&annotation.name.name());
                out.push_str(" = ");
                format_expr_into(out, &annotation.value, indent);
            }
            out.push_str("]]\n");
            format_decl(out, &inner.decl, indent);
            return;
        }
    }

    out.push('\n');
}

fn format_field(out: &mut String, field: &Field, indent: usize) {
    match &field.name {
        Some(name) => format_lookup_side(out, name, indent, true),
        None => {
            if let Some(ty) = &field.ty {
                format_expr_into(out, ty, indent);
            }
            return;
        }
    }

    if let Some(ty) = &field.ty {
        out.push_str(": ");
        format_expr_into(out, ty, indent);
    }
    if let Some(value) = &field.value {
        out.push_str(" = ");
        format_expr_into(out, value, indent);
    }
    if let Some(options) = &field.options {
        out.push_str(" options ");
        format_block(out, &options.block, indent);
    }
}

fn format_block(out: &mut String, block: &Block, indent: usize) {
    if block.decls.is_empty() {
        out.push_str("{}");
        return;
    }

    out.push_str("{\n");
    for decl in &block.decls {
        format_decl(out, decl, indent + 1);
    }
    push_indent(out, indent);
    out.push('}');
}

fn format_signature(out: &mut String, proto: &PrototypeDef, indent: usize) {
    out.push('(');
    for (i, param) in proto.params.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        format_field(out, param, indent);
    }
    out.push_str(") -> ");
    format_expr_into(out, &proto.return_type, indent);
}

fn format_expr_into(out: &mut String, expr: &Expr, indent: usize) {
    match expr {
        Expr::Ident(ident) => out.push_str(&ident.name()),
        Expr::Literal(literal) => format_literal(out, &literal.token),
        Expr::Unary(unary) => {
            out.push_str(&unary.operator.text());
            // `& &a` must not collapse into `&&a`
            if let Expr::Unary(inner) = unary.operand.as_ref() {
                let joined = [
                    unary.operator.value.as_slice(),
                    inner.operator.value.as_slice(),
                ]
                .concat();
                if PUNCTUATIONS.iter().any(|p| p.as_bytes() == joined) {
                    out.push(' ');
                }
            }
            format_operand(out, &unary.operand, UNARY, indent);
        }
        Expr::Binary(binary) if is_lookup(binary) => {
            format_lookup_side(out, &binary.left, indent, true);
            out.push('.');
            format_lookup_side(out, &binary.right, indent, false);
        }
        Expr::Binary(binary) => {
            let level = operator_level(&binary.operator);
            format_operand(out, &binary.left, level, indent);
            out.push(' ');
            out.push_str(&binary.operator.text());
            out.push(' ');
            format_operand(out, &binary.right, level + 1, indent);
        }
        Expr::Call(call) => {
            format_operand(out, &call.callee, LOOKUP, indent);
            out.push('(');
            for (i, arg) in call.args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                format_expr_into(out, arg, indent);
            }
            out.push(')');
        }
        Expr::Index(index) => {
            format_operand(out, &index.base, LOOKUP, indent);
            out.push('[');
            format_expr_into(out, &index.index, indent);
            out.push(']');
        }
        Expr::Struct(def) => {
            out.push_str("struct ");
            format_block(out, &def.block, indent);
        }
        Expr::Union(def) => {
            out.push_str("union ");
            format_block(out, &def.block, indent);
        }
        Expr::Enum(def) => {
            out.push_str("enum ");
            format_block(out, &def.block, indent);
        }
        Expr::Prototype(proto) => {
            out.push_str("proc");
            format_signature(out, proto, indent);
        }
    }
}

fn format_parenthesized(out: &mut String, expr: &Expr, indent: usize) {
    out.push('(');
    format_expr_into(out, expr, indent);
    out.push(')');
}

fn format_operand(out: &mut String, expr: &Expr, min: usize, indent: usize) {
    if binding(expr) < min {
        format_parenthesized(out, expr, indent);
    } else {
        format_expr_into(out, expr, indent);
    }
}

/// Either side of `a.b`. Only the left side may itself be a lookup chain.
fn format_lookup_side(out: &mut String, expr: &Expr, indent: usize, left: bool) {
    let bare = match expr {
        Expr::Binary(binary) => left && is_lookup(binary),
        Expr::Literal(literal) => literal.token.tag == TokenTag::String,
        Expr::Ident(_) | Expr::Struct(_) | Expr::Union(_) | Expr::Enum(_) => true,
        _ => false,
    };
    if bare {
        format_expr_into(out, expr, indent);
    } else {
        format_parenthesized(out, expr, indent);
    }
}

fn format_literal(out: &mut String, token: &Token) {
    let prefix = match token.tag {
        TokenTag::BinInt => "0b",
        TokenTag::OctInt => "0o",
        TokenTag::HexInt => "0x",
        TokenTag::String => {
            format_string(out, &token.value);
            return;
        }
        _ => "",
    };
    out.push_str(prefix);
    out.push_str(&token.text());
}

fn format_string(out: &mut String, value: &[u8]) {
    out.push('"');
    for chunk in value.utf8_chunks() {
        for ch in chunk.valid().chars() {
            match ch {
                '"' => out.push_str("\\\""),
                '\\' => out.push_str("\\\\"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                c if c.is_ascii_control() => {
                    let _ = write!(out, "\\x{:02X}", u32::from(c));
                }
                c if c.is_control() => {
                    let _ = write!(out, "\\u{:04X}", u32::from(c));
                }
                c => out.push(c),
            }
        }
        for byte in chunk.invalid() {
            let _ = write!(out, "\\x{byte:02X}");
        }
    }
    out.push('"');
}

fn is_lookup(binary: &BinaryOp) -> bool {
    binary.operator.is(TokenTag::Punct, ".")
}

fn operator_level(operator: &Token) -> usize {
    PRECEDENCE
        .iter()
        .position(|level| level.iter().any(|p| p.matches(operator)))
        .map_or(1, |i| i + 1)
}

fn binding(expr: &Expr) -> usize {
    match expr {
        Expr::Prototype(_) => PROTOTYPE,
        Expr::Binary(binary) if is_lookup(binary) => LOOKUP,
        Expr::Binary(binary) => operator_level(&binary.operator),
        Expr::Unary(_) => UNARY,
        Expr::Call(_) | Expr::Index(_) => POSTFIX,
        Expr::Ident(_)
        | Expr::Literal(_)
        | Expr::Struct(_)
        | Expr::Union(_)
        | Expr::Enum(_) => ATOM,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn roundtrip_expr(input: &str) -> String {
        let expr = Parser::new("test", input)
            .parse_expr()
            .expect("parse failed");
        format_expr(&expr)
    }

    fn roundtrip(input: &str) -> String {
        format(&crate::parse_str(input).expect("parse failed"))
    }

    #[test]
    fn binary_keeps_needed_parentheses() {
        assert_eq!(roundtrip_expr("a + (b + c)"), "a + (b + c)");
        assert_eq!(roundtrip_expr("(a + b) + c"), "a + b + c");
        assert_eq!(roundtrip_expr("(a + b) * c"), "(a + b) * c");
        assert_eq!(roundtrip_expr("a+b*c"), "a + b * c");
        assert_eq!(roundtrip_expr("-(a + b)"), "-(a + b)");
        assert_eq!(roundtrip_expr("(-a)(1,2)[3]"), "(-a)(1, 2)[3]");
    }

    #[test]
    fn lookup_sides() {
        assert_eq!(roundtrip_expr("a . b . c"), "a.b.c");
        assert_eq!(roundtrip_expr("a.(b.c)"), "a.(b.c)");
        assert_eq!(roundtrip_expr("(f(x)).y"), "(f(x)).y");
        assert_eq!(roundtrip_expr("a.(1)"), "a.(1)");
    }

    #[test]
    fn unary_ampersands_stay_apart() {
        assert_eq!(roundtrip_expr("& &a"), "& &a");
        assert_eq!(roundtrip_expr("- -a"), "--a");
    }

    #[test]
    fn literals_keep_radix() {
        assert_eq!(roundtrip_expr("0xFF"), "0xFF");
        assert_eq!(roundtrip_expr("0b101"), "0b101");
        assert_eq!(roundtrip_expr("0o17"), "0o17");
        assert_eq!(roundtrip_expr("1.5e-3"), "1.5e-3");
    }

    #[test]
    fn strings_are_escaped() {
        assert_eq!(roundtrip_expr(r#""a\"b\\c\n""#), r#""a\"b\\c\n""#);
        assert_eq!(roundtrip_expr(r#""\xC0\x01""#), r#""\xC0\x01""#);
        assert_eq!(roundtrip_expr(r#""ぱ""#), "\"\u{3071}\"");
    }

    #[test]
    fn prototypes_are_wrapped_as_operands() {
        assert_eq!(roundtrip_expr("proc(int) -> int"), "proc(int) -> int");
        assert_eq!(
            roundtrip_expr("(proc(int) -> a) + b"),
            "(proc(int) -> a) + b"
        );
    }

    #[test]
    fn declarations() {
        let input = "module m;type t int;proc p(s: int, n = 2) -> void;";
        assert_eq!(
            roundtrip(input),
            "module m\ntype t int\nproc p(s: int, n = 2) -> void\n"
        );
    }

    #[test]
    fn blocks_are_tab_indented() {
        let input = "type t struct { a : int = 1 options { packed = true; }; b : enum {}; }";
        let expected = "\
type t struct {
\ta: int = 1 options {
\t\tpacked = true
\t}
\tb: enum {}
}
";
        assert_eq!(roundtrip(input), expected);
    }

    #[test]
    fn multiline_declarations_are_spaced() {
        let input = "module m\ntype a int\ntype s struct { x : u8; }\ntype b int\n";
        let expected = "\
module m
type a int

type s struct {
\tx: u8
}

type b int
";
        assert_eq!(roundtrip(input), expected);
    }

    #[test]
    fn annotations_on_their_own_line() {
        let input = "[[a = 1]] [[b = x[y[0]]]]\ntype t int\n";
        assert_eq!(roundtrip(input), "[[a = 1, b = x[y[0]]]]\ntype t int\n");
    }

    #[test]
    fn blocks_inside_brackets_span_lines() {
        assert_eq!(
            roundtrip_expr("f(struct { a : u8; b : u8 options { c = 1; }; })"),
            "f(struct {\n\ta: u8\n\tb: u8 options {\n\t\tc = 1\n\t}\n})"
        );
        assert_eq!(
            roundtrip("[[s = enum{A=1;}]]\ntype t u8\n"),
            "[[s = enum {\n\tA = 1\n}]]\ntype t u8\n"
        );
        let input = "type t struct { p : proc(struct { x : u8; }) -> u8; }\n";
        let expected = "\
type t struct {
\tp: proc(struct {
\t\tx: u8
\t}) -> u8
}
";
        assert_eq!(roundtrip(input), expected);
        assert_eq!(roundtrip(expected), expected);
    }

    #[test]
    fn empty_schema() {
        assert_eq!(format(&Schema::default()), "");
    }
}
