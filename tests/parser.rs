//! Parser edge cases and error tests.

use simple_schema::{
    Decl, Error, Expr, LexErrorKind, Location, ParseErrorKind, Parser, TokenTag, parse, parse_str,
};

fn parse_error(input: &str) -> Error {
    parse("parser.ss", input).expect_err("should fail")
}

// -----------------------------------------------------------
// Whole files.
// -----------------------------------------------------------

const PACKET: &str = r#"# Wire format of the telemetry link.
module telemetry

type version u8

[[endian = "big", align = 4]]
type header struct {
  magic : u32 = 0xCAFE
  version : version = 1
  length : u16
  flags : u8 options { bits = 3; }
  options {
    packed = true
  }
}

type kind enum {
  PING = 1
  DATA = 2
}

type payload union {
  ping : u64
  data : u8[header.length - 4]
}

type handler proc(header, payload) -> bool

proc checksum(data : bytes, seed : u32 = 0) -> u32
"#;

#[test]
fn parse_complete_schema() {
    let schema = parse("telemetry.ss", PACKET).expect("parse");
    let names: Vec<_> = schema
        .decls
        .iter()
        .filter_map(|d| d.name().map(|n| n.name().into_owned()))
        .collect();
    assert_eq!(
        names,
        vec!["telemetry", "version", "header", "kind", "payload", "handler", "checksum"]
    );
}

#[test]
fn parse_annotated_struct_fields() {
    let schema = parse("telemetry.ss", PACKET).expect("parse");
    let Decl::Annotated(header) = &schema.decls[2] else {
        panic!("expected annotated declaration");
    };
    let annotations: Vec<_> = header
        .annotations
        .iter()
        .map(|a| a.name.name().into_owned())
        .collect();
    assert_eq!(annotations, vec!["endian", "align"]);

    let Decl::Type(ty) = header.decl.as_ref() else {
        panic!("expected type declaration");
    };
    let Expr::Struct(def) = &ty.ty else {
        panic!("expected struct");
    };
    assert_eq!(def.block.decls.len(), 5);
    assert_eq!(def.block.fields().count(), 4);
    assert!(matches!(def.block.decls[4], Decl::Options(_)));

    let magic = def.block.fields().next().expect("magic");
    let Some(Expr::Literal(value)) = &magic.value else {
        panic!("expected literal default");
    };
    assert_eq!(value.token.tag, TokenTag::HexInt);
    assert_eq!(value.token.text(), "CAFE");
    assert_eq!(value.token.loc, Location::new("telemetry.ss", 7, 16));

    let flags = def.block.fields().nth(3).expect("flags");
    assert!(flags.options.is_some());
}

#[test]
fn parse_proc_parameters() {
    let schema = parse("telemetry.ss", PACKET).expect("parse");
    let Some(Decl::Proc(proc)) = schema.decls.last() else {
        panic!("expected proc declaration");
    };
    assert_eq!(proc.ty.params.len(), 2);
    assert!(proc.ty.params[0].value.is_none());
    assert!(matches!(&proc.ty.params[0].ty, Some(Expr::Ident(i)) if i.name() == "bytes"));
    assert!(matches!(proc.ty.params[1].value, Some(Expr::Literal(_))));
}

#[test]
fn parse_is_deterministic() {
    let first = parse("telemetry.ss", PACKET).expect("first");
    let second = parse("telemetry.ss", PACKET).expect("second");
    assert_eq!(first, second);
}

#[test]
fn parse_empty_and_blank_files() {
    assert!(parse_str("").expect("empty").decls.is_empty());
    assert!(parse_str("\n\n# only comments\n\n").expect("blank").decls.is_empty());
}

#[test]
fn parse_str_convenience() {
    let schema = parse_str("module m\n").expect("parse");
    assert_eq!(schema.decls.len(), 1);
    assert_eq!(schema.decls[0].name().expect("name").token.loc.file.as_ref(), "<input>");
}

#[test]
fn parse_multiline_aggregates_inside_brackets() {
    for input in [
        "proc p(a : struct {\n  x : u8\n}) -> void\n",
        "type t f(struct {\n  a : u8\n})\n",
        "type t u8[enum {\n  A = 1\n}.A]\n",
        "[[layout = struct {\n  a : u8\n}]]\ntype t int\n",
    ] {
        let schema = parse_str(input).unwrap_or_else(|e| panic!("{input:?}: {e}"));
        assert_eq!(schema.decls.len(), 1, "{input:?}");
    }
}

// -----------------------------------------------------------
// Parser errors.
// -----------------------------------------------------------

#[test]
fn parse_error_unclosed_brace() {
    let err = parse_error("type t struct {\n  a : int\n");
    let Error::Parse(err) = err else {
        panic!("expected parse error");
    };
    assert_eq!(err.kind, ParseErrorKind::UnexpectedToken);
    assert_eq!(err.token.tag, TokenTag::Eof);
}

#[test]
fn parse_error_missing_field_terminator() {
    let err = parse_error("type t struct { a : int }\n");
    assert!(err.is_unexpected_token());
    assert_eq!(*err.location(), Location::new("parser.ss", 0, 24));
}

#[test]
fn parse_error_unclosed_call() {
    let err = parse_error("type t f(1, 2\n");
    let Error::Parse(err) = err else {
        panic!("expected parse error");
    };
    assert_eq!(err.kind, ParseErrorKind::UnclosedParenthesis);
    assert!(err.is(ParseErrorKind::UnexpectedToken));
}

#[test]
fn parse_error_unclosed_index() {
    let err = parse_error("type t u8[4\n");
    assert_eq!(
        err.to_string(),
        "parser.ss:1:0: unclosed subscription, unexpected token `EOF`"
    );
}

#[test]
fn parse_error_keyword_as_name() {
    let err = parse_error("module enum\n");
    assert_eq!(
        err.to_string(),
        "parser.ss:0:7: unexpected token `WORD 'enum'`"
    );
}

#[test]
fn parse_declaration_words_as_names() {
    let schema = parse_str("module type\ntype const struct {\n  type : u8\n}\n").expect("parse");
    let names: Vec<_> = schema
        .decls
        .iter()
        .map(|d| d.name().expect("name").name().into_owned())
        .collect();
    assert_eq!(names, ["type", "const"]);
}

#[test]
fn parse_error_stray_token_at_top_level() {
    let err = parse_error("module a\nx : int\n");
    assert_eq!(*err.location(), Location::new("parser.ss", 1, 0));
}

#[test]
fn parse_error_annotation_without_decl() {
    let err = parse_error("[[a = 1]]\n");
    let Error::Parse(err) = err else {
        panic!("expected parse error");
    };
    assert_eq!(err.token.tag, TokenTag::Eof);
}

#[test]
fn parse_lex_error_passes_through() {
    let err = parse_error("type t \"unclosed\n");
    assert!(!err.is_unexpected_token());
    assert!(matches!(
        err,
        Error::Lex(ref e) if e.kind == LexErrorKind::UnterminatedStringLiteral
    ));
}

// -----------------------------------------------------------
// Rule entry points.
// -----------------------------------------------------------

#[test]
fn parser_rules_leave_following_tokens() {
    let mut parser = Parser::new("parser.ss", "a + b\nc");
    let expr = parser.parse_expr().expect("expr");
    assert_eq!(expr.to_string(), "a + b");
    parser
        .expect(&[simple_schema::parser::TokenPattern::tag(TokenTag::Eol)])
        .expect("eol");
    assert_eq!(parser.parse_ident().expect("ident").name(), "c");
}

#[test]
fn parser_literal_rule() {
    let literal = Parser::new("parser.ss", "\"abc\"")
        .parse_literal()
        .expect("literal");
    assert_eq!(literal.token.value, b"abc");
}
