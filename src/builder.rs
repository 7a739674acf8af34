//! Constructors for assembling a schema tree without source text.
//!
//! Every token created here carries `Location::default()`.

use crate::ast::{
    AnnotatedDecl, Annotation, BinaryOp, Block, Call, Decl, EnumDef, Expr, Field, Ident, Index,
    Literal, ModuleDecl, OptionBlock, ProcDecl, PrototypeDef, Schema, StructDef, TypeDecl, UnaryOp,
    UnionDef,
};
use crate::token::{Location, Token, TokenTag};

fn synthetic(tag: TokenTag, value: impl Into<Vec<u8>>) -> Token {
    Token::new(tag, Location::default(), value)
}

impl Schema {
    /// Create an empty schema.
    #[must_use]
    pub const fn new() -> Self {
        Self { decls: Vec::new() }
    }

    /// Append a top-level declaration.
    #[must_use]
    pub fn decl(mut self, decl: impl Into<Decl>) -> Self {
        self.decls.push(decl.into());
        self
    }
}

impl Ident {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            token: synthetic(TokenTag::Word, name),
        }
    }
}

impl Literal {
    /// Decimal integer.
    #[must_use]
    pub fn int(value: u64) -> Self {
        Self::with(TokenTag::DecInt, value.to_string())
    }

    /// Hexadecimal integer, written with a `0x` prefix.
    #[must_use]
    pub fn hex(value: u64) -> Self {
        Self::with(TokenTag::HexInt, format!("{value:X}"))
    }

    /// Octal integer, written with a `0o` prefix.
    #[must_use]
    pub fn oct(value: u64) -> Self {
        Self::with(TokenTag::OctInt, format!("{value:o}"))
    }

    /// Binary integer, written with a `0b` prefix.
    #[must_use]
    pub fn bin(value: u64) -> Self {
        Self::with(TokenTag::BinInt, format!("{value:b}"))
    }

    /// Floating point number. The sign is not part of a literal, so
    /// negative values need a unary `-` around a positive literal.
    ///
    /// Returns `None` for infinities and NaN, which have no literal form.
    #[must_use]
    pub fn float(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let mut text = value.abs().to_string();
        if !text.contains(['.', 'e', 'E']) {
            text.push_str(".0");
        }
        Some(Self::with(TokenTag::Float, text))
    }

    /// String literal holding `value` as decoded bytes.
    #[must_use]
    pub fn string(value: impl Into<Vec<u8>>) -> Self {
        Self::with(TokenTag::String, value)
    }

    fn with(tag: TokenTag, value: impl Into<Vec<u8>>) -> Self {
        Self {
            token: synthetic(tag, value),
        }
    }
}

impl Expr {
    #[must_use]
    pub fn ident(name: &str) -> Self {
        Self::Ident(Ident::new(name))
    }

    #[must_use]
    pub fn int(value: u64) -> Self {
        Self::Literal(Literal::int(value))
    }

    #[must_use]
    pub fn string(value: impl Into<Vec<u8>>) -> Self {
        Self::Literal(Literal::string(value))
    }

    /// Infix operation spelled `operator`.
    #[must_use]
    pub fn binary(operator: &str, left: Self, right: Self) -> Self {
        Self::Binary(BinaryOp {
            operator: synthetic(TokenTag::Punct, operator),
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    /// Prefix operation spelled `operator`.
    #[must_use]
    pub fn unary(operator: &str, operand: Self) -> Self {
        Self::Unary(UnaryOp {
            operator: synthetic(TokenTag::Punct, operator),
            operand: Box::new(operand),
        })
    }

    /// `left.right`
    #[must_use]
    pub fn lookup(left: Self, right: Self) -> Self {
        Self::binary(".", left, right)
    }

    #[must_use]
    pub fn call(callee: Self, args: impl IntoIterator<Item = Self>) -> Self {
        Self::Call(Call {
            callee: Box::new(callee),
            args: args.into_iter().collect(),
        })
    }

    #[must_use]
    pub fn index(base: Self, index: Self) -> Self {
        Self::Index(Index {
            base: Box::new(base),
            index: Box::new(index),
        })
    }

    #[must_use]
    pub const fn struct_def(block: Block) -> Self {
        Self::Struct(StructDef { block })
    }

    #[must_use]
    pub const fn union_def(block: Block) -> Self {
        Self::Union(UnionDef { block })
    }

    #[must_use]
    pub const fn enum_def(block: Block) -> Self {
        Self::Enum(EnumDef { block })
    }
}

impl From<Ident> for Expr {
    fn from(ident: Ident) -> Self {
        Self::Ident(ident)
    }
}

impl From<Literal> for Expr {
    fn from(literal: Literal) -> Self {
        Self::Literal(literal)
    }
}

impl From<PrototypeDef> for Expr {
    fn from(proto: PrototypeDef) -> Self {
        Self::Prototype(proto)
    }
}

impl Block {
    /// Create an empty block.
    #[must_use]
    pub const fn new() -> Self {
        Self { decls: Vec::new() }
    }

    /// Append a field.
    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        self.decls.push(Decl::Field(field));
        self
    }

    /// Append a bare `options { ... }` entry.
    #[must_use]
    pub fn options(mut self, block: Self) -> Self {
        self.decls.push(Decl::Options(OptionBlock { block }));
        self
    }
}

impl Field {
    /// Field named `name` with no type, value, or options.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: Some(Expr::ident(name)),
            ty: None,
            value: None,
            options: None,
        }
    }

    /// Unnamed prototype parameter of type `ty`.
    #[must_use]
    pub const fn unnamed(ty: Expr) -> Self {
        Self {
            name: None,
            ty: Some(ty),
            value: None,
            options: None,
        }
    }

    #[must_use]
    pub fn ty(mut self, ty: Expr) -> Self {
        self.ty = Some(ty);
        self
    }

    #[must_use]
    pub fn value(mut self, value: Expr) -> Self {
        self.value = Some(value);
        self
    }

    #[must_use]
    pub fn options(mut self, block: Block) -> Self {
        self.options = Some(OptionBlock { block });
        self
    }
}

impl PrototypeDef {
    /// Signature with no parameters returning `return_type`.
    #[must_use]
    pub fn new(return_type: Expr) -> Self {
        Self {
            params: Vec::new(),
            return_type: Box::new(return_type),
        }
    }

    /// Append a parameter.
    #[must_use]
    pub fn param(mut self, param: Field) -> Self {
        self.params.push(param);
        self
    }
}

impl ModuleDecl {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: Ident::new(name),
        }
    }
}

impl TypeDecl {
    #[must_use]
    pub fn new(name: &str, ty: Expr) -> Self {
        Self {
            name: Ident::new(name),
            ty,
        }
    }
}

impl ProcDecl {
    #[must_use]
    pub fn new(name: &str, ty: PrototypeDef) -> Self {
        Self {
            name: Ident::new(name),
            ty,
        }
    }
}

impl Annotation {
    #[must_use]
    pub fn new(name: &str, value: Expr) -> Self {
        Self {
            name: Ident::new(name),
            value,
        }
    }
}

impl AnnotatedDecl {
    /// Wrap `decl` with an empty annotation list.
    #[must_use]
    pub fn new(decl: impl Into<Decl>) -> Self {
        Self {
            annotations: Vec::new(),
            decl: Box::new(decl.into()),
        }
    }

    /// Append a `name = value` annotation.
    #[must_use]
    pub fn annotation(mut self, name: &str, value: Expr) -> Self {
        self.annotations.push(Annotation::new(name, value));
        self
    }
}

impl From<Field> for Decl {
    fn from(field: Field) -> Self {
        Self::Field(field)
    }
}

impl From<ModuleDecl> for Decl {
    fn from(decl: ModuleDecl) -> Self {
        Self::Module(decl)
    }
}

impl From<TypeDecl> for Decl {
    fn from(decl: TypeDecl) -> Self {
        Self::Type(decl)
    }
}

impl From<ProcDecl> for Decl {
    fn from(decl: ProcDecl) -> Self {
        Self::Proc(decl)
    }
}

impl From<AnnotatedDecl> for Decl {
    fn from(decl: AnnotatedDecl) -> Self {
        Self::Annotated(decl)
    }
}
