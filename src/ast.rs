use crate::token::Token;

/// Root of a parsed source unit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    pub decls: Vec<Decl>,
}

/// Any declaration, top-level or inside a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decl {
    /// Binding inside a block: `name : Type = value options { ... }`.
    Field(Field),
    /// Bare `options { ... }` entry inside a block.
    Options(OptionBlock),
    /// `module name`.
    Module(ModuleDecl),
    /// `type Name Type`.
    Type(TypeDecl),
    /// `proc name(args) -> Type`.
    Proc(ProcDecl),
    /// Declaration preceded by `[[ ... ]]` metadata.
    Annotated(AnnotatedDecl),
}

/// Any expression, including type expressions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Ident(Ident),
    Literal(Literal),
    Unary(UnaryOp),
    Binary(BinaryOp),
    Call(Call),
    Index(Index),
    Struct(StructDef),
    Union(UnionDef),
    Enum(EnumDef),
    Prototype(PrototypeDef),
}

/// Identifier reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub token: Token,
}

/// Number or string literal, as scanned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    pub token: Token,
}

/// Prefix operation: `-a`, `!a`, `*a`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnaryOp {
    pub operator: Token,
    pub operand: Box<Expr>,
}

/// Infix operation. Lookups (`a.b`) use the `.` operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryOp {
    pub operator: Token,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
}

/// `callee(args...)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub callee: Box<Expr>,
    pub args: Vec<Expr>,
}

/// `base[index]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    pub base: Box<Expr>,
    pub index: Box<Expr>,
}

/// `struct { ... }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructDef {
    pub block: Block,
}

/// `union { ... }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionDef {
    pub block: Block,
}

/// `enum { ... }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDef {
    pub block: Block,
}

/// Procedure signature: `proc(int, int) -> int`.
///
/// In expression position parameters carry only a type. Procedure
/// declarations name their parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrototypeDef {
    pub params: Vec<Field>,
    pub return_type: Box<Expr>,
}

/// Ordered declarations between `{` and `}`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Block {
    pub decls: Vec<Decl>,
}

/// Named binding with optional type, default value, and options.
///
/// `name` is `None` only for unnamed prototype parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: Option<Expr>,
    pub ty: Option<Expr>,
    pub value: Option<Expr>,
    pub options: Option<OptionBlock>,
}

/// Nested metadata block: `options { ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OptionBlock {
    pub block: Block,
}

/// Single `name = value` pair of an annotation list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub name: Ident,
    pub value: Expr,
}

/// Declaration wrapped with `[[ ... ]]` annotations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedDecl {
    pub annotations: Vec<Annotation>,
    pub decl: Box<Decl>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDecl {
    pub name: Ident,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    pub name: Ident,
    pub ty: Expr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcDecl {
    pub name: Ident,
    pub ty: PrototypeDef,
}

impl Ident {
    /// Identifier text.
    #[must_use]
    pub fn name(&self) -> std::borrow::Cow<'_, str> {
        self.token.text()
    }
}

impl Decl {
    /// Declared name, if the declaration has a simple one.
    ///
    /// Annotated declarations report the name of the wrapped declaration.
    #[must_use]
    pub fn name(&self) -> Option<&Ident> {
        match self {
            Self::Module(m) => Some(&m.name),
            Self::Type(t) => Some(&t.name),
            Self::Proc(p) => Some(&p.name),
            Self::Annotated(a) => a.decl.name(),
            Self::Field(f) => match &f.name {
                Some(Expr::Ident(ident)) => Some(ident),
                _ => None,
            },
            Self::Options(_) => None,
        }
    }
}

impl Block {
    /// Fields of this block in source order, skipping option blocks.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.decls.iter().filter_map(|decl| match decl {
            Decl::Field(field) => Some(field),
            _ => None,
        })
    }
}
