//! SimpleSchema lexer, parser, formatter, and builder.
//!
//! A typed AST for the SimpleSchema data layout language with tools to
//! parse schema files from text, build them programmatically, and format
//! them back to valid syntax.
//!
//! # Quick start
//!
//! ## Parse and re-format a schema
//!
//! ```
//! use simple_schema::{format, parse};
//!
//! let input = "module net\n\ntype header struct {\n\tlen: u16 = 0\n}\n";
//! let schema = parse("net.ss", input).unwrap();
//! assert_eq!(format(&schema), input);
//! ```
//!
//! ## Build a schema programmatically
//!
//! ```
//! use simple_schema::{Block, Expr, Field, ModuleDecl, Schema, TypeDecl, format};
//!
//! let schema = Schema::new()
//!     .decl(ModuleDecl::new("net"))
//!     .decl(TypeDecl::new(
//!         "header",
//!         Expr::struct_def(Block::new().field(Field::new("len").ty(Expr::ident("u16")))),
//!     ));
//!
//! let output = format(&schema);
//! assert!(output.contains("len: u16"));
//! ```

// Allow noisy pedantic lints that don't add value for
// a library crate.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod ast;
pub mod builder;
pub mod formatter;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::{
    AnnotatedDecl, Annotation, BinaryOp, Block, Call, Decl, EnumDef, Expr, Field, Ident, Index,
    Literal, ModuleDecl, OptionBlock, ProcDecl, PrototypeDef, Schema, StructDef, TypeDecl, UnaryOp,
    UnionDef,
};
pub use formatter::{format, format_expr};
pub use lexer::{LexError, LexErrorKind, Lexer, tokenize};
pub use parser::{ParseError, ParseErrorKind, Parser, parse};
pub use token::{Location, Token, TokenTag};

/// Unified error type covering both lexing and parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A lexer error.
    #[error("{0}")]
    Lex(#[from] LexError),
    /// A parser error.
    #[error("{0}")]
    Parse(#[from] ParseError),
}

impl Error {
    /// Where the error was detected.
    #[must_use]
    pub const fn location(&self) -> &Location {
        match self {
            Self::Lex(err) => &err.loc,
            Self::Parse(err) => &err.token.loc,
        }
    }

    /// Whether this is a grammar error of any kind.
    #[must_use]
    pub const fn is_unexpected_token(&self) -> bool {
        matches!(self, Self::Parse(_))
    }
}

/// Parse an in-memory schema source in one step.
///
/// Locations in the resulting tree and in errors name the file `<input>`.
pub fn parse_str(input: &str) -> Result<Schema, Error> {
    parse("<input>", input)
}
