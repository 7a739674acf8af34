use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::Error;
use crate::ast::{
    AnnotatedDecl, Annotation, BinaryOp, Block, Call, Decl, EnumDef, Expr, Field, Ident, Index,
    Literal, ModuleDecl, OptionBlock, ProcDecl, PrototypeDef, Schema, StructDef, TypeDecl, UnaryOp,
    UnionDef,
};
use crate::lexer::Lexer;
use crate::token::{Token, TokenTag};

/// Words that cannot be used as identifiers. Each one starts a grammar
/// alternative that is tried where an identifier may also appear, so
/// `module`, `type` and `const` remain usable as names.
pub const KEYWORDS: &[&str] = &["proc", "struct", "union", "enum", "options"];

/// Binary operators grouped by precedence, loosest binding first.
pub const PRECEDENCE: &[&[TokenPattern]] = &[
    &[TokenPattern::punct("||")],
    &[TokenPattern::punct("&&")],
    &[TokenPattern::punct("|")],
    &[TokenPattern::punct("^")],
    &[TokenPattern::punct("&")],
    &[TokenPattern::punct("=="), TokenPattern::punct("!=")],
    &[
        TokenPattern::punct("<"),
        TokenPattern::punct(">"),
        TokenPattern::punct("<="),
        TokenPattern::punct(">="),
    ],
    &[TokenPattern::punct("+"), TokenPattern::punct("-")],
    &[
        TokenPattern::punct("*"),
        TokenPattern::punct("/"),
        TokenPattern::punct("%"),
    ],
];

const UNARY_OPERATORS: &[TokenPattern] = &[
    TokenPattern::punct("+"),
    TokenPattern::punct("-"),
    TokenPattern::punct("!"),
    TokenPattern::punct("~"),
    TokenPattern::punct("*"),
    TokenPattern::punct("&"),
];

const LITERALS: &[TokenPattern] = &[
    TokenPattern::tag(TokenTag::BinInt),
    TokenPattern::tag(TokenTag::DecInt),
    TokenPattern::tag(TokenTag::OctInt),
    TokenPattern::tag(TokenTag::HexInt),
    TokenPattern::tag(TokenTag::String),
    TokenPattern::tag(TokenTag::Float),
];

const AGGREGATES: &[TokenPattern] = &[
    TokenPattern::keyword("struct"),
    TokenPattern::keyword("union"),
    TokenPattern::keyword("enum"),
];

const DECLARATIONS: &[TokenPattern] = &[
    TokenPattern::keyword("module"),
    TokenPattern::keyword("type"),
    TokenPattern::keyword("proc"),
];

const EOL: TokenPattern = TokenPattern::tag(TokenTag::Eol);
const EOF: TokenPattern = TokenPattern::tag(TokenTag::Eof);

/// Token shape accepted by [`Parser::expect`]: a tag and, optionally, an
/// exact spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenPattern {
    pub tag: TokenTag,
    pub value: Option<&'static str>,
}

impl TokenPattern {
    /// Any token with `tag`.
    #[must_use]
    pub const fn tag(tag: TokenTag) -> Self {
        Self { tag, value: None }
    }

    /// Punctuation spelled exactly `value`.
    #[must_use]
    pub const fn punct(value: &'static str) -> Self {
        Self {
            tag: TokenTag::Punct,
            value: Some(value),
        }
    }

    /// Word spelled exactly `value`.
    #[must_use]
    pub const fn keyword(value: &'static str) -> Self {
        Self {
            tag: TokenTag::Word,
            value: Some(value),
        }
    }

    #[must_use]
    pub fn matches(&self, token: &Token) -> bool {
        token.tag == self.tag && self.value.is_none_or(|v| token.value == v.as_bytes())
    }
}

/// Classifies a parser error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Token that fits no rule at this position.
    UnexpectedToken,
    /// Call argument list without its closing `)`.
    UnclosedParenthesis,
    /// Index expression without its closing `]`.
    UnclosedSubscription,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedToken => write!(f, "unexpected token"),
            Self::UnclosedParenthesis => {
                write!(f, "unclosed parenthesis, unexpected token")
            }
            Self::UnclosedSubscription => {
                write!(f, "unclosed subscription, unexpected token")
            }
        }
    }
}

/// Error produced during parsing. `token` is the offending token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}: {kind} {token}", token.loc)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub token: Token,
}

impl ParseError {
    #[must_use]
    pub const fn new(kind: ParseErrorKind, token: Token) -> Self {
        Self { kind, token }
    }

    /// Whether this error is of `kind`. Unclosed delimiters are also
    /// unexpected tokens.
    #[must_use]
    pub fn is(&self, kind: ParseErrorKind) -> bool {
        self.kind == kind || kind == ParseErrorKind::UnexpectedToken
    }
}

/// Parse a complete source unit.
///
/// # Errors
///
/// Returns the first lexical or grammar error.
pub fn parse(file: impl Into<Arc<str>>, input: &str) -> Result<Schema, Error> {
    Parser::new(file, input).parse()
}

/// Recursive-descent parser pulling tokens from a [`Lexer`].
///
/// Every `try_*` rule returns `Ok(None)` when its first token does not
/// match, leaving that token unread. Once the first token matched the rule
/// is committed and any later mismatch is an error.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
}

impl<'a> Parser<'a> {
    #[must_use]
    pub fn new(file: impl Into<Arc<str>>, input: &'a str) -> Self {
        Self::from_lexer(Lexer::new(file, input))
    }

    #[must_use]
    pub const fn from_lexer(lexer: Lexer<'a>) -> Self {
        Self { lexer }
    }

    /// Consume the next token if it matches any of `patterns`.
    ///
    /// On mismatch the token is pushed back and `UnexpectedToken` is
    /// returned. Comments are skipped.
    pub fn expect(&mut self, patterns: &[TokenPattern]) -> Result<Token, Error> {
        let token = self.next_token()?;
        if patterns.iter().any(|p| p.matches(&token)) {
            return Ok(token);
        }
        self.lexer.unread(token.clone())?;
        Err(ParseError::new(ParseErrorKind::UnexpectedToken, token).into())
    }

    /// Parse the whole input: declarations followed by end of file.
    pub fn parse(mut self) -> Result<Schema, Error> {
        self.skip_eols()?;

        let mut decls = Vec::new();
        loop {
            let decl = match self.try_annotated_decl()? {
                Some(decl) => decl,
                None => match self.try_decl()? {
                    Some(decl) => decl,
                    None => break,
                },
            };
            decls.push(decl);
            self.skip_eols()?;
        }

        self.expect(&[EOF])?;
        debug!(
            file = %self.lexer.location().file,
            decls = decls.len(),
            "parsed schema"
        );
        Ok(Schema { decls })
    }

    pub fn parse_ident(&mut self) -> Result<Ident, Error> {
        let ident = self.try_ident()?;
        self.required(ident)
    }

    pub fn parse_literal(&mut self) -> Result<Literal, Error> {
        let literal = self.try_literal()?;
        self.required(literal)
    }

    pub fn parse_atom(&mut self) -> Result<Expr, Error> {
        let atom = self.try_atom()?;
        self.required(atom)
    }

    pub fn parse_lookup(&mut self) -> Result<Expr, Error> {
        let lookup = self.try_lookup()?;
        self.required(lookup)
    }

    pub fn parse_subscript(&mut self) -> Result<Expr, Error> {
        let subscript = self.try_subscript()?;
        self.required(subscript)
    }

    pub fn parse_unary(&mut self) -> Result<Expr, Error> {
        let unary = self.try_unary()?;
        self.required(unary)
    }

    pub fn parse_binary(&mut self) -> Result<Expr, Error> {
        let binary = self.try_binary(0)?;
        self.required(binary)
    }

    /// Single expression entry point.
    pub fn parse_expr(&mut self) -> Result<Expr, Error> {
        self.parse_binary()
    }

    pub fn parse_field(&mut self) -> Result<Field, Error> {
        let field = self.try_field()?;
        self.required(field)
    }

    /// `{` [EOL] (Field | `options` Block)* `}`
    ///
    /// Line breaks inside the braces end entries even when the block is
    /// nested in brackets.
    pub fn parse_block(&mut self) -> Result<Block, Error> {
        self.expect(&[TokenPattern::punct("{")])?;
        let outer = self.lexer.suspend_groups();
        self.skip_eols()?;

        let mut decls = Vec::new();
        loop {
            if let Some(field) = self.try_field()? {
                decls.push(Decl::Field(field));
            } else if self.accept(&[TokenPattern::keyword("options")])?.is_some() {
                let block = self.parse_block()?;
                decls.push(Decl::Options(OptionBlock { block }));
            } else {
                break;
            }
            self.skip_eols()?;
        }

        self.expect(&[TokenPattern::punct("}")])?;
        self.lexer.resume_groups(outer);
        Ok(Block { decls })
    }

    pub fn parse_decl(&mut self) -> Result<Decl, Error> {
        let decl = self.try_decl()?;
        self.required(decl)
    }

    pub fn parse_annotated_decl(&mut self) -> Result<Decl, Error> {
        let decl = self.try_annotated_decl()?;
        self.required(decl)
    }

    fn next_token(&mut self) -> Result<Token, Error> {
        loop {
            let token = self.lexer.read()?;
            if token.tag != TokenTag::Comment {
                return Ok(token);
            }
        }
    }

    fn accept(&mut self, patterns: &[TokenPattern]) -> Result<Option<Token>, Error> {
        match self.expect(patterns) {
            Ok(token) => Ok(Some(token)),
            Err(Error::Parse(err)) if err.kind == ParseErrorKind::UnexpectedToken => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn required<T>(&mut self, parsed: Option<T>) -> Result<T, Error> {
        match parsed {
            Some(value) => Ok(value),
            None => Err(self.unexpected()),
        }
    }

    /// Build an `UnexpectedToken` error for the pending token.
    fn unexpected(&mut self) -> Error {
        let token = match self.next_token() {
            Ok(token) => token,
            Err(err) => return err,
        };
        if let Err(err) = self.lexer.unread(token.clone()) {
            return err.into();
        }
        ParseError::new(ParseErrorKind::UnexpectedToken, token).into()
    }

    fn skip_eols(&mut self) -> Result<(), Error> {
        while self.accept(&[EOL])?.is_some() {}
        Ok(())
    }

    /// Consume a closing delimiter and leave the group opened for it.
    fn close_group(&mut self, close: &'static str, kind: ParseErrorKind) -> Result<(), Error> {
        self.expect(&[TokenPattern::punct(close)])
            .map_err(|err| rekind(err, kind))?;
        self.lexer.pop_group()?;
        Ok(())
    }

    /// Close an index expression. A `]]` closes two nested subscripts, so
    /// its second half is pushed back as a plain `]`.
    fn close_subscript(&mut self) -> Result<(), Error> {
        let token = self
            .expect(&[TokenPattern::punct("]"), TokenPattern::punct("]]")])
            .map_err(|err| rekind(err, ParseErrorKind::UnclosedSubscription))?;
        if token.value == b"]]" {
            let mut loc = token.loc;
            loc.col += 1;
            self.lexer.unread(Token::new(TokenTag::Punct, loc, "]"))?;
        }
        self.lexer.pop_group()?;
        Ok(())
    }

    fn try_ident(&mut self) -> Result<Option<Ident>, Error> {
        let Some(token) = self.accept(&[TokenPattern::tag(TokenTag::Word)])? else {
            return Ok(None);
        };
        if KEYWORDS.iter().any(|k| token.value == k.as_bytes()) {
            self.lexer.unread(token)?;
            return Ok(None);
        }
        Ok(Some(Ident { token }))
    }

    fn try_literal(&mut self) -> Result<Option<Literal>, Error> {
        Ok(self.accept(LITERALS)?.map(|token| Literal { token }))
    }

    fn try_group(&mut self) -> Result<Option<Expr>, Error> {
        if self.accept(&[TokenPattern::punct("(")])?.is_none() {
            return Ok(None);
        }
        self.lexer.push_group();
        let expr = self.parse_expr()?;
        self.close_group(")", ParseErrorKind::UnexpectedToken)?;
        Ok(Some(expr))
    }

    fn try_aggregate(&mut self) -> Result<Option<Expr>, Error> {
        let Some(keyword) = self.accept(AGGREGATES)? else {
            return Ok(None);
        };
        let block = self.parse_block()?;
        let expr = match keyword.value.as_slice() {
            b"struct" => Expr::Struct(StructDef { block }),
            b"union" => Expr::Union(UnionDef { block }),
            _ => Expr::Enum(EnumDef { block }),
        };
        Ok(Some(expr))
    }

    /// `proc ( ident, ... ) -> Expr`
    fn try_prototype(&mut self) -> Result<Option<Expr>, Error> {
        if self.accept(&[TokenPattern::keyword("proc")])?.is_none() {
            return Ok(None);
        }
        let prototype = self.parse_signature(false)?;
        Ok(Some(Expr::Prototype(prototype)))
    }

    fn try_atom(&mut self) -> Result<Option<Expr>, Error> {
        if let Some(group) = self.try_group()? {
            return Ok(Some(group));
        }
        if let Some(aggregate) = self.try_aggregate()? {
            return Ok(Some(aggregate));
        }
        if let Some(prototype) = self.try_prototype()? {
            return Ok(Some(prototype));
        }
        if let Some(literal) = self.try_literal()? {
            return Ok(Some(Expr::Literal(literal)));
        }
        Ok(self.try_ident()?.map(Expr::Ident))
    }

    fn try_lookup(&mut self) -> Result<Option<Expr>, Error> {
        let Some(mut expr) = self.try_atom()? else {
            return Ok(None);
        };
        while let Some(operator) = self.accept(&[TokenPattern::punct(".")])? {
            let right = self.parse_atom()?;
            expr = Expr::Binary(BinaryOp {
                operator,
                left: Box::new(expr),
                right: Box::new(right),
            });
        }
        Ok(Some(expr))
    }

    fn try_subscript(&mut self) -> Result<Option<Expr>, Error> {
        let Some(mut expr) = self.try_lookup()? else {
            return Ok(None);
        };

        loop {
            if self.accept(&[TokenPattern::punct("(")])?.is_some() {
                self.lexer.push_group();
                let args = self.parse_args()?;
                self.close_group(")", ParseErrorKind::UnclosedParenthesis)?;
                expr = Expr::Call(Call {
                    callee: Box::new(expr),
                    args,
                });
            } else if self.accept(&[TokenPattern::punct("[")])?.is_some() {
                self.lexer.push_group();
                let index = self.parse_expr()?;
                self.close_subscript()?;
                expr = Expr::Index(Index {
                    base: Box::new(expr),
                    index: Box::new(index),
                });
            } else {
                return Ok(Some(expr));
            }
        }
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>, Error> {
        let mut args = Vec::new();
        while let Some(arg) = self.try_binary(0)? {
            args.push(arg);
            if self.accept(&[TokenPattern::punct(",")])?.is_none() {
                break;
            }
        }
        Ok(args)
    }

    fn try_unary(&mut self) -> Result<Option<Expr>, Error> {
        if let Some(operator) = self.accept(UNARY_OPERATORS)? {
            let operand = self.parse_unary()?;
            return Ok(Some(Expr::Unary(UnaryOp {
                operator,
                operand: Box::new(operand),
            })));
        }
        self.try_subscript()
    }

    /// Precedence climbing. `level` indexes [`PRECEDENCE`]; past the last
    /// level the operands are unary expressions.
    fn try_binary(&mut self, level: usize) -> Result<Option<Expr>, Error> {
        let Some(operators) = PRECEDENCE.get(level) else {
            return self.try_unary();
        };
        let Some(mut expr) = self.try_binary(level + 1)? else {
            return Ok(None);
        };

        while let Some(operator) = self.accept(operators)? {
            let right = self.try_binary(level + 1)?;
            let right = self.required(right)?;
            expr = Expr::Binary(BinaryOp {
                operator,
                left: Box::new(expr),
                right: Box::new(right),
            });
        }
        Ok(Some(expr))
    }

    /// Lookup [`:` Expr] [`=` Expr] [`options` Block] EOL
    fn try_field(&mut self) -> Result<Option<Field>, Error> {
        let Some(name) = self.try_lookup()? else {
            return Ok(None);
        };

        let ty = if self.accept(&[TokenPattern::punct(":")])?.is_some() {
            Some(self.parse_expr()?)
        } else {
            None
        };
        let value = if self.accept(&[TokenPattern::punct("=")])?.is_some() {
            Some(self.parse_expr()?)
        } else {
            None
        };
        let options = if self.accept(&[TokenPattern::keyword("options")])?.is_some() {
            Some(OptionBlock {
                block: self.parse_block()?,
            })
        } else {
            None
        };

        self.expect(&[EOL])?;
        Ok(Some(Field {
            name: Some(name),
            ty,
            value,
            options,
        }))
    }

    /// `( params ) -> Expr`. Declarations name their parameters; the
    /// expression form lists bare type identifiers.
    fn parse_signature(&mut self, named: bool) -> Result<PrototypeDef, Error> {
        self.expect(&[TokenPattern::punct("(")])?;
        self.lexer.push_group();

        let mut params = Vec::new();
        loop {
            let param = if named {
                self.try_param()?
            } else {
                self.try_ident()?.map(|ident| Field {
                    name: None,
                    ty: Some(Expr::Ident(ident)),
                    value: None,
                    options: None,
                })
            };
            let Some(param) = param else {
                break;
            };
            params.push(param);
            if self.accept(&[TokenPattern::punct(",")])?.is_none() {
                break;
            }
        }

        self.close_group(")", ParseErrorKind::UnclosedParenthesis)?;
        self.expect(&[TokenPattern::punct("->")])?;
        let return_type = self.parse_expr()?;
        Ok(PrototypeDef {
            params,
            return_type: Box::new(return_type),
        })
    }

    /// Lookup [`:` Expr] [`=` Expr]
    fn try_param(&mut self) -> Result<Option<Field>, Error> {
        let Some(name) = self.try_lookup()? else {
            return Ok(None);
        };
        let ty = if self.accept(&[TokenPattern::punct(":")])?.is_some() {
            Some(self.parse_expr()?)
        } else {
            None
        };
        let value = if self.accept(&[TokenPattern::punct("=")])?.is_some() {
            Some(self.parse_expr()?)
        } else {
            None
        };
        Ok(Some(Field {
            name: Some(name),
            ty,
            value,
            options: None,
        }))
    }

    /// (`module` | `type` | `proc`) Ident ... EOL
    fn try_decl(&mut self) -> Result<Option<Decl>, Error> {
        let Some(keyword) = self.accept(DECLARATIONS)? else {
            return Ok(None);
        };
        let name = self.parse_ident()?;

        let decl = match keyword.value.as_slice() {
            b"type" => Decl::Type(TypeDecl {
                name,
                ty: self.parse_expr()?,
            }),
            b"proc" => Decl::Proc(ProcDecl {
                name,
                ty: self.parse_signature(true)?,
            }),
            _ => Decl::Module(ModuleDecl { name }),
        };

        // the last declaration may run into end of file
        let end = self.expect(&[EOL, EOF])?;
        if end.tag == TokenTag::Eof {
            self.lexer.unread(end)?;
        }

        trace!(
            keyword = %keyword.text(),
            name = ?decl.name().map(Ident::name),
            loc = %keyword.loc,
            "parsed declaration"
        );
        Ok(Some(decl))
    }

    /// One or more `[[ name = expr, ... ]]` lists followed by a declaration.
    fn try_annotated_decl(&mut self) -> Result<Option<Decl>, Error> {
        if self.accept(&[TokenPattern::punct("[[")])?.is_none() {
            return Ok(None);
        }

        let mut annotations = Vec::new();
        loop {
            self.lexer.push_group();
            self.parse_annotations(&mut annotations)?;
            self.skip_eols()?;
            if self.accept(&[TokenPattern::punct("[[")])?.is_none() {
                break;
            }
        }

        let decl = self.parse_decl()?;
        Ok(Some(Decl::Annotated(AnnotatedDecl {
            annotations,
            decl: Box::new(decl),
        })))
    }

    fn parse_annotations(&mut self, annotations: &mut Vec<Annotation>) -> Result<(), Error> {
        while let Some(name) = self.try_ident()? {
            self.expect(&[TokenPattern::punct("=")])?;
            let value = self.parse_expr()?;
            annotations.push(Annotation { name, value });
            if self.accept(&[TokenPattern::punct(",")])?.is_none() {
                break;
            }
        }

        // `]]` may have been split by a subscript closing right before it
        if self.accept(&[TokenPattern::punct("]]")])?.is_none() {
            self.expect(&[TokenPattern::punct("]")])?;
            self.expect(&[TokenPattern::punct("]")])?;
        }
        self.lexer.pop_group()?;
        Ok(())
    }
}

fn rekind(err: Error, kind: ParseErrorKind) -> Error {
    match err {
        Error::Parse(err) => ParseError::new(kind, err.token).into(),
        other => other,
    }
}
