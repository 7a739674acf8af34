use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Source coordinate of the first character of a token.
///
/// Rows and columns are zero-based and counted in characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    pub file: Arc<str>,
    pub row: usize,
    pub col: usize,
}

impl Location {
    /// Create a location inside `file`.
    #[must_use]
    pub fn new(file: impl Into<Arc<str>>, row: usize, col: usize) -> Self {
        Self {
            file: file.into(),
            row,
            col,
        }
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::new("", 0, 0)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.row, self.col)
    }
}

/// Token classification produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenTag {
    /// End of input.
    Eof,
    /// One or more statement separators (`\n` or `;`).
    Eol,
    /// Single-line comment (`# ...`).
    Comment,
    /// Decimal integer.
    DecInt,
    /// Binary integer (`0b...`).
    BinInt,
    /// Octal integer (`0o...`).
    OctInt,
    /// Hexadecimal integer (`0x...`).
    HexInt,
    /// Decimal floating point number.
    Float,
    /// Double-quoted string literal, escapes decoded.
    String,
    /// Identifier or keyword.
    Word,
    /// Operator or delimiter.
    Punct,
}

impl TokenTag {
    /// Whether tokens with this tag are literal values.
    #[must_use]
    pub const fn is_literal(self) -> bool {
        matches!(
            self,
            Self::DecInt | Self::BinInt | Self::OctInt | Self::HexInt | Self::Float | Self::String
        )
    }
}

impl fmt::Display for TokenTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Eof => "EOF",
            Self::Eol => "EOL",
            Self::Comment => "COMMENT",
            Self::DecInt | Self::BinInt | Self::OctInt | Self::HexInt => "INT",
            Self::Float => "FLOAT",
            Self::String => "STRING",
            Self::Word => "WORD",
            Self::Punct => "PUNCT",
        };
        f.write_str(name)
    }
}

/// A classified span of source text with its starting location.
///
/// `value` holds bytes rather than a `String` because a `\xHH` escape in a
/// string literal appends a single raw byte.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    pub tag: TokenTag,
    pub loc: Location,
    pub value: Vec<u8>,
}

impl Token {
    #[must_use]
    pub fn new(tag: TokenTag, loc: Location, value: impl Into<Vec<u8>>) -> Self {
        Self {
            tag,
            loc,
            value: value.into(),
        }
    }

    /// Token value as text, replacing invalid UTF-8 with `U+FFFD`.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.value)
    }

    /// Whether the token has `tag` and exactly the spelling `value`.
    #[must_use]
    pub fn is(&self, tag: TokenTag, value: &str) -> bool {
        self.tag == tag && self.value == value.as_bytes()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tag {
            TokenTag::Eof | TokenTag::Eol => write!(f, "`{}`", self.tag),
            _ => write!(f, "`{} '{}'`", self.tag, self.text()),
        }
    }
}
