use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::token::{Location, Token, TokenTag};

/// Every operator and delimiter the lexer recognizes.
///
/// Punctuation is matched greedily: the lexer keeps extending a token while
/// the accumulated text is still a prefix of some entry.
pub const PUNCTUATIONS: &[&str] = &[
    "(", ")", "[", "]", "{", "}", ",", ".", ":", "=", "+", "-", "*", "/", "%", ">", "<", "^", "~",
    "!", "|", "&", ":=", "==", "!=", ">=", "<=", ">>", "<<", "&&", "||", "=>", "->", "[[", "]]",
];

/// Classifies a lexer error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexErrorKind {
    /// Character that cannot start any token.
    InvalidCharacter(char),
    /// Misplaced `.` or an exponent without digits.
    MalformedFloatLiteral,
    /// Radix prefix (`0b`, `0o`, `0x`) without digits.
    MalformedIntLiteral,
    /// Unknown escape letter or a short/invalid hex run.
    MalformedEscapeSequence,
    /// Line break or end of input before the closing quote.
    UnterminatedStringLiteral,
    /// `pop_group` without a matching `push_group`.
    UnbalancedGroup,
    /// `unread` while a token is already pending.
    AlreadyUnread,
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCharacter(ch) => write!(f, "invalid character: {ch:?}"),
            Self::MalformedFloatLiteral => write!(f, "malformed floating literal"),
            Self::MalformedIntLiteral => write!(f, "malformed integer literal"),
            Self::MalformedEscapeSequence => write!(f, "malformed escape sequence"),
            Self::UnterminatedStringLiteral => write!(f, "unterminated string literal"),
            Self::UnbalancedGroup => write!(f, "unbalanced group"),
            Self::AlreadyUnread => write!(f, "token is already unread"),
        }
    }
}

/// Error produced during lexing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{loc}: {kind}")]
pub struct LexError {
    pub kind: LexErrorKind,
    pub loc: Location,
}

/// Scan a whole source string. The last token is always `EOF`.
///
/// # Errors
///
/// Returns the first `LexError` encountered.
pub fn tokenize(file: impl Into<Arc<str>>, input: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer::new(file, input);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.read()?;
        let done = token.tag == TokenTag::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

/// On-demand scanner with a single pushback slot.
///
/// While the group depth is above zero, line breaks are treated as plain
/// whitespace instead of statement separators.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    file: Arc<str>,
    input: &'a str,
    pos: usize,
    row: usize,
    col: usize,
    unread: Option<Token>,
    groups: usize,
}

impl<'a> Lexer<'a> {
    #[must_use]
    pub fn new(file: impl Into<Arc<str>>, input: &'a str) -> Self {
        Self {
            file: file.into(),
            input: input.strip_prefix('\u{FEFF}').unwrap_or(input),
            pos: 0,
            row: 0,
            col: 0,
            unread: None,
            groups: 0,
        }
    }

    /// Return the next token, preferring a previously unread one.
    ///
    /// # Errors
    ///
    /// Returns `LexError` for invalid characters and malformed literals.
    pub fn read(&mut self) -> Result<Token, LexError> {
        if let Some(token) = self.unread.take() {
            return Ok(token);
        }

        self.skip_spaces();
        let token = self.classify()?;
        trace!(tag = ?token.tag, loc = %token.loc, "token");
        Ok(token)
    }

    /// Push `token` back so the next `read` returns it.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyUnread` if a token is already pending.
    pub fn unread(&mut self, token: Token) -> Result<(), LexError> {
        if self.unread.is_some() {
            return Err(LexError {
                kind: LexErrorKind::AlreadyUnread,
                loc: token.loc,
            });
        }
        self.unread = Some(token);
        Ok(())
    }

    /// Enter a bracketed context.
    pub const fn push_group(&mut self) {
        self.groups += 1;
    }

    /// Leave a bracketed context.
    ///
    /// # Errors
    ///
    /// Returns `UnbalancedGroup` when no group is open.
    pub fn pop_group(&mut self) -> Result<(), LexError> {
        if self.groups == 0 {
            return Err(self.error(LexErrorKind::UnbalancedGroup));
        }
        self.groups -= 1;
        Ok(())
    }

    #[must_use]
    pub const fn group_depth(&self) -> usize {
        self.groups
    }

    /// Enter a `{}` body, where line breaks separate entries again even when
    /// the body sits inside brackets. Returns the depth to hand back to
    /// [`Lexer::resume_groups`] at the closing brace.
    pub const fn suspend_groups(&mut self) -> usize {
        let depth = self.groups;
        self.groups = 0;
        depth
    }

    /// Restore the group depth saved by [`Lexer::suspend_groups`].
    pub const fn resume_groups(&mut self, depth: usize) {
        self.groups = depth;
    }

    /// Location of the next unscanned character.
    #[must_use]
    pub fn location(&self) -> Location {
        Location {
            file: Arc::clone(&self.file),
            row: self.row,
            col: self.col,
        }
    }

    fn classify(&mut self) -> Result<Token, LexError> {
        let Some(ch) = self.peek() else {
            return Ok(Token::new(TokenTag::Eof, self.location(), Vec::new()));
        };

        // order is important
        match ch {
            '\n' | ';' => Ok(self.read_eol()),
            '#' => Ok(self.read_comment()),
            c if c.is_ascii_digit() => self.read_number(),
            '"' => self.read_string(),
            c if c.is_alphabetic() || c == '_' => Ok(self.read_word()),
            _ => self.read_punct(),
        }
    }

    fn error(&self, kind: LexErrorKind) -> LexError {
        LexError {
            kind,
            loc: self.location(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.row += 1;
            self.col = 0;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn skip_spaces(&mut self) {
        while let Some(ch) = self.peek() {
            let space = matches!(ch, ' ' | '\t' | '\r') || (self.groups > 0 && ch.is_whitespace());
            if !space {
                break;
            }
            self.advance();
        }
    }

    fn read_eol(&mut self) -> Token {
        let start = self.location();
        while matches!(self.peek(), Some('\n' | ';' | ' ' | '\t' | '\r')) {
            self.advance();
        }
        Token::new(TokenTag::Eol, start, Vec::new())
    }

    fn read_comment(&mut self) -> Token {
        let start = self.location();
        let begin = self.pos;
        while self.peek().is_some_and(|ch| ch != '\n') {
            self.advance();
        }
        let text = self.input[begin..self.pos].trim_end_matches('\r');
        Token::new(TokenTag::Comment, start, text)
    }

    fn read_number(&mut self) -> Result<Token, LexError> {
        let start = self.location();
        let mut tag = TokenTag::DecInt;
        let mut value = String::new();

        if self.input[self.pos..].starts_with('0') {
            let radix = match self.input[self.pos..].chars().nth(1) {
                Some('b') => Some(TokenTag::BinInt),
                Some('o') => Some(TokenTag::OctInt),
                Some('x') => Some(TokenTag::HexInt),
                _ => None,
            };
            if let Some(radix) = radix {
                self.advance();
                self.advance();
                tag = radix;
            }
        }

        let mut have_exp = false;
        loop {
            while let Some(ch) = self.peek().filter(|&c| is_digit_of(c, tag)) {
                value.push(ch);
                self.advance();
            }

            match self.peek() {
                Some('.') => {
                    if tag != TokenTag::DecInt || have_exp {
                        return Err(self.error(LexErrorKind::MalformedFloatLiteral));
                    }
                    value.push('.');
                    self.advance();
                    tag = TokenTag::Float;
                }
                Some(marker @ ('e' | 'E'))
                    if !have_exp && matches!(tag, TokenTag::DecInt | TokenTag::Float) =>
                {
                    have_exp = true;
                    value.push(marker);
                    self.advance();

                    if let Some(sign @ ('+' | '-')) = self.peek() {
                        value.push(sign);
                        self.advance();
                    }

                    if !self.peek().is_some_and(|c| c.is_ascii_digit()) {
                        return Err(self.error(LexErrorKind::MalformedFloatLiteral));
                    }
                }
                _ => break,
            }
        }

        if value.is_empty() {
            return Err(self.error(LexErrorKind::MalformedIntLiteral));
        }

        Ok(Token::new(tag, start, value))
    }

    fn read_string(&mut self) -> Result<Token, LexError> {
        let start = self.location();
        self.advance(); // skip opening quote

        let mut value = Vec::new();
        loop {
            match self.advance() {
                None | Some('\n') => {
                    return Err(LexError {
                        kind: LexErrorKind::UnterminatedStringLiteral,
                        loc: start,
                    });
                }
                Some('"') => break,
                Some('\\') => self.read_escape(&mut value)?,
                Some(ch) => push_char(&mut value, ch),
            }
        }

        Ok(Token::new(TokenTag::String, start, value))
    }

    fn read_escape(&mut self, value: &mut Vec<u8>) -> Result<(), LexError> {
        let loc = self.location();
        let Some(letter) = self.advance() else {
            return Err(LexError {
                kind: LexErrorKind::UnterminatedStringLiteral,
                loc,
            });
        };

        let decoded = match letter {
            'a' => '\u{07}',
            'b' => '\u{08}',
            'f' => '\u{0C}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'v' => '\u{0B}',
            '\\' => '\\',
            '\'' => '\'',
            '"' => '"',
            'x' => {
                let [.., byte] = self.read_hex(2, &loc)?.to_be_bytes();
                value.push(byte);
                return Ok(());
            }
            'u' => self.read_code_point(4, &loc)?,
            'U' => self.read_code_point(8, &loc)?,
            _ => {
                return Err(LexError {
                    kind: LexErrorKind::MalformedEscapeSequence,
                    loc,
                });
            }
        };

        push_char(value, decoded);
        Ok(())
    }

    fn read_code_point(&mut self, digits: usize, loc: &Location) -> Result<char, LexError> {
        let code = self.read_hex(digits, loc)?;
        char::from_u32(code).ok_or_else(|| LexError {
            kind: LexErrorKind::MalformedEscapeSequence,
            loc: loc.clone(),
        })
    }

    fn read_hex(&mut self, digits: usize, loc: &Location) -> Result<u32, LexError> {
        let mut code = 0u32;
        for _ in 0..digits {
            let digit = self
                .peek()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| LexError {
                    kind: LexErrorKind::MalformedEscapeSequence,
                    loc: loc.clone(),
                })?;
            self.advance();
            code = (code << 4) | digit;
        }
        Ok(code)
    }

    fn read_word(&mut self) -> Token {
        let start = self.location();
        let begin = self.pos;
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.advance();
        }
        Token::new(TokenTag::Word, start, &self.input[begin..self.pos])
    }

    fn read_punct(&mut self) -> Result<Token, LexError> {
        let start = self.location();
        let begin = self.pos;

        while let Some(ch) = self.peek() {
            let candidate = &self.input[begin..self.pos + ch.len_utf8()];
            if !PUNCTUATIONS.iter().any(|p| p.starts_with(candidate)) {
                break;
            }
            self.advance();
        }

        let text = &self.input[begin..self.pos];
        if !PUNCTUATIONS.contains(&text) {
            let ch = self.input[begin..].chars().next().unwrap_or_default();
            return Err(LexError {
                kind: LexErrorKind::InvalidCharacter(ch),
                loc: start,
            });
        }

        Ok(Token::new(TokenTag::Punct, start, text))
    }
}

fn is_digit_of(ch: char, tag: TokenTag) -> bool {
    match tag {
        TokenTag::BinInt => matches!(ch, '0' | '1'),
        TokenTag::OctInt => matches!(ch, '0'..='7'),
        TokenTag::HexInt => ch.is_ascii_hexdigit(),
        _ => ch.is_ascii_digit(),
    }
}

fn push_char(value: &mut Vec<u8>, ch: char) {
    let mut buf = [0; 4];
    value.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
}
