//! Lossless SQL scanner aware of quotes, comments and `?` markers

use query_core::ResolveError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    #[error("Unterminated string literal starting at offset {0}")]
    UnterminatedString(usize),

    #[error("Unterminated quoted identifier starting at offset {0}")]
    UnterminatedIdentifier(usize),

    #[error("Unterminated block comment starting at offset {0}")]
    UnterminatedComment(usize),
}

impl ScanError {
    /// Character offset where the unterminated token starts.
    pub fn offset(&self) -> usize {
        match self {
            ScanError::UnterminatedString(at)
            | ScanError::UnterminatedIdentifier(at)
            | ScanError::UnterminatedComment(at) => *at,
        }
    }
}

impl From<ScanError> for ResolveError {
    fn from(err: ScanError) -> Self {
        ResolveError::Scan(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Keyword or bare identifier
    Word,
    /// `"..."` identifier
    QuotedIdent,
    /// `'...'`, with `''` as the escaped quote
    StringLit,
    /// `X'...'`
    HexLit,
    /// Digits only: `42`
    Integer,
    /// Digits with a fractional part and no exponent: `1.0`, `.5`
    Decimal,
    /// Anything with an exponent: `1e3`, `1.0e-1`
    Float,
    /// User bind marker `?`
    Param,
    Semicolon,
    Comment,
    Whitespace,
    Symbol,
}

/// A scanned token holding its exact source text.
///
/// Concatenating the text of every token reproduces the input verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    fn new(kind: TokenKind, text: String) -> Self {
        Self { kind, text }
    }

    pub fn is_literal(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::StringLit
                | TokenKind::HexLit
                | TokenKind::Integer
                | TokenKind::Decimal
                | TokenKind::Float
        )
    }

    pub fn is_trivia(&self) -> bool {
        matches!(self.kind, TokenKind::Comment | TokenKind::Whitespace)
    }
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, ScanError> {
        let mut tokens = Vec::new();

        while self.position < self.input.len() {
            tokens.push(self.next_token()?);
        }

        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Token, ScanError> {
        let start = self.position;
        let ch = self.current_char();

        let kind = match ch {
            _ if ch.is_whitespace() => {
                self.skip_whitespace();
                TokenKind::Whitespace
            }
            '-' if self.peek_char(1) == '-' => {
                while self.position < self.input.len() && self.current_char() != '\n' {
                    self.advance();
                }
                TokenKind::Comment
            }
            '/' if self.peek_char(1) == '*' => {
                self.read_block_comment(start)?;
                TokenKind::Comment
            }
            '\'' => {
                self.read_quoted('\'')
                    .ok_or(ScanError::UnterminatedString(start))?;
                TokenKind::StringLit
            }
            '"' => {
                self.read_quoted('"')
                    .ok_or(ScanError::UnterminatedIdentifier(start))?;
                TokenKind::QuotedIdent
            }
            'x' | 'X' if self.peek_char(1) == '\'' => {
                self.advance();
                self.read_quoted('\'')
                    .ok_or(ScanError::UnterminatedString(start))?;
                TokenKind::HexLit
            }
            '?' => {
                self.advance();
                TokenKind::Param
            }
            ';' => {
                self.advance();
                TokenKind::Semicolon
            }
            _ if ch.is_ascii_digit() => self.read_number(),
            '.' if self.peek_char(1).is_ascii_digit() => self.read_number(),
            _ if ch.is_alphabetic() || ch == '_' => {
                self.read_word();
                TokenKind::Word
            }
            _ => {
                self.advance();
                TokenKind::Symbol
            }
        };

        let text: String = self.input[start..self.position].iter().collect();
        Ok(Token::new(kind, text))
    }

    /// Consume a quoted run; a doubled quote character is an escape.
    fn read_quoted(&mut self, quote: char) -> Option<()> {
        self.advance();
        loop {
            if self.position >= self.input.len() {
                return None;
            }
            if self.current_char() == quote {
                if self.peek_char(1) == quote {
                    self.position += 2;
                    continue;
                }
                self.advance();
                return Some(());
            }
            self.advance();
        }
    }

    fn read_block_comment(&mut self, start: usize) -> Result<(), ScanError> {
        self.position += 2;
        while self.position < self.input.len() {
            if self.current_char() == '*' && self.peek_char(1) == '/' {
                self.position += 2;
                return Ok(());
            }
            self.advance();
        }
        Err(ScanError::UnterminatedComment(start))
    }

    fn read_number(&mut self) -> TokenKind {
        let mut kind = TokenKind::Integer;

        self.skip_digits();
        if self.current_char() == '.' {
            kind = TokenKind::Decimal;
            self.advance();
            self.skip_digits();
        }

        // Only treat `e` as an exponent when digits follow, so `1else` stays split.
        if matches!(self.current_char(), 'e' | 'E') {
            let sign = matches!(self.peek_char(1), '+' | '-');
            let digit_at = if sign { 2 } else { 1 };
            if self.peek_char(digit_at).is_ascii_digit() {
                self.position += digit_at;
                self.skip_digits();
                kind = TokenKind::Float;
            }
        }

        kind
    }

    fn read_word(&mut self) {
        while self.position < self.input.len()
            && (self.current_char().is_alphanumeric()
                || self.current_char() == '_'
                || self.current_char() == '$')
        {
            self.advance();
        }
    }

    fn skip_digits(&mut self) {
        while self.position < self.input.len() && self.current_char().is_ascii_digit() {
            self.advance();
        }
    }

    fn current_char(&self) -> char {
        self.peek_char(0)
    }

    fn peek_char(&self, offset: usize) -> char {
        self.input
            .get(self.position + offset)
            .copied()
            .unwrap_or('\0')
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while self.position < self.input.len() && self.current_char().is_whitespace() {
            self.advance();
        }
    }
}

/// Scan `input` into tokens.
pub fn scan(input: &str) -> Result<Vec<Token>, ScanError> {
    Lexer::new(input).tokenize()
}
