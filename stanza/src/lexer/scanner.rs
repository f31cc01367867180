//! Lexer implementation

use super::token::{SignOp, Span, TermType, Token, TokenKind};
use crate::error::{Error, Result};
use std::iter::Peekable;
use std::str::CharIndices;

/// Lexer for configuration text.
pub struct Lexer<'a> {
    source: &'a str,
    file: &'a str,
    chars: Peekable<CharIndices<'a>>,
    line: usize,
    column: usize,
    pos: usize,
}

impl<'a> Lexer<'a> {
    /// Create a lexer over `source`; `file` names it in error messages.
    #[must_use]
    pub fn new(source: &'a str, file: &'a str) -> Self {
        Self {
            source,
            file,
            chars: source.char_indices().peekable(),
            line: 1,
            column: 1,
            pos: 0,
        }
    }

    /// Tokenize the entire source. The last token is always [`TokenKind::Eof`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Scan`] for unterminated strings and characters that
    /// cannot start a token.
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace_and_comments();

        let span = Span {
            line: self.line,
            column: self.column,
        };

        let kind = match self.peek_char() {
            None => TokenKind::Eof,
            Some(c) => match c {
                '{' => {
                    self.advance();
                    TokenKind::LBrace
                }
                '}' => {
                    self.advance();
                    TokenKind::RBrace
                }
                '=' => {
                    self.advance();
                    TokenKind::Equals
                }
                ';' => {
                    self.advance();
                    TokenKind::Semicolon
                }
                ',' => {
                    self.advance();
                    TokenKind::Comma
                }
                '%' => self.scan_directive(span)?,
                '"' => self.scan_dquote(span)?,
                '\'' => self.scan_squote(span)?,
                '-' if self.next_is_digit() => {
                    self.advance();
                    TokenKind::Op(SignOp::Minus)
                }
                '~' => {
                    self.advance();
                    if !self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                        return Err(self.error(span, "'~' must be followed by a number"));
                    }
                    TokenKind::Op(SignOp::Tilde)
                }
                c if c.is_control() => {
                    return Err(self.error(
                        span,
                        &format!("unexpected character (0x{:02x})", c as u32),
                    ));
                }
                _ => {
                    let word = self.scan_word();
                    TokenKind::Term(classify(word), word.to_string())
                }
            },
        };

        Ok(Token { kind, span })
    }

    fn scan_directive(&mut self, span: Span) -> Result<TokenKind> {
        self.advance(); // '%'
        let word = self.scan_word();
        if word.eq_ignore_ascii_case("include") {
            Ok(TokenKind::Include)
        } else {
            Err(self.error(span, &format!("unknown directive %{word}")))
        }
    }

    fn scan_dquote(&mut self, span: Span) -> Result<TokenKind> {
        self.advance(); // opening quote
        let mut value = String::new();

        loop {
            match self.advance() {
                None => return Err(self.error(span, "unterminated string")),
                Some('"') => break,
                Some('\\') => match self.advance() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('\\') => value.push('\\'),
                    Some('"') => value.push('"'),
                    Some(c) => {
                        // Unknown escapes are kept as written.
                        value.push('\\');
                        value.push(c);
                    }
                    None => return Err(self.error(span, "unterminated string")),
                },
                Some(c) => value.push(c),
            }
        }

        Ok(TokenKind::Term(TermType::DQuote, value))
    }

    fn scan_squote(&mut self, span: Span) -> Result<TokenKind> {
        self.advance(); // opening quote
        let start = self.pos;

        loop {
            match self.advance() {
                None => return Err(self.error(span, "unterminated string")),
                Some('\'') => break,
                Some(_) => {}
            }
        }

        // pos is just past the closing quote
        let text = &self.source[start..self.pos - 1];
        Ok(TokenKind::Term(TermType::SQuote, text.to_string()))
    }

    fn scan_word(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() || is_delimiter(c) {
                break;
            }
            self.advance();
        }
        &self.source[start..self.pos]
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while let Some(c) = self.peek_char() {
                if c.is_whitespace() {
                    self.advance();
                } else {
                    break;
                }
            }

            if self.peek_char() == Some('#') {
                while let Some(c) = self.peek_char() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
                continue;
            }

            break;
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn next_is_digit(&self) -> bool {
        let mut ahead = self.chars.clone();
        ahead.next();
        ahead.peek().is_some_and(|(_, c)| c.is_ascii_digit())
    }

    fn advance(&mut self) -> Option<char> {
        let (idx, c) = self.chars.next()?;
        self.pos = idx + c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error(&self, span: Span, message: &str) -> Error {
        Error::Scan {
            file: self.file.to_string(),
            line: span.line,
            message: message.to_string(),
        }
    }
}

fn is_delimiter(c: char) -> bool {
    matches!(c, '{' | '}' | '=' | ';' | ',' | '#' | '"' | '\'')
}

/// Infer the [`TermType`] of a bare word.
///
/// # Examples
///
/// ```
/// use stanza::lexer::{classify, TermType};
///
/// assert_eq!(classify("0x1F"), TermType::HexNum);
/// assert_eq!(classify("Yes"), TermType::True);
/// assert_eq!(classify("/export/home"), TermType::AbsPath);
/// assert_eq!(classify("152.152"), TermType::Fsid);
/// ```
#[must_use]
pub fn classify(word: &str) -> TermType {
    match word.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" => return TermType::True,
        "false" | "no" | "off" => return TermType::False,
        _ => {}
    }

    if let Some(kind) = number_kind(word) {
        return kind;
    }
    if let Some((major, minor)) = word.split_once('.') {
        if number_kind(major).is_some() && number_kind(minor).is_some() {
            return TermType::Fsid;
        }
    }
    if let Some(kind) = ipv4_kind(word) {
        return kind;
    }
    if let Some(kind) = ipv6_kind(word) {
        return kind;
    }
    if word.starts_with('/') {
        return TermType::AbsPath;
    }
    if word.contains('/') {
        return TermType::Path;
    }
    if word.len() > 1 && word.starts_with('@') {
        return TermType::Netgroup;
    }
    TermType::Token
}

fn number_kind(word: &str) -> Option<TermType> {
    let bytes = word.as_bytes();
    match bytes {
        [] => None,
        [b'0'] => Some(TermType::DecNum),
        [b'0', b'x' | b'X', rest @ ..] => {
            (!rest.is_empty() && rest.iter().all(u8::is_ascii_hexdigit)).then_some(TermType::HexNum)
        }
        [b'0', rest @ ..] => rest
            .iter()
            .all(|b| (b'0'..=b'7').contains(b))
            .then_some(TermType::OctNum),
        _ => bytes.iter().all(u8::is_ascii_digit).then_some(TermType::DecNum),
    }
}

fn ipv4_kind(word: &str) -> Option<TermType> {
    let (addr, prefix) = match word.split_once('/') {
        Some((a, p)) => (a, Some(p)),
        None => (word, None),
    };
    let parts: Vec<&str> = addr.split('.').collect();
    let dotted_quad = parts.len() == 4
        && parts.iter().all(|p| {
            !p.is_empty() && p.len() <= 3 && p.bytes().all(|b| b.is_ascii_digit())
        });
    if !dotted_quad {
        return None;
    }
    match prefix {
        Some(p) if !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()) => Some(TermType::V4Cidr),
        Some(_) => None,
        None if addr == "0.0.0.0" => Some(TermType::V4Any),
        None => Some(TermType::V4Addr),
    }
}

fn ipv6_kind(word: &str) -> Option<TermType> {
    let (addr, prefix) = match word.split_once('/') {
        Some((a, p)) => (a, Some(p)),
        None => (word, None),
    };
    let shaped = addr.matches(':').count() >= 2
        && addr
            .chars()
            .all(|c| c.is_ascii_hexdigit() || c == ':' || c == '.');
    if !shaped {
        return None;
    }
    match prefix {
        Some(p) if !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()) => Some(TermType::V6Cidr),
        Some(_) => None,
        None => Some(TermType::V6Addr),
    }
}
