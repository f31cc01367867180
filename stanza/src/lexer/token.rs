//! Lexer token types

use serde::Serialize;
use std::fmt;

/// Lexical class of a value term, inferred from how it is written.
///
/// The binding engine uses this hint to choose a numeric base, to accept
/// boolean spellings, and to reject values of the wrong shape before trying
/// to convert them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TermType {
    /// Bare word that fits no other class.
    Token,
    /// Double-quoted string.
    DQuote,
    /// Single-quoted string.
    SQuote,
    /// `true`, `yes` or `on`.
    True,
    /// `false`, `no` or `off`.
    False,
    /// Decimal integer.
    DecNum,
    /// `0x` hexadecimal integer.
    HexNum,
    /// Leading-zero octal integer.
    OctNum,
    /// Filesystem id, `<num>.<num>`.
    Fsid,
    /// Dotted-quad IPv4 address.
    V4Addr,
    /// The IPv4 wildcard `0.0.0.0`.
    V4Any,
    /// IPv4 address with a prefix length.
    V4Cidr,
    /// IPv6 address.
    V6Addr,
    /// IPv6 address with a prefix length.
    V6Cidr,
    /// Path starting with `/`.
    AbsPath,
    /// Relative path (contains `/`).
    Path,
    /// Netgroup name (`@group`).
    Netgroup,
}

impl TermType {
    /// Human-readable description used in diagnostics.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Token => "option name or number",
            Self::DQuote => "double quoted string",
            Self::SQuote => "single quoted string",
            Self::True => "boolean TRUE",
            Self::False => "boolean FALSE",
            Self::DecNum => "decimal number",
            Self::HexNum => "hexadecimal number",
            Self::OctNum => "octal number",
            Self::Fsid => "filesystem id",
            Self::V4Addr => "IPv4 address",
            Self::V4Any => "IPv4 any address",
            Self::V4Cidr => "IPv4 CIDR subnet",
            Self::V6Addr => "IPv6 address",
            Self::V6Cidr => "IPv6 CIDR subnet",
            Self::AbsPath => "absolute file path",
            Self::Path => "file path",
            Self::Netgroup => "netgroup name",
        }
    }

    /// True for the three integer classes.
    #[must_use]
    pub const fn is_number(self) -> bool {
        matches!(self, Self::DecNum | Self::HexNum | Self::OctNum)
    }

    /// True for quoted strings.
    #[must_use]
    pub const fn is_quoted(self) -> bool {
        matches!(self, Self::DQuote | Self::SQuote)
    }
}

impl fmt::Display for TermType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Prefix operator written immediately before a numeric term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SignOp {
    /// `-`, negation (signed kinds only).
    Minus,
    /// `~`, bitwise complement (unsigned kinds only).
    Tilde,
}

impl SignOp {
    /// The operator character.
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Minus => '-',
            Self::Tilde => '~',
        }
    }
}

/// Token kinds produced by the scanner.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `=`
    Equals,
    /// `;`
    Semicolon,
    /// `,`
    Comma,
    /// `%include`
    Include,
    /// `-` or `~` in front of a number.
    Op(SignOp),
    /// A value or name.
    Term(TermType, String),
    /// End of input.
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LBrace => f.write_str("'{'"),
            Self::RBrace => f.write_str("'}'"),
            Self::Equals => f.write_str("'='"),
            Self::Semicolon => f.write_str("';'"),
            Self::Comma => f.write_str("','"),
            Self::Include => f.write_str("%include"),
            Self::Op(op) => write!(f, "'{}'", op.as_char()),
            Self::Term(kind, text) => write!(f, "{kind} ({text})"),
            Self::Eof => f.write_str("end of file"),
        }
    }
}

/// Source location of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// 1-based line.
    pub line: usize,
    /// 1-based column.
    pub column: usize,
}

impl Default for Span {
    fn default() -> Self {
        Self { line: 1, column: 1 }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A token with its kind and source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// What was scanned.
    pub kind: TokenKind,
    /// Where it starts.
    pub span: Span,
}
