//! Tokenizer for the configuration language.
//!
//! The lexer turns text into a flat stream of [`Token`]s. Punctuation,
//! `%include` and sign operators get their own kinds; every other word or
//! quoted string becomes a [`TokenKind::Term`] tagged with the [`TermType`]
//! the binding engine later uses as a conversion hint.

mod scanner;
mod token;

pub use scanner::{classify, Lexer};
pub use token::{SignOp, Span, TermType, Token, TokenKind};
