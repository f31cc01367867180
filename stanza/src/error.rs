//! Error types for the stanza library.
//!
//! This module provides the error hierarchy for operations that fail as a
//! whole (building a tree, looking up a node, loading a block), using
//! `thiserror` for ergonomic error handling.
//!
//! Problems found while binding a tree against a schema are *not* reported
//! through this type one by one; they accumulate in
//! [`ConfigErrors`](crate::diagnostics::ConfigErrors) so that a single pass can
//! surface every mistake in a file.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for operations that may fail with a stanza error.
///
/// # Examples
///
/// ```
/// use stanza::{Error, Result};
///
/// fn example_operation() -> Result<usize> {
///     Ok(1)
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the stanza library.
#[derive(Debug, Error)]
pub enum Error {
    /// The text could not be split into tokens.
    #[error("scan error at {file}:{line}: {message}")]
    Scan {
        /// File the error was found in.
        file: String,
        /// Line number (1-based).
        line: usize,
        /// Description of the failure.
        message: String,
    },

    /// The token stream does not follow the configuration grammar.
    #[error("parse error at {file}:{line}: {message}")]
    Parse {
        /// File the error was found in.
        file: String,
        /// Line number (1-based).
        line: usize,
        /// Description of the failure.
        message: String,
    },

    /// An I/O error occurred while reading a configuration file.
    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        /// The file being read.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The requested node does not exist in the tree.
    #[error("not found: {what}")]
    NotFound {
        /// Description of what was looked up.
        what: String,
    },

    /// A key/value accessor was used on a node that is not a statement.
    #[error("{name} is not a statement")]
    NotStatement {
        /// Name of the offending node.
        name: String,
    },

    /// A search expression could not be parsed.
    #[error("invalid search expression '{expr}': {reason}")]
    InvalidExpression {
        /// The expression as given.
        expr: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A node handed to the loader is not the block the descriptor expects.
    #[error("looking for block ({expected}), got ({found})")]
    BlockMismatch {
        /// Block name declared by the descriptor.
        expected: String,
        /// Name (or kind) of the node actually supplied.
        found: String,
    },

    /// Loading a block failed; details are in the diagnostic stream.
    #[error("errors found in configuration block {block}: {errors} {summary}")]
    Load {
        /// The block being loaded.
        block: String,
        /// Number of errors recorded during this load.
        errors: usize,
        /// Compact summary of the triggered error categories.
        summary: String,
    },

    /// An option override (environment or builder) is invalid.
    #[error("invalid option '{field}': {message}")]
    Options {
        /// The option that failed validation.
        field: String,
        /// A description of the validation failure.
        message: String,
    },
}

impl Error {
    /// Returns true for failures produced while scanning or parsing input.
    ///
    /// # Examples
    ///
    /// ```
    /// use stanza::Error;
    ///
    /// let err = Error::Parse { file: "a.conf".into(), line: 3, message: "oops".into() };
    /// assert!(err.is_syntax());
    /// ```
    #[must_use]
    pub fn is_syntax(&self) -> bool {
        matches!(self, Self::Scan { .. } | Self::Parse { .. })
    }

    /// Source line the error refers to, when there is one.
    #[must_use]
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Scan { line, .. } | Self::Parse { line, .. } => Some(*line),
            _ => None,
        }
    }
}
