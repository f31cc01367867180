//! Error accumulation for binding passes.
//!
//! Binding a tree never stops at the first problem. Every problem becomes a
//! [`Diagnostic`] carrying the file and line of the node it concerns, bumps
//! the error count, and raises its category in an [`ErrorKinds`] set. Callers
//! decide what to do with the result through [`ConfigErrors::is_fatal`],
//! [`ConfigErrors::is_critical`], [`ConfigErrors::is_harmless`] and
//! [`ConfigErrors::is_error_free`].

use crate::error::Error;
use crate::logging::{Logger, Severity};
use crate::tree::{Location, NodeRef};
use bitflags::bitflags;
use std::fmt;
use std::sync::Arc;

bitflags! {
    /// Set of error categories raised during a pass.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ErrorKinds: u32 {
        /// Lexical error.
        const SCAN = 1 << 0;
        /// Grammar error.
        const PARSE = 1 << 1;
        /// Block storage could not be obtained.
        const INIT = 1 << 2;
        /// Filesystem backend failure.
        const FSAL = 1 << 3;
        /// Resource allocation failure.
        const RESOURCE = 1 << 4;
        /// A unique parameter was repeated.
        const UNIQUE = 1 << 5;
        /// A value failed conversion or validation.
        const INVALID = 1 << 6;
        /// A mandatory parameter is absent.
        const MISSING = 1 << 7;
        /// A block failed its validator.
        const VALIDATE = 1 << 8;
        /// A block appeared more often than allowed.
        const EXISTS = 1 << 9;
        /// Engine defect or schema mistake.
        const INTERNAL = 1 << 10;
        /// Unknown parameter.
        const BOGUS = 1 << 11;
        /// Retired parameter.
        const DEPRECATED = 1 << 12;
    }
}

impl ErrorKinds {
    const FATAL: Self = Self::SCAN
        .union(Self::PARSE)
        .union(Self::INIT)
        .union(Self::FSAL)
        .union(Self::RESOURCE);

    const CRITICAL: Self = Self::FATAL
        .union(Self::INVALID)
        .union(Self::MISSING)
        .union(Self::VALIDATE)
        .union(Self::EXISTS)
        .union(Self::INTERNAL);

    /// Any category that must stop processing of the file.
    #[must_use]
    pub fn is_fatal(self) -> bool {
        self.intersects(Self::FATAL)
    }

    /// Any category that makes the affected block unusable.
    #[must_use]
    pub fn is_critical(self) -> bool {
        self.intersects(Self::CRITICAL)
    }

    /// Only categories that let processing continue normally.
    #[must_use]
    pub fn is_harmless(self) -> bool {
        !self.is_critical()
    }

    /// Parenthesized, comma-joined category names.
    ///
    /// ```
    /// use stanza::diagnostics::ErrorKinds;
    ///
    /// let kinds = ErrorKinds::INVALID | ErrorKinds::MISSING;
    /// assert_eq!(kinds.summary(), "(invalid param value, missing mandatory param)");
    /// assert_eq!(ErrorKinds::empty().summary(), "(no errors)");
    /// ```
    #[must_use]
    pub fn summary(self) -> String {
        if self.is_empty() {
            return "(no errors)".to_string();
        }
        let names: Vec<&str> = ErrorKind::ALL
            .iter()
            .filter(|k| self.contains(k.flag()))
            .map(|k| k.describe())
            .collect();
        format!("({})", names.join(", "))
    }
}

/// One error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`ErrorKinds::SCAN`].
    Scan,
    /// See [`ErrorKinds::PARSE`].
    Parse,
    /// See [`ErrorKinds::INIT`].
    Init,
    /// See [`ErrorKinds::FSAL`].
    Fsal,
    /// See [`ErrorKinds::RESOURCE`].
    Resource,
    /// See [`ErrorKinds::UNIQUE`].
    Unique,
    /// See [`ErrorKinds::INVALID`].
    Invalid,
    /// See [`ErrorKinds::MISSING`].
    Missing,
    /// See [`ErrorKinds::VALIDATE`].
    Validate,
    /// See [`ErrorKinds::EXISTS`].
    Exists,
    /// See [`ErrorKinds::INTERNAL`].
    Internal,
    /// See [`ErrorKinds::BOGUS`].
    Bogus,
    /// See [`ErrorKinds::DEPRECATED`].
    Deprecated,
}

impl ErrorKind {
    /// Every category in summary order.
    pub const ALL: [Self; 13] = [
        Self::Scan,
        Self::Parse,
        Self::Init,
        Self::Fsal,
        Self::Resource,
        Self::Unique,
        Self::Invalid,
        Self::Missing,
        Self::Validate,
        Self::Exists,
        Self::Internal,
        Self::Bogus,
        Self::Deprecated,
    ];

    /// The matching bit in [`ErrorKinds`].
    #[must_use]
    pub const fn flag(self) -> ErrorKinds {
        match self {
            Self::Scan => ErrorKinds::SCAN,
            Self::Parse => ErrorKinds::PARSE,
            Self::Init => ErrorKinds::INIT,
            Self::Fsal => ErrorKinds::FSAL,
            Self::Resource => ErrorKinds::RESOURCE,
            Self::Unique => ErrorKinds::UNIQUE,
            Self::Invalid => ErrorKinds::INVALID,
            Self::Missing => ErrorKinds::MISSING,
            Self::Validate => ErrorKinds::VALIDATE,
            Self::Exists => ErrorKinds::EXISTS,
            Self::Internal => ErrorKinds::INTERNAL,
            Self::Bogus => ErrorKinds::BOGUS,
            Self::Deprecated => ErrorKinds::DEPRECATED,
        }
    }

    /// Name used in summaries.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Scan => "token scan",
            Self::Parse => "parser rule",
            Self::Init => "block init",
            Self::Fsal => "fsal load",
            Self::Resource => "resource alloc",
            Self::Unique => "not unique param",
            Self::Invalid => "invalid param value",
            Self::Missing => "missing mandatory param",
            Self::Validate => "block validation",
            Self::Exists => "block exists",
            Self::Internal => "internal error",
            Self::Bogus => "unknown param",
            Self::Deprecated => "deprecated param",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// One line of the diagnostic stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Where the problem is.
    pub location: Location,
    /// Category, or `None` for informational notes.
    pub kind: Option<ErrorKind>,
    /// What went wrong.
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Config File ({}): {}", self.location, self.message)
    }
}

/// Position in the diagnostic stream, used to look at what one block added.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    diagnostics: usize,
    errors: usize,
}

/// Accumulated outcome of one or more binding passes.
#[derive(Debug, Clone, Default)]
pub struct ConfigErrors {
    errors: usize,
    kinds: ErrorKinds,
    dispose: bool,
    diagnostics: Vec<Diagnostic>,
}

impl ConfigErrors {
    /// Empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error of `kind` against `node` (or an unknown location).
    pub fn record(&mut self, kind: ErrorKind, node: Option<NodeRef<'_>>, message: impl Into<String>) {
        let location = node.map_or_else(Location::unknown, |n| n.location());
        self.record_at(kind, location, message);
    }

    /// Record an error of `kind` at an explicit location.
    pub fn record_at(&mut self, kind: ErrorKind, location: Location, message: impl Into<String>) {
        let message = message.into();
        log::debug!("config error [{kind}] at {location}: {message}");
        self.errors += 1;
        self.kinds |= kind.flag();
        self.diagnostics.push(Diagnostic {
            location,
            kind: Some(kind),
            message,
        });
    }

    /// Add an informational line. Notes do not count as errors.
    pub fn note(&mut self, node: Option<NodeRef<'_>>, message: impl Into<String>) {
        let location = node.map_or_else(Location::unknown, |n| n.location());
        self.diagnostics.push(Diagnostic {
            location,
            kind: None,
            message: message.into(),
        });
    }

    /// Record a failed tree build so it shows up alongside binding errors.
    pub fn record_build_failure(&mut self, err: &Error) {
        let (kind, location) = match err {
            Error::Scan { file, line, .. } => (ErrorKind::Scan, Location {
                file: Arc::from(file.as_str()),
                line: *line,
            }),
            Error::Parse { file, line, .. } => (ErrorKind::Parse, Location {
                file: Arc::from(file.as_str()),
                line: *line,
            }),
            Error::Io { path, .. } => (ErrorKind::Resource, Location {
                file: Arc::from(path.display().to_string()),
                line: 0,
            }),
            _ => (ErrorKind::Internal, Location::unknown()),
        };
        self.record_at(kind, location, err.to_string());
    }

    /// Number of errors recorded.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors
    }

    /// Categories raised so far.
    #[must_use]
    pub fn kinds(&self) -> ErrorKinds {
        self.kinds
    }

    /// True if `kind` was raised.
    #[must_use]
    pub fn has(&self, kind: ErrorKind) -> bool {
        self.kinds.contains(kind.flag())
    }

    /// Every diagnostic in the order it was recorded.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Number of errors of `kind`.
    #[must_use]
    pub fn count_of(&self, kind: ErrorKind) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.kind == Some(kind))
            .count()
    }

    /// Mark the current position in the stream.
    #[must_use]
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            diagnostics: self.diagnostics.len(),
            errors: self.errors,
        }
    }

    /// Errors recorded since `cp`.
    #[must_use]
    pub fn errors_since(&self, cp: Checkpoint) -> usize {
        self.errors - cp.errors
    }

    /// Categories raised since `cp`.
    #[must_use]
    pub fn kinds_since(&self, cp: Checkpoint) -> ErrorKinds {
        self.diagnostics[cp.diagnostics..]
            .iter()
            .filter_map(|d| d.kind)
            .fold(ErrorKinds::empty(), |acc, k| acc | k.flag())
    }

    /// True while a committed block is waiting to be disposed of.
    #[must_use]
    pub fn dispose_pending(&self) -> bool {
        self.dispose
    }

    pub(crate) fn set_dispose(&mut self, pending: bool) {
        self.dispose = pending;
    }

    /// Something happened that must stop processing.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.kinds.is_fatal()
    }

    /// Something happened that leaves a block unusable.
    #[must_use]
    pub fn is_critical(&self) -> bool {
        self.kinds.is_critical()
    }

    /// Only harmless problems were found.
    #[must_use]
    pub fn is_harmless(&self) -> bool {
        self.kinds.is_harmless()
    }

    /// Nothing was found at all.
    #[must_use]
    pub fn is_error_free(&self) -> bool {
        self.errors == 0 && self.kinds.is_empty()
    }

    /// Summary of the categories raised, e.g. `"(unknown param)"`.
    #[must_use]
    pub fn err_type_str(&self) -> String {
        self.kinds.summary()
    }

    /// Write every diagnostic to `logger`.
    ///
    /// Errors are logged as errors when anything critical happened and as
    /// warnings otherwise; notes are logged as info.
    pub fn report(&self, logger: &Logger) {
        let severity = if self.is_critical() {
            Severity::Error
        } else {
            Severity::Warn
        };
        for diag in &self.diagnostics {
            match diag.kind {
                Some(_) => logger.log(severity, &diag.to_string()),
                None => logger.log(Severity::Info, &diag.to_string()),
            }
        }
    }
}
