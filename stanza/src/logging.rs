//! Logging infrastructure for the stanza library.
//!
//! Diagnostics collected while loading a configuration are user-facing and
//! go through [`Logger`], a small level-filtered writer (stderr by default).
//! Engine tracing meant for developers goes through the `log` facade instead
//! and is only visible when the host application installs a `log` backend.

use std::env;
use std::fmt;
use std::io::{self, Write};
use std::sync::Mutex;

/// Environment variable consulted by [`init_logger`].
pub const LOG_MODE_ENV: &str = "STANZA_LOG_MODE";

/// Logging level for controlling output verbosity.
///
/// Log levels are ordered from least verbose (Quiet) to most verbose (Verbose).
///
/// # Examples
///
/// ```
/// use stanza::LogLevel;
///
/// assert!(LogLevel::Quiet < LogLevel::Normal);
/// assert!(LogLevel::Normal < LogLevel::Verbose);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Suppress all non-essential output.
    Quiet,
    /// Normal output level (errors and warnings).
    Normal,
    /// Verbose output (errors, warnings, info, and debug messages).
    Verbose,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quiet => write!(f, "quiet"),
            Self::Normal => write!(f, "normal"),
            Self::Verbose => write!(f, "verbose"),
        }
    }
}

impl LogLevel {
    /// Parses a log level from a string.
    ///
    /// Recognizes: "quiet", "normal", "verbose" (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not recognized.
    ///
    /// # Examples
    ///
    /// ```
    /// use stanza::LogLevel;
    ///
    /// assert_eq!(LogLevel::parse("quiet").unwrap(), LogLevel::Quiet);
    /// assert_eq!(LogLevel::parse("VERBOSE").unwrap(), LogLevel::Verbose);
    /// assert!(LogLevel::parse("invalid").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "quiet" => Ok(Self::Quiet),
            "normal" => Ok(Self::Normal),
            "verbose" => Ok(Self::Verbose),
            _ => Err(format!("invalid log level: {s}")),
        }
    }
}

/// Severity attached to a single logged line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Something made the configuration unusable.
    Error,
    /// Something was ignored or tolerated.
    Warn,
    /// Progress information.
    Info,
    /// Developer detail.
    Debug,
}

impl Severity {
    const fn prefix(self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Warn => "WARN",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
        }
    }

    const fn min_level(self) -> LogLevel {
        match self {
            Self::Error | Self::Warn => LogLevel::Normal,
            Self::Info | Self::Debug => LogLevel::Verbose,
        }
    }
}

/// A level-filtered line logger.
///
/// Writes to stderr unless constructed with [`Logger::with_sink`].
///
/// # Examples
///
/// ```
/// use stanza::{Logger, LogLevel};
///
/// let logger = Logger::new(LogLevel::Normal);
/// logger.error("This is an error message");
/// logger.info("This will not be printed (requires Verbose)");
/// ```
pub struct Logger {
    level: LogLevel,
    sink: Option<Mutex<Box<dyn Write + Send>>>,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.level)
            .field("custom_sink", &self.sink.is_some())
            .finish()
    }
}

impl Logger {
    /// Creates a new stderr logger with the specified log level.
    #[must_use]
    pub const fn new(level: LogLevel) -> Self {
        Self { level, sink: None }
    }

    /// Creates a logger that writes into `sink` instead of stderr.
    #[must_use]
    pub fn with_sink(level: LogLevel, sink: Box<dyn Write + Send>) -> Self {
        Self {
            level,
            sink: Some(Mutex::new(sink)),
        }
    }

    /// Returns the current log level.
    #[must_use]
    pub const fn level(&self) -> LogLevel {
        self.level
    }

    /// Returns true if a line of `severity` would be written.
    #[must_use]
    pub fn enabled(&self, severity: Severity) -> bool {
        self.level >= severity.min_level()
    }

    /// Logs `message` at `severity`.
    pub fn log(&self, severity: Severity, message: &str) {
        if !self.enabled(severity) {
            return;
        }
        let line = format!("{}: {message}", severity.prefix());
        match &self.sink {
            Some(sink) => {
                // A poisoned sink only means another thread panicked mid-write.
                let mut guard = sink.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
                let _ = writeln!(guard, "{line}");
            }
            None => {
                let _ = writeln!(io::stderr(), "{line}");
            }
        }
    }

    /// Logs an error message.
    pub fn error(&self, message: &str) {
        self.log(Severity::Error, message);
    }

    /// Logs a warning message.
    pub fn warn(&self, message: &str) {
        self.log(Severity::Warn, message);
    }

    /// Logs an informational message.
    pub fn info(&self, message: &str) {
        self.log(Severity::Info, message);
    }

    /// Logs a debug message.
    pub fn debug(&self, message: &str) {
        self.log(Severity::Debug, message);
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(LogLevel::Normal)
    }
}

/// Initializes a logger based on environment variables and CLI flags.
///
/// The priority order is:
/// 1. CLI flags (verbose/quiet)
/// 2. `STANZA_LOG_MODE` environment variable
/// 3. Default (Normal)
///
/// If both `verbose` and `quiet` are true, `verbose` takes precedence.
///
/// # Examples
///
/// ```
/// use stanza::{init_logger, LogLevel};
///
/// let logger = init_logger(true, false);
/// assert_eq!(logger.level(), LogLevel::Verbose);
/// ```
#[must_use]
pub fn init_logger(verbose: bool, quiet: bool) -> Logger {
    if verbose {
        return Logger::new(LogLevel::Verbose);
    }
    if quiet {
        return Logger::new(LogLevel::Quiet);
    }

    if let Ok(env_value) = env::var(LOG_MODE_ENV) {
        if let Ok(level) = LogLevel::parse(&env_value) {
            return Logger::new(level);
        }
    }

    Logger::new(LogLevel::Normal)
}
