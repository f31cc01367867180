//! Options controlling how configuration files are read.
//!
//! Options are assembled with [`BuildOptionsBuilder`]; values come from (lowest
//! to highest precedence) built-in defaults, `STANZA_*` environment variables,
//! and explicit builder calls.
//!
//! # Examples
//!
//! ```
//! use stanza::options::BuildOptions;
//! use std::path::Path;
//!
//! let opts = BuildOptions::builder()
//!     .skip_env()
//!     .base_dir(Path::new("/etc/ganesha"))
//!     .max_include_depth(4)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(opts.max_include_depth, 4);
//! ```

use crate::error::{Error, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Default limit on `%include` nesting.
pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 10;
/// Default limit on `{ ... }` block nesting.
pub const DEFAULT_MAX_BLOCK_DEPTH: usize = 1000;

/// Environment variable overriding [`BuildOptions::base_dir`].
pub const INCLUDE_DIR_ENV: &str = "STANZA_INCLUDE_DIR";
/// Environment variable overriding [`BuildOptions::max_include_depth`].
pub const MAX_INCLUDE_DEPTH_ENV: &str = "STANZA_MAX_INCLUDE_DEPTH";
/// Environment variable overriding [`BuildOptions::max_block_depth`].
pub const MAX_BLOCK_DEPTH_ENV: &str = "STANZA_MAX_BLOCK_DEPTH";
/// Environment variable overriding [`BuildOptions::max_file_size`].
pub const MAX_FILE_SIZE_ENV: &str = "STANZA_MAX_FILE_SIZE";

/// Settings for the tree builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Directory relative `%include` paths resolve against. When unset they
    /// resolve against the directory of the including file.
    pub base_dir: Option<PathBuf>,
    /// Maximum `%include` nesting depth.
    pub max_include_depth: usize,
    /// Maximum block nesting depth, counted across included files.
    pub max_block_depth: usize,
    /// Files larger than this many bytes are refused before scanning.
    pub max_file_size: Option<u64>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            base_dir: None,
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
            max_block_depth: DEFAULT_MAX_BLOCK_DEPTH,
            max_file_size: None,
        }
    }
}

impl BuildOptions {
    /// Starts a builder with default values.
    #[must_use]
    pub fn builder() -> BuildOptionsBuilder {
        BuildOptionsBuilder::new()
    }

    /// Apply `STANZA_*` environment overrides to these options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Options`] if a numeric override does not parse or the
    /// include or block depth is zero.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(dir) = env::var(INCLUDE_DIR_ENV) {
            if !dir.is_empty() {
                self.base_dir = Some(PathBuf::from(dir));
            }
        }

        if let Ok(depth) = env::var(MAX_INCLUDE_DEPTH_ENV) {
            self.max_include_depth = depth.trim().parse().map_err(|_| Error::Options {
                field: MAX_INCLUDE_DEPTH_ENV.into(),
                message: "Must be a positive integer".into(),
            })?;
        }

        if let Ok(depth) = env::var(MAX_BLOCK_DEPTH_ENV) {
            self.max_block_depth = depth.trim().parse().map_err(|_| Error::Options {
                field: MAX_BLOCK_DEPTH_ENV.into(),
                message: "Must be a positive integer".into(),
            })?;
        }

        if let Ok(size) = env::var(MAX_FILE_SIZE_ENV) {
            self.max_file_size = Some(size.trim().parse().map_err(|_| Error::Options {
                field: MAX_FILE_SIZE_ENV.into(),
                message: "Must be a byte count".into(),
            })?);
        }

        Ok(())
    }

    /// Checks the options for consistency.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Options`] when either depth limit is zero.
    pub fn validate(&self) -> Result<()> {
        if self.max_include_depth == 0 {
            return Err(Error::Options {
                field: "max_include_depth".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.max_block_depth == 0 {
            return Err(Error::Options {
                field: "max_block_depth".into(),
                message: "must be greater than 0".into(),
            });
        }
        Ok(())
    }

    /// Resolves an include target named in `including_file`.
    #[must_use]
    pub fn resolve_include(&self, target: &str, including_file: Option<&Path>) -> PathBuf {
        let target = Path::new(target);
        if target.is_absolute() {
            return target.to_path_buf();
        }
        if let Some(base) = &self.base_dir {
            return base.join(target);
        }
        match including_file.and_then(Path::parent) {
            Some(dir) => dir.join(target),
            None => target.to_path_buf(),
        }
    }
}

/// Builder for [`BuildOptions`].
#[derive(Debug, Clone)]
pub struct BuildOptionsBuilder {
    options: BuildOptions,
    base_dir: Option<PathBuf>,
    max_include_depth: Option<usize>,
    max_block_depth: Option<usize>,
    max_file_size: Option<u64>,
    skip_env: bool,
}

impl Default for BuildOptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildOptionsBuilder {
    /// Create a builder holding default options.
    #[must_use]
    pub fn new() -> Self {
        Self {
            options: BuildOptions::default(),
            base_dir: None,
            max_include_depth: None,
            max_block_depth: None,
            max_file_size: None,
            skip_env: false,
        }
    }

    /// Ignore `STANZA_*` environment variables.
    #[must_use]
    pub fn skip_env(mut self) -> Self {
        self.skip_env = true;
        self
    }

    /// Resolve relative includes against `dir`.
    #[must_use]
    pub fn base_dir(mut self, dir: &Path) -> Self {
        self.base_dir = Some(dir.to_path_buf());
        self
    }

    /// Limit `%include` nesting.
    #[must_use]
    pub fn max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = Some(depth);
        self
    }

    /// Limit block nesting.
    #[must_use]
    pub fn max_block_depth(mut self, depth: usize) -> Self {
        self.max_block_depth = Some(depth);
        self
    }

    /// Refuse files larger than `bytes`.
    #[must_use]
    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = Some(bytes);
        self
    }

    /// Produce the final options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Options`] if an environment override is malformed or
    /// the resulting options are inconsistent.
    pub fn build(self) -> Result<BuildOptions> {
        let mut options = self.options;

        if !self.skip_env {
            options.apply_env_overrides()?;
        }

        // Explicit builder calls win over the environment.
        if let Some(dir) = self.base_dir {
            options.base_dir = Some(dir);
        }
        if let Some(depth) = self.max_include_depth {
            options.max_include_depth = depth;
        }
        if let Some(depth) = self.max_block_depth {
            options.max_block_depth = depth;
        }
        if let Some(size) = self.max_file_size {
            options.max_file_size = Some(size);
        }

        options.validate()?;
        Ok(options)
    }
}
