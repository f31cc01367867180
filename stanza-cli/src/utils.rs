//! Utility functions for CLI operations.
//!
//! This module provides the global options shared by every command and the
//! helpers that turn them into a parsed tree.

use crate::error::CliError;
use stanza::{BuildOptions, ParseTree, TreeBuilder};
use std::path::{Path, PathBuf};

/// Global CLI options shared across all commands.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Enable verbose output.
    pub verbose: bool,

    /// Suppress non-essential output.
    pub quiet: bool,

    /// Base directory for relative `%include` paths.
    pub include_dir: Option<PathBuf>,
}

/// Build options from the global flags.
///
/// `STANZA_*` environment variables still apply; an explicit
/// `--include-dir` wins over them.
pub fn build_options(global: &GlobalOptions) -> Result<BuildOptions, CliError> {
    let mut builder = BuildOptions::builder();
    if let Some(ref dir) = global.include_dir {
        if !dir.is_dir() {
            return Err(CliError::InvalidArguments(format!(
                "Include directory not found: {}",
                dir.display()
            )));
        }
        builder = builder.base_dir(dir);
    }
    Ok(builder.build()?)
}

/// Parse `file` with the global options applied.
pub fn load_tree(global: &GlobalOptions, file: &Path) -> Result<ParseTree, CliError> {
    let options = build_options(global)?;
    let tree = TreeBuilder::new(options).build_file(file)?;
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_include_dir() {
        let global = GlobalOptions {
            include_dir: Some(PathBuf::from("/definitely/not/here")),
            ..GlobalOptions::default()
        };
        let err = build_options(&global).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_load_tree() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.conf");
        std::fs::write(&path, "A = 1;\n").unwrap();
        let tree = load_tree(&GlobalOptions::default(), &path).unwrap();
        assert_eq!(stanza::count_top_level_items(&tree), 1);
    }
}
