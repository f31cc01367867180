//! Command to check that a configuration file parses.
//!
//! Failures are routed through the diagnostic accumulator so they are
//! reported with the same `Config File (file:line): ...` format the loader
//! uses.

use crate::error::CliError;
use crate::utils::{load_tree, GlobalOptions};
use clap::Args;
use stanza::{count_top_level_items, init_logger, ConfigErrors};
use std::path::PathBuf;

/// Parse a file and report scan or parse errors.
#[derive(Args)]
pub struct CheckCommand {
    /// Configuration file to check
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

impl CheckCommand {
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        if !self.file.exists() {
            return Err(CliError::InvalidArguments(format!(
                "File not found: {}",
                self.file.display()
            )));
        }

        let logger = init_logger(global.verbose, global.quiet);
        match load_tree(global, &self.file) {
            Ok(tree) => {
                logger.info(&format!("{} nodes, {} interned strings", tree.len(), tree.interned_strings()));
                if !global.quiet {
                    println!(
                        "{}: OK ({} top-level items from {} file(s))",
                        self.file.display(),
                        count_top_level_items(&tree),
                        tree.files().len()
                    );
                }
                Ok(())
            }
            Err(CliError::Library(err)) if err.is_syntax() => {
                let mut errs = ConfigErrors::new();
                errs.record_build_failure(&err);
                errs.report(&logger);
                Err(CliError::Library(err))
            }
            Err(other) => Err(other),
        }
    }
}
