//! Print command implementation.
//!
//! This module implements the `print` command, which parses a file (following
//! its includes) and writes the resulting tree as configuration text, JSON or
//! YAML.

use crate::error::CliError;
use crate::utils::{load_tree, GlobalOptions};
use clap::{Args, ValueEnum};
use stanza::tree::TreeView;
use stanza::{ParseTree, TreePrinter};
use std::io::Write;
use std::path::PathBuf;

/// Parse a file and print its tree.
#[derive(Args)]
pub struct PrintCommand {
    /// Configuration file to read
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Output format
    #[arg(
        long,
        value_enum,
        default_value = "text",
        env = "STANZA_OUTPUT_FORMAT",
        ignore_case = true
    )]
    pub format: OutputFormat,

    /// Spaces per nesting level in text output
    #[arg(long, default_value_t = 4, value_name = "N")]
    pub indent: usize,
}

/// Output format for the print command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Configuration text that parses back to the same tree
    Text,
    /// JSON document
    Json,
    /// YAML document
    Yaml,
}

impl PrintCommand {
    /// Execute the print command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let tree = load_tree(global, &self.file)?;
        let rendered = render(&tree, self.format, self.indent)?;

        let mut stdout = std::io::stdout().lock();
        stdout.write_all(rendered.as_bytes())?;
        if !rendered.ends_with('\n') {
            writeln!(stdout)?;
        }
        Ok(())
    }
}

/// Render `tree` in `format`.
pub fn render(tree: &ParseTree, format: OutputFormat, indent: usize) -> Result<String, CliError> {
    match format {
        OutputFormat::Text => Ok(TreePrinter::new().indent(indent).render(tree)),
        OutputFormat::Json => serde_json::to_string_pretty(&TreeView::from(tree))
            .map_err(|e| CliError::Serialize(e.to_string())),
        OutputFormat::Yaml => serde_yaml::to_string(&TreeView::from(tree))
            .map_err(|e| CliError::Serialize(e.to_string())),
    }
}
