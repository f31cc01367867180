//! CLI structure and command definitions.
//!
//! This module defines the main CLI structure using clap's derive macros,
//! including global options and subcommands.

use crate::commands::{CheckCommand, FindCommand, GetCommand, PrintCommand};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line tool for inspecting block/statement configuration files.
#[derive(Parser)]
#[command(name = "stanza")]
#[command(version, about = "Inspect block/statement configuration files", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Resolve relative %include paths against this directory
    #[arg(long, value_name = "DIR", global = true, env = "STANZA_INCLUDE_DIR")]
    pub include_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand)]
pub enum Command {
    /// Parse a file and print its tree
    Print(PrintCommand),

    /// Print one statement or block by qualified name
    Get(GetCommand),

    /// List blocks matching a search expression
    Find(FindCommand),

    /// Parse a file and report scan or parse errors
    Check(CheckCommand),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["stanza", "check", "a.conf", "--quiet"]).unwrap();
        assert!(cli.quiet);
        assert!(matches!(cli.command, Command::Check(_)));
    }
}
