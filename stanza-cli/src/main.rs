//! Main entry point for the stanza CLI.
//!
//! This is the command-line interface for block/statement configuration
//! files. It provides commands for inspecting a file:
//! - `print`: Parse a file and print its tree
//! - `get`: Print one statement or block by qualified name
//! - `find`: List blocks matching a search expression
//! - `check`: Parse a file and report scan or parse errors

mod cli;
mod commands;
mod error;
mod utils;

use clap::Parser;
use cli::Cli;
use utils::GlobalOptions;

fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let _logger = stanza::init_logger(cli.verbose, cli.quiet);

    // Convert CLI args to GlobalOptions
    let global = GlobalOptions {
        verbose: cli.verbose,
        quiet: cli.quiet,
        include_dir: cli.include_dir,
    };

    // Execute the command
    let result = match cli.command {
        cli::Command::Print(cmd) => cmd.execute(&global),
        cli::Command::Get(cmd) => cmd.execute(&global),
        cli::Command::Find(cmd) => cmd.execute(&global),
        cli::Command::Check(cmd) => cmd.execute(&global),
    };

    // Handle errors and set exit code
    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
