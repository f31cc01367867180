//! Find command implementation.
//!
//! Searches a parsed file with an expression such as
//! `EXPORT(Export_Id = 1).CLIENT(Clients = *)` and lists every matching block.

use crate::error::CliError;
use crate::utils::{load_tree, GlobalOptions};
use clap::Args;
use stanza::{find_config_nodes, TreePrinter};
use std::path::PathBuf;

/// List blocks matching a search expression.
#[derive(Args)]
pub struct FindCommand {
    /// Configuration file to read
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Search expression, e.g. `EXPORT(Export_Id = 1).CLIENT(Clients = *)`
    #[arg(value_name = "EXPR")]
    pub expr: String,

    /// Print each matching block in full
    #[arg(long)]
    pub print: bool,
}

impl FindCommand {
    /// Execute the find command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let tree = load_tree(global, &self.file)?;
        let found = find_config_nodes(&tree, &self.expr)?;

        let printer = TreePrinter::new();
        for node in &found {
            if self.print {
                print!("{}", printer.render_node(*node));
            } else {
                println!("{}:{}\t{}", node.file(), node.line(), node.name());
            }
        }

        if !global.quiet {
            eprintln!("{} matching block(s)", found.len());
        }
        Ok(())
    }
}
