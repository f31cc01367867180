//! Command to print one node by qualified name.

use crate::error::CliError;
use crate::utils::{load_tree, GlobalOptions};
use clap::Args;
use stanza::{find_by_qualified_name, key_value, NodeKind, TreePrinter};
use std::path::PathBuf;

/// Print one statement or block by qualified name.
#[derive(Args)]
pub struct GetCommand {
    /// Configuration file to read
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Name path such as `EXPORT::Path` (case-insensitive)
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Also print where the node was defined
    #[arg(long)]
    pub show_location: bool,
}

impl GetCommand {
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        if self.name.trim().is_empty() {
            return Err(CliError::InvalidArguments("Name must not be empty".to_string()));
        }

        let tree = load_tree(global, &self.file)?;
        let node = find_by_qualified_name(&tree, &self.name)?;

        if self.show_location {
            eprintln!("{}", node.location());
        }

        match node.kind() {
            NodeKind::Statement => {
                let (_, value) = key_value(node)?;
                println!("{value}");
            }
            _ => print!("{}", TreePrinter::new().render_node(node)),
        }
        Ok(())
    }
}
