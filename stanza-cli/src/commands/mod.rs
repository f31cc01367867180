//! CLI command implementations.
//!
//! This module contains the implementations of all CLI commands:
//! - `print`: Parse a file and print its tree
//! - `get`: Print one statement or block by qualified name
//! - `find`: List blocks matching a search expression
//! - `check`: Parse a file and report scan or parse errors

pub mod check;
pub mod find;
pub mod get;
pub mod print;

pub use check::CheckCommand;
pub use find::FindCommand;
pub use get::GetCommand;
pub use print::PrintCommand;
