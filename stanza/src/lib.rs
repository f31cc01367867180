#![deny(missing_docs, unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! # stanza
//!
//! A schema-driven loader for block/statement configuration files.
//!
//! Files are made of nested `Name { key = value; ... }` blocks and
//! `key = value;` statements, optionally split across `%include`d files.
//! This library turns such a file into a [`ParseTree`], then binds the tree
//! onto plain Rust structs using declarative schemas, collecting every
//! problem it finds (with file and line) instead of stopping at the first.
//!
//! ## Core Types
//!
//! - [`ParseTree`] and [`NodeRef`]: the parsed file
//! - [`FieldDescriptor`] and [`BlockDescriptor`]: schemas
//! - [`ConfigErrors`]: diagnostics collected while binding
//! - [`Error`] and [`Result`]: failures of whole operations
//! - [`Logger`] and [`LogLevel`]: logging infrastructure
//!
//! ## Examples
//!
//! ```
//! use stanza::{load_config_from_parse, parse_str, BlockDescriptor, ConfigErrors, EmbeddedBlock,
//!     FieldDescriptor};
//!
//! #[derive(Debug, Default, Clone)]
//! struct Log {
//!     level: u32,
//!     path: Option<String>,
//! }
//!
//! const LEVELS: &[(&str, u32)] = &[("INFO", 1), ("DEBUG", 2)];
//!
//! let schema = BlockDescriptor::new(
//!     "Log",
//!     vec![
//!         FieldDescriptor::token("Level", LEVELS, 1, |l: &mut Log| &mut l.level),
//!         FieldDescriptor::path("Path", 1, 4096, None, |l: &mut Log| &mut l.path),
//!     ],
//!     EmbeddedBlock::new(),
//! );
//!
//! let tree = parse_str("app.conf", "Log { Level = debug; Path = /var/log/app; }").unwrap();
//! let mut log = Log::default();
//! let mut errs = ConfigErrors::new();
//! load_config_from_parse(&tree, &schema, &mut log, false, &mut errs).unwrap();
//! assert_eq!(log.level, 2);
//! assert_eq!(log.path.as_deref(), Some("/var/log/app"));
//! assert!(errs.is_error_free());
//! ```

pub mod binding;
pub mod builder;
pub mod diagnostics;
pub mod error;
pub mod lexer;
pub mod logging;
pub mod options;
pub mod query;
pub mod schema;
pub mod tree;

// Re-export key types at crate root for convenience
pub use binding::{default_init, load_config_from_node, load_config_from_parse};
pub use builder::{build, parse_str, TreeBuilder};
pub use diagnostics::{ConfigErrors, Diagnostic, ErrorKind, ErrorKinds};
pub use error::{Error, Result};
pub use logging::{init_logger, LogLevel, Logger};
pub use options::{BuildOptions, BuildOptionsBuilder};
pub use query::{
    count_top_level_items, find_by_qualified_name, find_config_nodes, item_kind, key_value,
    nth_top_level_item,
};
pub use schema::{
    BlockDescriptor, BlockOps, CommitOutcome, EmbeddedBlock, FieldDescriptor, FieldFlags,
    ListBlock,
};
pub use tree::{Location, NodeKind, NodeRef, ParseTree, Term, TreePrinter};
