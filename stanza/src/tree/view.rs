//! Serializable snapshot of a parse tree for JSON/YAML dumps.

use super::{NodeRef, ParseTree, Term};
use crate::lexer::TermType;
use serde::Serialize;

/// Owned, serializable copy of a [`ParseTree`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeView {
    /// Files that contributed to the tree.
    pub files: Vec<String>,
    /// Reload generation.
    pub generation: u64,
    /// Top-level blocks and statements.
    pub items: Vec<NodeView>,
}

/// One block or statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeView {
    /// A block with its children.
    Block {
        /// Block name.
        name: String,
        /// Source file.
        file: String,
        /// Source line.
        line: usize,
        /// Nested items.
        children: Vec<NodeView>,
    },
    /// A statement with its values.
    Statement {
        /// Statement name.
        name: String,
        /// Source file.
        file: String,
        /// Source line.
        line: usize,
        /// Values in order.
        values: Vec<TermView>,
    },
}

/// One statement value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermView {
    /// Lexical class.
    #[serde(rename = "type")]
    pub kind: TermType,
    /// Value text.
    pub text: String,
    /// Sign operator, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub op: Option<char>,
}

impl From<&Term> for TermView {
    fn from(term: &Term) -> Self {
        Self {
            kind: term.kind(),
            text: term.text().to_string(),
            op: term.op().map(|op| op.as_char()),
        }
    }
}

impl From<NodeRef<'_>> for NodeView {
    fn from(node: NodeRef<'_>) -> Self {
        if node.is_statement() {
            Self::Statement {
                name: node.name().to_string(),
                file: node.file().to_string(),
                line: node.line(),
                values: node.terms().iter().map(TermView::from).collect(),
            }
        } else {
            Self::Block {
                name: node.name().to_string(),
                file: node.file().to_string(),
                line: node.line(),
                children: node.children().map(NodeView::from).collect(),
            }
        }
    }
}

impl From<&ParseTree> for TreeView {
    fn from(tree: &ParseTree) -> Self {
        Self {
            files: tree.files().iter().map(ToString::to_string).collect(),
            generation: tree.generation(),
            items: tree.root().children().map(NodeView::from).collect(),
        }
    }
}
