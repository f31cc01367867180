//! In-memory parse tree.
//!
//! A [`ParseTree`] is an arena: every node lives in one `Vec` and refers to
//! its parent and children by [`NodeId`]. The tree is built once by
//! [`crate::builder`] and is read-only afterwards; navigation goes through the
//! borrowed [`NodeRef`] cursor.
//!
//! ```
//! use stanza::builder::parse_str;
//! use stanza::tree::NodeKind;
//!
//! let tree = parse_str("main.conf", "EXPORT { Path = /srv; }").unwrap();
//! let export = tree.root().children().next().unwrap();
//! assert_eq!(export.kind(), NodeKind::Block);
//!
//! let path = export.children().next().unwrap();
//! assert_eq!(path.name(), "Path");
//! assert_eq!(path.terms()[0].text(), "/srv");
//! assert_eq!(path.parent().unwrap().name(), "EXPORT");
//! ```

mod intern;
mod printer;
#[cfg(test)]
mod proptests;
mod view;

pub use intern::Interner;
pub use printer::TreePrinter;
pub use view::{NodeView, TermView, TreeView};

use crate::lexer::{SignOp, TermType};
use std::fmt;
use std::sync::Arc;

/// File name used when a diagnostic has no node to point at.
pub const UNKNOWN_FILE: &str = "<unknown file>";

/// Index of a node inside its [`ParseTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// The root node of every tree.
    pub const ROOT: Self = Self(0);

    /// Position of the node in the arena.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Index into the tree's list of contributing files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId(usize);

/// What a node is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// The single top-level node.
    Root,
    /// `name { ... }`
    Block,
    /// `name = value, ...;`
    Statement,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => write!(f, "root node"),
            Self::Block => write!(f, "block"),
            Self::Statement => write!(f, "statement"),
        }
    }
}

/// One value of a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    kind: TermType,
    text: Arc<str>,
    op: Option<SignOp>,
    line: usize,
}

impl Term {
    /// Create a term. Quoted strings hold their unescaped contents.
    #[must_use]
    pub fn new(kind: TermType, text: Arc<str>, op: Option<SignOp>, line: usize) -> Self {
        Self {
            kind,
            text,
            op,
            line,
        }
    }

    /// Lexical class of the value.
    #[must_use]
    pub fn kind(&self) -> TermType {
        self.kind
    }

    /// The value text, without any sign operator.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The `-` or `~` written in front of a number.
    #[must_use]
    pub fn op(&self) -> Option<SignOp> {
        self.op
    }

    /// Line the term appears on.
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(op) = self.op {
            write!(f, "{}", op.as_char())?;
        }
        f.write_str(&self.text)
    }
}

/// Where a node came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// File name as given to the builder.
    pub file: Arc<str>,
    /// 1-based line, or 0 when unknown.
    pub line: usize,
}

impl Location {
    /// Placeholder for diagnostics without node context.
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            file: Arc::from(UNKNOWN_FILE),
            line: 0,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    name: Arc<str>,
    file: FileId,
    line: usize,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    terms: Vec<Term>,
}

/// A parsed configuration: the root node, every block and statement below
/// it, and the list of files that contributed to it.
#[derive(Debug, Clone)]
pub struct ParseTree {
    nodes: Vec<Node>,
    files: Vec<Arc<str>>,
    interner: Interner,
    generation: u64,
}

impl Default for ParseTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ParseTree {
    /// Create a tree holding only the root node.
    #[must_use]
    pub fn new() -> Self {
        let mut interner = Interner::new();
        let root = Node {
            kind: NodeKind::Root,
            name: interner.intern("root"),
            file: FileId(0),
            line: 0,
            parent: None,
            children: Vec::new(),
            terms: Vec::new(),
        };
        Self {
            nodes: vec![root],
            files: Vec::new(),
            interner,
            generation: 0,
        }
    }

    /// Cursor at the root node.
    #[must_use]
    pub fn root(&self) -> NodeRef<'_> {
        self.node(NodeId::ROOT)
    }

    /// Cursor at `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this tree.
    #[must_use]
    pub fn node(&self, id: NodeId) -> NodeRef<'_> {
        assert!(id.0 < self.nodes.len(), "node id out of range");
        NodeRef { tree: self, id }
    }

    /// Total number of nodes, including the root.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the tree holds nothing but its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Files that contributed nodes, in the order they were first read.
    #[must_use]
    pub fn files(&self) -> &[Arc<str>] {
        &self.files
    }

    /// Reload generation recorded by the caller.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Record a reload generation.
    pub fn set_generation(&mut self, generation: u64) {
        self.generation = generation;
    }

    /// Number of distinct strings held by the tree's intern pool.
    #[must_use]
    pub fn interned_strings(&self) -> usize {
        self.interner.len()
    }

    /// First block anywhere in the tree whose name matches `name`
    /// (case-insensitive). Nodes are searched in file order.
    #[must_use]
    pub fn first_block_named(&self, name: &str) -> Option<NodeRef<'_>> {
        self.nodes
            .iter()
            .position(|n| n.kind == NodeKind::Block && n.name.eq_ignore_ascii_case(name))
            .map(|idx| self.node(NodeId(idx)))
    }

    pub(crate) fn intern(&mut self, text: &str) -> Arc<str> {
        self.interner.intern(text)
    }

    pub(crate) fn add_file(&mut self, name: &str) -> FileId {
        if let Some(idx) = self.files.iter().position(|f| &**f == name) {
            return FileId(idx);
        }
        let shared = self.interner.intern(name);
        self.files.push(shared);
        FileId(self.files.len() - 1)
    }

    pub(crate) fn add_block(
        &mut self,
        parent: NodeId,
        name: &str,
        file: FileId,
        line: usize,
    ) -> NodeId {
        self.push(parent, NodeKind::Block, name, file, line, Vec::new())
    }

    pub(crate) fn add_statement(
        &mut self,
        parent: NodeId,
        name: &str,
        file: FileId,
        line: usize,
        terms: Vec<Term>,
    ) -> NodeId {
        self.push(parent, NodeKind::Statement, name, file, line, terms)
    }

    fn push(
        &mut self,
        parent: NodeId,
        kind: NodeKind,
        name: &str,
        file: FileId,
        line: usize,
        terms: Vec<Term>,
    ) -> NodeId {
        debug_assert!(!name.is_empty());
        debug_assert!(self.nodes[parent.0].kind != NodeKind::Statement);
        let id = NodeId(self.nodes.len());
        let name = self.interner.intern(name);
        self.nodes.push(Node {
            kind,
            name,
            file,
            line,
            parent: Some(parent),
            children: Vec::new(),
            terms,
        });
        self.nodes[parent.0].children.push(id);
        id
    }
}

impl fmt::Display for ParseTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        TreePrinter::new().write(self, f)
    }
}

/// Borrowed cursor over one node of a [`ParseTree`].
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a ParseTree,
    id: NodeId,
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .field("name", &self.name())
            .field("location", &self.location())
            .finish()
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for NodeRef<'_> {}

impl<'a> NodeRef<'a> {
    fn raw(&self) -> &'a Node {
        &self.tree.nodes[self.id.0]
    }

    /// Arena index of this node.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The tree this node belongs to.
    #[must_use]
    pub fn tree(&self) -> &'a ParseTree {
        self.tree
    }

    /// Node name as written in the file.
    #[must_use]
    pub fn name(&self) -> &'a str {
        &self.raw().name
    }

    /// Case-insensitive name comparison.
    #[must_use]
    pub fn is_named(&self, name: &str) -> bool {
        self.raw().name.eq_ignore_ascii_case(name)
    }

    /// Root, block or statement.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.raw().kind
    }

    /// True for [`NodeKind::Block`].
    #[must_use]
    pub fn is_block(&self) -> bool {
        self.kind() == NodeKind::Block
    }

    /// True for [`NodeKind::Statement`].
    #[must_use]
    pub fn is_statement(&self) -> bool {
        self.kind() == NodeKind::Statement
    }

    /// Enclosing block, or `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.raw().parent.map(|id| self.tree.node(id))
    }

    /// Immediate children in file order. Statements have none.
    pub fn children(&self) -> impl DoubleEndedIterator<Item = NodeRef<'a>> + ExactSizeIterator + 'a {
        let tree = self.tree;
        self.raw()
            .children
            .iter()
            .map(move |&id| NodeRef { tree, id })
    }

    /// Number of immediate children.
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.raw().children.len()
    }

    /// Statement values. Empty for blocks and the root.
    #[must_use]
    pub fn terms(&self) -> &'a [Term] {
        &self.raw().terms
    }

    /// Source line, 0 for the root.
    #[must_use]
    pub fn line(&self) -> usize {
        self.raw().line
    }

    /// Source file name.
    #[must_use]
    pub fn file(&self) -> &'a str {
        self.tree
            .files
            .get(self.raw().file.0)
            .map_or(UNKNOWN_FILE, |f| &**f)
    }

    /// File and line for diagnostics.
    #[must_use]
    pub fn location(&self) -> Location {
        match self.tree.files.get(self.raw().file.0) {
            Some(file) => Location {
                file: Arc::clone(file),
                line: self.line(),
            },
            None => Location::unknown(),
        }
    }

    /// Walk parent links up to the root node.
    #[must_use]
    pub fn root(&self) -> NodeRef<'a> {
        let mut cur = *self;
        while let Some(parent) = cur.parent() {
            cur = parent;
        }
        cur
    }
}

/// Root node of the tree `node` belongs to.
#[must_use]
pub fn root_of(node: NodeRef<'_>) -> NodeRef<'_> {
    node.root()
}
