//! Schema-free lookups over a built tree.
//!
//! Nothing here mutates the tree, so these calls can run alongside each other
//! from any number of threads.

use crate::error::{Error, Result};
use crate::tree::{NodeKind, NodeRef, ParseTree};

/// Separator between levels of a qualified name.
pub const PATH_SEPARATOR: &str = "::";

/// Follow `Block::SubBlock::key` down from the root, matching each level
/// case-insensitively against the first child of that name.
///
/// # Errors
///
/// [`Error::NotFound`] if any level has no matching child.
///
/// ```
/// use stanza::builder::parse_str;
/// use stanza::query::find_by_qualified_name;
///
/// let tree = parse_str("a.conf", "Log { Default_Log_Level = DEBUG; }").unwrap();
/// let node = find_by_qualified_name(&tree, "log::default_log_level").unwrap();
/// assert_eq!(node.terms()[0].text(), "DEBUG");
/// ```
pub fn find_by_qualified_name<'t>(tree: &'t ParseTree, name: &str) -> Result<NodeRef<'t>> {
    let not_found = || Error::NotFound {
        what: name.to_string(),
    };
    let mut node = tree.root();
    for segment in name.split(PATH_SEPARATOR) {
        let segment = segment.trim();
        if segment.is_empty() {
            return Err(not_found());
        }
        node = node
            .children()
            .find(|c| c.is_named(segment))
            .ok_or_else(not_found)?;
    }
    Ok(node)
}

/// Number of blocks and statements directly under the root.
#[must_use]
pub fn count_top_level_items(tree: &ParseTree) -> usize {
    tree.root().child_count()
}

/// The `index`th (0-based) top-level item.
///
/// # Errors
///
/// [`Error::NotFound`] if there are not that many items.
pub fn nth_top_level_item(tree: &ParseTree, index: usize) -> Result<NodeRef<'_>> {
    tree.root()
        .children()
        .nth(index)
        .ok_or_else(|| Error::NotFound {
            what: format!("top-level item {index}"),
        })
}

/// Whether `node` is a block or a statement ([`NodeKind::Root`] for the
/// root itself).
#[must_use]
pub fn item_kind(node: NodeRef<'_>) -> NodeKind {
    node.kind()
}

/// Name and value of a statement. A statement with several values gives
/// them joined with `", "`.
///
/// # Errors
///
/// [`Error::NotStatement`] for blocks and the root.
pub fn key_value(node: NodeRef<'_>) -> Result<(&str, String)> {
    if !node.is_statement() {
        return Err(Error::NotStatement {
            name: node.name().to_string(),
        });
    }
    let value = node
        .terms()
        .iter()
        .map(|t| t.text())
        .collect::<Vec<_>>()
        .join(", ");
    Ok((node.name(), value))
}

#[derive(Debug, PartialEq, Eq)]
struct Qualifier<'x> {
    name: &'x str,
    value: &'x str,
}

#[derive(Debug, PartialEq, Eq)]
struct Segment<'x> {
    name: &'x str,
    qualifiers: Vec<Qualifier<'x>>,
}

struct ExprParser<'x> {
    expr: &'x str,
    pos: usize,
}

impl<'x> ExprParser<'x> {
    fn fail(&self, reason: impl Into<String>) -> Error {
        Error::InvalidExpression {
            expr: self.expr.to_string(),
            reason: reason.into(),
        }
    }

    fn rest(&self) -> &'x str {
        &self.expr[self.pos..]
    }

    fn skip_white(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_white();
        if self.rest().starts_with(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'x str {
        let rest = self.rest();
        let len = rest.find(|c: char| !pred(c)).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn identifier(&mut self) -> Result<&'x str> {
        self.skip_white();
        let start = self.rest().chars().next();
        if !start.is_some_and(|c| c.is_ascii_alphabetic() || c == '_') {
            return Err(self.fail(format!("expected a name at offset {}", self.pos)));
        }
        Ok(self.take_while(|c| c.is_ascii_alphanumeric() || c == '_'))
    }

    fn value(&mut self) -> Result<&'x str> {
        self.skip_white();
        let value = self.take_while(|c| !(c.is_whitespace() || matches!(c, ',' | '(' | ')')));
        if value.is_empty() {
            return Err(self.fail(format!("expected a value at offset {}", self.pos)));
        }
        Ok(value)
    }

    fn segment(&mut self) -> Result<Segment<'x>> {
        let name = self.identifier()?;
        if !self.eat('(') {
            return Err(self.fail(format!("expected '(' after {name}")));
        }
        let mut qualifiers = Vec::new();
        loop {
            let key = self.identifier()?;
            if !self.eat('=') {
                return Err(self.fail(format!("expected '=' after {key}")));
            }
            qualifiers.push(Qualifier {
                name: key,
                value: self.value()?,
            });
            if self.eat(')') {
                break;
            }
            if !self.eat(',') {
                return Err(self.fail(format!("expected ',' or ')' in {name}")));
            }
        }
        Ok(Segment { name, qualifiers })
    }

    fn parse(mut self) -> Result<Vec<Segment<'x>>> {
        let mut segments = vec![self.segment()?];
        loop {
            self.skip_white();
            if self.rest().is_empty() {
                return Ok(segments);
            }
            if !self.eat('.') {
                return Err(self.fail(format!("unexpected text at offset {}", self.pos)));
            }
            segments.push(self.segment()?);
        }
    }
}

fn parse_expr(expr: &str) -> Result<Vec<Segment<'_>>> {
    ExprParser { expr, pos: 0 }.parse()
}

/// A block matches when every qualifier names at least one statement in it
/// and every such statement has a value equal (case-insensitively) to the
/// qualifier's. `*` matches any value in the last segment.
fn block_matches(blk: NodeRef<'_>, segment: &Segment<'_>, last: bool) -> bool {
    segment.qualifiers.iter().all(|q| {
        let mut stmts = blk
            .children()
            .filter(|c| c.is_statement() && c.is_named(q.name))
            .peekable();
        if stmts.peek().is_none() {
            return false;
        }
        if last && q.value == "*" {
            return true;
        }
        stmts.all(|s| s.terms().iter().any(|t| t.text().eq_ignore_ascii_case(q.value)))
    })
}

/// Find blocks by a qualified search expression.
///
/// The expression names a path of blocks, each narrowed by one or more
/// `name = value` qualifiers:
/// `Export(Export_Id = 1).Client(Clients = *)`. Matches are returned in file
/// order.
///
/// # Errors
///
/// [`Error::InvalidExpression`] if `expr` cannot be parsed;
/// [`Error::NotFound`] if no block matches.
///
/// ```
/// use stanza::builder::parse_str;
/// use stanza::query::find_config_nodes;
///
/// let tree = parse_str(
///     "exports.conf",
///     "Export { Export_Id = 1; Client { Clients = a; } Client { Clients = b; } }",
/// )
/// .unwrap();
/// let found = find_config_nodes(&tree, "export(export_id = 1).client(clients = *)").unwrap();
/// assert_eq!(found.len(), 2);
/// ```
pub fn find_config_nodes<'t>(tree: &'t ParseTree, expr: &str) -> Result<Vec<NodeRef<'t>>> {
    let segments = parse_expr(expr)?;
    let mut level = vec![tree.root()];
    for (i, segment) in segments.iter().enumerate() {
        let last = i + 1 == segments.len();
        level = level
            .iter()
            .flat_map(|parent| parent.children())
            .filter(|c| c.is_block() && c.is_named(segment.name) && block_matches(*c, segment, last))
            .collect();
        log::trace!("{expr}: {} match(es) for {}", level.len(), segment.name);
        if level.is_empty() {
            break;
        }
    }
    if level.is_empty() {
        return Err(Error::NotFound {
            what: expr.to_string(),
        });
    }
    Ok(level)
}
