//! Text printer for parse trees.
//!
//! The output is valid configuration text: feeding it back through the
//! builder yields a tree with the same blocks, statements and values.

use super::{NodeRef, ParseTree, Term};
use crate::lexer::TermType;
use std::fmt::{self, Write};

/// Renders a [`ParseTree`] as configuration text.
///
/// # Examples
///
/// ```
/// use stanza::builder::parse_str;
/// use stanza::tree::TreePrinter;
///
/// let tree = parse_str("t", "LOG{Default_Log_Level=INFO;}").unwrap();
/// let text = TreePrinter::new().indent(2).render(&tree);
/// assert_eq!(text, "LOG {\n  Default_Log_Level = INFO;\n}\n");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TreePrinter {
    indent: usize,
}

impl Default for TreePrinter {
    fn default() -> Self {
        Self::new()
    }
}

impl TreePrinter {
    /// Printer with a four-space indent.
    #[must_use]
    pub const fn new() -> Self {
        Self { indent: 4 }
    }

    /// Set the number of spaces per nesting level.
    #[must_use]
    pub const fn indent(mut self, width: usize) -> Self {
        self.indent = width;
        self
    }

    /// Render into a fresh `String`.
    #[must_use]
    pub fn render(&self, tree: &ParseTree) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write(tree, &mut out);
        out
    }

    /// Render the whole tree into `out`.
    ///
    /// # Errors
    ///
    /// Propagates errors from the underlying writer.
    pub fn write<W: Write>(&self, tree: &ParseTree, out: &mut W) -> fmt::Result {
        for child in tree.root().children() {
            self.write_node(child, 0, out)?;
        }
        Ok(())
    }

    /// Render one block or statement and everything below it.
    #[must_use]
    pub fn render_node(&self, node: NodeRef<'_>) -> String {
        let mut out = String::new();
        if node.kind() == super::NodeKind::Root {
            for child in node.children() {
                let _ = self.write_node(child, 0, &mut out);
            }
        } else {
            let _ = self.write_node(node, 0, &mut out);
        }
        out
    }

    fn write_node<W: Write>(&self, node: NodeRef<'_>, depth: usize, out: &mut W) -> fmt::Result {
        let pad = depth * self.indent;
        if node.is_block() {
            writeln!(out, "{:pad$}{} {{", "", node.name())?;
            for child in node.children() {
                self.write_node(child, depth + 1, out)?;
            }
            writeln!(out, "{:pad$}}}", "")
        } else {
            write!(out, "{:pad$}{} =", "", node.name())?;
            for (i, term) in node.terms().iter().enumerate() {
                out.write_str(if i == 0 { " " } else { ", " })?;
                write_term(term, out)?;
            }
            out.write_str(";\n")
        }
    }
}

/// Write one term so that it scans back to the same kind and text.
fn write_term<W: Write>(term: &Term, out: &mut W) -> fmt::Result {
    if let Some(op) = term.op() {
        out.write_char(op.as_char())?;
    }
    match term.kind() {
        TermType::DQuote => {
            out.write_char('"')?;
            for c in term.text().chars() {
                match c {
                    '"' => out.write_str("\\\"")?,
                    '\\' => out.write_str("\\\\")?,
                    '\n' => out.write_str("\\n")?,
                    '\t' => out.write_str("\\t")?,
                    c => out.write_char(c)?,
                }
            }
            out.write_char('"')
        }
        TermType::SQuote => write!(out, "'{}'", term.text()),
        _ => out.write_str(term.text()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::parse_str;

    #[test]
    fn test_nested_output() {
        let tree = parse_str(
            "t",
            "EXPORT { Export_Id = 1; Protocols = 3, 4; CLIENT { Clients = *; } }",
        )
        .unwrap();
        let expected = "\
EXPORT {
    Export_Id = 1;
    Protocols = 3, 4;
    CLIENT {
        Clients = *;
    }
}
";
        assert_eq!(TreePrinter::new().render(&tree), expected);
        assert_eq!(tree.to_string(), expected);
    }

    #[test]
    fn test_render_single_node() {
        let tree = parse_str("t", "A = 1;\nEXPORT { Path = /x; CLIENT { Clients = *; } }").unwrap();
        let export = tree.root().children().nth(1).unwrap();
        let client = export.children().nth(1).unwrap();
        let printer = TreePrinter::new().indent(2);
        assert_eq!(printer.render_node(client), "CLIENT {\n  Clients = *;\n}\n");
        assert_eq!(printer.render_node(tree.root()), printer.render(&tree));
    }

    #[test]
    fn test_quoted_strings_are_escaped() {
        let tree = parse_str("t", r#"A = "x \"y\"\tz"; B = 'raw\n';"#).unwrap();
        let text = tree.to_string();
        assert_eq!(text, "A = \"x \\\"y\\\"\\tz\";\nB = 'raw\\n';\n");
    }

    #[test]
    fn test_signs_and_empty_statements() {
        let tree = parse_str("t", "Low = -5; Mask = ~0; Nothing = ;").unwrap();
        assert_eq!(tree.to_string(), "Low = -5;\nMask = ~0;\nNothing =;\n");
    }

    #[test]
    fn test_printed_text_parses_again() {
        let src = "LOG { COMPONENTS { ALL = EVENT; } Facility { name = \"a b\"; } }";
        let tree = parse_str("t", src).unwrap();
        let again = parse_str("t", &tree.to_string()).unwrap();
        assert_eq!(again.to_string(), tree.to_string());
    }
}
