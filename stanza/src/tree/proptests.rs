//! Property-based tests for printing and re-parsing trees.

use super::{NodeRef, ParseTree, TreePrinter};
use crate::builder::parse_str;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Item {
    Stmt(String, Vec<String>),
    Block(String, Vec<Item>),
}

// Names always contain an underscore so they never classify as a keyword,
// number or address.
fn name_strategy() -> impl Strategy<Value = String> {
    "[A-Z][a-z0-9]{0,6}_[A-Za-z]{1,4}"
}

fn dquote_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ,;{}#=\"\\\\\t]{0,12}".prop_map(|s| {
        let mut out = String::from("\"");
        for c in s.chars() {
            match c {
                '"' => out.push_str("\\\""),
                '\\' => out.push_str("\\\\"),
                '\t' => out.push_str("\\t"),
                c => out.push(c),
            }
        }
        out.push('"');
        out
    })
}

fn value_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        (0u64..1_000_000).prop_map(|n| n.to_string()),
        (0u32..0xffff).prop_map(|n| format!("0x{n:x}")),
        (1i64..10_000).prop_map(|n| format!("-{n}")),
        (0u16..4096).prop_map(|n| format!("~{n}")),
        "[a-z][a-z_]{2,8}[0-9]",
        "(/[a-z]{1,5}){1,4}",
        "[0-9]{1,3}\\.[0-9]{1,3}\\.[0-9]{1,3}\\.[0-9]{1,3}",
        dquote_strategy(),
        "'[a-zA-Z0-9 ,;{}#=\"]{0,10}'",
    ]
}

fn item_strategy() -> impl Strategy<Value = Item> {
    let stmt = (name_strategy(), prop::collection::vec(value_strategy(), 0..4))
        .prop_map(|(name, values)| Item::Stmt(name, values));
    stmt.prop_recursive(4, 48, 6, |inner| {
        (name_strategy(), prop::collection::vec(inner, 0..6))
            .prop_map(|(name, children)| Item::Block(name, children))
    })
}

fn render_source(items: &[Item], out: &mut String) {
    for item in items {
        match item {
            Item::Stmt(name, values) => {
                out.push_str(name);
                out.push_str(" = ");
                out.push_str(&values.join(" , "));
                out.push_str(";\n");
            }
            Item::Block(name, children) => {
                out.push_str(name);
                out.push_str("{");
                render_source(children, out);
                out.push_str("}\n");
            }
        }
    }
}

fn shape(node: NodeRef<'_>, depth: usize, out: &mut Vec<String>) {
    for child in node.children() {
        if child.is_block() {
            out.push(format!("{depth} block {}", child.name()));
            shape(child, depth + 1, out);
        } else {
            let terms: Vec<String> = child
                .terms()
                .iter()
                .map(|t| format!("{:?}:{:?}:{}", t.kind(), t.op(), t.text()))
                .collect();
            out.push(format!("{depth} stmt {} [{}]", child.name(), terms.join("|")));
        }
    }
}

fn tree_shape(tree: &ParseTree) -> Vec<String> {
    let mut out = Vec::new();
    shape(tree.root(), 0, &mut out);
    out
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 512,
        .. ProptestConfig::default()
    })]

    // Printing and re-parsing keeps names, kinds and values
    #[test]
    fn print_parse_round_trip(items in prop::collection::vec(item_strategy(), 0..6)) {
        let mut source = String::new();
        render_source(&items, &mut source);
        let tree = parse_str("gen.conf", &source).unwrap();

        let printed = tree.to_string();
        let reparsed = parse_str("printed.conf", &printed).unwrap();
        prop_assert_eq!(tree_shape(&tree), tree_shape(&reparsed));

        // Printing is stable once the text is in printer form
        prop_assert_eq!(printed, reparsed.to_string());
    }

    // Indentation never changes the parsed shape
    #[test]
    fn indent_is_cosmetic(items in prop::collection::vec(item_strategy(), 1..4), width in 0usize..8) {
        let mut source = String::new();
        render_source(&items, &mut source);
        let tree = parse_str("gen.conf", &source).unwrap();
        let printed = TreePrinter::new().indent(width).render(&tree);
        let reparsed = parse_str("printed.conf", &printed).unwrap();
        prop_assert_eq!(tree_shape(&tree), tree_shape(&reparsed));
    }
}
