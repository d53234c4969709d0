//! Testing utilities for the perspective workspace
//!
//! Page fixtures, configurations, and tree assertions.

#![allow(missing_docs)]

use perspective_core::{ConversionMode, ValuationConfig};
use perspective_engine::{ContentTree, EngineConfig, EngineState, MemoryTree, NodeId};

pub const TEST_INCOME: f64 = 100_000.0;

pub fn time_config() -> ValuationConfig {
    ValuationConfig::new().with_income(TEST_INCOME)
}

pub fn item_config(name: &str, cost: f64) -> ValuationConfig {
    ValuationConfig::new()
        .with_mode(ConversionMode::ItemEquivalence)
        .with_income(TEST_INCOME)
        .with_item(name, cost)
}

pub fn life_config() -> ValuationConfig {
    ValuationConfig::new()
        .with_mode(ConversionMode::LifePercentage)
        .with_income(TEST_INCOME)
}

pub fn fresh_state() -> EngineState {
    EngineState::new(time_config())
}

pub fn fast_engine() -> EngineConfig {
    EngineConfig::new().with_debounce(std::time::Duration::from_millis(50))
}

/// `body > div > span "₹500"`; returns the tree, the div and the span
pub fn nested_price_page() -> (MemoryTree, NodeId, NodeId) {
    let mut tree = MemoryTree::new("body");
    let root = tree.root();
    let div = tree.append_element(root, "div").unwrap();
    let span = tree.append_text_element(div, "span", "₹500").unwrap();
    (tree, div, span)
}

/// One card per `(name, price)`: `div.card > h3 name + p > b price`
pub fn product_listing(products: &[(&str, &str)]) -> MemoryTree {
    let mut tree = MemoryTree::new("body");
    let root = tree.root();
    let list = tree.append_element(root, "ul").unwrap();
    for (name, price) in products {
        let card = tree.append_element(list, "li").unwrap();
        tree.append_text_element(card, "h3", *name).unwrap();
        let line = tree.append_element(card, "p").unwrap();
        tree.append_text_element(line, "b", *price).unwrap();
    }
    tree
}

/// A paragraph per text, each wrapped in `depth` extra `div`s
pub fn page_of_texts(texts: &[String], depth: usize) -> MemoryTree {
    let mut tree = MemoryTree::new("body");
    let root = tree.root();
    for text in texts {
        let mut parent = root;
        for _ in 0..depth {
            parent = tree.append_element(parent, "div").unwrap();
        }
        tree.append_text_element(parent, "p", text.as_str()).unwrap();
    }
    tree
}

/// Nodes carrying a marker child
pub fn owners(tree: &MemoryTree) -> Vec<NodeId> {
    let mut owners: Vec<NodeId> = tree
        .markers()
        .into_iter()
        .filter_map(|marker| tree.parent(marker))
        .collect();
    owners.dedup();
    owners
}

/// Panics if any owner is an ancestor of another
pub fn assert_no_nested_owners(tree: &MemoryTree) {
    let paths: Vec<_> = owners(tree).into_iter().map(|n| tree.path_of(n)).collect();
    for a in &paths {
        for b in &paths {
            assert!(
                !a.is_ancestor_of(b),
                "owner {a} is an ancestor of owner {b}\n{}",
                tree.outline()
            );
        }
    }
}

/// Panics unless every owner has exactly one marker
pub fn assert_one_marker_per_owner(tree: &MemoryTree) {
    for owner in owners(tree) {
        assert_eq!(
            tree.marker_children(owner).len(),
            1,
            "owner {} has several markers\n{}",
            tree.path_of(owner),
            tree.outline()
        );
    }
}
