//! Tree matcher
//!
//! Walks the content tree once and returns the element nodes whose content
//! looks like it carries a price, deepest first. Leaves are evaluated before
//! their ancestors so the placement policy can reject an ancestor once a
//! descendant has already claimed the amount.

use crate::path::NodePath;
use crate::state::Annotation;
use crate::tree::{ContentTree, NodeKind};
use indexmap::IndexMap;
use perspective_core::is_price_like;

/// Node that may own an annotation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate<N> {
    /// Node handle
    pub node: N,
    /// Structural path
    pub path: NodePath,
    /// Content projection, markers excluded
    pub text: String,
}

impl<N> Candidate<N> {
    /// Distance from the root
    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.path.depth()
    }
}

/// Candidate owners, deepest first, ties in document order
///
/// Skipped: non-renderable subtrees (`script`, `style`, ...), marker nodes,
/// nodes already in `annotated`, nodes with a marker anywhere in their
/// subtree, and nodes whose text lacks a currency cue or a digit.
pub fn find_candidates<T: ContentTree>(
    tree: &T,
    annotated: &IndexMap<NodePath, Annotation>,
) -> Vec<Candidate<T::Node>> {
    let mut found = Vec::new();
    visit(tree, tree.root(), NodePath::root(), annotated, &mut found);
    // Post-order push keeps same-depth nodes in document order; the sort is stable.
    found.sort_by(|a, b| b.depth().cmp(&a.depth()));
    found
}

/// Returns the node's content text and whether its subtree holds a marker.
fn visit<T: ContentTree>(
    tree: &T,
    node: T::Node,
    path: NodePath,
    annotated: &IndexMap<NodePath, Annotation>,
    found: &mut Vec<Candidate<T::Node>>,
) -> (String, bool) {
    match tree.kind(node) {
        Some(NodeKind::Text(text)) => (text.to_string(), false),
        Some(NodeKind::Marker(_)) => (String::new(), true),
        Some(NodeKind::Element { .. }) if tree.is_renderable_element(node) => {
            let mut text = String::new();
            let mut marked = false;
            for (index, child) in tree.children(node).into_iter().enumerate() {
                let (child_text, child_marked) =
                    visit(tree, child, path.child(index), annotated, found);
                text.push_str(&child_text);
                marked |= child_marked;
            }
            if !marked && !annotated.contains_key(&path) && is_price_like(&text) {
                found.push(Candidate {
                    node,
                    path,
                    text: text.clone(),
                });
            }
            (text, marked)
        }
        _ => (String::new(), false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::MemoryTree;

    #[test]
    fn deepest_candidates_come_first() {
        let mut tree = MemoryTree::new("body");
        let root = tree.root();
        let card = tree.append_element(root, "div").unwrap();
        tree.append_text_element(card, "h2", "Headphones").unwrap();
        let price = tree.append_element(card, "p").unwrap();
        let amount = tree.append_text_element(price, "b", "₹2,999").unwrap();

        let candidates = find_candidates(&tree, &IndexMap::new());
        let nodes: Vec<_> = candidates.iter().map(|c| c.node).collect();
        assert_eq!(nodes, vec![amount, price, card, root]);
        assert_eq!(candidates[0].text, "₹2,999");
        assert_eq!(candidates[2].text, "Headphones₹2,999");
    }

    #[test]
    fn same_depth_keeps_document_order() {
        let mut tree = MemoryTree::new("body");
        let root = tree.root();
        let first = tree.append_text_element(root, "li", "₹100").unwrap();
        let second = tree.append_text_element(root, "li", "₹200").unwrap();

        let candidates = find_candidates(&tree, &IndexMap::new());
        assert_eq!(candidates[0].node, first);
        assert_eq!(candidates[1].node, second);
    }

    #[test]
    fn skips_scripts_and_priceless_text() {
        let mut tree = MemoryTree::new("body");
        let root = tree.root();
        tree.append_text_element(root, "script", "price = '₹99'").unwrap();
        tree.append_text_element(root, "style", ".rs1 { width: 10px }").unwrap();
        tree.append_text_element(root, "p", "Chapter 12").unwrap();

        assert!(find_candidates(&tree, &IndexMap::new()).is_empty());
    }

    #[test]
    fn skips_nodes_bearing_markers() {
        let mut tree = MemoryTree::new("body");
        let root = tree.root();
        let div = tree.append_element(root, "div").unwrap();
        let span = tree.append_text_element(div, "span", "₹500").unwrap();
        tree.append_marker(span, "⏰ 45 mins").unwrap();
        let other = tree.append_text_element(root, "p", "₹80").unwrap();

        let candidates = find_candidates(&tree, &IndexMap::new());
        let nodes: Vec<_> = candidates.iter().map(|c| c.node).collect();
        assert_eq!(nodes, vec![other]);
    }

    #[test]
    fn skips_already_annotated_paths() {
        let mut tree = MemoryTree::new("body");
        let root = tree.root();
        tree.append_text_element(root, "p", "₹80").unwrap();

        let mut annotated = IndexMap::new();
        let path = NodePath::new(vec![0]);
        annotated.insert(
            path.clone(),
            Annotation {
                owner_path: path,
                display_text: "⏰ 7 mins".to_string(),
                amount: 80.0,
            },
        );
        let candidates = find_candidates(&tree, &annotated);
        assert!(candidates.iter().all(|c| c.path != NodePath::new(vec![0])));
    }
}
