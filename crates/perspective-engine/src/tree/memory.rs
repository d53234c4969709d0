//! In-memory content tree
//!
//! Arena-backed [`ContentTree`] used by the CLI and the test suites. Pages are
//! loaded from a small JSON document format:
//!
//! ```json
//! { "tag": "body", "children": [
//!     { "tag": "p", "children": [ { "text": "Only ₹499" } ] }
//! ] }
//! ```

use super::{ContentTree, NodeKind};
use crate::error::TreeError;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Arena index of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    /// Raw arena index
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
enum NodeData {
    Element(String),
    Text(String),
    Marker(String),
}

#[derive(Debug, Clone)]
struct Slot {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Serializable page document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentNode {
    /// Text leaf
    Text {
        /// Leaf content
        text: String,
    },
    /// Annotation marker (only present in exported documents)
    Marker {
        /// Display text
        marker: String,
    },
    /// Element with children
    Element {
        /// Tag name
        tag: String,
        /// Children in order
        #[serde(default)]
        children: Vec<DocumentNode>,
    },
}

impl DocumentNode {
    /// Text leaf
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Element with children
    #[must_use]
    pub fn element(tag: impl Into<String>, children: Vec<DocumentNode>) -> Self {
        Self::Element {
            tag: tag.into(),
            children,
        }
    }
}

/// Arena-backed content tree
#[derive(Debug, Clone)]
pub struct MemoryTree {
    slots: Vec<Option<Slot>>,
    root: NodeId,
}

impl MemoryTree {
    /// Tree with a single root element
    #[must_use]
    pub fn new(root_tag: impl Into<String>) -> Self {
        Self {
            slots: vec![Some(Slot {
                data: NodeData::Element(root_tag.into()),
                parent: None,
                children: Vec::new(),
            })],
            root: NodeId(0),
        }
    }

    /// Build a tree from a document; a bare text document is wrapped in `body`
    #[must_use]
    pub fn from_document(document: &DocumentNode) -> Self {
        match document {
            DocumentNode::Element { tag, children } => {
                let mut tree = Self::new(tag.clone());
                let root = tree.root;
                for child in children {
                    tree.load(root, child);
                }
                tree
            }
            leaf => {
                let mut tree = Self::new("body");
                let root = tree.root;
                tree.load(root, leaf);
                tree
            }
        }
    }

    fn load(&mut self, parent: NodeId, document: &DocumentNode) {
        let data = match document {
            DocumentNode::Text { text } => NodeData::Text(text.clone()),
            DocumentNode::Marker { marker } => NodeData::Marker(marker.clone()),
            DocumentNode::Element { tag, .. } => NodeData::Element(tag.clone()),
        };
        let id = self.push(parent, None, data);
        if let DocumentNode::Element { children, .. } = document {
            for child in children {
                self.load(id, child);
            }
        }
    }

    /// Export the tree, markers included
    #[must_use]
    pub fn to_document(&self) -> DocumentNode {
        self.export(self.root)
            .unwrap_or_else(|| DocumentNode::element("body", Vec::new()))
    }

    fn export(&self, id: NodeId) -> Option<DocumentNode> {
        let slot = self.slot(id).ok()?;
        Some(match &slot.data {
            NodeData::Text(text) => DocumentNode::text(text.clone()),
            NodeData::Marker(marker) => DocumentNode::Marker {
                marker: marker.clone(),
            },
            NodeData::Element(tag) => DocumentNode::element(
                tag.clone(),
                slot.children.iter().filter_map(|c| self.export(*c)).collect(),
            ),
        })
    }

    fn slot(&self, id: NodeId) -> Result<&Slot, TreeError> {
        self.slots
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or(TreeError::StaleNode(id.0))
    }

    fn slot_mut(&mut self, id: NodeId) -> Result<&mut Slot, TreeError> {
        self.slots
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(TreeError::StaleNode(id.0))
    }

    fn ensure_element(&self, id: NodeId) -> Result<(), TreeError> {
        match self.slot(id)?.data {
            NodeData::Element(_) => Ok(()),
            _ => Err(TreeError::NotAnElement(id.0)),
        }
    }

    fn push(&mut self, parent: NodeId, index: Option<usize>, data: NodeData) -> NodeId {
        let id = NodeId(self.slots.len());
        self.slots.push(Some(Slot {
            data,
            parent: Some(parent),
            children: Vec::new(),
        }));
        if let Ok(slot) = self.slot_mut(parent) {
            match index {
                Some(at) if at <= slot.children.len() => slot.children.insert(at, id),
                _ => slot.children.push(id),
            }
        }
        id
    }

    /// Append an element child
    ///
    /// # Errors
    /// Returns error if `parent` is stale or not an element
    pub fn append_element(
        &mut self,
        parent: NodeId,
        tag: impl Into<String>,
    ) -> Result<NodeId, TreeError> {
        self.ensure_element(parent)?;
        Ok(self.push(parent, None, NodeData::Element(tag.into())))
    }

    /// Insert an element child at `index` (clamped to the end)
    ///
    /// # Errors
    /// Returns error if `parent` is stale or not an element
    pub fn insert_element(
        &mut self,
        parent: NodeId,
        index: usize,
        tag: impl Into<String>,
    ) -> Result<NodeId, TreeError> {
        self.ensure_element(parent)?;
        Ok(self.push(parent, Some(index), NodeData::Element(tag.into())))
    }

    /// Append a text leaf
    ///
    /// # Errors
    /// Returns error if `parent` is stale or not an element
    pub fn append_text(
        &mut self,
        parent: NodeId,
        text: impl Into<String>,
    ) -> Result<NodeId, TreeError> {
        self.ensure_element(parent)?;
        Ok(self.push(parent, None, NodeData::Text(text.into())))
    }

    /// Append an element holding a single text leaf
    ///
    /// # Errors
    /// Returns error if `parent` is stale or not an element
    pub fn append_text_element(
        &mut self,
        parent: NodeId,
        tag: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<NodeId, TreeError> {
        let element = self.append_element(parent, tag)?;
        self.append_text(element, text)?;
        Ok(element)
    }

    /// Replace the content of a text leaf
    ///
    /// # Errors
    /// Returns error if `node` is stale or not a text leaf
    pub fn set_text(&mut self, node: NodeId, text: impl Into<String>) -> Result<(), TreeError> {
        let slot = self.slot_mut(node)?;
        match &mut slot.data {
            NodeData::Text(current) => {
                *current = text.into();
                Ok(())
            }
            _ => Err(TreeError::NotText(node.0)),
        }
    }

    /// Live nodes, markers included
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Indented outline, markers shown in brackets
    #[must_use]
    pub fn outline(&self) -> String {
        let mut out = String::new();
        self.write_outline(self.root, 0, &mut out);
        out
    }

    fn write_outline(&self, id: NodeId, depth: usize, out: &mut String) {
        let Ok(slot) = self.slot(id) else {
            return;
        };
        let indent = "  ".repeat(depth);
        match &slot.data {
            NodeData::Element(tag) => {
                let _ = writeln!(out, "{indent}<{tag}>");
                for child in &slot.children {
                    self.write_outline(*child, depth + 1, out);
                }
            }
            NodeData::Text(text) => {
                let _ = writeln!(out, "{indent}{text:?}");
            }
            NodeData::Marker(marker) => {
                let _ = writeln!(out, "{indent}[{marker}]");
            }
        }
    }
}

impl Default for MemoryTree {
    fn default() -> Self {
        Self::new("body")
    }
}

impl ContentTree for MemoryTree {
    type Node = NodeId;

    fn root(&self) -> NodeId {
        self.root
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.slot(node).ok()?.parent
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.slot(node)
            .map(|slot| slot.children.clone())
            .unwrap_or_default()
    }

    fn kind(&self, node: NodeId) -> Option<NodeKind<'_>> {
        let slot = self.slot(node).ok()?;
        Some(match &slot.data {
            NodeData::Element(tag) => NodeKind::Element { tag },
            NodeData::Text(text) => NodeKind::Text(text),
            NodeData::Marker(text) => NodeKind::Marker(text),
        })
    }

    fn append_marker(&mut self, owner: NodeId, text: &str) -> Result<NodeId, TreeError> {
        self.ensure_element(owner)?;
        Ok(self.push(owner, None, NodeData::Marker(text.to_string())))
    }

    fn remove(&mut self, node: NodeId) -> Result<(), TreeError> {
        if node == self.root {
            return Err(TreeError::RootRemoval);
        }
        let parent = self.slot(node)?.parent;
        if let Some(parent) = parent {
            if let Ok(slot) = self.slot_mut(parent) {
                slot.children.retain(|child| *child != node);
            }
        }

        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(slot) = self.slots.get_mut(id.0).and_then(Option::take) {
                stack.extend(slot.children);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::NodePath;

    fn sample() -> (MemoryTree, NodeId, NodeId) {
        let mut tree = MemoryTree::new("body");
        let root = tree.root();
        let div = tree.append_element(root, "div").unwrap();
        tree.append_text(div, "Price: ").unwrap();
        let span = tree.append_text_element(div, "span", "₹500").unwrap();
        (tree, div, span)
    }

    #[test]
    fn content_text_concatenates_leaves() {
        let (tree, div, span) = sample();
        assert_eq!(tree.content_text(div), "Price: ₹500");
        assert_eq!(tree.content_text(span), "₹500");
    }

    #[test]
    fn markers_are_excluded_from_content_text() {
        let (mut tree, div, span) = sample();
        tree.append_marker(span, "⏰ 45 mins").unwrap();
        assert_eq!(tree.content_text(div), "Price: ₹500");
        assert_eq!(tree.rendered_text(div), "Price: ₹500⏰ 45 mins");
        assert!(tree.has_marker(div));
        assert_eq!(tree.markers().len(), 1);
    }

    #[test]
    fn script_content_is_not_rendered() {
        let mut tree = MemoryTree::new("body");
        let root = tree.root();
        tree.append_text_element(root, "SCRIPT", "var p = '₹9'").unwrap();
        tree.append_text_element(root, "p", "hello").unwrap();
        assert_eq!(tree.content_text(root), "hello");
    }

    #[test]
    fn paths_resolve_both_ways() {
        let (tree, div, span) = sample();
        assert_eq!(tree.path_of(div), NodePath::new(vec![0]));
        assert_eq!(tree.path_of(span), NodePath::new(vec![0, 1]));
        assert_eq!(tree.resolve(&NodePath::new(vec![0, 1])), Some(span));
        assert_eq!(tree.resolve(&NodePath::new(vec![0, 7])), None);
        assert_eq!(tree.resolve(&NodePath::root()), Some(tree.root()));
    }

    #[test]
    fn remove_detaches_subtree() {
        let (mut tree, div, span) = sample();
        let before = tree.node_count();
        tree.remove(span).unwrap();
        assert_eq!(tree.node_count(), before - 2);
        assert_eq!(tree.content_text(div), "Price: ");
        assert!(tree.kind(span).is_none());
        assert_eq!(tree.remove(span), Err(TreeError::StaleNode(span.index())));
        assert_eq!(tree.remove(tree.root()), Err(TreeError::RootRemoval));
    }

    #[test]
    fn markers_only_attach_to_elements() {
        let mut tree = MemoryTree::new("body");
        let root = tree.root();
        let leaf = tree.append_text(root, "₹5").unwrap();
        assert_eq!(
            tree.append_marker(leaf, "x"),
            Err(TreeError::NotAnElement(leaf.index()))
        );
    }

    #[test]
    fn insert_element_shifts_later_siblings() {
        let (mut tree, div, _) = sample();
        let root = tree.root();
        tree.insert_element(root, 0, "header").unwrap();
        assert_eq!(tree.path_of(div), NodePath::new(vec![1]));
    }

    #[test]
    fn document_round_trip() {
        let json = r#"{"tag":"body","children":[{"tag":"p","children":[{"text":"Only ₹499"}]}]}"#;
        let document: DocumentNode = serde_json::from_str(json).unwrap();
        let mut tree = MemoryTree::from_document(&document);
        let p = tree.resolve(&NodePath::new(vec![0])).unwrap();
        tree.append_marker(p, "⏰ 5 mins").unwrap();

        let exported = tree.to_document();
        let expected = DocumentNode::element(
            "body",
            vec![DocumentNode::element(
                "p",
                vec![
                    DocumentNode::text("Only ₹499"),
                    DocumentNode::Marker {
                        marker: "⏰ 5 mins".to_string(),
                    },
                ],
            )],
        );
        assert_eq!(exported, expected);
    }

    #[test]
    fn outline_shows_markers() {
        let (mut tree, _, span) = sample();
        tree.append_marker(span, "⏰ 45 mins").unwrap();
        let outline = tree.outline();
        assert!(outline.contains("<span>"));
        assert!(outline.contains("[⏰ 45 mins]"));
    }
}
