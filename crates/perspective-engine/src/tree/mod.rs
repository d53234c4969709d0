//! Host content tree interface
//!
//! The engine never owns the content it annotates. A host exposes its tree
//! through [`ContentTree`]: traversal, node kinds, and the two mutations the
//! engine is allowed to request (append a marker, remove a node). Everything
//! else (text projections, structural paths, marker lookups) is derived here.

pub mod memory;

use crate::error::TreeError;
use crate::path::NodePath;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;

pub use memory::{DocumentNode, MemoryTree, NodeId};

/// Element tags whose content is never rendered as text
pub const NON_RENDERABLE_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// What a node is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind<'a> {
    /// Container with a tag name
    Element {
        /// Tag name as the host reports it
        tag: &'a str,
    },
    /// Text leaf
    Text(&'a str),
    /// Annotation marker previously inserted by the engine
    Marker(&'a str),
}

/// Tree provider implemented by the host
pub trait ContentTree {
    /// Opaque node handle
    type Node: Copy + Eq + Hash + Debug;

    /// Tree root
    fn root(&self) -> Self::Node;

    /// Parent of a node (`None` for the root or a stale handle)
    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    /// Children in document order
    fn children(&self, node: Self::Node) -> Vec<Self::Node>;

    /// Kind of a node (`None` for a stale handle)
    fn kind(&self, node: Self::Node) -> Option<NodeKind<'_>>;

    /// Append a marker as the trailing child of `owner`
    ///
    /// # Errors
    /// Returns error if `owner` is stale or not an element
    fn append_marker(&mut self, owner: Self::Node, text: &str) -> Result<Self::Node, TreeError>;

    /// Detach a node and its subtree
    ///
    /// # Errors
    /// Returns error if `node` is stale or the root
    fn remove(&mut self, node: Self::Node) -> Result<(), TreeError>;

    /// Structural path of a node
    fn path_of(&self, node: Self::Node) -> NodePath {
        let mut indices = Vec::new();
        let mut current = node;
        while let Some(parent) = self.parent(current) {
            let index = self
                .children(parent)
                .iter()
                .position(|child| *child == current)
                .unwrap_or_default();
            indices.push(index);
            current = parent;
        }
        indices.reverse();
        NodePath::new(indices)
    }

    /// Node at a structural path, if any
    fn resolve(&self, path: &NodePath) -> Option<Self::Node> {
        path.indices()
            .iter()
            .try_fold(self.root(), |node, index| {
                self.children(node).get(*index).copied()
            })
    }

    /// Whether the node is a marker
    fn is_marker(&self, node: Self::Node) -> bool {
        matches!(self.kind(node), Some(NodeKind::Marker(_)))
    }

    /// Whether the node is an element whose content renders
    fn is_renderable_element(&self, node: Self::Node) -> bool {
        match self.kind(node) {
            Some(NodeKind::Element { tag }) => !NON_RENDERABLE_TAGS
                .iter()
                .any(|skip| tag.eq_ignore_ascii_case(skip)),
            _ => false,
        }
    }

    /// Text of all rendered descendant text leaves, markers excluded
    fn content_text(&self, node: Self::Node) -> String {
        let mut out = String::new();
        collect_text(self, node, false, &mut out);
        out
    }

    /// Text as displayed, markers included
    fn rendered_text(&self, node: Self::Node) -> String {
        let mut out = String::new();
        collect_text(self, node, true, &mut out);
        out
    }

    /// Whether the node or any descendant is a marker
    fn has_marker(&self, node: Self::Node) -> bool {
        if self.is_marker(node) {
            return true;
        }
        self.children(node)
            .into_iter()
            .any(|child| self.has_marker(child))
    }

    /// Direct marker children of a node
    fn marker_children(&self, node: Self::Node) -> Vec<Self::Node> {
        self.children(node)
            .into_iter()
            .filter(|child| self.is_marker(*child))
            .collect()
    }

    /// Every marker in the tree, in document order
    fn markers(&self) -> Vec<Self::Node> {
        let mut found = Vec::new();
        let mut stack = vec![self.root()];
        while let Some(node) = stack.pop() {
            if self.is_marker(node) {
                found.push(node);
                continue;
            }
            let children = self.children(node);
            stack.extend(children.into_iter().rev());
        }
        found
    }
}

fn collect_text<T: ContentTree + ?Sized>(
    tree: &T,
    node: T::Node,
    include_markers: bool,
    out: &mut String,
) {
    match tree.kind(node) {
        Some(NodeKind::Text(text)) => out.push_str(text),
        Some(NodeKind::Marker(text)) => {
            if include_markers {
                out.push_str(text);
            }
        }
        Some(NodeKind::Element { .. }) => {
            if !tree.is_renderable_element(node) {
                return;
            }
            for child in tree.children(node) {
                collect_text(tree, child, include_markers, out);
            }
        }
        None => {}
    }
}

/// Kind of structural change reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    /// Children added or removed
    ChildList,
    /// Text of a leaf changed
    CharacterData,
}

/// Mutation notification delivered by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationRecord {
    /// Node whose children or text changed
    pub target: NodePath,
    /// Change kind
    pub kind: MutationKind,
    /// Every added or removed node was an annotation marker
    ///
    /// Hosts that observe their whole tree see the engine's own insertions;
    /// flagging them lets the controller ignore its own echo.
    #[serde(default)]
    pub markers_only: bool,
}

impl MutationRecord {
    /// Children of `target` changed
    #[inline]
    #[must_use]
    pub fn child_list(target: NodePath) -> Self {
        Self {
            target,
            kind: MutationKind::ChildList,
            markers_only: false,
        }
    }

    /// Text below `target` changed
    #[inline]
    #[must_use]
    pub fn character_data(target: NodePath) -> Self {
        Self {
            target,
            kind: MutationKind::CharacterData,
            markers_only: false,
        }
    }

    /// Marker insertion or removal echoed back by the host
    #[inline]
    #[must_use]
    pub fn marker_echo(target: NodePath) -> Self {
        Self {
            target,
            kind: MutationKind::ChildList,
            markers_only: true,
        }
    }
}
