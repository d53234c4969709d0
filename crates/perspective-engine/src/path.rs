//! Structural paths into the content tree
//!
//! A [`NodePath`] is the sequence of sibling indices leading from the tree
//! root to a node. It doubles as the node's fingerprint across scans: markers
//! are only ever appended as trailing children, so annotating a node never
//! shifts the path of any existing content node.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Sibling-index path from the root
///
/// # Examples
/// - `[]` → the root, displayed as an empty string
/// - `[0, 2, 1]` → `0.2.1`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    /// Create path from sibling indices
    #[inline]
    #[must_use]
    pub fn new(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    /// Empty path (root)
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Sibling indices from the root
    #[inline]
    #[must_use]
    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    /// Distance from the root
    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Check if path is the root
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Parent path (if not root)
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.0
            .split_last()
            .map(|(_, init)| Self(init.to_vec()))
    }

    /// Path of the `index`-th child
    #[inline]
    #[must_use]
    pub fn child(&self, index: usize) -> Self {
        let mut next = self.0.clone();
        next.push(index);
        Self(next)
    }

    /// Index among siblings (if not root)
    #[inline]
    #[must_use]
    pub fn sibling_index(&self) -> Option<usize> {
        self.0.last().copied()
    }

    /// Check if this path is a prefix of another (or equal to it)
    #[inline]
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        other.0.starts_with(&self.0)
    }

    /// Check if this path is a strict ancestor of another
    #[inline]
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        self.0.len() < other.0.len() && self.is_prefix_of(other)
    }

    /// Ancestors from the nearest parent up to the root
    pub fn ancestors(&self) -> impl Iterator<Item = NodePath> + '_ {
        (0..self.0.len()).rev().map(|len| Self(self.0[..len].to_vec()))
    }
}

impl Display for NodePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for index in &self.0 {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{index}")?;
            first = false;
        }
        Ok(())
    }
}

impl FromStr for NodePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::root());
        }

        s.split('.')
            .map(|seg| {
                if seg.is_empty() {
                    Err(PathError::EmptySegment)
                } else {
                    seg.parse::<usize>()
                        .map_err(|_| PathError::InvalidSegment(seg.to_string()))
                }
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

impl From<Vec<usize>> for NodePath {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

/// Errors parsing a dotted path
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Empty segment in path
    #[error("path contains empty segment")]
    EmptySegment,

    /// Segment is not a sibling index
    #[error("invalid segment: {0} (must be a sibling index)")]
    InvalidSegment(String),
}
