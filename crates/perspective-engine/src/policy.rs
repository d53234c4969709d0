//! Deduplication and placement policy
//!
//! Decides, candidate by candidate (deepest first), which node owns the
//! annotation for a detected amount. An ancestor that already owns an
//! annotation and whose content contains the candidate's content speaks for
//! the candidate too.
//!
//! The containment test compares text projections, not structure. Two
//! unrelated amounts can be suppressed when one owner's text happens to
//! contain the other's. That loss of recall is accepted in exchange for never
//! stacking annotations on nested nodes.

use crate::matcher::Candidate;
use crate::path::NodePath;
use crate::state::{EngineState, Fingerprint};
use crate::tree::ContentTree;

/// Outcome of placing one candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Candidate should own the annotation; the fingerprint is recorded once
    /// the marker is in place
    Owner,
    /// An earlier decision already handled this node and amount
    AlreadyProcessed,
    /// An owning ancestor's content already covers this candidate
    SubsumedBy(NodePath),
}

/// Place a candidate carrying `amount`
pub fn place<T: ContentTree>(
    tree: &T,
    state: &mut EngineState,
    candidate: &Candidate<T::Node>,
    amount: f64,
    max_ancestor_depth: usize,
) -> Placement {
    let fingerprint = Fingerprint::new(candidate.path.clone(), amount);
    if state.is_processed(&fingerprint) {
        return Placement::AlreadyProcessed;
    }

    if let Some(owner) = subsuming_ancestor(tree, state, candidate, max_ancestor_depth) {
        return Placement::SubsumedBy(owner);
    }

    Placement::Owner
}

/// Nearest owning ancestor whose content contains the candidate's content
///
/// Hitting the depth bound counts as "no conflict": producing an annotation
/// is preferred over silently losing one.
fn subsuming_ancestor<T: ContentTree>(
    tree: &T,
    state: &EngineState,
    candidate: &Candidate<T::Node>,
    max_depth: usize,
) -> Option<NodePath> {
    let mut node = candidate.node;
    let mut path = candidate.path.clone();
    for _ in 0..max_depth {
        let parent = tree.parent(node)?;
        path = path.parent()?;
        if state.is_owner(&path) && tree.content_text(parent).contains(&candidate.text) {
            return Some(path);
        }
        node = parent;
    }
    tracing::debug!(path = %candidate.path, max_depth, "ancestor walk bound reached");
    None
}
