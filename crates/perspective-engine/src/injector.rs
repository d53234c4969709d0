//! Annotation injector
//!
//! The only code that mutates the host tree. Markers are appended as the
//! trailing child of their owner and are removable as a unit.

use crate::error::TreeError;
use crate::state::{Annotation, EngineState};
use crate::tree::{ContentTree, NodeKind};
use indexmap::IndexMap;
use perspective_core::{detect, equivalence};
use tracing::{debug, warn};

/// Append a marker showing `display` to `owner`
///
/// Returns `Ok(false)` without touching the tree when the owner or any of its
/// descendants already carries a marker. The check runs immediately before
/// insertion.
///
/// # Errors
/// Returns error if the host rejects the insertion
pub fn attach<T: ContentTree>(
    tree: &mut T,
    owner: T::Node,
    display: &str,
) -> Result<bool, TreeError> {
    if tree.has_marker(owner) {
        return Ok(false);
    }
    tree.append_marker(owner, display)?;
    Ok(true)
}

/// Remove every marker in the tree; returns how many were removed
pub fn remove_markers<T: ContentTree>(tree: &mut T) -> usize {
    let mut removed = 0;
    for marker in tree.markers() {
        match tree.remove(marker) {
            Ok(()) => removed += 1,
            Err(err) => warn!(?marker, %err, "marker removal failed"),
        }
    }
    removed
}

/// Remove every marker and empty the annotated and processed sets
pub fn clear<T: ContentTree>(tree: &mut T, state: &mut EngineState) -> usize {
    let removed = remove_markers(tree);
    state.reset();
    debug!(removed, "annotations cleared");
    removed
}

/// Bring the annotated set back in line with the markers in the tree
///
/// For every owner found in the tree, the first marker survives when the
/// owner's content still yields an amount whose display equals the marker's
/// text. Duplicates and stale markers are removed, and their owners'
/// fingerprints are released so the changed node can be annotated again.
/// Owners whose markers the host dropped are forgotten, but their
/// fingerprints are kept. Returns the number of markers removed.
pub fn reconcile<T: ContentTree>(tree: &mut T, state: &mut EngineState) -> usize {
    let mut by_owner: IndexMap<T::Node, Vec<T::Node>> = IndexMap::new();
    for marker in tree.markers() {
        if let Some(owner) = tree.parent(marker) {
            by_owner.entry(owner).or_default().push(marker);
        }
    }

    let mut surviving = IndexMap::new();
    let mut doomed = Vec::new();
    let mut released = Vec::new();

    for (owner, markers) in by_owner {
        let path = tree.path_of(owner);
        let expected = detect(&tree.content_text(owner))
            .map(|price| (price.amount, equivalence(price.amount, state.config())));

        let keep = match (&expected, markers.first()) {
            (Some((_, display)), Some(first)) => {
                matches!(tree.kind(*first), Some(NodeKind::Marker(text)) if text == display.as_str())
            }
            _ => false,
        };

        if keep {
            doomed.extend(markers.iter().skip(1).copied());
            if let Some((amount, display_text)) = expected {
                surviving.insert(
                    path.clone(),
                    Annotation {
                        owner_path: path,
                        display_text,
                        amount,
                    },
                );
            }
        } else {
            debug!(%path, "stale annotation");
            doomed.extend(markers);
            released.push(path);
        }
    }

    let mut removed = 0;
    for marker in doomed {
        match tree.remove(marker) {
            Ok(()) => removed += 1,
            Err(err) => warn!(?marker, %err, "marker removal failed"),
        }
    }
    for path in &released {
        state.release(path);
    }
    state.replace_annotated(surviving);
    removed
}
