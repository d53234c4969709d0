//! One full detection and annotation pass
//!
//! reconcile → match → detect → place → valuate → attach
//!
//! A fingerprint is recorded only for a candidate that received a marker.

use crate::config::EngineConfig;
use crate::injector;
use crate::matcher::find_candidates;
use crate::policy::{place, Placement};
use crate::state::{Annotation, EngineState, Fingerprint, PriceToken};
use crate::tree::ContentTree;
use perspective_core::{detect, equivalence};
use serde::Serialize;
use tracing::{debug, info, warn};

/// What a pass did
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PassReport {
    /// Candidates the matcher produced
    pub candidates: usize,
    /// Markers inserted
    pub injected: usize,
    /// Tokens attributed to the new owners, in insertion order
    pub tokens: Vec<PriceToken>,
    /// Candidates whose fingerprint was already recorded
    pub already_processed: usize,
    /// Candidates covered by an owning ancestor
    pub subsumed: usize,
    /// Candidates whose text yielded no valid amount
    pub unpriced: usize,
    /// Owners refused by the injector (marker already in the subtree, or host error)
    pub rejected_by_injector: usize,
    /// Stale or duplicate markers removed before matching
    pub stale_removed: usize,
}

impl PassReport {
    /// Whether the pass changed the tree
    #[inline]
    #[must_use]
    pub fn changed_tree(&self) -> bool {
        self.injected > 0 || self.stale_removed > 0
    }
}

/// Run one pass over the whole tree
pub fn run_pass<T: ContentTree>(
    tree: &mut T,
    state: &mut EngineState,
    config: &EngineConfig,
) -> PassReport {
    let mut report = PassReport {
        stale_removed: injector::reconcile(tree, state),
        ..PassReport::default()
    };

    let candidates = find_candidates(tree, state.annotated());
    report.candidates = candidates.len();

    for candidate in candidates {
        let Some(price) = detect(&candidate.text) else {
            report.unpriced += 1;
            continue;
        };

        match place(tree, state, &candidate, price.amount, config.max_ancestor_depth) {
            Placement::AlreadyProcessed => report.already_processed += 1,
            Placement::SubsumedBy(owner) => {
                debug!(path = %candidate.path, %owner, "subsumed by ancestor");
                report.subsumed += 1;
            }
            Placement::Owner => {
                let display_text = equivalence(price.amount, state.config());
                match injector::attach(tree, candidate.node, &display_text) {
                    Ok(true) => {
                        debug!(
                            path = %candidate.path,
                            amount = price.amount,
                            display = %display_text,
                            "annotated"
                        );
                        state.mark_processed(Fingerprint::new(
                            candidate.path.clone(),
                            price.amount,
                        ));
                        state.record(Annotation {
                            owner_path: candidate.path.clone(),
                            display_text,
                            amount: price.amount,
                        });
                        report.tokens.push(PriceToken {
                            raw: price.raw,
                            amount: price.amount,
                            source_path: candidate.path,
                        });
                        report.injected += 1;
                    }
                    Ok(false) => report.rejected_by_injector += 1,
                    Err(err) => {
                        warn!(path = %candidate.path, %err, "marker insertion failed");
                        report.rejected_by_injector += 1;
                    }
                }
            }
        }
    }

    info!(
        candidates = report.candidates,
        injected = report.injected,
        subsumed = report.subsumed,
        stale_removed = report.stale_removed,
        "pass complete"
    );
    report
}
