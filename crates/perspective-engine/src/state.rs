//! Per-page engine state
//!
//! One [`EngineState`] exists per active page context. It is passed
//! explicitly to every pipeline stage; nothing in the engine keeps ambient
//! mutable state.

use crate::path::NodePath;
use indexmap::IndexMap;
use perspective_core::ValuationConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Annotation attached to an owning node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Path of the owning node
    pub owner_path: NodePath,
    /// Text shown in the marker
    pub display_text: String,
    /// Amount the annotation was computed for
    pub amount: f64,
}

/// `(path, amount)` pair identifying work already done
///
/// The amount is kept in paise so the pair is hashable and exact for any
/// amount with at most two decimals.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint {
    /// Node path
    pub path: NodePath,
    /// Amount in paise
    pub paise: u64,
}

impl Fingerprint {
    /// Fingerprint for a node and amount
    #[must_use]
    pub fn new(path: NodePath, amount: f64) -> Self {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let paise = (amount * 100.0).round() as u64;
        Self { path, paise }
    }
}

/// Price token attributed to an owning node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceToken {
    /// Text matched by the scanner
    pub raw: String,
    /// Validated amount
    pub amount: f64,
    /// Path of the node the text was read from
    pub source_path: NodePath,
}

/// Engine state for one page context
#[derive(Debug, Clone)]
pub struct EngineState {
    config: ValuationConfig,
    annotated: IndexMap<NodePath, Annotation>,
    processed: HashSet<Fingerprint>,
}

impl EngineState {
    /// Fresh state for a validated configuration
    #[must_use]
    pub fn new(config: ValuationConfig) -> Self {
        Self {
            config,
            annotated: IndexMap::new(),
            processed: HashSet::new(),
        }
    }

    /// Configuration for the current pass
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ValuationConfig {
        &self.config
    }

    /// Replace the configuration, dropping all bookkeeping
    pub fn reconfigure(&mut self, config: ValuationConfig) {
        self.config = config;
        self.reset();
    }

    /// Owning nodes and their annotations, in the order they were recorded
    #[inline]
    #[must_use]
    pub fn annotated(&self) -> &IndexMap<NodePath, Annotation> {
        &self.annotated
    }

    /// Whether `path` currently owns an annotation
    #[inline]
    #[must_use]
    pub fn is_owner(&self, path: &NodePath) -> bool {
        self.annotated.contains_key(path)
    }

    /// Number of owning nodes
    #[inline]
    #[must_use]
    pub fn annotation_count(&self) -> usize {
        self.annotated.len()
    }

    /// Number of processed fingerprints
    #[inline]
    #[must_use]
    pub fn processed_count(&self) -> usize {
        self.processed.len()
    }

    /// Whether a fingerprint has been handled by an earlier decision
    #[inline]
    #[must_use]
    pub fn is_processed(&self, fingerprint: &Fingerprint) -> bool {
        self.processed.contains(fingerprint)
    }

    pub(crate) fn mark_processed(&mut self, fingerprint: Fingerprint) {
        self.processed.insert(fingerprint);
    }

    pub(crate) fn record(&mut self, annotation: Annotation) {
        self.annotated
            .insert(annotation.owner_path.clone(), annotation);
    }

    /// Forget an owner and every fingerprint recorded at its path
    pub(crate) fn release(&mut self, path: &NodePath) {
        self.annotated.shift_remove(path);
        self.processed.retain(|fp| &fp.path != path);
    }

    pub(crate) fn replace_annotated(&mut self, annotated: IndexMap<NodePath, Annotation>) {
        self.annotated = annotated;
    }

    /// Empty both the annotated and processed sets
    pub fn reset(&mut self) {
        self.annotated.clear();
        self.processed.clear();
    }

    /// Whether both sets are empty
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.annotated.is_empty() && self.processed.is_empty()
    }
}
