//! Engine configuration
//!
//! Tuning knobs for the controller and the placement policy. Valuation
//! parameters live in [`perspective_core::ValuationConfig`].

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default quiet period before a deferred rescan fires
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Default bound on the ancestor walk in the placement policy
pub const DEFAULT_MAX_ANCESTOR_DEPTH: usize = 16;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Quiet period after the last mutation
    #[serde(with = "millis")]
    pub debounce: Duration,
    /// Ancestors inspected before declaring no conflict
    pub max_ancestor_depth: usize,
}

impl EngineConfig {
    /// Create with defaults
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the debounce window
    #[inline]
    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Set the ancestor walk bound
    #[inline]
    #[must_use]
    pub fn with_max_ancestor_depth(mut self, depth: usize) -> Self {
        self.max_ancestor_depth = depth;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            max_ancestor_depth: DEFAULT_MAX_ANCESTOR_DEPTH,
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub(super) fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        #[allow(clippy::cast_possible_truncation)]
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
