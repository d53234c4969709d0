//! Commands accepted from the settings surface
//!
//! Wire shape: `{"action": "rescan", "config": {...}}` in, and
//! `{"success": true, "matchCount": 3}` out.

use perspective_core::ValuationConfig;
use serde::{Deserialize, Serialize};

/// Command addressed to an engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "config", rename_all = "camelCase")]
pub enum Command {
    /// Start observing and run an initial pass
    Activate(ValuationConfig),
    /// Stop observing and remove every annotation
    Deactivate,
    /// One-shot: clear, then run a pass under the given configuration
    Rescan(ValuationConfig),
    /// Remove every annotation and stop observing
    Clear,
    /// Replace the configuration, re-annotating if active
    UpdateConfig(ValuationConfig),
}

impl Command {
    /// Short name for logs
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Activate(_) => "activate",
            Self::Deactivate => "deactivate",
            Self::Rescan(_) => "rescan",
            Self::Clear => "clear",
            Self::UpdateConfig(_) => "update_config",
        }
    }
}

/// Reply to a command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandOutcome {
    /// Whether the command took effect
    pub success: bool,
    /// Owning nodes after the command, when it ran a pass
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_count: Option<usize>,
    /// Why the command was rejected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl CommandOutcome {
    /// Success without a pass
    #[inline]
    #[must_use]
    pub fn done() -> Self {
        Self {
            success: true,
            match_count: None,
            reason: None,
        }
    }

    /// Success after a pass that left `count` owners
    #[inline]
    #[must_use]
    pub fn matched(count: usize) -> Self {
        Self {
            success: true,
            match_count: Some(count),
            reason: None,
        }
    }

    /// Rejection with a reason
    #[inline]
    #[must_use]
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            match_count: None,
            reason: Some(reason.into()),
        }
    }
}
