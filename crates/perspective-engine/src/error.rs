//! Error types for the annotation engine
//!
//! Covers:
//! - Host tree failures (stale handles, markers attached to the wrong kind of
//!   node); these stay inside a pass and never reach [`EngineError`]
//! - Configuration store I/O and decoding
//! - Controller state machine violations
//! - Command channel failures (engine task gone)
//!
//! Scan-level problems never surface here: an amount that fails validation is
//! simply not annotated.

use crate::controller::ControllerState;
use perspective_core::ConfigError;

/// Main engine error type
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration rejected before any tree mutation
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// Configuration store failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Illegal controller transition
    #[error("controller error: {0}")]
    Controller(#[from] ControllerError),

    /// The engine task behind a handle no longer exists
    #[error("engine channel closed")]
    ChannelClosed,
}

impl EngineError {
    /// Check if the failure is the host context going away
    #[inline]
    #[must_use]
    pub fn is_disconnected(&self) -> bool {
        matches!(self, Self::ChannelClosed)
    }

    /// Check if the configuration store failed
    #[inline]
    #[must_use]
    pub fn is_store(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}

/// Host tree errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// Handle refers to a node that was removed
    #[error("node {0} no longer exists")]
    StaleNode(usize),

    /// Markers can only be attached to element nodes
    #[error("node {0} cannot own an annotation")]
    NotAnElement(usize),

    /// Only text leaves carry editable text
    #[error("node {0} is not a text leaf")]
    NotText(usize),

    /// The root cannot be removed
    #[error("the root node cannot be removed")]
    RootRemoval,
}

/// Configuration store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data is not a JSON object of settings
    #[error("store data is malformed: {0}")]
    Json(#[from] serde_json::Error),

    /// A stored value has the wrong shape for its key
    #[error("invalid value for key {key}: {message}")]
    InvalidValue {
        /// Settings key
        key: String,
        /// Decoder message
        message: String,
    },
}

/// Controller state machine errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControllerError {
    /// Transition not in the allowed table
    #[error("illegal transition: {from:?} -> {to:?}")]
    IllegalTransition {
        /// Current state
        from: ControllerState,
        /// Requested state
        to: ControllerState,
    },
}
