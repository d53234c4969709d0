//! Perspective Engine
//!
//! Finds rupee prices in a host content tree and annotates each with a
//! personal equivalence (time to earn, item count, share of a career).
//!
//! A pass runs in fixed stages:
//! 1. [`injector::reconcile`] drops markers whose owner changed
//! 2. [`matcher::find_candidates`] lists price-like nodes, deepest first
//! 3. [`policy::place`] picks one owner per amount
//! 4. [`injector::attach`] appends the marker
//!
//! [`controller`] decides when passes run; [`spawn_engine`] drives it from a
//! tokio task.
//!
//! # Example
//!
//! ```rust
//! use perspective_engine::prelude::*;
//!
//! let mut tree = MemoryTree::new("body");
//! let root = tree.root();
//! tree.append_text_element(root, "span", "₹1,234").unwrap();
//!
//! let mut state = EngineState::new(ValuationConfig::new().with_income(100_000.0));
//! let report = run_pass(&mut tree, &mut state, &EngineConfig::new());
//! assert_eq!(report.injected, 1);
//! assert_eq!(tree.rendered_text(root), "₹1,234⏰ 1.9 hrs");
//! ```

#![warn(unreachable_pub)]

pub mod command;
pub mod config;
pub mod controller;
pub mod error;
pub mod injector;
pub mod matcher;
pub mod path;
pub mod pipeline;
pub mod policy;
pub mod settings;
pub mod state;
pub mod store;
pub mod tree;

pub use command::{Command, CommandOutcome};
pub use config::EngineConfig;
pub use controller::actor::EngineStatus;
pub use controller::{spawn_engine, Controller, ControllerState, EngineHandle};
pub use error::{ControllerError, EngineError, StoreError, TreeError};
pub use path::NodePath;
pub use pipeline::{run_pass, PassReport};
pub use settings::Settings;
pub use state::{Annotation, EngineState, Fingerprint, PriceToken};
pub use store::{ConfigStore, JsonFileStore, MemoryStore};
pub use tree::{ContentTree, DocumentNode, MemoryTree, MutationRecord, NodeId};

/// Common imports
pub mod prelude {
    pub use crate::command::{Command, CommandOutcome};
    pub use crate::config::EngineConfig;
    pub use crate::controller::{spawn_engine, Controller, ControllerState, EngineHandle};
    pub use crate::pipeline::run_pass;
    pub use crate::state::EngineState;
    pub use crate::tree::{ContentTree, MemoryTree, MutationRecord};
    pub use perspective_core::{ConversionMode, ValuationConfig};
}
