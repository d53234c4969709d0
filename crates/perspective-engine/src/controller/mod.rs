//! Incremental update controller
//!
//! Explicit lifecycle state machine with one cancellable deferred rescan.
//! The controller is synchronous; [`actor`] drives it from a tokio task.
//!
//! ```text
//! Inactive --activate--> Idle --mutation--> Pending --timer--> Idle
//!    ^                    |                   |
//!    +----deactivate------+-------------------+
//! ```

pub mod actor;

use crate::command::{Command, CommandOutcome};
use crate::config::EngineConfig;
use crate::error::{ControllerError, EngineError};
use crate::injector;
use crate::pipeline::{run_pass, PassReport};
use crate::state::EngineState;
use crate::tree::{ContentTree, MutationRecord};
use perspective_core::ValuationConfig;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info, warn};

pub use actor::{spawn_engine, EngineHandle};

/// Lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerState {
    /// Not observing; no engine state exists
    Inactive,
    /// Observing with no rescan scheduled
    Idle,
    /// Observing with a rescan scheduled
    Pending,
}

/// States reachable from `from`
#[must_use]
pub fn allowed_transitions(from: ControllerState) -> &'static [ControllerState] {
    use ControllerState::{Idle, Inactive, Pending};
    match from {
        Inactive => &[Idle],
        Idle => &[Idle, Pending, Inactive],
        Pending => &[Pending, Idle, Inactive],
    }
}

/// Validate a lifecycle transition
///
/// # Errors
/// Returns [`ControllerError::IllegalTransition`] when `to` is not reachable from `from`
pub fn validate_transition(from: ControllerState, to: ControllerState) -> Result<(), ControllerError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(ControllerError::IllegalTransition { from, to })
    }
}

/// The single deferred rescan
///
/// Arming replaces any previous deadline, so at most one is ever live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeferredRescan {
    deadline: Option<Instant>,
}

impl DeferredRescan {
    /// Schedule at `at`, returning the deadline it replaced
    pub fn arm(&mut self, at: Instant) -> Option<Instant> {
        self.deadline.replace(at)
    }

    /// Cancel; returns whether a deadline was live
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    /// Live deadline
    #[inline]
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether the deadline has been reached
    #[inline]
    #[must_use]
    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }
}

/// Lifecycle controller for one page context
#[derive(Debug)]
pub struct Controller {
    engine: EngineConfig,
    lifecycle: ControllerState,
    state: Option<EngineState>,
    deferred: DeferredRescan,
}

impl Controller {
    /// Inactive controller
    #[must_use]
    pub fn new(engine: EngineConfig) -> Self {
        Self {
            engine,
            lifecycle: ControllerState::Inactive,
            state: None,
            deferred: DeferredRescan::default(),
        }
    }

    /// Current lifecycle state
    #[inline]
    #[must_use]
    pub fn lifecycle(&self) -> ControllerState {
        self.lifecycle
    }

    /// Engine state, present while active
    #[inline]
    #[must_use]
    pub fn state(&self) -> Option<&EngineState> {
        self.state.as_ref()
    }

    /// Engine configuration
    #[inline]
    #[must_use]
    pub fn engine_config(&self) -> &EngineConfig {
        &self.engine
    }

    /// Deadline of the pending rescan
    #[inline]
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deferred.deadline()
    }

    /// Apply a command; rejections are reported in the outcome
    pub fn handle<T: ContentTree>(&mut self, tree: &mut T, command: Command) -> CommandOutcome {
        let name = command.name();
        match self.apply(tree, command) {
            Ok(outcome) => {
                info!(command = name, lifecycle = ?self.lifecycle, count = ?outcome.match_count, "command applied");
                outcome
            }
            Err(err) => {
                warn!(command = name, %err, "command rejected");
                CommandOutcome::rejected(err.to_string())
            }
        }
    }

    fn apply<T: ContentTree>(
        &mut self,
        tree: &mut T,
        command: Command,
    ) -> Result<CommandOutcome, EngineError> {
        match command {
            Command::Activate(config) => {
                config.validate()?;
                if self.lifecycle == ControllerState::Inactive {
                    self.transition(ControllerState::Idle)?;
                    let state = self.state.insert(EngineState::new(config));
                    run_pass(tree, state, &self.engine);
                    Ok(CommandOutcome::matched(state.annotation_count()))
                } else {
                    self.reannotate(tree, config)
                }
            }
            Command::Deactivate | Command::Clear => {
                self.shut_down(tree)?;
                Ok(CommandOutcome::done())
            }
            Command::Rescan(config) => {
                config.validate()?;
                if self.lifecycle == ControllerState::Inactive {
                    injector::remove_markers(tree);
                    let mut state = EngineState::new(config);
                    run_pass(tree, &mut state, &self.engine);
                    Ok(CommandOutcome::matched(state.annotation_count()))
                } else {
                    self.reannotate(tree, config)
                }
            }
            Command::UpdateConfig(config) => {
                config.validate()?;
                if self.lifecycle == ControllerState::Inactive {
                    Ok(CommandOutcome::done())
                } else {
                    self.reannotate(tree, config)
                }
            }
        }
    }

    /// Clear and re-run under `config` while active
    fn reannotate<T: ContentTree>(
        &mut self,
        tree: &mut T,
        config: ValuationConfig,
    ) -> Result<CommandOutcome, EngineError> {
        if self.deferred.cancel() {
            debug!("pending rescan cancelled");
        }
        self.transition(ControllerState::Idle)?;
        let state = self
            .state
            .get_or_insert_with(|| EngineState::new(config.clone()));
        injector::clear(tree, state);
        state.reconfigure(config);
        run_pass(tree, state, &self.engine);
        Ok(CommandOutcome::matched(state.annotation_count()))
    }

    fn shut_down<T: ContentTree>(&mut self, tree: &mut T) -> Result<(), EngineError> {
        self.deferred.cancel();
        match self.state.take() {
            Some(mut state) => {
                injector::clear(tree, &mut state);
            }
            None => {
                injector::remove_markers(tree);
            }
        }
        if self.lifecycle != ControllerState::Inactive {
            self.transition(ControllerState::Inactive)?;
        }
        Ok(())
    }

    /// Record a host mutation; returns whether a rescan is now scheduled
    ///
    /// Ignored while inactive and for the engine's own marker echoes.
    pub fn on_mutation(&mut self, record: &MutationRecord, now: Instant) -> bool {
        if self.lifecycle == ControllerState::Inactive || record.markers_only {
            return false;
        }
        if let Err(err) = self.transition(ControllerState::Pending) {
            warn!(%err, "mutation not scheduled");
            return false;
        }
        let at = now + self.engine.debounce;
        if self.deferred.arm(at).is_some() {
            debug!(target_path = %record.target, "deferred rescan re-armed");
        }
        true
    }

    /// Run the deferred rescan if it is due
    pub fn on_timer<T: ContentTree>(&mut self, tree: &mut T, now: Instant) -> Option<PassReport> {
        if self.lifecycle != ControllerState::Pending || !self.deferred.is_due(now) {
            return None;
        }
        self.deferred.cancel();
        if let Err(err) = self.transition(ControllerState::Idle) {
            warn!(%err, "deferred rescan dropped");
            return None;
        }
        let state = self.state.as_mut()?;
        Some(run_pass(tree, state, &self.engine))
    }

    fn transition(&mut self, to: ControllerState) -> Result<(), ControllerError> {
        validate_transition(self.lifecycle, to)?;
        if self.lifecycle != to {
            debug!(from = ?self.lifecycle, ?to, "lifecycle transition");
        }
        self.lifecycle = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::NodePath;
    use crate::tree::MemoryTree;
    use std::time::Duration;

    fn page() -> MemoryTree {
        let mut tree = MemoryTree::new("body");
        let root = tree.root();
        tree.append_text_element(root, "p", "₹1,234").unwrap();
        tree
    }

    fn config() -> ValuationConfig {
        ValuationConfig::new().with_income(100_000.0)
    }

    #[test]
    fn transition_table() {
        use ControllerState::{Idle, Inactive, Pending};
        assert!(validate_transition(Inactive, Idle).is_ok());
        assert!(validate_transition(Idle, Pending).is_ok());
        assert!(validate_transition(Pending, Idle).is_ok());
        assert!(validate_transition(Pending, Inactive).is_ok());
        assert_eq!(
            validate_transition(Inactive, Pending),
            Err(ControllerError::IllegalTransition {
                from: Inactive,
                to: Pending
            })
        );
    }

    #[test]
    fn deferred_rescan_keeps_one_deadline() {
        let now = Instant::now();
        let mut deferred = DeferredRescan::default();
        assert_eq!(deferred.arm(now), None);
        let later = now + Duration::from_millis(10);
        assert_eq!(deferred.arm(later), Some(now));
        assert_eq!(deferred.deadline(), Some(later));
        assert!(!deferred.is_due(now));
        assert!(deferred.is_due(later));
        assert!(deferred.cancel());
        assert!(!deferred.cancel());
    }

    #[test]
    fn activate_runs_initial_pass() {
        let mut tree = page();
        let mut controller = Controller::new(EngineConfig::new());
        let outcome = controller.handle(&mut tree, Command::Activate(config()));
        assert_eq!(outcome, CommandOutcome::matched(1));
        assert_eq!(controller.lifecycle(), ControllerState::Idle);
        assert_eq!(tree.markers().len(), 1);
    }

    #[test]
    fn invalid_config_leaves_tree_untouched() {
        let mut tree = page();
        let before = tree.outline();
        let mut controller = Controller::new(EngineConfig::new());
        let outcome = controller.handle(
            &mut tree,
            Command::Activate(ValuationConfig::new().with_income(0.0)),
        );
        assert!(!outcome.success);
        assert!(outcome.reason.is_some());
        assert_eq!(controller.lifecycle(), ControllerState::Inactive);
        assert_eq!(tree.outline(), before);
    }

    #[test]
    fn mutations_debounce_into_one_rescan() {
        let mut tree = page();
        let mut controller = Controller::new(EngineConfig::new());
        controller.handle(&mut tree, Command::Activate(config()));

        let start = Instant::now();
        let root = tree.root();
        tree.append_text_element(root, "p", "₹99").unwrap();
        assert!(controller.on_mutation(&MutationRecord::child_list(NodePath::root()), start));
        let second = start + Duration::from_millis(300);
        assert!(controller.on_mutation(&MutationRecord::child_list(NodePath::root()), second));
        assert_eq!(controller.lifecycle(), ControllerState::Pending);
        assert_eq!(controller.deadline(), Some(second + Duration::from_millis(500)));

        assert!(controller.on_timer(&mut tree, start + Duration::from_millis(500)).is_none());
        let report = controller
            .on_timer(&mut tree, second + Duration::from_millis(500))
            .unwrap();
        assert_eq!(report.injected, 1);
        assert_eq!(controller.lifecycle(), ControllerState::Idle);
        assert_eq!(controller.deadline(), None);
    }

    #[test]
    fn marker_echoes_and_inactive_mutations_are_ignored() {
        let mut tree = page();
        let mut controller = Controller::new(EngineConfig::new());
        let now = Instant::now();
        assert!(!controller.on_mutation(&MutationRecord::child_list(NodePath::root()), now));

        controller.handle(&mut tree, Command::Activate(config()));
        assert!(!controller.on_mutation(&MutationRecord::marker_echo(NodePath::new(vec![0])), now));
        assert_eq!(controller.lifecycle(), ControllerState::Idle);
    }

    #[test]
    fn deactivate_cancels_pending_and_clears() {
        let mut tree = page();
        let mut controller = Controller::new(EngineConfig::new());
        controller.handle(&mut tree, Command::Activate(config()));
        controller.on_mutation(&MutationRecord::character_data(NodePath::root()), Instant::now());

        assert_eq!(
            controller.handle(&mut tree, Command::Deactivate),
            CommandOutcome::done()
        );
        assert_eq!(controller.lifecycle(), ControllerState::Inactive);
        assert!(controller.state().is_none());
        assert_eq!(controller.deadline(), None);
        assert!(tree.markers().is_empty());
    }

    #[test]
    fn rescan_while_pending_cancels_the_deferred_pass() {
        let mut tree = page();
        let mut controller = Controller::new(EngineConfig::new());
        controller.handle(&mut tree, Command::Activate(config()));
        controller.on_mutation(&MutationRecord::child_list(NodePath::root()), Instant::now());

        let outcome = controller.handle(
            &mut tree,
            Command::Rescan(config().with_income(50_000.0)),
        );
        assert_eq!(outcome, CommandOutcome::matched(1));
        assert_eq!(controller.lifecycle(), ControllerState::Idle);
        assert_eq!(controller.deadline(), None);
        assert_eq!(tree.markers().len(), 1);
    }

    #[test]
    fn rescan_while_inactive_annotates_without_observing() {
        let mut tree = page();
        let mut controller = Controller::new(EngineConfig::new());
        let outcome = controller.handle(&mut tree, Command::Rescan(config()));
        assert_eq!(outcome, CommandOutcome::matched(1));
        assert_eq!(controller.lifecycle(), ControllerState::Inactive);
        assert!(!controller.on_mutation(&MutationRecord::child_list(NodePath::root()), Instant::now()));

        // A second one-shot replaces rather than stacks
        controller.handle(&mut tree, Command::Rescan(config().with_income(50_000.0)));
        assert_eq!(tree.markers().len(), 1);
    }

    #[test]
    fn update_config_re_renders_while_active() {
        let mut tree = page();
        let mut controller = Controller::new(EngineConfig::new());
        assert_eq!(
            controller.handle(&mut tree, Command::UpdateConfig(config())),
            CommandOutcome::done()
        );
        assert!(tree.markers().is_empty());

        controller.handle(&mut tree, Command::Activate(config()));
        let before = tree.rendered_text(tree.root());
        controller.handle(&mut tree, Command::UpdateConfig(config().with_income(50_000.0)));
        let after = tree.rendered_text(tree.root());
        assert_ne!(before, after);
        assert_eq!(tree.markers().len(), 1);
    }
}
