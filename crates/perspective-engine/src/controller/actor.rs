//! Engine actor
//!
//! One tokio task owns the [`Controller`] and serialises every callback
//! (commands, mutation notices, the deferred rescan) through a single
//! `select!` loop. The tree lock is held only while one callback runs.

use super::{Controller, ControllerState};
use crate::command::{Command, CommandOutcome};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::tree::{ContentTree, MutationRecord};
use parking_lot::Mutex;
use perspective_core::ValuationConfig;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep_until, Instant};
use tracing::debug;

/// Queue depth between handles and the engine task
const INBOX_CAPACITY: usize = 64;

/// Snapshot of an engine's lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EngineStatus {
    /// Lifecycle state
    pub lifecycle: ControllerState,
    /// Owning nodes
    pub annotations: usize,
    /// Whether a deferred rescan is armed
    pub rescan_pending: bool,
}

enum Envelope {
    Command(Command, oneshot::Sender<CommandOutcome>),
    Mutation(MutationRecord),
    Status(oneshot::Sender<EngineStatus>),
}

/// Handle for talking to a running engine
///
/// Cloneable; the engine task stops once every handle is dropped.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    sender: mpsc::Sender<Envelope>,
}

impl EngineHandle {
    /// Send a command and wait for its outcome
    ///
    /// # Errors
    /// Returns [`EngineError::ChannelClosed`] if the engine task is gone
    pub async fn send(&self, command: Command) -> Result<CommandOutcome, EngineError> {
        let (reply, outcome) = oneshot::channel();
        self.sender
            .send(Envelope::Command(command, reply))
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        outcome.await.map_err(|_| EngineError::ChannelClosed)
    }

    /// Start observing with `config`
    ///
    /// # Errors
    /// Returns [`EngineError::ChannelClosed`] if the engine task is gone
    pub async fn activate(&self, config: ValuationConfig) -> Result<CommandOutcome, EngineError> {
        self.send(Command::Activate(config)).await
    }

    /// Stop observing and remove all annotations
    ///
    /// # Errors
    /// Returns [`EngineError::ChannelClosed`] if the engine task is gone
    pub async fn deactivate(&self) -> Result<CommandOutcome, EngineError> {
        self.send(Command::Deactivate).await
    }

    /// One-shot clear and pass
    ///
    /// # Errors
    /// Returns [`EngineError::ChannelClosed`] if the engine task is gone
    pub async fn rescan(&self, config: ValuationConfig) -> Result<CommandOutcome, EngineError> {
        self.send(Command::Rescan(config)).await
    }

    /// Remove all annotations
    ///
    /// # Errors
    /// Returns [`EngineError::ChannelClosed`] if the engine task is gone
    pub async fn clear(&self) -> Result<CommandOutcome, EngineError> {
        self.send(Command::Clear).await
    }

    /// Replace the valuation configuration
    ///
    /// # Errors
    /// Returns [`EngineError::ChannelClosed`] if the engine task is gone
    pub async fn update_config(
        &self,
        config: ValuationConfig,
    ) -> Result<CommandOutcome, EngineError> {
        self.send(Command::UpdateConfig(config)).await
    }

    /// Report a host mutation
    ///
    /// # Errors
    /// Returns [`EngineError::ChannelClosed`] if the engine task is gone
    pub async fn notify(&self, record: MutationRecord) -> Result<(), EngineError> {
        self.sender
            .send(Envelope::Mutation(record))
            .await
            .map_err(|_| EngineError::ChannelClosed)
    }

    /// Current lifecycle snapshot
    ///
    /// # Errors
    /// Returns [`EngineError::ChannelClosed`] if the engine task is gone
    pub async fn status(&self) -> Result<EngineStatus, EngineError> {
        let (reply, status) = oneshot::channel();
        self.sender
            .send(Envelope::Status(reply))
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        status.await.map_err(|_| EngineError::ChannelClosed)
    }
}

/// Spawn an engine task for `tree`
///
/// Must be called from within a tokio runtime.
pub fn spawn_engine<T>(tree: Arc<Mutex<T>>, config: EngineConfig) -> EngineHandle
where
    T: ContentTree + Send + 'static,
{
    let (sender, inbox) = mpsc::channel(INBOX_CAPACITY);
    tokio::spawn(run(tree, Controller::new(config), inbox));
    EngineHandle { sender }
}

async fn run<T>(tree: Arc<Mutex<T>>, mut controller: Controller, mut inbox: mpsc::Receiver<Envelope>)
where
    T: ContentTree + Send + 'static,
{
    loop {
        let deadline = controller.deadline();
        tokio::select! {
            envelope = inbox.recv() => {
                let Some(envelope) = envelope else {
                    break;
                };
                match envelope {
                    Envelope::Command(command, reply) => {
                        let outcome = {
                            let mut guard = tree.lock();
                            controller.handle(&mut *guard, command)
                        };
                        // The caller may have stopped waiting
                        let _ = reply.send(outcome);
                    }
                    Envelope::Mutation(record) => {
                        controller.on_mutation(&record, Instant::now());
                    }
                    Envelope::Status(reply) => {
                        let _ = reply.send(status_of(&controller));
                    }
                }
            }
            () = wait_until(deadline) => {
                let mut guard = tree.lock();
                controller.on_timer(&mut *guard, Instant::now());
            }
        }
    }
    debug!("engine task stopped");
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn status_of(controller: &Controller) -> EngineStatus {
    EngineStatus {
        lifecycle: controller.lifecycle(),
        annotations: controller
            .state()
            .map_or(0, crate::state::EngineState::annotation_count),
        rescan_pending: controller.deadline().is_some(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::NodePath;
    use crate::tree::MemoryTree;
    use std::time::Duration;

    fn shared_page() -> Arc<Mutex<MemoryTree>> {
        let mut tree = MemoryTree::new("body");
        let root = tree.root();
        tree.append_text_element(root, "p", "₹1,234").unwrap();
        Arc::new(Mutex::new(tree))
    }

    fn config() -> ValuationConfig {
        ValuationConfig::new().with_income(100_000.0)
    }

    #[tokio::test(start_paused = true)]
    async fn burst_of_mutations_runs_one_pass_after_quiet_period() {
        let tree = shared_page();
        let engine = spawn_engine(Arc::clone(&tree), EngineConfig::new());
        assert_eq!(engine.activate(config()).await.unwrap().match_count, Some(1));

        for price in ["₹10", "₹20", "₹30"] {
            {
                let mut guard = tree.lock();
                let root = guard.root();
                guard.append_text_element(root, "p", price).unwrap();
            }
            engine.notify(MutationRecord::child_list(NodePath::root())).await.unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        let status = engine.status().await.unwrap();
        assert_eq!(status.lifecycle, ControllerState::Pending);
        assert_eq!(status.annotations, 1);

        tokio::time::sleep(Duration::from_millis(450)).await;
        let status = engine.status().await.unwrap();
        assert_eq!(status.lifecycle, ControllerState::Idle);
        assert_eq!(status.annotations, 4);
        assert!(!status.rescan_pending);
    }

    #[tokio::test(start_paused = true)]
    async fn deactivate_cancels_pending_rescan() {
        let tree = shared_page();
        let engine = spawn_engine(Arc::clone(&tree), EngineConfig::new());
        engine.activate(config()).await.unwrap();
        engine.notify(MutationRecord::child_list(NodePath::root())).await.unwrap();

        engine.deactivate().await.unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;

        let status = engine.status().await.unwrap();
        assert_eq!(status.lifecycle, ControllerState::Inactive);
        assert!(tree.lock().markers().is_empty());
    }

    #[tokio::test]
    async fn invalid_config_is_reported() {
        let engine = spawn_engine(shared_page(), EngineConfig::new());
        let outcome = engine
            .activate(ValuationConfig::new().with_income(-5.0))
            .await
            .unwrap();
        assert!(!outcome.success);
        assert_eq!(
            engine.status().await.unwrap().lifecycle,
            ControllerState::Inactive
        );
    }
}
