//! Worker-spawning capability injected into a [`Controller`](crate::worker::Controller).

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::WorkerError;
use crate::worker::compute::CancelToken;
use crate::worker::message::{Command, WorkerEvent};
use crate::worker::registry::ComputationRegistry;
use crate::worker::state::WorkerId;
use crate::worker::worker::Worker;

/// Owner-side handle to a spawned worker.
///
/// Dropping the handle terminates the worker. Terminating also cancels the
/// handle's [`CancelToken`], which a running computation polls to stop early.
#[derive(Debug)]
pub struct WorkerHandle {
    id: WorkerId,
    target: String,
    commands: mpsc::UnboundedSender<Command>,
    events: Option<mpsc::UnboundedReceiver<WorkerEvent>>,
    task: Option<JoinHandle<()>>,
    cancel: CancelToken,
}

impl WorkerHandle {
    /// Wrap a command/event channel pair. Spawners attach the task driving
    /// the worker with [`with_task`](Self::with_task).
    pub fn new(
        target: impl Into<String>,
        commands: mpsc::UnboundedSender<Command>,
        events: mpsc::UnboundedReceiver<WorkerEvent>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            target: target.into(),
            commands,
            events: Some(events),
            task: None,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_task(mut self, task: JoinHandle<()>) -> Self {
        self.task = Some(task);
        self
    }

    pub fn id(&self) -> WorkerId {
        self.id
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Token the worker's computations observe; cancelled by [`terminate`](Self::terminate).
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Post a command. Commands are delivered in the order they are posted.
    pub fn post(&self, command: Command) -> Result<(), WorkerError> {
        self.commands
            .send(command)
            .map_err(|_| WorkerError::Disconnected { id: self.id })
    }

    /// Take the event stream. Only the first call returns `Some`.
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<WorkerEvent>> {
        self.events.take()
    }

    /// Stop the worker. Safe to call more than once.
    pub fn terminate(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take()
            && !task.is_finished()
        {
            task.abort();
        }
        self.events = None;
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.terminate();
    }
}

/// Creates workers from a code reference.
pub trait WorkerSpawner: Send + Sync {
    fn spawn(&self, target: &str) -> Result<WorkerHandle, WorkerError>;
}

/// Spawns each worker as a tokio task running a registered computation.
pub struct TaskSpawner {
    registry: Arc<ComputationRegistry>,
}

impl TaskSpawner {
    pub fn new(registry: Arc<ComputationRegistry>) -> Self {
        Self { registry }
    }
}

impl WorkerSpawner for TaskSpawner {
    fn spawn(&self, target: &str) -> Result<WorkerHandle, WorkerError> {
        let computation =
            self.registry
                .get(target)
                .ok_or_else(|| WorkerError::ConstructionFailed {
                    target: target.to_string(),
                    reason: "no computation registered under this name".to_string(),
                })?;

        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            WorkerError::ConstructionFailed {
                target: target.to_string(),
                reason: e.to_string(),
            }
        })?;

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let handle = WorkerHandle::new(target, command_tx, event_rx);

        let worker = Worker::new(
            handle.id(),
            computation,
            command_rx,
            event_tx,
            handle.cancel_token(),
        );
        let task = runtime.spawn(worker.run());

        tracing::debug!(worker_id = %handle.id(), worker_target = target, "Spawned worker");
        Ok(handle.with_task(task))
    }
}
