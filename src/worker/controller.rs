//! Controller - owns a worker and exposes its outcome as observable state.
//!
//! The controller never waits on its worker. Events are applied by a pump
//! task and published through a `watch` channel, so any observer sees the
//! latest result or error the next time it reads.
//!
//! Only the current, non-terminated worker may change state. Anything that
//! arrives after [`Controller::dispose`] is dropped.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::error::WorkerError;
use crate::worker::message::{Command, CommandId, WorkerEvent};
use crate::worker::registry::ComputationRegistry;
use crate::worker::spawner::{TaskSpawner, WorkerHandle, WorkerSpawner};
use crate::worker::state::{WorkerId, WorkerLifecycle, WorkerState};

/// Everything an observer can see about a controller.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ControllerSnapshot {
    /// Lifecycle of the most recently created worker.
    pub lifecycle: Option<WorkerLifecycle>,
    /// Latest result. Cleared when an error arrives.
    pub result: Option<Value>,
    /// Latest error. Cleared when a result arrives.
    pub error: Option<String>,
    /// Command that produced the visible result or error.
    pub last_command: Option<CommandId>,
    /// Commands sent to the current worker that have not been answered.
    pub pending: usize,
}

impl ControllerSnapshot {
    pub fn state(&self) -> Option<WorkerState> {
        self.lifecycle.as_ref().map(|l| l.state)
    }

    pub fn worker_id(&self) -> Option<WorkerId> {
        self.lifecycle.as_ref().and_then(|l| l.worker_id)
    }

    pub fn is_running(&self) -> bool {
        self.state() == Some(WorkerState::Running)
    }

    /// No command is waiting for an outcome.
    pub fn is_settled(&self) -> bool {
        self.pending == 0
    }

    fn transition(&mut self, state: WorkerState, reason: Option<String>) {
        if let Some(lifecycle) = self.lifecycle.as_mut()
            && lifecycle.state != state
            && let Err(e) = lifecycle.transition_to(state, reason)
        {
            tracing::warn!(target_state = %state, "Ignored lifecycle transition: {}", e);
        }
    }

    fn record_result(&mut self, command_id: CommandId, value: Value) {
        self.result = Some(value);
        self.error = None;
        self.last_command = Some(command_id);
        self.pending = self.pending.saturating_sub(1);
        if self.pending == 0 {
            self.transition(WorkerState::Completed, None);
        }
    }

    fn record_error(&mut self, command_id: Option<CommandId>, message: String) {
        self.error = Some(message.clone());
        self.result = None;
        match command_id {
            Some(id) => {
                self.last_command = Some(id);
                self.pending = self.pending.saturating_sub(1);
            }
            // Not tied to a command: nothing outstanding will be answered.
            None => self.pending = 0,
        }
        if self.pending == 0 {
            self.transition(WorkerState::Failed, Some(message));
        }
    }
}

/// The worker currently owned by a controller.
struct ActiveWorker {
    handle: WorkerHandle,
    pump: JoinHandle<()>,
}

/// Creates, messages, observes, and disposes a single worker.
pub struct Controller {
    spawner: Arc<dyn WorkerSpawner>,
    active: Option<ActiveWorker>,
    state: Arc<watch::Sender<ControllerSnapshot>>,
}

impl Controller {
    /// Create a controller that spawns workers through `spawner`.
    pub fn new(spawner: Arc<dyn WorkerSpawner>) -> Self {
        let (state, _) = watch::channel(ControllerSnapshot::default());
        Self {
            spawner,
            active: None,
            state: Arc::new(state),
        }
    }

    /// Create a controller backed by a [`TaskSpawner`] over `registry`.
    pub fn with_registry(registry: Arc<ComputationRegistry>) -> Self {
        Self::new(Arc::new(TaskSpawner::new(registry)))
    }

    /// Spawn a worker for `target`.
    ///
    /// A worker that is already held is disposed first. Construction
    /// failures land in the error state; the return value is then `None`.
    pub fn create(&mut self, target: &str) -> Option<WorkerId> {
        if self.active.is_some() {
            tracing::debug!(worker_target = target, "Replacing existing worker");
            self.dispose();
        }

        let spawned = tokio::runtime::Handle::try_current()
            .map_err(|e| WorkerError::ConstructionFailed {
                target: target.to_string(),
                reason: e.to_string(),
            })
            .and_then(|runtime| {
                let mut handle = self.spawner.spawn(target)?;
                let events =
                    handle
                        .take_events()
                        .ok_or_else(|| WorkerError::ConstructionFailed {
                            target: target.to_string(),
                            reason: "worker event stream already taken".to_string(),
                        })?;
                Ok((runtime, handle, events))
            });

        let (runtime, handle, events) = match spawned {
            Ok(parts) => parts,
            Err(e) => {
                tracing::warn!(worker_target = target, error = %e, "Worker construction failed");
                let message = e.to_string();
                self.state.send_modify(|s| {
                    s.lifecycle = Some(WorkerLifecycle::new(None, target));
                    s.transition(WorkerState::Failed, Some(message.clone()));
                    s.result = None;
                    s.error = Some(message);
                    s.last_command = None;
                    s.pending = 0;
                });
                return None;
            }
        };

        let worker_id = handle.id();
        self.state.send_modify(|s| {
            s.lifecycle = Some(WorkerLifecycle::new(Some(worker_id), target));
            s.pending = 0;
        });

        let pump = runtime.spawn(pump_events(worker_id, events, Arc::clone(&self.state)));
        self.active = Some(ActiveWorker { handle, pump });

        tracing::info!(worker_id = %worker_id, worker_target = target, "Worker created");
        Some(worker_id)
    }

    /// Forward `payload` to the held worker.
    ///
    /// Without a worker this is a no-op returning `None`.
    pub fn send(&self, payload: impl Into<Value>) -> Option<CommandId> {
        let Some(active) = self.active.as_ref() else {
            tracing::debug!("No worker held; ignoring send");
            return None;
        };

        let command = Command::new(payload);
        let command_id = command.id;

        // Count the command before the worker can possibly answer it.
        self.state.send_modify(|s| {
            s.pending += 1;
            s.transition(WorkerState::Running, None);
        });

        match active.handle.post(command) {
            Ok(()) => {
                tracing::debug!(worker_id = %active.handle.id(), command_id = %command_id, "Sent command");
                Some(command_id)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to send command");
                let message = e.to_string();
                self.state.send_modify(|s| s.record_error(Some(command_id), message));
                None
            }
        }
    }

    /// Terminate the held worker. No-op when none is held; safe to repeat.
    pub fn dispose(&mut self) {
        let Some(mut active) = self.active.take() else {
            return;
        };

        let worker_id = active.handle.id();

        // Publish termination first so a late event from the pump is rejected.
        self.state.send_modify(|s| {
            s.pending = 0;
            if s.worker_id() == Some(worker_id) {
                s.transition(WorkerState::Terminated, Some("Disposed by controller".to_string()));
            }
        });

        active.pump.abort();
        active.handle.terminate();

        tracing::info!(worker_id = %worker_id, "Worker terminated");
    }

    /// Current observable state.
    pub fn snapshot(&self) -> ControllerSnapshot {
        self.state.borrow().clone()
    }

    /// Watch state changes.
    pub fn subscribe(&self) -> watch::Receiver<ControllerSnapshot> {
        self.state.subscribe()
    }

    pub fn result(&self) -> Option<Value> {
        self.state.borrow().result.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    pub fn state(&self) -> Option<WorkerState> {
        self.state.borrow().state()
    }

    /// Whether a worker is currently held.
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Apply a worker event unless it is stale. Returns whether state changed.
fn deliver(
    state: &watch::Sender<ControllerSnapshot>,
    worker_id: WorkerId,
    event: WorkerEvent,
) -> bool {
    let applied = state.send_if_modified(|s| {
        let current = s
            .lifecycle
            .as_ref()
            .is_some_and(|l| l.accepts_events_from(worker_id));
        if !current {
            return false;
        }
        match event {
            WorkerEvent::Result { command_id, value } => s.record_result(command_id, value),
            WorkerEvent::Error {
                command_id,
                message,
            } => s.record_error(command_id, message),
        }
        true
    });

    if !applied {
        tracing::debug!(worker_id = %worker_id, "Discarded stale delivery");
    }
    applied
}

async fn pump_events(
    worker_id: WorkerId,
    mut events: mpsc::UnboundedReceiver<WorkerEvent>,
    state: Arc<watch::Sender<ControllerSnapshot>>,
) {
    while let Some(event) = events.recv().await {
        tracing::debug!(
            worker_id = %worker_id,
            command_id = ?event.command_id(),
            error = event.is_error(),
            "Controller received a message from worker"
        );
        deliver(&state, worker_id, event);
    }

    // Stream closed while this worker is still current: it died on its own.
    let exited = WorkerEvent::Error {
        command_id: None,
        message: WorkerError::Exited { id: worker_id }.to_string(),
    };
    if deliver(&state, worker_id, exited) {
        tracing::warn!(worker_id = %worker_id, "Worker exited unexpectedly");
    }
}
