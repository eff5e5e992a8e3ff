//! Worker unit: runs one computation per received command.

use std::any::Any;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::{ComputeError, WorkerError};
use crate::worker::compute::{CancelToken, Computation};
use crate::worker::message::{Command, WorkerEvent};
use crate::worker::state::WorkerId;

/// Background side of a worker.
///
/// Commands are handled one at a time in arrival order. Each command yields
/// exactly one [`WorkerEvent`].
pub struct Worker {
    id: WorkerId,
    computation: Arc<dyn Computation>,
    commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedSender<WorkerEvent>,
    cancel: CancelToken,
}

impl Worker {
    pub fn new(
        id: WorkerId,
        computation: Arc<dyn Computation>,
        commands: mpsc::UnboundedReceiver<Command>,
        events: mpsc::UnboundedSender<WorkerEvent>,
        cancel: CancelToken,
    ) -> Self {
        Self {
            id,
            computation,
            commands,
            events,
            cancel,
        }
    }

    /// Process commands until the owner hangs up.
    pub async fn run(mut self) {
        tracing::debug!(
            worker_id = %self.id,
            computation = self.computation.name(),
            "Worker started"
        );

        while let Some(command) = self.commands.recv().await {
            tracing::debug!(
                worker_id = %self.id,
                command_id = %command.id,
                "Worker received a message"
            );

            let event = self.execute(command).await;
            if self.events.send(event).is_err() {
                tracing::debug!(worker_id = %self.id, "Owner dropped event stream");
                break;
            }
        }

        tracing::debug!(worker_id = %self.id, "Worker stopped");
    }

    /// Run the computation off the async threads and turn its outcome into an event.
    async fn execute(&self, command: Command) -> WorkerEvent {
        let Command { id, payload, .. } = command;
        let computation = Arc::clone(&self.computation);
        let cancel = self.cancel.clone();

        let outcome = tokio::task::spawn_blocking(move || computation.compute(&payload, &cancel))
            .await
            .unwrap_or_else(|join_err| {
                if join_err.is_panic() {
                    Err(ComputeError::Panicked(panic_message(join_err.into_panic())))
                } else {
                    Err(ComputeError::Failed(join_err.to_string()))
                }
            });

        match outcome {
            Ok(value) => WorkerEvent::Result {
                command_id: id,
                value,
            },
            Err(e) => {
                let err = WorkerError::ComputationFailed {
                    name: self.computation.name().to_string(),
                    reason: e.to_string(),
                };
                tracing::warn!(worker_id = %self.id, command_id = %id, error = %err, "Computation failed");
                WorkerEvent::Error {
                    command_id: Some(id),
                    message: err.to_string(),
                }
            }
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
