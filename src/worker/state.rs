//! Worker lifecycle state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of a spawned worker.
pub type WorkerId = Uuid;

/// Lifecycle state of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    /// Worker exists but has not received a command yet.
    Created,
    /// At least one command is awaiting its outcome.
    Running,
    /// The last outstanding command produced a result.
    Completed,
    /// Construction failed, or the last outstanding command produced an error.
    Failed,
    /// Disposed by its controller. Nothing happens after this.
    Terminated,
}

impl WorkerState {
    /// Check if this state allows transitioning to another state.
    pub fn can_transition_to(&self, target: WorkerState) -> bool {
        use WorkerState::*;

        match (self, target) {
            (Terminated, _) => false,
            (_, Terminated) => true,
            _ => matches!(
                (self, target),
                (Created, Running)
                    | (Created, Failed)
                    | (Running, Completed)
                    | (Running, Failed)
                    | (Completed, Running)
                    | (Completed, Failed)
                    | (Failed, Running)
            ),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminated)
    }
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Terminated => "terminated",
        };
        write!(f, "{s}")
    }
}

/// A state transition event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: WorkerState,
    pub to: WorkerState,
    pub timestamp: DateTime<Utc>,
    pub reason: Option<String>,
}

/// Lifecycle record of one worker, as seen by its controller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerLifecycle {
    /// Worker identity. `None` when construction failed.
    pub worker_id: Option<WorkerId>,
    /// Code reference the worker was created for.
    pub target: String,
    pub state: WorkerState,
    pub created_at: DateTime<Utc>,
    pub terminated_at: Option<DateTime<Utc>>,
    /// State transition history.
    pub transitions: Vec<StateTransition>,
}

impl WorkerLifecycle {
    const MAX_TRANSITIONS: usize = 200;

    pub fn new(worker_id: Option<WorkerId>, target: impl Into<String>) -> Self {
        Self {
            worker_id,
            target: target.into(),
            state: WorkerState::Created,
            created_at: Utc::now(),
            terminated_at: None,
            transitions: Vec::new(),
        }
    }

    /// Transition to a new state.
    pub fn transition_to(
        &mut self,
        new_state: WorkerState,
        reason: Option<String>,
    ) -> Result<(), String> {
        if !self.state.can_transition_to(new_state) {
            return Err(format!(
                "Cannot transition from {} to {}",
                self.state, new_state
            ));
        }

        self.transitions.push(StateTransition {
            from: self.state,
            to: new_state,
            timestamp: Utc::now(),
            reason,
        });

        if self.transitions.len() > Self::MAX_TRANSITIONS {
            let drain_count = self.transitions.len() - Self::MAX_TRANSITIONS;
            self.transitions.drain(..drain_count);
        }

        self.state = new_state;
        if new_state == WorkerState::Terminated {
            self.terminated_at = Some(Utc::now());
        }

        Ok(())
    }

    /// Whether events from `worker_id` may still change observable state.
    pub fn accepts_events_from(&self, worker_id: WorkerId) -> bool {
        self.worker_id == Some(worker_id) && !self.state.is_terminal()
    }
}
