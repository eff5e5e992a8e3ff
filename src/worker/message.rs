//! Messages exchanged between a controller and its worker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Correlates a command with the result or error it produced.
pub type CommandId = Uuid;

/// Controller → worker message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Command {
    /// Correlation id echoed back by the worker.
    pub id: CommandId,
    /// Opaque payload handed to the computation.
    pub payload: Value,
    /// When the controller created the command.
    pub sent_at: DateTime<Utc>,
}

impl Command {
    /// Create a command carrying an arbitrary payload.
    pub fn new(payload: impl Into<Value>) -> Self {
        Self {
            id: Uuid::new_v4(),
            payload: payload.into(),
            sent_at: Utc::now(),
        }
    }

    /// The plain `"start"` command used to kick off a computation.
    pub fn start() -> Self {
        Self::new("start")
    }
}

/// Worker → controller message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkerEvent {
    /// The computation for `command_id` finished.
    Result { command_id: CommandId, value: Value },
    /// The computation failed. `command_id` is `None` for faults that are
    /// not tied to a single command.
    Error {
        command_id: Option<CommandId>,
        message: String,
    },
}

impl WorkerEvent {
    /// Command this event answers, if any.
    pub fn command_id(&self) -> Option<CommandId> {
        match self {
            Self::Result { command_id, .. } => Some(*command_id),
            Self::Error { command_id, .. } => *command_id,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_command_payload() {
        let cmd = Command::start();
        assert_eq!(cmd.payload, Value::String("start".to_string()));
        assert_ne!(cmd.id, Command::start().id);
    }

    #[test]
    fn event_wire_shape() {
        let id = Uuid::new_v4();
        let event = WorkerEvent::Result {
            command_id: id,
            value: serde_json::json!(10),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "result");
        assert_eq!(json["value"], 10);
        assert_eq!(event.command_id(), Some(id));
        assert!(!event.is_error());
    }

    #[test]
    fn uncorrelated_error_has_no_command() {
        let event = WorkerEvent::Error {
            command_id: None,
            message: "gone".to_string(),
        };
        assert!(event.is_error());
        assert_eq!(event.command_id(), None);
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"error\""));
    }
}
