//! Error types for worker-offload.

use uuid::Uuid;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    #[error("Compute error: {0}")]
    Compute(#[from] ComputeError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Worker lifecycle errors.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("Worker for {target} could not be created: {reason}")]
    ConstructionFailed { target: String, reason: String },

    #[error("Computation {name} failed: {reason}")]
    ComputationFailed { name: String, reason: String },

    #[error("Worker {id} is disconnected")]
    Disconnected { id: Uuid },

    #[error("Worker {id} exited unexpectedly")]
    Exited { id: Uuid },
}

/// Errors raised by a computation while it runs.
#[derive(Debug, thiserror::Error)]
pub enum ComputeError {
    #[error("Unsupported command: {0}")]
    UnsupportedCommand(String),

    #[error("Computation cancelled")]
    Cancelled,

    #[error("Computation panicked: {0}")]
    Panicked(String),

    #[error("{0}")]
    Failed(String),
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
