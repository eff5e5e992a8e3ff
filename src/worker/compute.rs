//! Computations a worker can run.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value;

use crate::error::ComputeError;

/// Shared stop flag between a worker's owner and its running computation.
///
/// Clones observe the same flag. Once cancelled it stays cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// `Err(ComputeError::Cancelled)` once cancelled, for use with `?` in loops.
    pub fn check(&self) -> Result<(), ComputeError> {
        if self.is_cancelled() {
            Err(ComputeError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// A synchronous, bounded unit of work.
///
/// Implementations run on a blocking thread inside the worker, never on the
/// controller's flow. They must terminate for every payload they accept, and
/// long-running ones should poll `cancel` and stop early once it is set.
pub trait Computation: Send + Sync + 'static {
    /// Registry name (the "code reference" a controller spawns by).
    fn name(&self) -> &str;

    /// Run once for a single command payload.
    fn compute(&self, payload: &Value, cancel: &CancelToken) -> Result<Value, ComputeError>;
}

/// Placeholder heavy loop: counts up by one per iteration.
#[derive(Debug, Clone)]
pub struct CountingLoop {
    name: String,
    iterations: u64,
}

impl CountingLoop {
    pub const DEFAULT_ITERATIONS: u64 = 10;

    /// A loop registered as `counting_loop`.
    pub fn new(iterations: u64) -> Self {
        Self::named("counting_loop", iterations)
    }

    pub fn named(name: impl Into<String>, iterations: u64) -> Self {
        Self {
            name: name.into(),
            iterations,
        }
    }

    fn iterations_for(&self, payload: &Value) -> Result<u64, ComputeError> {
        match payload {
            Value::String(s) if s == "start" => Ok(self.iterations),
            Value::Object(map) => map
                .get("iterations")
                .and_then(Value::as_u64)
                .ok_or_else(|| ComputeError::UnsupportedCommand(payload.to_string())),
            other => Err(ComputeError::UnsupportedCommand(other.to_string())),
        }
    }
}

impl Default for CountingLoop {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ITERATIONS)
    }
}

impl Computation for CountingLoop {
    fn name(&self) -> &str {
        &self.name
    }

    fn compute(&self, payload: &Value, cancel: &CancelToken) -> Result<Value, ComputeError> {
        let iterations = self.iterations_for(payload)?;
        tracing::debug!(computation = %self.name, iterations, "Computation started");

        let mut result: u64 = 0;
        for _ in 0..iterations {
            cancel.check()?;
            result += 1;
            tracing::trace!(result, "counting");
        }

        Ok(Value::from(result))
    }
}
