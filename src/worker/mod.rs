//! Worker system - offload a computation and observe its outcome.
//!
//! Core components:
//! - `message` - Command / WorkerEvent types with correlation ids
//! - `compute` - Computation trait and the counting loop
//! - `registry` - Code reference → computation lookup
//! - `spawner` - WorkerSpawner capability, WorkerHandle, tokio TaskSpawner
//! - `worker` - Worker unit (one event per command)
//! - `state` - Worker lifecycle (Created → Running → Completed/Failed, Terminated)
//! - `controller` - Create / Send / Dispose plus observable result and error

pub mod compute;
pub mod controller;
pub mod message;
pub mod registry;
pub mod spawner;
pub mod state;
pub mod worker;

pub use compute::{CancelToken, Computation, CountingLoop};
pub use controller::{Controller, ControllerSnapshot};
pub use message::{Command, CommandId, WorkerEvent};
pub use registry::ComputationRegistry;
pub use spawner::{TaskSpawner, WorkerHandle, WorkerSpawner};
pub use state::{WorkerId, WorkerLifecycle, WorkerState};
pub use worker::Worker;
