//! worker-offload runs a bounded computation on a background worker and
//! observes its result without blocking the owning flow.

pub mod config;
pub mod error;
pub mod greeting;
pub mod worker;
