//! Registry of computations workers can be spawned for.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::OffloadConfig;
use crate::worker::compute::{Computation, CountingLoop};

/// Maps a code reference to the computation a worker runs.
pub struct ComputationRegistry {
    computations: HashMap<String, Arc<dyn Computation>>,
}

impl ComputationRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            computations: HashMap::new(),
        }
    }

    /// Registry with `counting_loop` and `heavy_loop` sized from config.
    pub fn with_builtins(config: &OffloadConfig) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(CountingLoop::new(config.iterations)));
        registry.register(Arc::new(CountingLoop::named(
            "heavy_loop",
            config.heavy_iterations,
        )));
        registry
    }

    /// Register a computation under its own name, replacing any previous one.
    pub fn register(&mut self, computation: Arc<dyn Computation>) {
        let name = computation.name().to_string();
        if self.computations.insert(name.clone(), computation).is_some() {
            tracing::warn!(computation = %name, "Replaced registered computation");
        } else {
            tracing::debug!("Registered computation: {}", name);
        }
    }

    /// Get a computation by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Computation>> {
        self.computations.get(name).cloned()
    }

    pub fn has(&self, name: &str) -> bool {
        self.computations.contains_key(name)
    }

    /// List registered names, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.computations.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn count(&self) -> usize {
        self.computations.len()
    }
}

impl Default for ComputationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::worker::compute::CancelToken;

    #[test]
    fn builtins_are_registered() {
        let config = OffloadConfig {
            iterations: 4,
            heavy_iterations: 8,
            ..Default::default()
        };
        let registry = ComputationRegistry::with_builtins(&config);
        assert_eq!(registry.list(), vec!["counting_loop", "heavy_loop"]);
        assert_eq!(registry.count(), 2);

        let counting = registry.get("counting_loop").unwrap();
        assert_eq!(counting.compute(&json!("start"), &CancelToken::new()).unwrap(), json!(4));
        let heavy = registry.get("heavy_loop").unwrap();
        assert_eq!(heavy.compute(&json!("start"), &CancelToken::new()).unwrap(), json!(8));
    }

    #[test]
    fn unknown_name_is_absent() {
        let registry = ComputationRegistry::new();
        assert!(!registry.has("worker.js"));
        assert!(registry.get("worker.js").is_none());
    }

    #[test]
    fn register_replaces_same_name() {
        let mut registry = ComputationRegistry::new();
        registry.register(Arc::new(CountingLoop::new(1)));
        registry.register(Arc::new(CountingLoop::new(2)));
        assert_eq!(registry.count(), 1);
        let computation = registry.get("counting_loop").unwrap();
        assert_eq!(computation.compute(&json!("start"), &CancelToken::new()).unwrap(), json!(2));
    }
}
