//! Configuration types.

use std::time::Duration;

use crate::error::ConfigError;

/// Offload demo configuration.
#[derive(Debug, Clone)]
pub struct OffloadConfig {
    /// Registry name of the computation the demo controller spawns.
    pub worker_target: String,
    /// Iterations for the `counting_loop` computation.
    pub iterations: u64,
    /// Iterations for the `heavy_loop` computation.
    pub heavy_iterations: u64,
    /// How often the demo ticker fires while a worker is busy.
    pub tick_interval: Duration,
    /// Name used by the greeting.
    pub greeting_name: String,
}

impl Default for OffloadConfig {
    fn default() -> Self {
        Self {
            worker_target: "heavy_loop".to_string(),
            iterations: 10,
            heavy_iterations: 200_000_000,
            tick_interval: Duration::from_millis(100),
            greeting_name: "Developer".to_string(),
        }
    }
}

impl OffloadConfig {
    /// Load configuration from `OFFLOAD_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup. Missing keys keep
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(target) = lookup("OFFLOAD_WORKER_TARGET") {
            if target.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "OFFLOAD_WORKER_TARGET".to_string(),
                    message: "must not be empty".to_string(),
                });
            }
            config.worker_target = target;
        }
        if let Some(raw) = lookup("OFFLOAD_ITERATIONS") {
            config.iterations = parse_u64("OFFLOAD_ITERATIONS", &raw)?;
        }
        if let Some(raw) = lookup("OFFLOAD_HEAVY_ITERATIONS") {
            config.heavy_iterations = parse_u64("OFFLOAD_HEAVY_ITERATIONS", &raw)?;
        }
        if let Some(raw) = lookup("OFFLOAD_TICK_MS") {
            let millis = parse_u64("OFFLOAD_TICK_MS", &raw)?;
            if millis == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "OFFLOAD_TICK_MS".to_string(),
                    message: "must be greater than zero".to_string(),
                });
            }
            config.tick_interval = Duration::from_millis(millis);
        }
        if let Some(name) = lookup("OFFLOAD_GREETING_NAME") {
            config.greeting_name = name;
        }

        Ok(config)
    }
}

fn parse_u64(key: &str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim().parse().map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("{raw:?} is not a non-negative integer ({e})"),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = OffloadConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.worker_target, "heavy_loop");
        assert_eq!(config.iterations, 10);
        assert_eq!(config.tick_interval, Duration::from_millis(100));
        assert_eq!(config.greeting_name, "Developer");
    }

    #[test]
    fn overrides_are_applied() {
        let config = OffloadConfig::from_lookup(lookup_from(&[
            ("OFFLOAD_WORKER_TARGET", "counting_loop"),
            ("OFFLOAD_ITERATIONS", "25"),
            ("OFFLOAD_HEAVY_ITERATIONS", " 1000 "),
            ("OFFLOAD_TICK_MS", "5"),
            ("OFFLOAD_GREETING_NAME", "Ada"),
        ]))
        .unwrap();
        assert_eq!(config.worker_target, "counting_loop");
        assert_eq!(config.iterations, 25);
        assert_eq!(config.heavy_iterations, 1000);
        assert_eq!(config.tick_interval, Duration::from_millis(5));
        assert_eq!(config.greeting_name, "Ada");
    }

    #[test]
    fn malformed_number_is_rejected() {
        let err = OffloadConfig::from_lookup(lookup_from(&[("OFFLOAD_ITERATIONS", "ten")]))
            .unwrap_err();
        match err {
            ConfigError::InvalidValue { key, .. } => assert_eq!(key, "OFFLOAD_ITERATIONS"),
        }
    }

    #[test]
    fn zero_tick_is_rejected() {
        assert!(OffloadConfig::from_lookup(lookup_from(&[("OFFLOAD_TICK_MS", "0")])).is_err());
    }

    #[test]
    fn empty_target_is_rejected() {
        assert!(
            OffloadConfig::from_lookup(lookup_from(&[("OFFLOAD_WORKER_TARGET", "  ")])).is_err()
        );
    }
}
