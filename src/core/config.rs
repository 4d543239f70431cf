/*!
 * Runtime Configuration
 *
 * Tunables for a run: simulated state access delay, pool size and how many
 * job files the CLI processes at once. Values come from defaults, then the
 * environment, then explicit overrides.
 */

use super::errors::EmsError;
use super::limits::{
    DEFAULT_MAX_JOBS, DEFAULT_STATE_ACCESS_DELAY, DEFAULT_WORKERS, MAX_STATE_ACCESS_DELAY,
    MAX_WORKERS,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable holding the state access delay in milliseconds
pub const ENV_STATE_DELAY_MS: &str = "EMS_STATE_DELAY_MS";
/// Environment variable holding the worker count
pub const ENV_WORKERS: &str = "EMS_WORKERS";
/// Environment variable holding the concurrent job file limit
pub const ENV_MAX_JOBS: &str = "EMS_MAX_JOBS";

/// Kernel configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmsConfig {
    /// Sleep injected before every store lookup and seat access
    pub state_access_delay: Duration,
    /// Workers in the command pool
    pub workers: usize,
    /// Job files processed concurrently
    pub max_jobs: usize,
}

impl Default for EmsConfig {
    fn default() -> Self {
        Self {
            state_access_delay: DEFAULT_STATE_ACCESS_DELAY,
            workers: DEFAULT_WORKERS,
            max_jobs: DEFAULT_MAX_JOBS,
        }
    }
}

impl EmsConfig {
    /// Defaults overridden by `EMS_*` environment variables
    ///
    /// Values are parsed but not range-checked, so callers can still apply
    /// overrides before calling [`validate`](Self::validate).
    pub fn from_env() -> Result<Self, EmsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, EmsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_STATE_DELAY_MS) {
            config.state_access_delay = Duration::from_millis(parse_number(ENV_STATE_DELAY_MS, &raw)?);
        }
        if let Some(raw) = lookup(ENV_WORKERS) {
            config.workers = parse_number(ENV_WORKERS, &raw)? as usize;
        }
        if let Some(raw) = lookup(ENV_MAX_JOBS) {
            config.max_jobs = parse_number(ENV_MAX_JOBS, &raw)? as usize;
        }

        Ok(config)
    }

    pub fn with_state_access_delay(mut self, delay: Duration) -> Self {
        self.state_access_delay = delay;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_max_jobs(mut self, max_jobs: usize) -> Self {
        self.max_jobs = max_jobs;
        self
    }

    /// Check every value is within its limit
    pub fn validate(&self) -> Result<(), EmsError> {
        if self.workers == 0 || self.workers > MAX_WORKERS {
            return Err(EmsError::Configuration(format!(
                "workers must be between 1 and {}, got {}",
                MAX_WORKERS, self.workers
            )));
        }
        if self.max_jobs == 0 {
            return Err(EmsError::Configuration(
                "max_jobs must be at least 1".to_string(),
            ));
        }
        if self.state_access_delay > MAX_STATE_ACCESS_DELAY {
            return Err(EmsError::Configuration(format!(
                "state access delay {:?} exceeds {:?}",
                self.state_access_delay, MAX_STATE_ACCESS_DELAY
            )));
        }
        Ok(())
    }
}

fn parse_number(key: &str, raw: &str) -> Result<u64, EmsError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|e| EmsError::Configuration(format!("{}={:?}: {}", key, raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = EmsConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, EmsConfig::default());
    }

    #[test]
    fn test_env_overrides() {
        let config = EmsConfig::from_lookup(lookup(&[
            (ENV_STATE_DELAY_MS, "15"),
            (ENV_WORKERS, "8"),
            (ENV_MAX_JOBS, "2"),
        ]))
        .unwrap();

        assert_eq!(config.state_access_delay, Duration::from_millis(15));
        assert_eq!(config.workers, 8);
        assert_eq!(config.max_jobs, 2);
    }

    #[test]
    fn test_rejects_garbage_and_zero_workers() {
        assert!(EmsConfig::from_lookup(lookup(&[(ENV_WORKERS, "many")])).is_err());
        let zero = EmsConfig::from_lookup(lookup(&[(ENV_WORKERS, "0")])).unwrap();
        assert!(zero.validate().is_err());
        assert!(EmsConfig::default().with_max_jobs(0).validate().is_err());
    }

    #[test]
    fn test_override_fixes_out_of_range_env() {
        let config = EmsConfig::from_lookup(lookup(&[(ENV_WORKERS, "0"), (ENV_MAX_JOBS, "0")]))
            .unwrap()
            .with_workers(4)
            .with_max_jobs(2);
        assert!(config.validate().is_ok());
    }
}
