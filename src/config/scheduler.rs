//! Scheduler configuration structures.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use super::{env_or, BridgeConfig, WorkerPoolConfig};

/// Concurrency cap used when none is configured.
pub const DEFAULT_MAX_CONCURRENT_TASKS: usize = 10;

/// Task scheduler configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Maximum tasks executing at once.
    #[serde(default = "default_max_concurrent_tasks")]
    pub max_concurrent_tasks: usize,
    /// Timeout for tasks that carry none, in milliseconds.
    #[serde(default)]
    pub default_timeout_ms: Option<u64>,
}

const fn default_max_concurrent_tasks() -> usize {
    DEFAULT_MAX_CONCURRENT_TASKS
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: DEFAULT_MAX_CONCURRENT_TASKS,
            default_timeout_ms: None,
        }
    }
}

impl SchedulerConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrent_tasks == 0 {
            return Err("max_concurrent_tasks must be greater than 0".into());
        }
        if self.max_concurrent_tasks > Semaphore::MAX_PERMITS {
            return Err(format!(
                "max_concurrent_tasks must be at most {}",
                Semaphore::MAX_PERMITS
            ));
        }
        if self.default_timeout_ms == Some(0) {
            return Err("default_timeout_ms must be greater than 0 when set".into());
        }
        Ok(())
    }

    /// Default task timeout as a Duration.
    #[must_use]
    pub fn default_timeout(&self) -> Option<Duration> {
        self.default_timeout_ms.map(Duration::from_millis)
    }

    /// Parse scheduler configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build from `ASYNCX_MAX_CONCURRENT_TASKS` and `ASYNCX_DEFAULT_TIMEOUT_MS`.
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();
        let default_timeout_ms = match std::env::var("ASYNCX_DEFAULT_TIMEOUT_MS") {
            Ok(raw) => Some(
                raw.trim()
                    .parse()
                    .map_err(|e| format!("ASYNCX_DEFAULT_TIMEOUT_MS={raw:?} is invalid: {e}"))?,
            ),
            Err(_) => defaults.default_timeout_ms,
        };
        let cfg = Self {
            max_concurrent_tasks: env_or(
                "ASYNCX_MAX_CONCURRENT_TASKS",
                defaults.max_concurrent_tasks,
            )?,
            default_timeout_ms,
        };
        cfg.validate()?;
        Ok(cfg)
    }
}

/// Root configuration bundling the scheduler and bridge settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsyncxConfig {
    /// Scheduler settings.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Bridge settings.
    #[serde(default)]
    pub bridge: BridgeConfig,
    /// Shared worker pool settings.
    #[serde(default)]
    pub worker_pool: WorkerPoolConfig,
}

impl AsyncxConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<(), String> {
        self.scheduler
            .validate()
            .map_err(|e| format!("scheduler invalid: {e}"))?;
        self.bridge
            .validate()
            .map_err(|e| format!("bridge invalid: {e}"))?;
        self.worker_pool
            .validate()
            .map_err(|e| format!("worker_pool invalid: {e}"))
    }

    /// Parse configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load a `.env` file if present, then read every `ASYNCX_*` variable.
    pub fn from_env() -> Result<Self, String> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(format!(".env could not be read: {e}")),
        }
        Ok(Self {
            scheduler: SchedulerConfig::from_env()?,
            bridge: BridgeConfig::from_env()?,
            worker_pool: WorkerPoolConfig::from_env()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = SchedulerConfig::default();
        assert_eq!(cfg.max_concurrent_tasks, 10);
        assert_eq!(cfg.default_timeout(), None);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_invalid_values() {
        let zero = SchedulerConfig {
            max_concurrent_tasks: 0,
            ..SchedulerConfig::default()
        };
        assert!(zero.validate().is_err());

        let zero_timeout = SchedulerConfig {
            default_timeout_ms: Some(0),
            ..SchedulerConfig::default()
        };
        assert!(zero_timeout.validate().is_err());

        let oversized = SchedulerConfig {
            max_concurrent_tasks: usize::MAX,
            ..SchedulerConfig::default()
        };
        assert!(oversized.validate().is_err());
    }

    #[test]
    fn test_json_fills_defaults() {
        let cfg = SchedulerConfig::from_json_str(r#"{"default_timeout_ms": 250}"#).unwrap();
        assert_eq!(cfg.max_concurrent_tasks, DEFAULT_MAX_CONCURRENT_TASKS);
        assert_eq!(cfg.default_timeout(), Some(Duration::from_millis(250)));
        assert!(SchedulerConfig::from_json_str(r#"{"max_concurrent_tasks": 0}"#).is_err());
    }

    #[test]
    fn test_root_config_json() {
        let cfg = AsyncxConfig::from_json_str(
            r#"{"scheduler": {"max_concurrent_tasks": 2}, "bridge": {"wait_timeout_ms": 500}}"#,
        )
        .unwrap();
        assert_eq!(cfg.scheduler.max_concurrent_tasks, 2);
        assert_eq!(cfg.bridge.wait_timeout_ms, 500);
        assert!(cfg.worker_pool.worker_count >= 1);
        assert!(AsyncxConfig::from_json_str("{not json").is_err());
    }
}
