//! Sync/async bridge configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::env_or;

/// Bound on the blocking wait when a coroutine is submitted to a running loop.
pub const DEFAULT_BRIDGE_WAIT_MS: u64 = 30_000;

/// Bridge configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Upper bound on the async-to-sync blocking wait, in milliseconds.
    #[serde(default = "default_wait_timeout_ms")]
    pub wait_timeout_ms: u64,
    /// Run blocking callables on a dedicated worker rather than the shared
    /// blocking pool.
    #[serde(default = "default_thread_sensitive")]
    pub thread_sensitive: bool,
}

const fn default_wait_timeout_ms() -> u64 {
    DEFAULT_BRIDGE_WAIT_MS
}

const fn default_thread_sensitive() -> bool {
    true
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            wait_timeout_ms: DEFAULT_BRIDGE_WAIT_MS,
            thread_sensitive: true,
        }
    }
}

impl BridgeConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.wait_timeout_ms == 0 {
            return Err("wait_timeout_ms must be greater than 0".into());
        }
        Ok(())
    }

    /// Wait bound as a Duration.
    #[must_use]
    pub const fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    /// Build from `ASYNCX_BRIDGE_WAIT_MS` and `ASYNCX_THREAD_SENSITIVE`.
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();
        let cfg = Self {
            wait_timeout_ms: env_or("ASYNCX_BRIDGE_WAIT_MS", defaults.wait_timeout_ms)?,
            thread_sensitive: env_or("ASYNCX_THREAD_SENSITIVE", defaults.thread_sensitive)?,
        };
        cfg.validate()?;
        Ok(cfg)
    }
}
