//! Configuration models for the scheduler, worker pools, and bridges.

pub mod bridge;
pub mod scheduler;
pub mod worker_pool;

pub use bridge::{BridgeConfig, DEFAULT_BRIDGE_WAIT_MS};
pub use scheduler::{AsyncxConfig, SchedulerConfig, DEFAULT_MAX_CONCURRENT_TASKS};
pub use worker_pool::WorkerPoolConfig;

use std::str::FromStr;

/// Read `key` from the environment and parse it, keeping `default` when the
/// variable is absent.
pub(crate) fn env_or<T>(key: &str, default: T) -> Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| format!("{key}={raw:?} is invalid: {e}")),
        Err(_) => Ok(default),
    }
}
