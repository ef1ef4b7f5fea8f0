//! Worker pool configuration.

use serde::{Deserialize, Serialize};

use super::env_or;

/// Worker thread pool configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerPoolConfig {
    /// Number of dedicated OS threads.
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    /// Jobs that may wait for a free worker before submission is rejected.
    #[serde(default = "default_max_queue_depth")]
    pub max_queue_depth: usize,
    /// Stack size of each worker thread, in bytes.
    #[serde(default = "default_thread_stack_size")]
    pub thread_stack_size: usize,
    /// Prefix for worker thread names.
    #[serde(default = "default_thread_name")]
    pub thread_name: String,
}

fn default_worker_count() -> usize {
    num_cpus::get().max(1)
}

const fn default_max_queue_depth() -> usize {
    1024
}

const fn default_thread_stack_size() -> usize {
    2 * 1024 * 1024
}

fn default_thread_name() -> String {
    "asyncx-worker".into()
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
            max_queue_depth: default_max_queue_depth(),
            thread_stack_size: default_thread_stack_size(),
            thread_name: default_thread_name(),
        }
    }
}

impl WorkerPoolConfig {
    /// Start from defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of worker threads.
    #[must_use]
    pub const fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Set the queue depth.
    #[must_use]
    pub const fn with_max_queue_depth(mut self, max_queue_depth: usize) -> Self {
        self.max_queue_depth = max_queue_depth;
        self
    }

    /// Set the worker stack size.
    #[must_use]
    pub const fn with_thread_stack_size(mut self, thread_stack_size: usize) -> Self {
        self.thread_stack_size = thread_stack_size;
        self
    }

    /// Set the worker thread name prefix.
    #[must_use]
    pub fn with_thread_name(mut self, thread_name: impl Into<String>) -> Self {
        self.thread_name = thread_name.into();
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.worker_count == 0 {
            return Err("worker_count must be greater than 0".into());
        }
        if self.max_queue_depth == 0 {
            return Err("max_queue_depth must be greater than 0".into());
        }
        if self.thread_stack_size < 64 * 1024 {
            return Err("thread_stack_size must be at least 64 KiB".into());
        }
        Ok(())
    }

    /// Build from `ASYNCX_WORKER_COUNT` and `ASYNCX_WORKER_QUEUE_DEPTH`.
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();
        let cfg = Self {
            worker_count: env_or("ASYNCX_WORKER_COUNT", defaults.worker_count)?,
            max_queue_depth: env_or("ASYNCX_WORKER_QUEUE_DEPTH", defaults.max_queue_depth)?,
            ..defaults
        };
        cfg.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_methods() {
        let cfg = WorkerPoolConfig::new()
            .with_worker_count(3)
            .with_max_queue_depth(7)
            .with_thread_name("io");
        assert_eq!(cfg.worker_count, 3);
        assert_eq!(cfg.max_queue_depth, 7);
        assert_eq!(cfg.thread_name, "io");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_invalid_values() {
        assert!(WorkerPoolConfig::new().with_worker_count(0).validate().is_err());
        assert!(WorkerPoolConfig::new().with_max_queue_depth(0).validate().is_err());
        assert!(WorkerPoolConfig::new()
            .with_thread_stack_size(1024)
            .validate()
            .is_err());
    }

    #[test]
    fn test_default_uses_available_cpus() {
        assert!(WorkerPoolConfig::default().worker_count >= 1);
    }
}
