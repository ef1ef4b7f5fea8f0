//! Error types for scheduler and bridge operations.

use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Shared, cloneable cause of a task failure.
pub type FailureCause = Arc<dyn StdError + Send + Sync + 'static>;

/// Failures recorded against a task name by the scheduler.
#[derive(Debug, Clone, Error)]
pub enum TaskError {
    /// The task did not finish within its timeout and was abandoned.
    #[error("task {name} timed out after {timeout:?}")]
    Timeout {
        /// Name of the task.
        name: String,
        /// Timeout that elapsed.
        timeout: Duration,
    },
    /// The task's work returned an error.
    #[error("error in task {name}: {source}")]
    Failed {
        /// Name of the task.
        name: String,
        /// Original cause produced by the work.
        #[source]
        source: FailureCause,
    },
    /// Invalid priority value. Reserved; not raised by the scheduler today.
    #[error("priority violation: {0}")]
    Priority(String),
    /// Resource limit violation. Reserved; not raised by the scheduler today.
    #[error("resource limit exceeded: {0}")]
    Resource(String),
}

impl TaskError {
    /// Wrap a work error as a task failure for `name`.
    pub fn failed(name: impl Into<String>, cause: anyhow::Error) -> Self {
        let boxed: Box<dyn StdError + Send + Sync + 'static> = cause.into();
        Self::Failed {
            name: name.into(),
            source: Arc::from(boxed),
        }
    }

    /// Name of the task this failure belongs to, if any.
    #[must_use]
    pub fn task_name(&self) -> Option<&str> {
        match self {
            Self::Timeout { name, .. } | Self::Failed { name, .. } => Some(name),
            Self::Priority(_) | Self::Resource(_) => None,
        }
    }

    /// True for [`TaskError::Timeout`].
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Failures raised by the sync/async bridges themselves, as opposed to
/// errors produced by the bridged callable.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The blocking wait on a running loop exceeded its bound.
    #[error("operation timed out after {waited:?} while waiting for event loop")]
    Timeout {
        /// Bound that elapsed.
        waited: Duration,
    },
    /// The blocking callable panicked on its worker thread.
    #[error("worker panicked: {0}")]
    WorkerPanicked(String),
    /// No worker could accept the call (pool full or shut down).
    #[error("worker unavailable: {0}")]
    WorkerUnavailable(String),
    /// A private runtime could not be created or driven.
    #[error("runtime error: {0}")]
    Runtime(String),
}

/// Errors produced while building scheduler components.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Worker pool could not be constructed.
    #[error("worker pool error: {0}")]
    Pool(String),
}
