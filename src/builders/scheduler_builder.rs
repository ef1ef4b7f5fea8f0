//! Build schedulers, worker pools and bridge options from configuration.

use std::sync::Arc;

use tracing::info;

use crate::bridge::{AsyncToSyncOptions, SyncToAsyncOptions};
use crate::config::{BridgeConfig, SchedulerConfig, WorkerPoolConfig};
use crate::core::{AuditSink, SchedulerError, TaskScheduler, WorkerPool};

/// Build a scheduler from configuration, optionally attaching an audit sink.
///
/// # Errors
///
/// `SchedulerError::InvalidConfig` if `cfg` fails validation.
pub fn build_scheduler<T>(
    cfg: &SchedulerConfig,
    audit: Option<Box<dyn AuditSink>>,
) -> Result<TaskScheduler<T>, SchedulerError>
where
    T: Clone + Send + 'static,
{
    cfg.validate().map_err(SchedulerError::InvalidConfig)?;

    let mut scheduler = TaskScheduler::new(cfg.max_concurrent_tasks);
    if let Some(timeout) = cfg.default_timeout() {
        scheduler = scheduler.with_default_timeout(timeout);
    }
    if let Some(audit) = audit {
        scheduler = scheduler.with_audit(audit);
    }

    info!(
        max_concurrent_tasks = cfg.max_concurrent_tasks,
        default_timeout_ms = cfg.default_timeout_ms,
        "scheduler built"
    );
    Ok(scheduler)
}

/// Build a worker pool to share across sync-to-async calls.
///
/// # Errors
///
/// - `SchedulerError::InvalidConfig` if `cfg` fails validation
/// - `SchedulerError::Pool` if the worker threads could not be started
pub fn build_worker_pool(cfg: &WorkerPoolConfig) -> Result<Arc<WorkerPool>, SchedulerError> {
    cfg.validate().map_err(SchedulerError::InvalidConfig)?;
    let pool = WorkerPool::new(cfg.clone()).map_err(|e| SchedulerError::Pool(e.to_string()))?;
    Ok(Arc::new(pool))
}

/// Option sets for both bridges from one configuration.
///
/// # Errors
///
/// `SchedulerError::InvalidConfig` if `cfg` fails validation.
pub fn build_bridge_options(
    cfg: &BridgeConfig,
    executor: Option<Arc<WorkerPool>>,
) -> Result<(SyncToAsyncOptions, AsyncToSyncOptions), SchedulerError> {
    cfg.validate().map_err(SchedulerError::InvalidConfig)?;

    let mut to_async = SyncToAsyncOptions::from(cfg);
    to_async.executor = executor;
    Ok((to_async, AsyncToSyncOptions::from(cfg)))
}
