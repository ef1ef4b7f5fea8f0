//! Core scheduling abstractions: tasks, the concurrency limiter, the
//! scheduler itself and the worker pool used by the bridges.

pub mod audit;
pub mod error;
pub mod limiter;
pub mod scheduler;
pub mod task;
pub mod worker_pool;

pub use audit::{
    build_audit_event, AuditAction, AuditEvent, AuditSink, InMemoryAuditSink, SharedAuditSink,
};
pub use error::{BridgeError, FailureCause, SchedulerError, TaskError};
pub use limiter::{ConcurrencyLimiter, LimiterPermit};
pub use scheduler::{SchedulerStats, TaskScheduler};
pub use task::{Task, Work};
pub use worker_pool::{JobHandle, PoolError, PoolStats, WorkerPool};
