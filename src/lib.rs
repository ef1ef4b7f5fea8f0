//! # asyncx
//!
//! An in-process task layer for async Rust services.
//!
//! ## Core Problem Solved
//!
//! Services that fan out many small async jobs (fetches, lookups, model calls)
//! need to bound how many run at once, run the important ones first, and keep
//! one slow or failing job from taking down its siblings. They also keep
//! meeting code of the other colour: blocking libraries that must not stall
//! the runtime, and async clients that must be called from blocking code.
//!
//! ## Key Features
//!
//! - **Priority dispatch**: higher priority first, insertion order among equals
//! - **Bounded concurrency**: at most `max_concurrent_tasks` bodies in flight
//! - **Per-task timeouts**: a slow task is abandoned, its siblings continue
//! - **Failure isolation**: results and errors recorded per task name
//! - **Sync/async bridges**: offload blocking callables to worker threads, or
//!   drive async callables from blocking code with or without a running loop
//!
//! ## TaskScheduler
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use asyncx::core::{Task, TaskScheduler};
//!
//! let scheduler = TaskScheduler::new(2);
//! scheduler.add_task(Task::new("fetch", || async { Ok(fetch().await?) }).with_priority(3));
//! scheduler.add_task(
//!     Task::new("report", || async { Ok(report().await?) })
//!         .with_priority(1)
//!         .with_timeout(Duration::from_secs(5)),
//! );
//!
//! let results = scheduler.run_tasks(None).await;
//! for (name, err) in scheduler.get_errors() {
//!     tracing::warn!(%name, %err, "task failed");
//! }
//! ```
//!
//! ## Bridges
//!
//! ```rust,ignore
//! use asyncx::bridge::{async_to_sync, sync_to_async, AsyncToSyncOptions, Callable, SyncToAsyncOptions};
//!
//! let read = sync_to_async(Callable::blocking(read_file), SyncToAsyncOptions::default());
//! let bytes = read(path).await?;
//!
//! let get = async_to_sync(Callable::async_fn(http_get), AsyncToSyncOptions::default());
//! let body = get(url)?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling abstractions: tasks, limiter, scheduler, worker pool.
pub mod core;
/// Configuration models for the scheduler, bridges and worker pools.
pub mod config;
/// Builders to construct components from configuration.
pub mod builders;
/// Infrastructure adapters for pending-task storage.
pub mod infra;
/// Runtime adapters describing the event loop a caller runs in.
pub mod runtime;
/// Sync/async bridges.
pub mod bridge;
/// Shared utilities.
pub mod util;

pub use crate::bridge::{async_to_sync, sync_to_async, Callable};
pub use crate::core::{BridgeError, Task, TaskError, TaskScheduler};
