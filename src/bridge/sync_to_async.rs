//! Run blocking callables from async code without blocking the runtime.

use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{debug, Instrument};

use crate::config::{BridgeConfig, WorkerPoolConfig};
use crate::core::worker_pool::panic_message;
use crate::core::{BridgeError, WorkerPool};

use super::{AsyncFn, BlockingFn, Callable};

/// Thread name prefix of the single-use worker created per call.
const SCOPED_WORKER_NAME: &str = "asyncx-sync";

/// How a blocking callable is offloaded.
#[derive(Clone)]
pub struct SyncToAsyncOptions {
    /// Run on a dedicated worker: `executor` if given, otherwise a
    /// single-thread pool created for the call and torn down after it.
    /// When false, run on tokio's shared blocking pool.
    pub thread_sensitive: bool,
    /// Caller-owned pool. Never shut down by the bridge.
    pub executor: Option<Arc<WorkerPool>>,
}

impl Default for SyncToAsyncOptions {
    fn default() -> Self {
        Self {
            thread_sensitive: true,
            executor: None,
        }
    }
}

impl SyncToAsyncOptions {
    /// Offload onto a caller-owned pool.
    #[must_use]
    pub fn with_executor(mut self, executor: Arc<WorkerPool>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Choose between a dedicated worker and the shared blocking pool.
    #[must_use]
    pub const fn with_thread_sensitive(mut self, thread_sensitive: bool) -> Self {
        self.thread_sensitive = thread_sensitive;
        self
    }
}

impl From<&BridgeConfig> for SyncToAsyncOptions {
    fn from(cfg: &BridgeConfig) -> Self {
        Self {
            thread_sensitive: cfg.thread_sensitive,
            executor: None,
        }
    }
}

/// Expose `callable` as an async function with the same argument and result
/// types.
///
/// An already-asynchronous callable is returned as is. A blocking one runs on
/// a worker thread per call while the awaiting task is suspended; its return
/// value or error is handed back to the awaiting task. Must be awaited inside
/// a tokio runtime.
pub fn sync_to_async<A, T, E>(callable: Callable<A, T, E>, options: SyncToAsyncOptions) -> AsyncFn<A, T, E>
where
    A: Send + 'static,
    T: Send + 'static,
    E: From<BridgeError> + Send + 'static,
{
    match callable {
        Callable::Async(f) => f,
        Callable::Blocking(f) => Arc::new(move |args: A| -> BoxFuture<'static, Result<T, E>> {
            let f = Arc::clone(&f);
            let options = options.clone();
            Box::pin(
                offload(f, args, options)
                    .instrument(tracing::debug_span!("sync_to_async")),
            )
        }),
    }
}

async fn offload<A, T, E>(f: BlockingFn<A, T, E>, args: A, options: SyncToAsyncOptions) -> Result<T, E>
where
    A: Send + 'static,
    T: Send + 'static,
    E: From<BridgeError> + Send + 'static,
{
    let job = move || f(args);

    let outcome = if !options.thread_sensitive {
        debug!("offloading to shared blocking pool");
        tokio::task::spawn_blocking(job).await.map_err(|e| {
            if e.is_panic() {
                BridgeError::WorkerPanicked(panic_message(e.into_panic().as_ref()))
            } else {
                BridgeError::WorkerUnavailable(e.to_string())
            }
        })
    } else if let Some(pool) = &options.executor {
        debug!(workers = pool.worker_count(), "offloading to caller pool");
        pool.run(job).await
    } else {
        debug!("offloading to scoped worker");
        let pool = WorkerPool::new(
            WorkerPoolConfig::new()
                .with_worker_count(1)
                .with_max_queue_depth(1)
                .with_thread_name(SCOPED_WORKER_NAME),
        )
        .map_err(|e| BridgeError::WorkerUnavailable(e.to_string()))?;
        // Dropped on every exit path, including cancellation of this future.
        pool.run(job).await
    };

    outcome.map_err(E::from)?
}
