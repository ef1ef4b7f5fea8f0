//! Native implementation of `WorkerPool` using OS threads.
//!
//! # Design Principles
//!
//! - **No polling**: workers block on channel recv; results travel over oneshot channels
//! - **Panic isolation**: a panicking job is reported to its caller, the worker survives
//! - **Clean shutdown**: dropping the sender lets workers drain the queue and exit

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::config::WorkerPoolConfig;
use crate::core::BridgeError;

use super::{panic_message, PoolCounters, PoolError, PoolStats};

/// A queued job. Returns false if the wrapped closure panicked.
type Job = Box<dyn FnOnce() -> bool + Send + 'static>;

/// How long `shutdown` waits for each worker to exit.
const JOIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Pause between attempts while `run` waits for queue space.
const QUEUE_RETRY_INTERVAL: Duration = Duration::from_millis(1);

/// Distinguishes threads of different pools in logs and thread names.
static POOL_ID: AtomicUsize = AtomicUsize::new(0);

/// Pending outcome of a submitted job.
#[derive(Debug)]
pub struct JobHandle<R> {
    rx: oneshot::Receiver<thread::Result<R>>,
}

impl<R> JobHandle<R> {
    /// Wait for the job without blocking the runtime thread.
    ///
    /// # Errors
    ///
    /// - `BridgeError::WorkerPanicked` if the closure panicked
    /// - `BridgeError::WorkerUnavailable` if the job was dropped unrun
    pub async fn join(self) -> Result<R, BridgeError> {
        match self.rx.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(payload)) => Err(BridgeError::WorkerPanicked(panic_message(payload.as_ref()))),
            Err(_) => Err(BridgeError::WorkerUnavailable(
                "worker exited before running the job".into(),
            )),
        }
    }
}

/// Worker pool with dedicated OS threads for blocking work.
///
/// # Design
///
/// - **No polling**: Workers block on channel recv
/// - **Clean shutdown**: Dropping sender naturally unblocks all workers
/// - **Lock-free fast path**: Atomic counters
pub struct WorkerPool {
    /// Pool configuration.
    config: WorkerPoolConfig,

    /// Job sender (to workers). Option allows clean shutdown by dropping.
    task_tx: Mutex<Option<Sender<Job>>>,

    /// Pool statistics counters (lock-free atomics).
    counters: Arc<PoolCounters>,

    /// Shutdown flag (lock-free atomic).
    shutdown: AtomicBool,

    /// Worker thread handles.
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Create a new worker pool with the given configuration.
    ///
    /// This spawns `config.worker_count` named OS threads.
    ///
    /// # Errors
    ///
    /// - `PoolError::InvalidConfig` if the configuration is invalid
    /// - `PoolError::Internal` if a thread could not be spawned
    pub fn new(config: WorkerPoolConfig) -> Result<Self, PoolError> {
        config.validate().map_err(PoolError::InvalidConfig)?;

        let (task_tx, task_rx) = bounded::<Job>(config.max_queue_depth);
        let counters = Arc::new(PoolCounters::default());
        let pool_id = POOL_ID.fetch_add(1, Ordering::Relaxed);

        let mut workers = Vec::with_capacity(config.worker_count);
        for worker_id in 0..config.worker_count {
            let spawned = spawn_worker(
                &config,
                pool_id,
                worker_id,
                task_rx.clone(),
                Arc::clone(&counters),
            );
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    // Closing the channel releases the workers already started.
                    drop(task_tx);
                    return Err(PoolError::Internal(format!(
                        "failed to spawn worker {worker_id}: {e}"
                    )));
                }
            }
        }

        debug!(
            pool_id = pool_id,
            worker_count = config.worker_count,
            max_queue_depth = config.max_queue_depth,
            "WorkerPool initialized"
        );

        Ok(Self {
            config,
            task_tx: Mutex::new(Some(task_tx)),
            counters,
            shutdown: AtomicBool::new(false),
            workers: Mutex::new(workers),
        })
    }

    /// Queue a blocking closure. Never blocks; fails fast if the queue is full.
    ///
    /// # Errors
    ///
    /// - `PoolError::QueueFull` if the job queue is full
    /// - `PoolError::PoolShutdown` if the pool has been shut down
    pub fn submit<F, R>(&self, f: F) -> Result<JobHandle<R>, PoolError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (job, handle) = package(f);
        match self.enqueue(job) {
            Ok(()) => Ok(handle),
            Err((PoolError::QueueFull, _)) => {
                warn!("Worker pool queue is full");
                Err(PoolError::QueueFull)
            }
            Err((e, _)) => Err(e),
        }
    }

    /// Run a blocking closure on a worker and await its result.
    ///
    /// Unlike [`submit`](Self::submit), a full queue is not an error: the
    /// caller is suspended until a slot opens.
    ///
    /// # Errors
    ///
    /// Any [`BridgeError`] from submission or from the worker.
    pub async fn run<F, R>(&self, f: F) -> Result<R, BridgeError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (mut job, handle) = package(f);
        loop {
            match self.enqueue(job) {
                Ok(()) => break,
                Err((PoolError::QueueFull, returned)) => {
                    job = returned;
                    tokio::time::sleep(QUEUE_RETRY_INTERVAL).await;
                }
                Err((e, _)) => return Err(BridgeError::WorkerUnavailable(e.to_string())),
            }
        }
        handle.join().await
    }

    /// Hand a packaged job to the workers, giving it back if it was refused.
    fn enqueue(&self, job: Job) -> Result<(), (PoolError, Job)> {
        if self.shutdown.load(Ordering::Acquire) {
            return Err((PoolError::PoolShutdown, job));
        }

        let task_tx_guard = self.task_tx.lock();
        let Some(task_tx) = task_tx_guard.as_ref() else {
            return Err((PoolError::PoolShutdown, job));
        };

        match task_tx.try_send(job) {
            Ok(()) => {
                self.counters.submitted_jobs.fetch_add(1, Ordering::Relaxed);
                self.counters.queued_jobs.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(TrySendError::Full(job)) => Err((PoolError::QueueFull, job)),
            Err(TrySendError::Disconnected(job)) => Err((PoolError::PoolShutdown, job)),
        }
    }

    /// Number of worker threads.
    #[must_use]
    pub const fn worker_count(&self) -> usize {
        self.config.worker_count
    }

    /// True once `shutdown` has been called or the pool was dropped.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Get current pool statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot(self.config.worker_count)
    }

    /// Shut down the pool gracefully with timeout.
    ///
    /// Queued jobs still run. Workers that don't exit within the timeout are
    /// detached to prevent hangs.
    pub fn shutdown(&self) {
        if self.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }

        info!("Shutting down worker pool");
        self.task_tx.lock().take();

        let mut workers = self.workers.lock();
        let worker_count = workers.len();

        for (idx, worker) in workers.drain(..).enumerate() {
            // Join through a helper thread so a stuck worker cannot hang us.
            let (tx, rx) = crossbeam_channel::bounded(1);
            let join_thread = thread::spawn(move || {
                let result = worker.join();
                let _ = tx.send(result.is_ok());
            });

            match rx.recv_timeout(JOIN_TIMEOUT) {
                Ok(true) => debug!(worker_id = idx, "Worker joined successfully"),
                Ok(false) => warn!(worker_id = idx, "Worker panicked"),
                Err(_) => {
                    warn!(worker_id = idx, "Worker did not exit within timeout - detaching");
                    continue;
                }
            }
            let _ = join_thread.join();
        }

        info!(worker_count = worker_count, "Worker pool shut down complete");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Signal shutdown but don't join: workers finish queued jobs and exit
        // on their own.
        if !self.shutdown.swap(true, Ordering::AcqRel) {
            self.task_tx.lock().take();
            debug!("WorkerPool dropped without explicit shutdown - workers will be detached");
        }
    }
}

/// Wrap `f` so its outcome, or its panic, reaches the returned handle.
fn package<F, R>(f: F) -> (Job, JobHandle<R>)
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    let job: Job = Box::new(move || {
        let outcome = panic::catch_unwind(AssertUnwindSafe(f));
        let ok = outcome.is_ok();
        // Receiver gone means the caller stopped waiting.
        let _ = tx.send(outcome);
        ok
    });
    (job, JobHandle { rx })
}

/// Spawn a worker thread.
fn spawn_worker(
    config: &WorkerPoolConfig,
    pool_id: usize,
    worker_id: usize,
    task_rx: Receiver<Job>,
    counters: Arc<PoolCounters>,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("{}-{pool_id}-{worker_id}", config.thread_name))
        .stack_size(config.thread_stack_size)
        .spawn(move || {
            debug!(pool_id, worker_id, "Worker thread started");

            // Blocking recv; returns Err once every sender is gone and the
            // queue is drained.
            while let Ok(job) = task_rx.recv() {
                counters.queued_jobs.fetch_sub(1, Ordering::Relaxed);
                counters.active_jobs.fetch_add(1, Ordering::Relaxed);

                let ok = job();

                counters.active_jobs.fetch_sub(1, Ordering::Relaxed);
                if ok {
                    counters.completed_jobs.fetch_add(1, Ordering::Relaxed);
                } else {
                    counters.panicked_jobs.fetch_add(1, Ordering::Relaxed);
                    warn!(pool_id, worker_id, "Job panicked");
                }
            }

            debug!(pool_id, worker_id, "Worker thread exiting");
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn small_pool(workers: usize) -> WorkerPool {
        WorkerPool::new(
            WorkerPoolConfig::new()
                .with_worker_count(workers)
                .with_max_queue_depth(16),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_worker_pool_basic() {
        let pool = small_pool(2);
        assert_eq!(pool.run(|| 1 + 2).await.unwrap(), 3);

        let stats = pool.stats();
        assert_eq!(stats.submitted_jobs, 1);
        assert_eq!(stats.worker_count, 2);
        pool.shutdown();
        assert_eq!(pool.stats().completed_jobs, 1);
    }

    #[tokio::test]
    async fn test_jobs_run_off_the_runtime_thread() {
        let pool = small_pool(1);
        let caller = thread::current().id();
        let (worker, name) = pool
            .run(|| {
                let t = thread::current();
                (t.id(), t.name().map(str::to_owned))
            })
            .await
            .unwrap();
        assert_ne!(worker, caller);
        assert!(name.unwrap().starts_with("asyncx-worker-"));
    }

    #[tokio::test]
    async fn test_panic_is_reported_and_worker_survives() {
        let pool = small_pool(1);
        let err = pool.run(|| -> u8 { panic!("kaboom") }).await.unwrap_err();
        assert!(matches!(err, BridgeError::WorkerPanicked(ref m) if m == "kaboom"));

        assert_eq!(pool.run(|| 5).await.unwrap(), 5);
        pool.shutdown();
        assert_eq!(pool.stats().panicked_jobs, 1);
    }

    #[tokio::test]
    async fn test_submit_after_shutdown_fails() {
        let pool = small_pool(1);
        pool.shutdown();
        assert!(pool.is_shutdown());
        assert!(matches!(pool.submit(|| ()), Err(PoolError::PoolShutdown)));
        assert!(matches!(
            pool.run(|| ()).await,
            Err(BridgeError::WorkerUnavailable(_))
        ));
    }

    #[test]
    fn test_queue_full() {
        let pool = WorkerPool::new(
            WorkerPoolConfig::new()
                .with_worker_count(1)
                .with_max_queue_depth(1),
        )
        .unwrap();
        let (release_tx, release_rx) = crossbeam_channel::bounded::<()>(0);
        let (started_tx, started_rx) = crossbeam_channel::bounded::<()>(0);

        // Occupy the single worker, then fill the single queue slot.
        let _busy = pool
            .submit(move || {
                let _ = started_tx.send(());
                let _ = release_rx.recv();
            })
            .unwrap();
        started_rx.recv().unwrap();
        let _queued = pool.submit(|| ()).unwrap();

        assert!(matches!(pool.submit(|| ()), Err(PoolError::QueueFull)));
        drop(release_tx);
        pool.shutdown();
    }

    #[tokio::test]
    async fn test_run_waits_for_queue_space() {
        let pool = WorkerPool::new(
            WorkerPoolConfig::new()
                .with_worker_count(1)
                .with_max_queue_depth(1),
        )
        .unwrap();
        let slow = |v: u32| {
            move || {
                thread::sleep(Duration::from_millis(20));
                v
            }
        };

        let (a, b, c) = tokio::join!(pool.run(slow(1)), pool.run(slow(2)), pool.run(slow(3)));
        assert_eq!((a.unwrap(), b.unwrap(), c.unwrap()), (1, 2, 3));
        pool.shutdown();
        assert_eq!(pool.stats().completed_jobs, 3);
    }

    #[test]
    fn test_invalid_config() {
        let result = WorkerPool::new(WorkerPoolConfig::new().with_worker_count(0));
        assert!(matches!(result, Err(PoolError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_pools_get_distinct_thread_names() {
        let a = small_pool(1);
        let b = small_pool(1);
        let name = || thread::current().name().map(str::to_owned);
        let names: HashSet<_> = [a.run(name).await.unwrap(), b.run(name).await.unwrap()]
            .into_iter()
            .collect();
        assert_eq!(names.len(), 2);
    }
}
