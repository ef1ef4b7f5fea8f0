//! Priority-ordered, bounded-concurrency task scheduler.
//!
//! Tasks are accumulated with [`TaskScheduler::add_task`] and drained in one
//! batch by [`TaskScheduler::run_tasks`]. Dispatch follows priority (ties by
//! insertion order); completion order depends on each task's own duration.
//! Results and errors are recorded per task name.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::future::join_all;
use parking_lot::Mutex;
use tracing::{debug, info, warn, Instrument};

use crate::core::audit::{build_audit_event, AuditAction, AuditSink};
use crate::core::{ConcurrencyLimiter, Task, TaskError};
use crate::infra::queue::PriorityQueue;

/// Statistics about scheduler activity since construction or the last `clear`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Maximum concurrent executions.
    pub capacity: usize,
    /// Tasks handed to execution.
    pub dispatched: u64,
    /// Tasks that produced a result.
    pub succeeded: u64,
    /// Tasks whose work returned an error.
    pub failed: u64,
    /// Tasks that exceeded their timeout.
    pub timed_out: u64,
    /// Highest number of simultaneously running task bodies.
    pub peak_in_flight: usize,
}

/// Internal counters for scheduler statistics (thread-safe).
#[derive(Debug, Default)]
struct SchedulerCounters {
    dispatched: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    timed_out: AtomicU64,
}

impl SchedulerCounters {
    fn reset(&self) {
        self.dispatched.store(0, Ordering::Relaxed);
        self.succeeded.store(0, Ordering::Relaxed);
        self.failed.store(0, Ordering::Relaxed);
        self.timed_out.store(0, Ordering::Relaxed);
    }
}

/// Runs asynchronous tasks by priority under a concurrency cap and collects
/// one result or one error per task name.
///
/// All state sits behind short `parking_lot` critical sections that are never
/// held across an await point, so the scheduler can be shared by reference
/// between the futures of a batch.
///
/// ```rust,ignore
/// use asyncx::core::{Task, TaskScheduler};
///
/// let scheduler = TaskScheduler::new(10);
/// scheduler.add_task(Task::new("low", || async { Ok(1) }).with_priority(1));
/// scheduler.add_task(Task::new("high", || async { Ok(3) }).with_priority(3));
/// let results = scheduler.run_tasks(None).await;
/// assert_eq!(results["high"], 3);
/// ```
pub struct TaskScheduler<T> {
    limiter: ConcurrencyLimiter,
    default_timeout: Option<Duration>,
    /// Pending tasks in dispatch order.
    pending: Mutex<PriorityQueue<T>>,
    results: Mutex<HashMap<String, T>>,
    errors: Mutex<HashMap<String, TaskError>>,
    counters: SchedulerCounters,
    audit: Option<Mutex<Box<dyn AuditSink>>>,
}

impl<T> TaskScheduler<T>
where
    T: Clone + Send + 'static,
{
    /// Create a scheduler running at most `max_concurrent_tasks` tasks at once.
    #[must_use]
    pub fn new(max_concurrent_tasks: usize) -> Self {
        Self {
            limiter: ConcurrencyLimiter::new(max_concurrent_tasks),
            default_timeout: None,
            pending: Mutex::new(PriorityQueue::new()),
            results: Mutex::new(HashMap::new()),
            errors: Mutex::new(HashMap::new()),
            counters: SchedulerCounters::default(),
            audit: None,
        }
    }

    /// Attach an audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Box<dyn AuditSink>) -> Self {
        self.audit = Some(Mutex::new(audit));
        self
    }

    /// Timeout applied to tasks that do not carry their own.
    #[must_use]
    pub const fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    /// Maximum concurrent executions.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.limiter.capacity()
    }

    /// Queue a task for the next `run_tasks` call. Nothing runs yet.
    pub fn add_task(&self, task: Task<T>) {
        debug!(task = %task.name(), priority = task.priority(), "task queued");
        self.pending.lock().push(task);
    }

    /// Number of queued tasks.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Names of queued tasks in the order they would be dispatched.
    #[must_use]
    pub fn pending_order(&self) -> Vec<String> {
        self.pending.lock().order()
    }

    /// Execute exactly one task, waiting for a free slot first.
    ///
    /// The outcome is recorded under the task's name and also returned.
    ///
    /// # Errors
    ///
    /// - [`TaskError::Timeout`] if the task outlives its timeout
    /// - [`TaskError::Failed`] wrapping the work's own error
    pub async fn run_task(&self, task: Task<T>) -> Result<T, TaskError> {
        self.execute(task, None).await
    }

    /// Run a whole batch concurrently, bounded by the limiter.
    ///
    /// `Some(tasks)` replaces everything currently pending; `None` runs what
    /// was queued with [`add_task`](Self::add_task). Every popped task runs to
    /// an outcome: one failure never cancels its siblings. Returns the
    /// accumulated results; inspect [`get_errors`](Self::get_errors) for
    /// failures.
    pub async fn run_tasks(&self, tasks: Option<Vec<Task<T>>>) -> HashMap<String, T> {
        let batch = {
            let mut pending = self.pending.lock();
            if let Some(tasks) = tasks {
                pending.clear();
                for task in tasks {
                    pending.push(task);
                }
            }
            if pending.is_empty() {
                return HashMap::new();
            }
            std::iter::from_fn(|| pending.pop()).collect::<Vec<_>>()
        };

        let batch_id = uuid::Uuid::new_v4().to_string();
        let span = tracing::info_span!("batch", id = %batch_id, size = batch.len());

        async {
            info!("dispatching batch");
            let running: Vec<_> = batch
                .into_iter()
                .map(|task| {
                    self.record_audit(Some(batch_id.as_str()), &task, AuditAction::Dispatch, None);
                    self.counters.dispatched.fetch_add(1, Ordering::Relaxed);
                    debug!(task = %task.name(), priority = task.priority(), "dispatched");
                    self.execute_dispatched(task, Some(batch_id.as_str()))
                })
                .collect();

            let outcomes = join_all(running).await;
            let failed = outcomes.iter().filter(|o| o.is_err()).count();
            info!(
                succeeded = outcomes.len() - failed,
                failed = failed,
                "batch finished"
            );
        }
        .instrument(span)
        .await;

        self.get_results()
    }

    /// Snapshot of results recorded so far.
    #[must_use]
    pub fn get_results(&self) -> HashMap<String, T> {
        self.results.lock().clone()
    }

    /// Snapshot of failures recorded so far.
    #[must_use]
    pub fn get_errors(&self) -> HashMap<String, TaskError> {
        self.errors.lock().clone()
    }

    /// Drop pending tasks, results, errors and statistics.
    pub fn clear(&self) {
        self.pending.lock().clear();
        self.results.lock().clear();
        self.errors.lock().clear();
        self.counters.reset();
        self.limiter.reset_peak();
        debug!("scheduler cleared");
    }

    /// Get current scheduler statistics.
    #[must_use]
    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            capacity: self.limiter.capacity(),
            dispatched: self.counters.dispatched.load(Ordering::Relaxed),
            succeeded: self.counters.succeeded.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            timed_out: self.counters.timed_out.load(Ordering::Relaxed),
            peak_in_flight: self.limiter.peak(),
        }
    }

    async fn execute(&self, task: Task<T>, batch: Option<&str>) -> Result<T, TaskError> {
        self.record_audit(batch, &task, AuditAction::Dispatch, None);
        self.counters.dispatched.fetch_add(1, Ordering::Relaxed);
        self.execute_dispatched(task, batch).await
    }

    async fn execute_dispatched(&self, task: Task<T>, batch: Option<&str>) -> Result<T, TaskError> {
        // Held until this function returns, whichever way it returns.
        let Some(_permit) = self.limiter.acquire().await else {
            let err = TaskError::Resource(format!("limiter closed before {} could start", task.name()));
            self.errors.lock().insert(task.name().to_owned(), err.clone());
            return Err(err);
        };

        self.record_audit(batch, &task, AuditAction::Start, None);
        debug!(task = %task.name(), in_flight = self.limiter.in_flight(), "task started");

        let work = task.work();
        let outcome = match task.timeout().or(self.default_timeout) {
            Some(limit) => match tokio::time::timeout(limit, work.run()).await {
                Ok(outcome) => outcome.map_err(|e| TaskError::failed(task.name(), e)),
                Err(_) => Err(TaskError::Timeout {
                    name: task.name().to_owned(),
                    timeout: limit,
                }),
            },
            None => work.run().await.map_err(|e| TaskError::failed(task.name(), e)),
        };

        match &outcome {
            Ok(value) => {
                self.results.lock().insert(task.name().to_owned(), value.clone());
                self.counters.succeeded.fetch_add(1, Ordering::Relaxed);
                self.record_audit(batch, &task, AuditAction::Complete, None);
                debug!(task = %task.name(), "task completed");
            }
            Err(err) => {
                self.errors.lock().insert(task.name().to_owned(), err.clone());
                let action = if err.is_timeout() {
                    self.counters.timed_out.fetch_add(1, Ordering::Relaxed);
                    AuditAction::Timeout
                } else {
                    self.counters.failed.fetch_add(1, Ordering::Relaxed);
                    AuditAction::Fail
                };
                self.record_audit(batch, &task, action, Some(err.to_string()));
                warn!(task = %task.name(), error = %err, "task did not complete");
            }
        }
        outcome
    }

    /// Record an audit event (sync operation with parking_lot mutex).
    fn record_audit(
        &self,
        batch: Option<&str>,
        task: &Task<T>,
        action: AuditAction,
        detail: Option<String>,
    ) {
        if let Some(audit_sink) = &self.audit {
            audit_sink
                .lock()
                .record(build_audit_event(batch, task.name(), task.priority(), action, detail));
        }
    }
}

impl<T> Default for TaskScheduler<T>
where
    T: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MAX_CONCURRENT_TASKS)
    }
}
