//! Task descriptors and the unit-of-work abstraction.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

/// Abstraction for an asynchronous unit of work producing `T`.
///
/// The scheduler may invoke `run` more than once for the same task (for
/// example when a batch is resubmitted); idempotence is the implementor's
/// concern.
///
/// Any `Fn() -> impl Future<Output = anyhow::Result<T>>` closure is a `Work`:
///
/// ```rust,ignore
/// use asyncx::core::Task;
///
/// let task = Task::new("fetch", || async { Ok::<_, anyhow::Error>(42) });
/// ```
#[async_trait]
pub trait Work<T>: Send + Sync + 'static {
    /// Run the work once.
    async fn run(&self) -> anyhow::Result<T>;
}

#[async_trait]
impl<T, F, Fut> Work<T> for F
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
{
    async fn run(&self) -> anyhow::Result<T> {
        (self)().await
    }
}

/// A named, immutable unit of asynchronous work with a priority and an
/// optional timeout.
pub struct Task<T> {
    name: String,
    priority: i64,
    timeout: Option<Duration>,
    work: Arc<dyn Work<T>>,
}

impl<T: Send + 'static> Task<T> {
    /// Create a task with priority 0 and no timeout from an async closure.
    pub fn new<F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        Self::from_work(name, f)
    }

    /// Create a task from any [`Work`] implementation.
    pub fn from_work<W>(name: impl Into<String>, work: W) -> Self
    where
        W: Work<T>,
    {
        Self {
            name: name.into(),
            priority: 0,
            timeout: None,
            work: Arc::new(work),
        }
    }

    /// Create a task whose work receives `args` on every invocation.
    ///
    /// The arguments are bound here and never change afterwards; each run
    /// gets its own clone. Use a tuple for positional arguments or a struct
    /// for named ones.
    pub fn with_args<A, F, Fut>(name: impl Into<String>, f: F, args: A) -> Self
    where
        A: Clone + Send + Sync + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        Self::new(name, move || f(args.clone()))
    }
}

impl<T> Task<T> {
    /// Set the priority. Higher values are dispatched earlier.
    #[must_use]
    pub const fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    /// Abort the task if it runs longer than `timeout`.
    ///
    /// A zero duration means no timeout of its own; the scheduler's default,
    /// if any, applies instead.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = if timeout.is_zero() { None } else { Some(timeout) };
        self
    }

    /// Task name, the key for results and errors.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Scheduling priority.
    #[must_use]
    pub const fn priority(&self) -> i64 {
        self.priority
    }

    /// Configured timeout, if any.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Shared handle to the work.
    pub(crate) fn work(&self) -> Arc<dyn Work<T>> {
        Arc::clone(&self.work)
    }
}

impl<T> Clone for Task<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            priority: self.priority,
            timeout: self.timeout,
            work: Arc::clone(&self.work),
        }
    }
}

impl<T> fmt::Debug for Task<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_closure_is_work() {
        let task = Task::new("answer", || async { Ok(42_u32) });
        assert_eq!(task.name(), "answer");
        assert_eq!(task.priority(), 0);
        assert!(task.timeout().is_none());
        assert_eq!(task.work().run().await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_args_are_bound_once_and_reused() {
        async fn add((x, y): (i32, i32)) -> anyhow::Result<i32> {
            Ok(x + y)
        }
        let task = Task::with_args("add", add, (2, 3))
            .with_priority(5)
            .with_timeout(Duration::from_secs(1));
        let work = task.work();
        assert_eq!(work.run().await.unwrap(), 5);
        assert_eq!(work.run().await.unwrap(), 5);
        assert_eq!(task.priority(), 5);
        assert_eq!(task.timeout(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_zero_timeout_means_none() {
        let task = Task::new("t", || async { Ok(()) })
            .with_timeout(Duration::from_secs(1))
            .with_timeout(Duration::ZERO);
        assert!(task.timeout().is_none());
    }

    #[test]
    fn test_debug_hides_work() {
        let task = Task::new("dbg", || async { Ok(()) }).with_priority(-1);
        let text = format!("{task:?}");
        assert!(text.contains("dbg"));
        assert!(text.contains("-1"));
    }
}
