//! Bridges between blocking and asynchronous execution contexts.
//!
//! A [`Callable`] is either blocking or asynchronous. [`sync_to_async`] turns
//! any callable into an [`AsyncFn`] and [`async_to_sync`] turns any callable
//! into a [`BlockingFn`]; each returns callables that are already of the
//! target kind unchanged.
//!
//! Bridged callables report their own failures through `E`. Failures of the
//! bridge itself (worker panics, wait bound exceeded) arrive through the same
//! channel via `E: From<BridgeError>`, which `anyhow::Error` satisfies.
//!
//! ```rust,ignore
//! use asyncx::bridge::{sync_to_async, Callable, SyncToAsyncOptions};
//!
//! let add = Callable::blocking(|(x, y): (i32, i32)| -> anyhow::Result<i32> {
//!     std::thread::sleep(std::time::Duration::from_millis(100));
//!     Ok(x + y)
//! });
//! let add = sync_to_async(add, SyncToAsyncOptions::default());
//! assert_eq!(add((1, 2)).await?, 3);
//! ```

pub mod async_to_sync;
pub mod sync_to_async;

pub use async_to_sync::{async_to_sync, call_in, AsyncToSyncOptions};
pub use sync_to_async::{sync_to_async, SyncToAsyncOptions};

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

/// Asynchronous callable taking `A` and resolving to `Result<T, E>`.
pub type AsyncFn<A, T, E> = Arc<dyn Fn(A) -> BoxFuture<'static, Result<T, E>> + Send + Sync>;

/// Blocking callable taking `A` and returning `Result<T, E>`.
pub type BlockingFn<A, T, E> = Arc<dyn Fn(A) -> Result<T, E> + Send + Sync>;

/// A callable that is either blocking or asynchronous.
///
/// Multiple arguments are passed as a tuple; named arguments as a struct.
pub enum Callable<A, T, E> {
    /// Runs to completion on the calling thread.
    Blocking(BlockingFn<A, T, E>),
    /// Returns a future that suspends rather than blocks.
    Async(AsyncFn<A, T, E>),
}

impl<A, T, E> Callable<A, T, E>
where
    A: 'static,
    T: 'static,
    E: 'static,
{
    /// Wrap a blocking closure.
    pub fn blocking<F>(f: F) -> Self
    where
        F: Fn(A) -> Result<T, E> + Send + Sync + 'static,
    {
        Self::Blocking(Arc::new(f))
    }

    /// Wrap an async closure or `async fn`.
    pub fn async_fn<F, Fut>(f: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self::Async(Arc::new(move |args| -> BoxFuture<'static, Result<T, E>> {
            Box::pin(f(args))
        }))
    }
}

impl<A, T, E> Callable<A, T, E> {
    /// True for [`Callable::Async`].
    #[must_use]
    pub const fn is_async(&self) -> bool {
        matches!(self, Self::Async(_))
    }
}

impl<A, T, E> Clone for Callable<A, T, E> {
    fn clone(&self) -> Self {
        match self {
            Self::Blocking(f) => Self::Blocking(Arc::clone(f)),
            Self::Async(f) => Self::Async(Arc::clone(f)),
        }
    }
}

impl<A, T, E> fmt::Debug for Callable<A, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blocking(_) => f.write_str("Callable::Blocking"),
            Self::Async(_) => f.write_str("Callable::Async"),
        }
    }
}

impl<A, T, E> From<AsyncFn<A, T, E>> for Callable<A, T, E> {
    fn from(f: AsyncFn<A, T, E>) -> Self {
        Self::Async(f)
    }
}

impl<A, T, E> From<BlockingFn<A, T, E>> for Callable<A, T, E> {
    fn from(f: BlockingFn<A, T, E>) -> Self {
        Self::Blocking(f)
    }
}
