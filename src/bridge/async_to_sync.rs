//! Call async callables from blocking code.
//!
//! How the call is driven depends on the [`LoopContext`] of the caller:
//!
//! | context                   | strategy                                             |
//! |---------------------------|------------------------------------------------------|
//! | no loop                   | private current-thread runtime, `block_on`           |
//! | loop on other threads     | spawn onto it, wait up to the bound                  |
//! | inside a multi-thread loop| `block_in_place`, spawn onto it, wait up to the bound|
//! | inside a current-thread loop | helper thread with its own runtime, wait up to the bound |
//!
//! In the last case the caller's loop is blocked for the duration of the
//! call; the helper runtime never touches it.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, RecvTimeoutError};
use futures::future::BoxFuture;
use tokio::runtime::{Builder, Handle};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::config::{BridgeConfig, DEFAULT_BRIDGE_WAIT_MS};
use crate::core::BridgeError;
use crate::runtime::LoopContext;

use super::{AsyncFn, BlockingFn, Callable};

const HELPER_THREAD_NAME: &str = "asyncx-bridge";

/// How an async callable is driven from blocking code.
#[derive(Debug, Clone)]
pub struct AsyncToSyncOptions {
    /// Longest a caller blocks on a running loop before giving up with
    /// [`BridgeError::Timeout`]. Does not apply when no loop is active.
    pub wait_timeout: Duration,
    /// Loop to submit to when the calling thread is not inside one.
    pub handle: Option<Handle>,
}

impl Default for AsyncToSyncOptions {
    fn default() -> Self {
        Self {
            wait_timeout: Duration::from_millis(DEFAULT_BRIDGE_WAIT_MS),
            handle: None,
        }
    }
}

impl AsyncToSyncOptions {
    /// Submit to `handle` when called off-loop.
    #[must_use]
    pub fn with_handle(mut self, handle: Handle) -> Self {
        self.handle = Some(handle);
        self
    }

    /// Override the wait bound.
    #[must_use]
    pub const fn with_wait_timeout(mut self, wait_timeout: Duration) -> Self {
        self.wait_timeout = wait_timeout;
        self
    }
}

impl From<&BridgeConfig> for AsyncToSyncOptions {
    fn from(cfg: &BridgeConfig) -> Self {
        Self {
            wait_timeout: cfg.wait_timeout(),
            handle: None,
        }
    }
}

/// Expose `callable` as a blocking function with the same argument and result
/// types.
///
/// A blocking callable is returned as is. An async one is driven to
/// completion on each call according to the caller's [`LoopContext`], which
/// is detected at call time with `options.handle` as the off-loop fallback.
pub fn async_to_sync<A, T, E>(callable: Callable<A, T, E>, options: AsyncToSyncOptions) -> BlockingFn<A, T, E>
where
    A: Send + 'static,
    T: Send + 'static,
    E: From<BridgeError> + Send + 'static,
{
    match callable {
        Callable::Blocking(f) => f,
        Callable::Async(f) => Arc::new(move |args: A| {
            let ctx = LoopContext::detect(options.handle.as_ref());
            call_in(&f, args, &ctx, options.wait_timeout)
        }),
    }
}

/// Run `f(args)` to completion from a blocking caller in context `ctx`.
///
/// # Errors
///
/// Whatever `f` returns, or, converted into `E`:
/// - [`BridgeError::Timeout`] if a running loop did not finish within `wait`
/// - [`BridgeError::Runtime`] if no runtime could be started or the submitted
///   task was lost
pub fn call_in<A, T, E>(f: &AsyncFn<A, T, E>, args: A, ctx: &LoopContext, wait: Duration) -> Result<T, E>
where
    T: Send + 'static,
    E: From<BridgeError> + Send + 'static,
{
    let fut = f(args);
    match ctx {
        LoopContext::None => {
            debug!("no active loop, driving a private runtime");
            let rt = Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| BridgeError::Runtime(e.to_string()))?;
            rt.block_on(fut)
        }
        LoopContext::Foreign(handle) => {
            debug!(?wait, "submitting to a loop on another thread");
            submit_and_wait(handle, fut, wait)
        }
        LoopContext::Inside(handle) if ctx.can_block_in_place() => {
            debug!(?wait, "blocking in place on a multi-thread loop");
            tokio::task::block_in_place(|| submit_and_wait(handle, fut, wait))
        }
        LoopContext::Inside(_) => {
            debug!(?wait, "inside a current-thread loop, using a helper thread");
            run_on_helper(fut, wait)
        }
    }
}

/// Spawn `fut` on `handle` and block the current thread on its outcome.
fn submit_and_wait<T, E>(handle: &Handle, fut: BoxFuture<'static, Result<T, E>>, wait: Duration) -> Result<T, E>
where
    T: Send + 'static,
    E: From<BridgeError> + Send + 'static,
{
    let (tx, rx) = bounded(1);
    let task = handle.spawn(async move {
        let _ = tx.send(fut.await);
    });

    match rx.recv_timeout(wait) {
        Ok(outcome) => outcome,
        Err(RecvTimeoutError::Timeout) => {
            warn!(?wait, "event loop did not finish in time, cancelling");
            task.abort();
            Err(BridgeError::Timeout { waited: wait }.into())
        }
        Err(RecvTimeoutError::Disconnected) => Err(BridgeError::Runtime(
            "submitted task panicked or was cancelled".into(),
        )
        .into()),
    }
}

/// Drive `fut` on a fresh runtime in a helper thread and block on its outcome.
fn run_on_helper<T, E>(fut: BoxFuture<'static, Result<T, E>>, wait: Duration) -> Result<T, E>
where
    T: Send + 'static,
    E: From<BridgeError> + Send + 'static,
{
    let (tx, rx) = bounded(1);
    let (cancel_tx, cancel_rx) = oneshot::channel::<()>();

    thread::Builder::new()
        .name(HELPER_THREAD_NAME.into())
        .spawn(move || {
            let rt = match Builder::new_current_thread().enable_all().build() {
                Ok(rt) => rt,
                Err(e) => {
                    let _ = tx.send(Err(BridgeError::Runtime(e.to_string()).into()));
                    return;
                }
            };
            rt.block_on(async move {
                tokio::select! {
                    outcome = fut => {
                        let _ = tx.send(outcome);
                    }
                    // Sender dropped: the caller stopped waiting.
                    _ = cancel_rx => {}
                }
            });
        })
        .map_err(|e| BridgeError::Runtime(format!("failed to spawn helper thread: {e}")))?;

    match rx.recv_timeout(wait) {
        Ok(outcome) => outcome,
        Err(RecvTimeoutError::Timeout) => {
            warn!(?wait, "helper loop did not finish in time, cancelling");
            drop(cancel_tx);
            Err(BridgeError::Timeout { waited: wait }.into())
        }
        Err(RecvTimeoutError::Disconnected) => Err(BridgeError::Runtime(
            "helper thread exited without a result".into(),
        )
        .into()),
    }
}
