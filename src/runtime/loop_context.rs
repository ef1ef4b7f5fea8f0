//! Explicit description of the event loop a blocking caller is running in.
//!
//! The async-to-sync bridge needs to know whether a loop is active and
//! whether the calling thread is one of that loop's own threads. Rather than
//! probing ambient state deep inside the bridge, callers pass a
//! [`LoopContext`], either built by hand or taken from
//! [`LoopContext::detect`] at the call boundary.

use std::fmt;

use tokio::runtime::{Handle, RuntimeFlavor};

/// The execution context a blocking call is made from.
#[derive(Clone, Default)]
pub enum LoopContext {
    /// No event loop is active; the bridge may drive a private one.
    #[default]
    None,
    /// A loop is running on other threads; the calling thread is not part of it
    /// and may block while the loop does the work.
    Foreign(Handle),
    /// The calling thread is itself executing inside this loop, so the loop
    /// must not be driven directly from here.
    Inside(Handle),
}

impl LoopContext {
    /// Describe the current thread. `fallback` names a loop running elsewhere
    /// that work may be submitted to when the current thread is not inside one.
    #[must_use]
    pub fn detect(fallback: Option<&Handle>) -> Self {
        match Handle::try_current() {
            Ok(handle) => Self::Inside(handle),
            Err(_) => fallback.map_or(Self::None, |h| Self::Foreign(h.clone())),
        }
    }

    /// A loop running on other threads.
    #[must_use]
    pub const fn foreign(handle: Handle) -> Self {
        Self::Foreign(handle)
    }

    /// True when any loop is active.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Handle of the active loop, if any.
    #[must_use]
    pub const fn handle(&self) -> Option<&Handle> {
        match self {
            Self::None => None,
            Self::Foreign(h) | Self::Inside(h) => Some(h),
        }
    }

    /// True when the calling thread belongs to a multi-threaded loop, where a
    /// worker may hand its other tasks off and block in place.
    #[must_use]
    pub fn can_block_in_place(&self) -> bool {
        matches!(self, Self::Inside(h) if h.runtime_flavor() == RuntimeFlavor::MultiThread)
    }
}

impl fmt::Debug for LoopContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Foreign(h) => write!(f, "Foreign({:?})", h.runtime_flavor()),
            Self::Inside(h) => write!(f, "Inside({:?})", h.runtime_flavor()),
        }
    }
}
