//! Concurrency limiter capping simultaneously in-flight tasks.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Caps the number of simultaneous holders at `capacity`.
///
/// Waiters are served in the order they started waiting, so acquisition
/// attempts issued in dispatch order are granted in dispatch order.
#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    capacity: usize,
    semaphore: Arc<Semaphore>,
    /// Lock-free count of current holders.
    in_flight: Arc<AtomicUsize>,
    /// Highest `in_flight` ever observed.
    peak: Arc<AtomicUsize>,
}

/// A held limiter slot. The slot is released when the permit is dropped,
/// which covers success, failure, timeout and cancellation alike.
#[derive(Debug)]
pub struct LimiterPermit {
    _permit: OwnedSemaphorePermit,
    in_flight: Arc<AtomicUsize>,
}

impl Drop for LimiterPermit {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

impl ConcurrencyLimiter {
    /// Create a limiter with `capacity` slots. A capacity of zero is raised
    /// to one so that acquisition can always make progress; anything above
    /// [`Semaphore::MAX_PERMITS`] is lowered to it.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = if capacity == 0 {
            tracing::warn!("limiter capacity 0 requested, using 1");
            1
        } else if capacity > Semaphore::MAX_PERMITS {
            tracing::warn!(
                requested = capacity,
                max = Semaphore::MAX_PERMITS,
                "limiter capacity above maximum, clamping"
            );
            Semaphore::MAX_PERMITS
        } else {
            capacity
        };
        Self {
            capacity,
            semaphore: Arc::new(Semaphore::new(capacity)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Wait for a free slot without blocking the runtime thread.
    ///
    /// Returns `None` only if the limiter has been closed.
    pub async fn acquire(&self) -> Option<LimiterPermit> {
        let permit = Arc::clone(&self.semaphore).acquire_owned().await.ok()?;
        Some(self.track(permit))
    }

    /// Take a slot if one is free right now.
    #[must_use]
    pub fn try_acquire(&self) -> Option<LimiterPermit> {
        let permit = Arc::clone(&self.semaphore).try_acquire_owned().ok()?;
        Some(self.track(permit))
    }

    fn track(&self, permit: OwnedSemaphorePermit) -> LimiterPermit {
        let now = self.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak.fetch_max(now, Ordering::AcqRel);
        LimiterPermit {
            _permit: permit,
            in_flight: Arc::clone(&self.in_flight),
        }
    }

    /// Maximum simultaneous holders.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently held.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Slots currently free.
    #[must_use]
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Highest number of simultaneous holders seen so far.
    #[must_use]
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::Acquire)
    }

    /// Forget the recorded peak.
    pub fn reset_peak(&self) {
        self.peak.store(self.in_flight(), Ordering::Release);
    }
}
