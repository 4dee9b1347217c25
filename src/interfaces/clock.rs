// ============================================================================
// Clock Interface
// Timestamp source for matching and cancellation
// ============================================================================

use crate::domain::Timestamp;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Instant;

/// Monotonic nanosecond clock.
///
/// Every timestamp a book compares comes from one shared clock, so readings
/// from different threads are ordered consistently.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Nanoseconds elapsed since the clock was created
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Timestamp {
        Timestamp::try_from(self.origin.elapsed().as_nanos()).unwrap_or(Timestamp::MAX)
    }
}

/// Deterministic clock: each reading returns the previous one plus `step`
pub struct ManualClock {
    next: AtomicI64,
    step: i64,
}

impl ManualClock {
    pub fn new(start: Timestamp, step: i64) -> Self {
        Self {
            next: AtomicI64::new(start),
            step,
        }
    }

    /// Jump the clock to `at`; the next reading returns it
    pub fn set(&self, at: Timestamp) {
        self.next.store(at, Ordering::SeqCst);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.next.fetch_add(self.step, Ordering::SeqCst)
    }
}
