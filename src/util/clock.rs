//! Epoch-second clocks.

use std::fmt::Debug;
use std::sync::atomic::{AtomicI64, Ordering};

/// Current time as Unix epoch seconds.
#[must_use]
pub fn now_epoch() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Source of the current time for signing and expiry checks.
pub trait Clock: Send + Sync + Debug {
    /// Current time as Unix epoch seconds.
    fn now(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        now_epoch()
    }
}

/// Manually driven clock for tests and replay tooling.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    /// Start at the given epoch second.
    #[must_use]
    pub fn new(start: i64) -> Self {
        Self {
            now: AtomicI64::new(start),
        }
    }

    /// Start at the current wall-clock time.
    #[must_use]
    pub fn starting_now() -> Self {
        Self::new(now_epoch())
    }

    /// Move the clock forward (or backward, with a negative value).
    pub fn advance(&self, seconds: i64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }

    /// Jump to an absolute epoch second.
    pub fn set(&self, epoch: i64) {
        self.now.store(epoch, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}
