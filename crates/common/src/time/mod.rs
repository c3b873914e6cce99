//! Time abstraction for the request path
//!
//! Every timestamp in nimbus is an `i64` count of milliseconds. Context
//! expirations, token expiries and retry waits are all expressed in that one
//! unit, and every component reads the time through an injected [`Clock`]
//! rather than a process-wide function, so tests can drive time by hand.
//!
//! # Examples
//!
//! ```
//! use nimbus_common::time::{Clock, MockClock};
//!
//! let clock = MockClock::starting_at(100_000_000);
//! clock.sleep_msec(4_000);
//! assert_eq!(clock.now_msec(), 100_004_000);
//! assert_eq!(clock.total_slept_msec(), 4_000);
//! ```

use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::trace;

/// Expiration value meaning "never"
pub const NEVER_EXPIRES: i64 = i64::MAX;

/// Source of the current time and of blocking waits
///
/// Implementations must be cheap to call; the credential policy asks for the
/// time on every request.
pub trait Clock: Send + Sync {
    /// Milliseconds since the clock's epoch
    fn now_msec(&self) -> i64;

    /// Block the calling thread for `msec` milliseconds (non-positive values
    /// return immediately)
    fn sleep_msec(&self, msec: i64);
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now_msec(&self) -> i64 {
        (**self).now_msec()
    }

    fn sleep_msec(&self, msec: i64) {
        (**self).sleep_msec(msec);
    }
}

impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn now_msec(&self) -> i64 {
        (**self).now_msec()
    }

    fn sleep_msec(&self, msec: i64) {
        (**self).sleep_msec(msec);
    }
}

/// Real wall clock (milliseconds since the UNIX epoch)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_msec(&self) -> i64 {
        let millis = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        i64::try_from(millis).unwrap_or(NEVER_EXPIRES)
    }

    fn sleep_msec(&self, msec: i64) {
        let Ok(msec) = u64::try_from(msec) else {
            return;
        };
        if msec == 0 {
            return;
        }
        trace!(msec, "sleeping");
        std::thread::sleep(Duration::from_millis(msec));
    }
}

/// Mock clock for deterministic testing
///
/// Time only moves when the test says so, or when code under test "sleeps":
/// [`Clock::sleep_msec`] advances the clock instead of blocking. Clones share
/// the same timeline.
#[derive(Debug, Clone, Default)]
pub struct MockClock {
    now: Arc<AtomicI64>,
    slept: Arc<AtomicI64>,
    sleeps: Arc<AtomicU32>,
    reads: Arc<AtomicU32>,
}

impl MockClock {
    /// Create a mock clock at time zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock clock at the given time
    #[must_use]
    pub fn starting_at(now_msec: i64) -> Self {
        let clock = Self::default();
        clock.set(now_msec);
        clock
    }

    /// Jump to an absolute time
    pub fn set(&self, now_msec: i64) {
        self.now.store(now_msec, Ordering::SeqCst);
    }

    /// Move the clock forward
    pub fn advance(&self, msec: i64) {
        self.now.fetch_add(msec, Ordering::SeqCst);
    }

    /// Total milliseconds spent in `sleep_msec`
    #[must_use]
    pub fn total_slept_msec(&self) -> i64 {
        self.slept.load(Ordering::SeqCst)
    }

    /// Number of `sleep_msec` calls with a positive duration
    #[must_use]
    pub fn sleep_count(&self) -> u32 {
        self.sleeps.load(Ordering::SeqCst)
    }

    /// Number of `now_msec` calls
    #[must_use]
    pub fn read_count(&self) -> u32 {
        self.reads.load(Ordering::SeqCst)
    }
}

impl Clock for MockClock {
    fn now_msec(&self) -> i64 {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.now.load(Ordering::SeqCst)
    }

    fn sleep_msec(&self, msec: i64) {
        if msec <= 0 {
            return;
        }
        self.sleeps.fetch_add(1, Ordering::SeqCst);
        self.slept.fetch_add(msec, Ordering::SeqCst);
        self.advance(msec);
    }
}
