//! Integration tests for the `time` module.
//!
//! Covers the clock abstraction as the pipeline consumes it: shared mock
//! timelines, sleeping that advances time, and trait-object use.

#![cfg(feature = "runtime")]

use std::sync::Arc;
use std::thread;

use nimbus_common::time::{Clock, MockClock, SystemClock, NEVER_EXPIRES};

/// A mock clock handed to several owners keeps one timeline.
#[test]
fn test_mock_clock_shared_across_threads() {
    let clock = MockClock::starting_at(100_000_000);
    let shared: Arc<dyn Clock> = Arc::new(clock.clone());

    let worker = {
        let shared = Arc::clone(&shared);
        thread::spawn(move || shared.sleep_msec(3_600_000))
    };
    worker.join().unwrap();

    assert_eq!(clock.now_msec(), 103_600_000);
    assert_eq!(clock.sleep_count(), 1);
}

/// Sleeping on the system clock blocks for roughly the requested time.
#[test]
fn test_system_clock_sleep_blocks() {
    let clock = SystemClock;
    let before = clock.now_msec();
    clock.sleep_msec(20);
    let after = clock.now_msec();

    assert!(after - before >= 15, "slept only {}ms", after - before);
}

#[test]
fn test_never_expires_is_max() {
    assert_eq!(NEVER_EXPIRES, i64::MAX);
    assert!(SystemClock.now_msec() < NEVER_EXPIRES);
}
