//! Integration tests for the context tree
//!
//! Exercises deadlines, cancellation and value lookup across deep chains and
//! across threads.

use std::thread;

use nimbus_common::error::SdkError;
use nimbus_common::time::NEVER_EXPIRES;
use nimbus_core::context::{self, Context, ContextKey};

static TENANT: ContextKey = ContextKey::new("tenant");
static REQUEST_ID: ContextKey = ContextKey::new("request_id");

/// Validates effective expiration over a C -> P1 -> P2 -> root chain.
///
/// # Test Steps
/// 1. Build a chain where the middle node carries the tightest deadline
/// 2. Verify every node below it reports that deadline
/// 3. Verify nodes above it are unaffected
#[test]
fn test_effective_expiration_over_chain() {
    let root = Context::root();
    let p2 = Context::with_expiration(Some(&root), 90_000);
    let p1 = Context::with_expiration(Some(&p2), 30_000);
    let c = Context::with_value(Some(&p1), &TENANT, &"contoso");

    assert_eq!(c.expiration(), 30_000);
    assert_eq!(p1.expiration(), 30_000);
    assert_eq!(p2.expiration(), 90_000);
    assert_eq!(root.expiration(), NEVER_EXPIRES);
    assert_eq!(c.depth(), 3);
}

/// Validates cancelling a root expires an arbitrarily deep chain.
#[test]
fn test_root_cancellation_reaches_deep_descendants() {
    fn descend(parent: &Context<'_>, remaining: usize, root: &Context<'_>) {
        let child = Context::with_expiration(Some(parent), NEVER_EXPIRES);
        if remaining == 0 {
            assert!(!child.has_expired(i64::MAX - 1));
            root.cancel();
            assert!(child.has_expired(1));
            assert_eq!(child.expiration(), 0);
        } else {
            descend(&child, remaining - 1, root);
        }
    }

    let root = Context::root();
    descend(&root, 64, &root);
    assert!(root.has_expired(1));
}

/// Validates nearest-binding lookup and `NotFound` across mixed nodes.
#[test]
fn test_value_lookup_through_expiration_nodes() {
    let root = Context::root();
    let outer = Context::with_value(Some(&root), &TENANT, &"outer");
    let deadline = Context::with_expiration(Some(&outer), 5_000);
    let id = Context::with_value(Some(&deadline), &REQUEST_ID, &17_u64);
    let inner = Context::with_value(Some(&id), &TENANT, &"inner");

    assert_eq!(inner.value_as::<&str>(&TENANT), Ok(&"inner"));
    assert_eq!(id.value_as::<&str>(&TENANT), Ok(&"outer"));
    assert_eq!(inner.value_as::<u64>(&REQUEST_ID), Ok(&17));
    assert_eq!(deadline.value(&REQUEST_ID).err(), Some(SdkError::NotFound { key: "request_id" }));
}

/// Validates contexts are shareable across threads and cancellation made on
/// one thread is observed on another.
///
/// # Test Steps
/// 1. Share a child context with a scoped worker thread
/// 2. Cancel the parent from the main thread
/// 3. Join and verify the worker observed the expiration
#[test]
fn test_cancellation_visible_across_threads() {
    let root = Context::root();
    let parent = Context::with_expiration(Some(&root), NEVER_EXPIRES);
    let child = Context::with_value(Some(&parent), &TENANT, &"shared");

    parent.cancel();
    let observed = thread::scope(|scope| {
        let worker = scope.spawn(|| (child.has_expired(1), child.value_as::<&str>(&TENANT).ok()));
        worker.join().unwrap()
    });

    assert_eq!(observed, (true, Some(&"shared")));
}

#[test]
fn test_free_cancel_targets_given_node() {
    let root = Context::root();
    let a = Context::with_expiration(Some(&root), 10_000);
    let b = Context::with_expiration(Some(&root), 10_000);

    context::cancel(Some(&a));

    assert!(a.has_expired(1));
    assert!(!b.has_expired(1));
}
