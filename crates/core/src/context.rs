//! Cancellation and deadline context tree
//!
//! A [`Context`] is a node in a tree of deadlines and key/value bindings. Each
//! node borrows its parent, so building a chain costs nothing beyond the
//! stack frames that hold the nodes, and the borrow checker guarantees a
//! parent outlives its children.
//!
//! Nothing is pushed when a node is cancelled. A node's effective expiration
//! is recomputed by walking to the root every time somebody asks, which is how
//! cancelling an ancestor reaches every descendant.
//!
//! ```
//! use nimbus_core::context::{Context, ContextKey};
//!
//! static REGION: ContextKey = ContextKey::new("region");
//!
//! let root = Context::root();
//! let deadline = Context::with_expiration(Some(&root), 5_000);
//! let scoped = Context::with_value(Some(&deadline), &REGION, &"westeurope");
//!
//! assert_eq!(scoped.expiration(), 5_000);
//! assert_eq!(scoped.value_as::<&str>(&REGION), Ok(&"westeurope"));
//!
//! root.cancel();
//! assert!(scoped.has_expired(1));
//! ```

use std::any::Any;
use std::fmt;
use std::iter;
use std::ptr;
use std::sync::atomic::{AtomicI64, Ordering};

use nimbus_common::error::{SdkError, SdkResult};
use nimbus_common::time::NEVER_EXPIRES;

/// Expiration assigned by [`Context::cancel`]: the earliest representable instant,
/// so a cancelled chain is expired at every `now` a clock can report, zero and
/// negative readings included
pub const CANCELLED_EXPIRATION: i64 = i64::MIN;

/// The process-wide root of every context created without an explicit parent
static APPLICATION: Context<'static> = Context::root();

/// Identity of a context binding
///
/// Lookups compare keys by address, never by name: two keys that happen to
/// share a name are different keys. Declare keys as `static` items.
#[derive(Debug)]
pub struct ContextKey {
    name: &'static str,
}

impl ContextKey {
    /// Create a key; `name` is only used in diagnostics
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self { name }
    }

    /// Diagnostic name of the key
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

/// A node in the context tree
pub struct Context<'p> {
    parent: Option<&'p Context<'p>>,
    expiration: AtomicI64,
    key: Option<&'p ContextKey>,
    value: Option<&'p (dyn Any + Send + Sync)>,
}

impl Context<'static> {
    /// The application context: root of every node created with a `None`
    /// parent. Cancelling it cancels everything derived from it.
    #[must_use]
    pub fn application() -> &'static Self {
        &APPLICATION
    }

    /// A fresh, never-expiring root with no parent
    ///
    /// Useful for cancellable scopes that must not depend on (or affect) the
    /// application context.
    #[must_use]
    pub const fn root() -> Self {
        Self { parent: None, expiration: AtomicI64::new(NEVER_EXPIRES), key: None, value: None }
    }
}

impl<'p> Context<'p> {
    /// Create a child that expires at `expiration` (or earlier, if an ancestor
    /// does). `None` parents the node to the application context.
    #[must_use]
    pub fn with_expiration(parent: Option<&'p Context<'p>>, expiration: i64) -> Self {
        Self {
            parent: Some(parent.unwrap_or(Context::application())),
            expiration: AtomicI64::new(expiration),
            key: None,
            value: None,
        }
    }

    /// Create a child carrying a key/value binding. The node itself never
    /// expires; it inherits its ancestors' deadlines.
    #[must_use]
    pub fn with_value(
        parent: Option<&'p Context<'p>>,
        key: &'p ContextKey,
        value: &'p (dyn Any + Send + Sync),
    ) -> Self {
        Self {
            parent: Some(parent.unwrap_or(Context::application())),
            expiration: AtomicI64::new(NEVER_EXPIRES),
            key: Some(key),
            value: Some(value),
        }
    }

    /// Cancel this node and, through the ancestor walk, every descendant
    pub fn cancel(&self) {
        self.expiration.store(CANCELLED_EXPIRATION, Ordering::Relaxed);
    }

    /// Parent node, if any
    #[must_use]
    pub const fn parent(&self) -> Option<&'p Context<'p>> {
        self.parent
    }

    /// This node's own expiration, ignoring ancestors
    #[must_use]
    pub fn own_expiration(&self) -> i64 {
        self.expiration.load(Ordering::Relaxed)
    }

    /// Earliest expiration of this node and all of its ancestors
    #[must_use]
    pub fn expiration(&self) -> i64 {
        self.ancestors().map(Context::own_expiration).min().unwrap_or(NEVER_EXPIRES)
    }

    /// Whether the effective expiration lies before `now`
    #[must_use]
    pub fn has_expired(&self, now: i64) -> bool {
        self.expiration() < now
    }

    /// Value bound to `key` by the nearest node (this one included)
    ///
    /// # Errors
    /// Returns `SdkError::NotFound` when no node in the chain carries `key`.
    pub fn value(&self, key: &ContextKey) -> SdkResult<&'p (dyn Any + Send + Sync)> {
        let mut node = Some(self);
        while let Some(current) = node {
            if let (Some(bound), Some(value)) = (current.key, current.value) {
                if ptr::eq(bound, key) {
                    return Ok(value);
                }
            }
            node = current.parent;
        }
        Err(SdkError::NotFound { key: key.name() })
    }

    /// Typed variant of [`Context::value`]
    ///
    /// # Errors
    /// Returns `SdkError::NotFound` when the key is unbound or the nearest
    /// binding holds a different type.
    pub fn value_as<T: Any>(&self, key: &ContextKey) -> SdkResult<&'p T> {
        self.value(key)?.downcast_ref::<T>().ok_or(SdkError::NotFound { key: key.name() })
    }

    /// Number of ancestors between this node and its root
    #[must_use]
    pub fn depth(&self) -> usize {
        self.ancestors().count() - 1
    }

    /// This node followed by every ancestor up to the root
    pub fn ancestors(&self) -> impl Iterator<Item = &Context<'p>> + '_ {
        iter::successors(Some(self), |node| node.parent)
    }
}

impl fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("expiration", &self.own_expiration())
            .field("key", &self.key.map(ContextKey::name))
            .field("has_value", &self.value.is_some())
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

/// Cancel `context`, or the application context when `None`
pub fn cancel(context: Option<&Context<'_>>) {
    context.unwrap_or(Context::application()).cancel();
}
