//! Subscriber types for the reactive system.
//!
//! A subscriber is an invalidation callback attached to one node. It is
//! how rendering and other outside collaborators learn that something they
//! displayed is out of date, without the core knowing anything about them.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use crate::graph::NodeId;

use super::runtime::RuntimeInner;

/// Unique identifier for a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// An invalidation callback registered on a node.
#[derive(Clone)]
pub struct Subscriber {
    id: SubscriberId,
    notify: Arc<dyn Fn() + Send + Sync>,
}

impl Subscriber {
    /// Create a new subscriber with the given notification callback.
    pub fn new<F>(notify: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            id: SubscriberId::new(),
            notify: Arc::new(notify),
        }
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Notify the subscriber that the node it watches was invalidated.
    pub fn notify(&self) {
        (self.notify)();
    }
}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber").field("id", &self.id).finish()
    }
}

/// Handle returned by `subscribe`.
///
/// Dropping this handle unregisters the callback.
pub struct Subscription {
    runtime: Weak<RuntimeInner>,
    node: NodeId,
    id: SubscriberId,
}

impl Subscription {
    pub(crate) fn new(runtime: Weak<RuntimeInner>, node: NodeId, id: SubscriberId) -> Self {
        Self { runtime, node, id }
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Unregister explicitly. Equivalent to dropping the handle.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.upgrade() {
            runtime.remove_subscriber(self.node, self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("node", &self.node)
            .field("id", &self.id)
            .finish()
    }
}
