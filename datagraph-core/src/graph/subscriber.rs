//! Subscription types for change notification.
//!
//! A subscription is an external callback attached to one registered node.
//! Callers trigger subscriptions with the changed set returned by a pass.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Unique identifier for a subscription.
///
/// Returned by [`DataGraph::subscribe`](crate::graph::DataGraph::subscribe)
/// and used to unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Generate a new unique subscription ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

/// A subscription callback.
pub type SubscriptionCallback = Arc<dyn Fn() + Send + Sync>;

/// A registered callback together with its ID.
#[derive(Clone)]
pub struct Subscription {
    id: SubscriptionId,
    notify: SubscriptionCallback,
}

impl Subscription {
    /// Create a new subscription with the given notification callback.
    pub fn new<F>(notify: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            id: SubscriptionId::new(),
            notify: Arc::new(notify),
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Invoke the callback.
    pub fn notify(&self) {
        (self.notify)();
    }
}
