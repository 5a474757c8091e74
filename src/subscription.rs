//! Price update subscriptions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use uuid::Uuid;

/// Callback invoked with each newly resolved price
pub type PriceCallback = Arc<dyn Fn(f64) + Send + Sync>;

/// Opaque handle for one registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Registered callbacks in registration order
///
/// Every call to `subscribe` is its own registration, even for the same
/// callback.
#[derive(Default)]
pub struct SubscriptionHub {
    subscribers: Vec<(SubscriptionId, PriceCallback)>,
}

impl SubscriptionHub {
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }

    /// Registers a callback and returns its handle
    pub fn subscribe(&mut self, callback: PriceCallback) -> SubscriptionId {
        let id = SubscriptionId::new();
        self.subscribers.push((id, callback));
        id
    }

    /// Removes a registration. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        match self.subscribers.iter().position(|(sid, _)| *sid == id) {
            Some(index) => {
                self.subscribers.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Copies the current subscriber list so callbacks can run without the
    /// owning lock held
    pub fn snapshot(&self) -> Vec<(SubscriptionId, PriceCallback)> {
        self.subscribers.clone()
    }
}

/// Delivers `price` to every subscriber in order
///
/// A panicking callback is logged and skipped; later subscribers still run.
/// Returns the number of callbacks that completed.
pub fn notify_all(subscribers: &[(SubscriptionId, PriceCallback)], price: f64) -> usize {
    let mut delivered = 0;

    for (id, callback) in subscribers {
        match catch_unwind(AssertUnwindSafe(|| callback(price))) {
            Ok(()) => delivered += 1,
            Err(panic) => {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::error!(subscription = %id, error = %reason, "Price update callback panicked");
            }
        }
    }

    delivered
}
