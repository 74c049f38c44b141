//! Global observers: callbacks fired after every successful resolution.

use std::sync::Arc;

use tracing::trace;

use crate::container::Container;
use crate::definition::AnyValue;

/// A global observer callback.
///
/// Observers receive every value a successful `get` produces: first
/// constructions, cache hits, parameter reads, protected reads, and factory
/// products alike, together with the container, in insertion order. This is
/// the hook for cross-cutting instrumentation on every access, not just
/// first construction.
pub type Observer = Arc<dyn Fn(&AnyValue, &Container) + Send + Sync>;

/// Append-only observer list.
#[derive(Default)]
pub(crate) struct Observers {
    list: Vec<Observer>,
}

impl Observers {
    pub(crate) fn push(&mut self, observer: Observer) {
        self.list.push(observer);
    }

    /// Clones the current list so dispatch can run without holding any
    /// borrow of container state, since observers may call back into the
    /// container.
    pub(crate) fn snapshot(&self) -> Vec<Observer> {
        self.list.clone()
    }
}

/// Invokes a snapshot of observers in insertion order.
pub(crate) fn notify_all(observers: &[Observer], id: &str, value: &AnyValue, container: &Container) {
    if observers.is_empty() {
        return;
    }
    trace!(id, observers = observers.len(), "notifying observers");
    for observer in observers {
        observer(value, container);
    }
}
