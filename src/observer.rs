//! "Metrics updated" subscriptions owned by the tracking session

use crate::session::TrackingState;

/// Receives a notification each time session metrics change
///
/// Delivery is synchronous on the loop that owns the session; observers read
/// whatever they need from the state they are handed.
pub trait MetricsObserver: Send {
    fn metrics_updated(&mut self, state: &TrackingState);
}

impl<F> MetricsObserver for F
where
    F: FnMut(&TrackingState) + Send,
{
    fn metrics_updated(&mut self, state: &TrackingState) {
        self(state)
    }
}

/// Handle returned by subscribe, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
pub struct ObserverRegistry {
    next_id: u64,
    observers: Vec<(SubscriptionId, Box<dyn MetricsObserver>)>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: Box<dyn MetricsObserver>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, observer));
        id
    }

    /// Returns false when the id was not subscribed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(existing, _)| *existing != id);
        self.observers.len() != before
    }

    pub fn notify(&mut self, state: &TrackingState) {
        for (_, observer) in self.observers.iter_mut() {
            observer.metrics_updated(state);
        }
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_subscribe_notify_unsubscribe() {
        let mut registry = ObserverRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = calls.clone();
        let first = registry.subscribe(Box::new(move |_: &TrackingState| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        let counter = calls.clone();
        let _second = registry.subscribe(Box::new(move |_: &TrackingState| {
            counter.fetch_add(10, Ordering::SeqCst);
        }));

        let state = TrackingState::default();
        registry.notify(&state);
        assert_eq!(calls.load(Ordering::SeqCst), 11);

        assert!(registry.unsubscribe(first));
        assert!(!registry.unsubscribe(first));
        registry.notify(&state);
        assert_eq!(calls.load(Ordering::SeqCst), 21);
        assert_eq!(registry.len(), 1);
    }
}
