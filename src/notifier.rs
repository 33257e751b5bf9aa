//! Change Notifier
//!
//! Fans out batched resource-change events to registered observers so the
//! host can push notifications to subscribed management servers. Delivery
//! is fire-and-forget: a panicking observer is isolated and logged, and
//! never rolls back the mutation that triggered the event.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

type ObserverFn = Box<dyn Fn(u16, &[u16]) + Send + Sync>;

#[derive(Default)]
pub struct ChangeNotifier {
    observers: Mutex<Vec<(Uuid, ObserverFn)>>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer; the returned token deregisters it.
    ///
    /// The callback receives `(object_instance_id, changed_resource_ids)`.
    /// It runs on whichever thread committed the mutation and must not call
    /// back into the same object instance.
    pub fn register<F>(&self, callback: F) -> Uuid
    where
        F: Fn(u16, &[u16]) + Send + Sync + 'static,
    {
        let token = Uuid::new_v4();
        self.observers
            .lock()
            .unwrap()
            .push((token, Box::new(callback)));
        token
    }

    /// Remove an observer. Returns false for an unknown token.
    pub fn unregister(&self, token: Uuid) -> bool {
        let mut observers = self.observers.lock().unwrap();
        let before = observers.len();
        observers.retain(|(id, _)| *id != token);
        observers.len() != before
    }

    pub fn observer_count(&self) -> usize {
        self.observers.lock().unwrap().len()
    }

    /// Deliver one batched change event to every observer.
    pub fn notify(&self, instance_id: u16, resource_ids: &[u16]) {
        debug!(
            "Resources changed on instance {}: {:?}",
            instance_id, resource_ids
        );
        let observers = self.observers.lock().unwrap();
        for (token, callback) in observers.iter() {
            let outcome = catch_unwind(AssertUnwindSafe(|| callback(instance_id, resource_ids)));
            if outcome.is_err() {
                warn!("Observer {} panicked during notification; skipping", token);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_register_notify_unregister() {
        let notifier = ChangeNotifier::new();
        let events: Arc<Mutex<Vec<(u16, Vec<u16>)>>> = Arc::new(Mutex::new(Vec::new()));

        let sink = events.clone();
        let token = notifier.register(move |instance, ids| {
            sink.lock().unwrap().push((instance, ids.to_vec()));
        });
        assert_eq!(notifier.observer_count(), 1);

        notifier.notify(0, &[3]);
        notifier.notify(0, &[3, 5, 6, 7]);
        {
            let events = events.lock().unwrap();
            assert_eq!(events.len(), 2);
            assert_eq!(events[0], (0, vec![3]));
            assert_eq!(events[1], (0, vec![3, 5, 6, 7]));
        }

        assert!(notifier.unregister(token));
        assert!(!notifier.unregister(token));
        notifier.notify(0, &[3]);
        assert_eq!(events.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_panicking_observer_is_isolated() {
        let notifier = ChangeNotifier::new();
        let events: Arc<Mutex<Vec<u16>>> = Arc::new(Mutex::new(Vec::new()));

        notifier.register(|_, _| panic!("bad observer"));
        let sink = events.clone();
        notifier.register(move |instance, _| sink.lock().unwrap().push(instance));

        notifier.notify(7, &[1]);
        // The healthy observer still got the event.
        assert_eq!(*events.lock().unwrap(), vec![7]);
    }
}
