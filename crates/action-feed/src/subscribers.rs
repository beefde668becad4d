//! Synchronous fan-out of list snapshots to registered callbacks.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, Weak};

use tracing::{debug, warn};

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Registry<T> {
    next_id: u64,
    last_revision: u64,
    entries: Vec<(u64, Callback<T>)>,
}

/// Ordered set of subscribers receiving snapshots of type `T`.
///
/// Callbacks run in subscription order on the publishing thread. A panicking callback is
/// logged and skipped; the remaining subscribers are still notified.
pub struct SubscriberSet<T> {
    name: &'static str,
    registry: Arc<Mutex<Registry<T>>>,
}

impl<T: 'static> SubscriberSet<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            registry: Arc::new(Mutex::new(Registry {
                next_id: 1,
                last_revision: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// Register `callback` and deliver `initial` to it immediately.
    pub fn subscribe<F>(&self, initial: &T, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let callback: Callback<T> = Arc::new(callback);
        let id = {
            let mut registry = self.registry.lock().expect("subscriber mutex poisoned");
            let id = registry.next_id;
            registry.next_id += 1;
            registry.entries.push((id, callback.clone()));
            id
        };

        self.invoke(id, &callback, initial);

        let registry = Arc::downgrade(&self.registry);
        Subscription {
            remove: Some(Box::new(move || remove_entry(&registry, id))),
        }
    }

    /// Deliver `snapshot` to every subscriber unless a newer revision already went out.
    pub fn publish(&self, revision: u64, snapshot: &T) {
        let callbacks: Vec<(u64, Callback<T>)> = {
            let mut registry = self.registry.lock().expect("subscriber mutex poisoned");
            if revision < registry.last_revision {
                debug!(
                    channel = self.name,
                    revision,
                    latest = registry.last_revision,
                    "skipping superseded snapshot"
                );
                return;
            }
            registry.last_revision = revision;
            registry.entries.clone()
        };

        for (id, callback) in &callbacks {
            self.invoke(*id, callback, snapshot);
        }
    }

    pub fn len(&self) -> usize {
        self.registry
            .lock()
            .expect("subscriber mutex poisoned")
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn invoke(&self, id: u64, callback: &Callback<T>, snapshot: &T) {
        if catch_unwind(AssertUnwindSafe(|| callback(snapshot))).is_err() {
            warn!(
                channel = self.name,
                subscriber = id,
                "subscriber panicked during notification"
            );
        }
    }
}

fn remove_entry<T>(registry: &Weak<Mutex<Registry<T>>>, id: u64) {
    if let Some(registry) = registry.upgrade() {
        registry
            .lock()
            .expect("subscriber mutex poisoned")
            .entries
            .retain(|(entry, _)| *entry != id);
    }
}

/// Handle returned by `subscribe`; call [`Subscription::unsubscribe`] to stop notifications.
///
/// Dropping the handle keeps the subscription alive.
#[must_use = "keep the subscription to be able to unsubscribe"]
pub struct Subscription {
    remove: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.remove.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) + Send + Sync + Clone) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        let push = move |entry: &str| sink.lock().expect("log").push(entry.to_string());
        (log, push)
    }

    #[test]
    fn delivers_initial_snapshot_then_updates_in_subscription_order() {
        let set = SubscriberSet::<Vec<u32>>::new("test");
        let (log, push) = recorder();

        let first = push.clone();
        let _a = set.subscribe(&vec![1], move |items: &Vec<u32>| {
            first(&format!("a:{}", items.len()))
        });
        let second = push.clone();
        let _b = set.subscribe(&vec![1], move |items: &Vec<u32>| {
            second(&format!("b:{}", items.len()))
        });

        set.publish(1, &vec![1, 2]);

        assert_eq!(
            *log.lock().expect("log"),
            vec!["a:1", "b:1", "a:2", "b:2"]
        );
    }

    #[test]
    fn panicking_subscriber_does_not_block_others() {
        let set = SubscriberSet::<u32>::new("test");
        let (log, push) = recorder();

        let _bad = set.subscribe(&0, |value: &u32| {
            if *value > 0 {
                panic!("boom");
            }
        });
        let _good = set.subscribe(&0, move |value: &u32| push(&value.to_string()));

        set.publish(1, &7);

        assert_eq!(*log.lock().expect("log"), vec!["0", "7"]);
    }

    #[test]
    fn unsubscribe_stops_delivery_and_stale_revisions_are_dropped() {
        let set = SubscriberSet::<u32>::new("test");
        let (log, push) = recorder();

        let subscription = set.subscribe(&0, move |value: &u32| push(&value.to_string()));
        set.publish(2, &2);
        set.publish(1, &1);
        subscription.unsubscribe();
        set.publish(3, &3);

        assert_eq!(*log.lock().expect("log"), vec!["0", "2"]);
        assert!(set.is_empty());
    }
}
