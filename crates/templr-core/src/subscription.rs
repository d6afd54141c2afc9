//! Push subscriptions: handler registries and disposable handles.
//!
//! Live data (sessions, listing snapshots) is delivered by pushing values to
//! registered handlers. Registering returns a [`Subscription`]; calling
//! [`Subscription::unsubscribe`] detaches the handler and releases whatever
//! resource backs it. Unsubscribing is idempotent.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

type Release = Box<dyn FnOnce() + Send>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Handle to a live subscription.
///
/// Dropping the handle does not unsubscribe; call [`unsubscribe`](Self::unsubscribe).
#[must_use = "dropping a Subscription leaves the handler attached; call unsubscribe()"]
pub struct Subscription {
    active: Arc<AtomicBool>,
    release: Mutex<Option<Release>>,
}

impl Subscription {
    /// Creates a handle whose `release` runs exactly once, on the first unsubscribe.
    pub fn new(active: Arc<AtomicBool>, release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            active,
            release: Mutex::new(Some(Box::new(release))),
        }
    }

    /// A handle with nothing attached. Unsubscribing it is a no-op.
    pub fn detached() -> Self {
        Self {
            active: Arc::new(AtomicBool::new(false)),
            release: Mutex::new(None),
        }
    }

    /// Detaches the handler. Safe to call any number of times.
    ///
    /// A delivery already in flight may still reach the handler, but nothing
    /// is delivered after the in-flight one.
    pub fn unsubscribe(&self) {
        self.active.store(false, Ordering::SeqCst);
        let release = lock(&self.release).take();
        if let Some(release) = release {
            release();
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

/// A shareable handler callback.
pub type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Entry<T> {
    id: u64,
    active: Arc<AtomicBool>,
    handler: Handler<T>,
}

struct RegistryInner<T> {
    next_id: u64,
    entries: Vec<Entry<T>>,
}

/// Ordered set of handlers that receive every dispatched value.
///
/// Handlers are invoked one after another, in registration order, outside the
/// registry lock, so a handler may unsubscribe itself or register others.
pub struct HandlerRegistry<T> {
    inner: Arc<Mutex<RegistryInner<T>>>,
}

impl<T: 'static> HandlerRegistry<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(RegistryInner {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// Registers a handler and returns the handle that removes it.
    pub fn register(&self, handler: Handler<T>) -> Subscription {
        let active = Arc::new(AtomicBool::new(true));
        let id = {
            let mut inner = lock(&self.inner);
            let id = inner.next_id;
            inner.next_id += 1;
            inner.entries.push(Entry {
                id,
                active: active.clone(),
                handler,
            });
            id
        };

        let registry: Weak<Mutex<RegistryInner<T>>> = Arc::downgrade(&self.inner);
        Subscription::new(active, move || {
            if let Some(registry) = registry.upgrade() {
                lock(&registry).entries.retain(|entry| entry.id != id);
            }
        })
    }

    /// Delivers `value` to every active handler.
    pub fn dispatch(&self, value: &T) {
        let targets: Vec<(Arc<AtomicBool>, Handler<T>)> = lock(&self.inner)
            .entries
            .iter()
            .map(|entry| (entry.active.clone(), entry.handler.clone()))
            .collect();

        for (active, handler) in targets {
            if active.load(Ordering::SeqCst) {
                handler(value);
            }
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.inner).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: 'static> Default for HandlerRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_dispatch_reaches_registered_handlers_in_order() {
        let registry = HandlerRegistry::<u32>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let first = seen.clone();
        let _a = registry.register(Arc::new(move |v: &u32| first.lock().unwrap().push(("a", *v))));
        let second = seen.clone();
        let _b = registry.register(Arc::new(move |v: &u32| second.lock().unwrap().push(("b", *v))));

        registry.dispatch(&7);

        assert_eq!(*seen.lock().unwrap(), vec![("a", 7), ("b", 7)]);
    }

    #[test]
    fn test_unsubscribe_is_idempotent_and_stops_delivery() {
        let registry = HandlerRegistry::<u32>::new();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let sub = registry.register(Arc::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        registry.dispatch(&1);
        sub.unsubscribe();
        sub.unsubscribe();
        registry.dispatch(&2);

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!sub.is_active());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_handler_may_unsubscribe_itself() {
        let registry = HandlerRegistry::<u32>::new();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let count = Arc::new(AtomicUsize::new(0));

        let inner_slot = slot.clone();
        let counter = count.clone();
        let sub = registry.register(Arc::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            if let Some(sub) = inner_slot.lock().unwrap().as_ref() {
                sub.unsubscribe();
            }
        }));
        *slot.lock().unwrap() = Some(sub);

        registry.dispatch(&1);
        registry.dispatch(&2);

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_detached_subscription_is_inert() {
        let sub = Subscription::detached();
        assert!(!sub.is_active());
        sub.unsubscribe();
    }
}
