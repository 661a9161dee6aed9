//! Change notification for the repository registry.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Events broadcast after a committed registry mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryEvent {
    /// The persisted repository list was rewritten
    ReposChanged,
}

type Callback = Arc<dyn Fn(RegistryEvent) + Send + Sync>;

#[derive(Default)]
struct ListenerList {
    next_id: u64,
    entries: Vec<(u64, Callback)>,
}

/// Registered callbacks, invoked in subscription order.
#[derive(Default, Clone)]
pub(crate) struct Listeners {
    inner: Arc<Mutex<ListenerList>>,
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.len())
            .finish()
    }
}

fn lock(list: &Mutex<ListenerList>) -> MutexGuard<'_, ListenerList> {
    list.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Listeners {
    pub(crate) fn subscribe(&self, callback: Callback) -> Subscription {
        let mut list = lock(&self.inner);
        let id = list.next_id;
        list.next_id += 1;
        list.entries.push((id, callback));

        Subscription {
            id,
            list: Arc::downgrade(&self.inner),
        }
    }

    /// Invoke every callback. The lock is released first so callbacks may
    /// read the registry or drop their own subscription.
    pub(crate) fn emit(&self, event: RegistryEvent) {
        let callbacks: Vec<Callback> = lock(&self.inner)
            .entries
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        for callback in callbacks {
            callback(event);
        }
    }

    pub(crate) fn len(&self) -> usize {
        lock(&self.inner).entries.len()
    }
}

/// Handle returned by [`RepoRegistry::subscribe`](super::RepoRegistry::subscribe).
///
/// The callback stays registered for as long as the handle lives.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    list: Weak<Mutex<ListenerList>>,
}

impl Subscription {
    /// Unsubscribe explicitly. Equivalent to dropping the handle.
    pub fn unsubscribe(self) {}
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(list) = self.list.upgrade() {
            lock(&list).entries.retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, Callback) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        let callback: Callback = Arc::new(move |_| {
            inner.fetch_add(1, Ordering::SeqCst);
        });
        (count, callback)
    }

    #[test]
    fn test_emit_reaches_every_subscriber() {
        let listeners = Listeners::default();
        let (a, cb_a) = counter();
        let (b, cb_b) = counter();
        let _sub_a = listeners.subscribe(cb_a);
        let _sub_b = listeners.subscribe(cb_b);

        listeners.emit(RegistryEvent::ReposChanged);

        assert_eq!(a.load(Ordering::SeqCst), 1);
        assert_eq!(b.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let listeners = Listeners::default();
        let (count, callback) = counter();
        let sub = listeners.subscribe(callback);
        assert_eq!(listeners.len(), 1);

        drop(sub);
        listeners.emit(RegistryEvent::ReposChanged);

        assert_eq!(listeners.len(), 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unsubscribe_leaves_others() {
        let listeners = Listeners::default();
        let (a, cb_a) = counter();
        let (b, cb_b) = counter();
        let sub_a = listeners.subscribe(cb_a);
        let _sub_b = listeners.subscribe(cb_b);

        sub_a.unsubscribe();
        listeners.emit(RegistryEvent::ReposChanged);

        assert_eq!(a.load(Ordering::SeqCst), 0);
        assert_eq!(b.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_subscription_outliving_listeners_is_harmless() {
        let listeners = Listeners::default();
        let (_count, callback) = counter();
        let sub = listeners.subscribe(callback);

        drop(listeners);
        drop(sub);
    }
}
