use crate::types::RealtimeError;
use serde_json::Value;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Receives every application-level event
pub type EventListener = dyn Fn(&Value) + Send + Sync;

/// Receives `(true, None)` when a subscription becomes active and
/// `(false, Some(reason))` whenever the socket closes
pub type ConnectionListener = dyn Fn(bool, Option<&str>) + Send + Sync;

/// Receives transport-level errors
pub type ErrorListener = dyn Fn(&RealtimeError) + Send + Sync;

/// A set of callbacks of one kind.
///
/// Registration order is delivery order. Registering the same `Arc` twice keeps
/// a single entry. Emission works on a snapshot, so a listener may unsubscribe
/// itself or clear the whole set mid-dispatch without skipping or repeating
/// anyone in the current round.
pub struct ListenerSet<L: ?Sized> {
    kind: &'static str,
    next_id: AtomicU64,
    entries: Mutex<Vec<(u64, Arc<L>)>>,
}

impl<L: ?Sized + Send + Sync + 'static> ListenerSet<L> {
    pub fn new(kind: &'static str) -> Arc<Self> {
        Arc::new(Self {
            kind,
            next_id: AtomicU64::new(1),
            entries: Mutex::new(Vec::new()),
        })
    }

    pub fn insert(self: &Arc<Self>, listener: Arc<L>) -> Subscription {
        let mut entries = self.entries();

        let id = match entries.iter().find(|(_, l)| Arc::ptr_eq(l, &listener)) {
            Some((id, _)) => *id,
            None => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                entries.push((id, listener));
                id
            }
        };

        let set: Weak<dyn RemoveListener> = Arc::downgrade(self) as Weak<dyn RemoveListener>;
        Subscription { id, set }
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke every listener registered at the time of the call.
    ///
    /// A panicking listener is logged and does not stop the others.
    pub fn emit(&self, invoke: impl Fn(&L)) {
        let snapshot: Vec<Arc<L>> = self
            .entries()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in snapshot {
            if catch_unwind(AssertUnwindSafe(|| invoke(&listener))).is_err() {
                tracing::warn!("A {} listener panicked; continuing dispatch", self.kind);
            }
        }
    }

    fn entries(&self) -> MutexGuard<'_, Vec<(u64, Arc<L>)>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

trait RemoveListener: Send + Sync {
    fn remove(&self, id: u64);
}

impl<L: ?Sized + Send + Sync + 'static> RemoveListener for ListenerSet<L> {
    fn remove(&self, id: u64) {
        self.entries().retain(|(entry_id, _)| *entry_id != id);
    }
}

/// Handle returned by listener registration.
///
/// Dropping it keeps the listener registered; call
/// [`unsubscribe`](Self::unsubscribe) to remove it. Unsubscribing more than
/// once is a no-op.
#[must_use = "keep the subscription to be able to unsubscribe later"]
pub struct Subscription {
    id: u64,
    set: Weak<dyn RemoveListener>,
}

impl Subscription {
    pub fn unsubscribe(&self) {
        if let Some(set) = self.set.upgrade() {
            set.remove(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

/// The three independent registries owned by a connection
pub struct Listeners {
    pub events: Arc<ListenerSet<EventListener>>,
    pub connection: Arc<ListenerSet<ConnectionListener>>,
    pub errors: Arc<ListenerSet<ErrorListener>>,
}

impl Listeners {
    pub fn new() -> Self {
        Self {
            events: ListenerSet::new("event"),
            connection: ListenerSet::new("connection"),
            errors: ListenerSet::new("error"),
        }
    }

    pub fn notify_connection(&self, connected: bool, reason: Option<&str>) {
        self.connection.emit(|listener| listener(connected, reason));
    }

    pub fn notify_error(&self, error: &RealtimeError) {
        self.errors.emit(|listener| listener(error));
    }

    pub fn clear(&self) {
        self.events.clear();
        self.connection.clear();
        self.errors.clear();
    }
}

impl Default for Listeners {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) -> Arc<EventListener>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let log_for_factory = Arc::clone(&log);
        let make = move |name: &str| -> Arc<EventListener> {
            let log = Arc::clone(&log_for_factory);
            let name = name.to_string();
            Arc::new(move |_: &Value| log.lock().unwrap().push(name.clone()))
        };
        (log, make)
    }

    #[test]
    fn test_emit_in_registration_order() {
        let set = ListenerSet::<EventListener>::new("event");
        let (log, make) = recorder();

        let _a = set.insert(make("a"));
        let _b = set.insert(make("b"));
        let _c = set.insert(make("c"));

        set.emit(|l| l(&json!({})));
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_unsubscribe_removes_exactly_one_and_is_idempotent() {
        let set = ListenerSet::<EventListener>::new("event");
        let (log, make) = recorder();

        let a = set.insert(make("a"));
        let _b = set.insert(make("b"));

        a.unsubscribe();
        a.unsubscribe();

        set.emit(|l| l(&json!({})));
        assert_eq!(*log.lock().unwrap(), vec!["b"]);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_duplicate_registration_fires_once() {
        let set = ListenerSet::<EventListener>::new("event");
        let (log, make) = recorder();

        let listener = make("dup");
        let _first = set.insert(Arc::clone(&listener));
        let _second = set.insert(listener);

        set.emit(|l| l(&json!({})));
        assert_eq!(*log.lock().unwrap(), vec!["dup"]);
    }

    #[test]
    fn test_panicking_listener_does_not_stop_dispatch() {
        let set = ListenerSet::<EventListener>::new("event");
        let (log, make) = recorder();

        fn boom(_: &Value) {
            panic!("listener failure")
        }

        let _boom = set.insert(Arc::new(boom));
        let _after = set.insert(make("after"));

        set.emit(|l| l(&json!({})));
        assert_eq!(*log.lock().unwrap(), vec!["after"]);
    }

    #[test]
    fn test_clear_during_dispatch_uses_snapshot() {
        let set = ListenerSet::<EventListener>::new("event");
        let (log, make) = recorder();

        let set_for_listener = Arc::clone(&set);
        let _clearing = set.insert(Arc::new(move |_: &Value| set_for_listener.clear()));
        let _second = set.insert(make("second"));

        set.emit(|l| l(&json!({})));
        assert_eq!(*log.lock().unwrap(), vec!["second"]);
        assert!(set.is_empty());

        set.emit(|l| l(&json!({})));
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_unsubscribe_after_set_dropped_is_safe() {
        let set = ListenerSet::<EventListener>::new("event");
        let (_log, make) = recorder();
        let subscription = set.insert(make("a"));
        drop(set);
        subscription.unsubscribe();
    }
}
