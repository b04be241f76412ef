//! Observable value cell with change and trigger notification.

use chronicle_core::Value;
use std::sync::{Arc, Mutex};

/// Handle returned by a subscription, used for explicit removal.
///
/// Ids are unique per cell, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    pub(crate) const fn from_raw(value: u64) -> Self {
        Self(value)
    }
}

type ChangeListener = Box<dyn FnMut(&Value, &Value) + Send>;
type TriggerListener = Box<dyn FnMut(&serde_json::Value) + Send>;

struct Listeners {
    next: u64,
    change: Vec<(ListenerId, ChangeListener)>,
    trigger: Vec<(ListenerId, TriggerListener)>,
}

struct Inner {
    value: Mutex<Value>,
    listeners: Mutex<Listeners>,
}

/// A single mutable value cell with change notification.
///
/// `Property` is a shared handle: clones point at the same cell and
/// compare equal. Subscription is lazy-linked - a listener fires
/// only on changes after it was attached, never with the value the
/// cell already held.
///
/// Listeners run with the cell's listener table locked, so they
/// must not mutate the property they observe.
#[derive(Clone)]
pub struct Property {
    inner: Arc<Inner>,
}

impl Property {
    /// Create a new cell holding `initial`
    #[must_use]
    pub fn new(initial: Value) -> Self {
        Self {
            inner: Arc::new(Inner {
                value: Mutex::new(initial),
                listeners: Mutex::new(Listeners {
                    next: 0,
                    change: Vec::new(),
                    trigger: Vec::new(),
                }),
            }),
        }
    }

    /// Current value
    #[must_use]
    pub fn get(&self) -> Value {
        self.inner.value.lock().expect("lock poisoned").clone()
    }

    /// Assign a new value, notifying change listeners with
    /// (new, old). Assigning an equal value does not notify.
    pub fn set(&self, new: Value) {
        let old = {
            let mut value = self.inner.value.lock().expect("lock poisoned");
            if *value == new {
                return;
            }
            std::mem::replace(&mut *value, new.clone())
        };
        let mut listeners = self.inner.listeners.lock().expect("lock poisoned");
        for (_, listener) in &mut listeners.change {
            listener(&new, &old);
        }
    }

    /// Assign a new value without notification.
    ///
    /// Replay uses this so reconstructed changes never feed back
    /// into an attached recorder.
    pub fn set_quiet(&self, new: Value) {
        *self.inner.value.lock().expect("lock poisoned") = new;
    }

    /// Subscribe to value changes. The listener receives (new, old)
    /// for every change after this call; the value held right now is
    /// not delivered.
    pub fn on_change<F>(&self, listener: F) -> ListenerId
    where
        F: FnMut(&Value, &Value) + Send + 'static,
    {
        let mut listeners = self.inner.listeners.lock().expect("lock poisoned");
        let id = ListenerId(listeners.next);
        listeners.next += 1;
        listeners.change.push((id, Box::new(listener)));
        id
    }

    /// Subscribe to trigger events
    pub fn on_trigger<F>(&self, listener: F) -> ListenerId
    where
        F: FnMut(&serde_json::Value) + Send + 'static,
    {
        let mut listeners = self.inner.listeners.lock().expect("lock poisoned");
        let id = ListenerId(listeners.next);
        listeners.next += 1;
        listeners.trigger.push((id, Box::new(listener)));
        id
    }

    /// Detach a previously attached listener. Returns true if the
    /// id was found.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.inner.listeners.lock().expect("lock poisoned");
        let before = listeners.change.len() + listeners.trigger.len();
        listeners.change.retain(|(lid, _)| *lid != id);
        listeners.trigger.retain(|(lid, _)| *lid != id);
        before != listeners.change.len() + listeners.trigger.len()
    }

    /// Fire a trigger event with an arbitrary JSON payload
    pub fn fire(&self, event: serde_json::Value) {
        let mut listeners = self.inner.listeners.lock().expect("lock poisoned");
        for (_, listener) in &mut listeners.trigger {
            listener(&event);
        }
    }

    /// Number of attached listeners (change + trigger)
    #[must_use]
    pub fn listener_count(&self) -> usize {
        let listeners = self.inner.listeners.lock().expect("lock poisoned");
        listeners.change.len() + listeners.trigger.len()
    }

    /// True if both handles point at the same cell
    #[must_use]
    pub fn same_cell(&self, other: &Property) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for Property {
    fn eq(&self, other: &Self) -> bool {
        self.same_cell(other)
    }
}

impl Eq for Property {}

impl std::fmt::Debug for Property {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Property").field("value", &self.get()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronicle_core::Cid;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_get_set() {
        let p = Property::new(Value::Number(1.0));
        assert_eq!(p.get(), Value::Number(1.0));
        p.set(Value::Number(2.0));
        assert_eq!(p.get(), Value::Number(2.0));
    }

    #[test]
    fn test_lazy_link_no_initial_notification() {
        let p = Property::new(Value::Number(5.0));
        let fired = Arc::new(AtomicUsize::new(0));
        let fired2 = fired.clone();
        p.on_change(move |_, _| {
            fired2.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        p.set(Value::Number(6.0));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_set_equal_value_does_not_notify() {
        let p = Property::new(Value::Number(5.0));
        let fired = Arc::new(AtomicUsize::new(0));
        let fired2 = fired.clone();
        p.on_change(move |_, _| {
            fired2.fetch_add(1, Ordering::SeqCst);
        });
        p.set(Value::Number(5.0));
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_listener_receives_new_and_old() {
        let p = Property::new(Value::Number(1.0));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen2 = seen.clone();
        p.on_change(move |new, old| {
            seen2.lock().unwrap().push((new.clone(), old.clone()));
        });
        p.set(Value::Number(2.0));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.as_slice(), &[(Value::Number(2.0), Value::Number(1.0))]);
    }

    #[test]
    fn test_set_quiet_does_not_notify() {
        let p = Property::new(Value::Number(1.0));
        let fired = Arc::new(AtomicUsize::new(0));
        let fired2 = fired.clone();
        p.on_change(move |_, _| {
            fired2.fetch_add(1, Ordering::SeqCst);
        });
        p.set_quiet(Value::Number(9.0));
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(p.get(), Value::Number(9.0));
    }

    #[test]
    fn test_remove_listener() {
        let p = Property::new(Value::Null);
        let fired = Arc::new(AtomicUsize::new(0));
        let fired2 = fired.clone();
        let id = p.on_change(move |_, _| {
            fired2.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(p.listener_count(), 1);
        assert!(p.remove_listener(id));
        assert_eq!(p.listener_count(), 0);
        assert!(!p.remove_listener(id)); // already gone

        p.set(Value::Bool(true));
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_trigger() {
        let p = Property::new(Value::Null);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen2 = seen.clone();
        p.on_trigger(move |event| {
            seen2.lock().unwrap().push(event.clone());
        });
        p.fire(serde_json::json!({"name": "pressed"}));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0]["name"], "pressed");
    }

    #[test]
    fn test_identity() {
        let p = Property::new(Value::Ref(Cid::from_raw(0)));
        let clone = p.clone();
        let other = Property::new(Value::Ref(Cid::from_raw(0)));

        assert_eq!(p, clone);
        assert_ne!(p, other); // same value, different cell
    }
}
