//! Ordered observable collection of property handles.

use crate::property::{ListenerId, Property};
use std::cmp::Ordering;
use std::sync::{Arc, Mutex};

/// Comparator used by [`ObservableList::sort`]
pub type Comparator = Arc<dyn Fn(&Property, &Property) -> Ordering + Send + Sync>;

/// A structural change to an observable list
#[derive(Debug, Clone)]
pub enum ListEvent {
    /// A property was appended
    Added(Property),
    /// A property was removed
    Removed(Property),
    /// Membership was restored to the initial state
    Reset,
    /// Members were re-sorted
    Sorted,
}

type ListListener = Box<dyn FnMut(&ListEvent) + Send>;

struct Listeners {
    next: u64,
    entries: Vec<(ListenerId, ListListener)>,
}

struct Inner {
    members: Mutex<Vec<Property>>,
    initial: Vec<Property>,
    comparator: Option<Comparator>,
    listeners: Mutex<Listeners>,
}

/// Ordered collection of property handles with structural change
/// notification: add, remove, reset to initial membership, and
/// re-sort with the comparator supplied at construction.
///
/// Like [`Property`], this is a shared handle with cell identity.
#[derive(Clone)]
pub struct ObservableList {
    inner: Arc<Inner>,
}

impl ObservableList {
    /// Create an empty list with no comparator
    #[must_use]
    pub fn new() -> Self {
        Self::with_members(Vec::new())
    }

    /// Create a list whose initial membership is `members`.
    /// [`reset`](Self::reset) restores exactly this membership.
    #[must_use]
    pub fn with_members(members: Vec<Property>) -> Self {
        Self {
            inner: Arc::new(Inner {
                members: Mutex::new(members.clone()),
                initial: members,
                comparator: None,
                listeners: Mutex::new(Listeners {
                    next: 0,
                    entries: Vec::new(),
                }),
            }),
        }
    }

    /// Create an empty list that sorts with `comparator`
    #[must_use]
    pub fn with_comparator(comparator: Comparator) -> Self {
        Self {
            inner: Arc::new(Inner {
                members: Mutex::new(Vec::new()),
                initial: Vec::new(),
                comparator: Some(comparator),
                listeners: Mutex::new(Listeners {
                    next: 0,
                    entries: Vec::new(),
                }),
            }),
        }
    }

    /// Append a property and notify
    pub fn add(&self, property: Property) {
        self.inner
            .members
            .lock()
            .expect("lock poisoned")
            .push(property.clone());
        self.notify(&ListEvent::Added(property));
    }

    /// Remove a property by cell identity and notify. Returns true
    /// if the property was a member.
    pub fn remove(&self, property: &Property) -> bool {
        let removed = {
            let mut members = self.inner.members.lock().expect("lock poisoned");
            match members.iter().position(|m| m.same_cell(property)) {
                Some(index) => {
                    members.remove(index);
                    true
                }
                None => false,
            }
        };
        if removed {
            self.notify(&ListEvent::Removed(property.clone()));
        }
        removed
    }

    /// Restore the membership captured at construction and notify
    pub fn reset(&self) {
        *self.inner.members.lock().expect("lock poisoned") = self.inner.initial.clone();
        self.notify(&ListEvent::Reset);
    }

    /// Stable re-sort with the construction-time comparator and
    /// notify. Without a comparator the order is left unchanged but
    /// listeners still hear the event, so a recording captures it.
    pub fn sort(&self) {
        if let Some(comparator) = &self.inner.comparator {
            self.inner
                .members
                .lock()
                .expect("lock poisoned")
                .sort_by(|a, b| comparator(a, b));
        }
        self.notify(&ListEvent::Sorted);
    }

    /// True if `property` is a member, by cell identity
    #[must_use]
    pub fn contains(&self, property: &Property) -> bool {
        self.inner
            .members
            .lock()
            .expect("lock poisoned")
            .iter()
            .any(|m| m.same_cell(property))
    }

    /// Current member count
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.members.lock().expect("lock poisoned").len()
    }

    /// True if the list has no members
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the current members, in order
    #[must_use]
    pub fn members(&self) -> Vec<Property> {
        self.inner.members.lock().expect("lock poisoned").clone()
    }

    /// Subscribe to structural changes
    pub fn on_event<F>(&self, listener: F) -> ListenerId
    where
        F: FnMut(&ListEvent) + Send + 'static,
    {
        let mut listeners = self.inner.listeners.lock().expect("lock poisoned");
        let id = ListenerId::from_raw(listeners.next);
        listeners.next += 1;
        listeners.entries.push((id, Box::new(listener)));
        id
    }

    /// Detach a previously attached listener. Returns true if the
    /// id was found.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.inner.listeners.lock().expect("lock poisoned");
        let before = listeners.entries.len();
        listeners.entries.retain(|(lid, _)| *lid != id);
        before != listeners.entries.len()
    }

    /// True if both handles point at the same list
    #[must_use]
    pub fn same_cell(&self, other: &ObservableList) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn notify(&self, event: &ListEvent) {
        let mut listeners = self.inner.listeners.lock().expect("lock poisoned");
        for (_, listener) in &mut listeners.entries {
            listener(event);
        }
    }
}

impl Default for ObservableList {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for ObservableList {
    fn eq(&self, other: &Self) -> bool {
        self.same_cell(other)
    }
}

impl Eq for ObservableList {}

impl std::fmt::Debug for ObservableList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservableList")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronicle_core::Value;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    fn number(n: f64) -> Property {
        Property::new(Value::Number(n))
    }

    #[test]
    fn test_add_remove_contains() {
        let list = ObservableList::new();
        let p = number(1.0);

        list.add(p.clone());
        assert!(list.contains(&p));
        assert_eq!(list.len(), 1);

        assert!(list.remove(&p));
        assert!(!list.contains(&p));
        assert!(list.is_empty());

        assert!(!list.remove(&p)); // not a member anymore
    }

    #[test]
    fn test_remove_is_by_identity() {
        let list = ObservableList::new();
        let p = number(1.0);
        let twin = number(1.0); // equal value, different cell

        list.add(p);
        assert!(!list.remove(&twin));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_reset_restores_initial_membership() {
        let a = number(1.0);
        let b = number(2.0);
        let list = ObservableList::with_members(vec![a.clone()]);

        list.add(b.clone());
        assert_eq!(list.len(), 2);

        list.reset();
        assert_eq!(list.len(), 1);
        assert!(list.contains(&a));
        assert!(!list.contains(&b));
    }

    #[test]
    fn test_sort_with_comparator() {
        let comparator: Comparator = Arc::new(|a, b| {
            let a = a.get().as_number().unwrap_or(0.0);
            let b = b.get().as_number().unwrap_or(0.0);
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        });
        let list = ObservableList::with_comparator(comparator);
        let three = number(3.0);
        let one = number(1.0);
        let two = number(2.0);
        list.add(three.clone());
        list.add(one.clone());
        list.add(two.clone());

        list.sort();

        let members = list.members();
        assert!(members[0].same_cell(&one));
        assert!(members[1].same_cell(&two));
        assert!(members[2].same_cell(&three));
    }

    #[test]
    fn test_events_fire_for_every_operation() {
        let list = ObservableList::new();
        let count = Arc::new(AtomicUsize::new(0));
        let count2 = count.clone();
        list.on_event(move |_| {
            count2.fetch_add(1, AtomicOrdering::SeqCst);
        });

        let p = number(1.0);
        list.add(p.clone()); // 1
        list.remove(&p); // 2
        list.reset(); // 3
        list.sort(); // 4 - no comparator, still notifies
        assert_eq!(count.load(AtomicOrdering::SeqCst), 4);
    }

    #[test]
    fn test_removed_listener_is_silent() {
        let list = ObservableList::new();
        let count = Arc::new(AtomicUsize::new(0));
        let count2 = count.clone();
        let id = list.on_event(move |_| {
            count2.fetch_add(1, AtomicOrdering::SeqCst);
        });
        assert!(list.remove_listener(id));
        list.add(number(1.0));
        assert_eq!(count.load(AtomicOrdering::SeqCst), 0);
    }
}
