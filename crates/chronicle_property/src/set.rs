//! Named groups of property handles.

use crate::property::Property;
use indexmap::IndexMap;
use std::sync::{Arc, Mutex};

/// An insertion-ordered, named group of properties.
///
/// Sets are registration targets only - no replayable operation
/// addresses them - but they occupy their own registry so ids stay
/// parallel with properties and collections.
#[derive(Clone)]
pub struct PropertySet {
    inner: Arc<Mutex<IndexMap<String, Property>>>,
}

impl PropertySet {
    /// Create an empty set
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(IndexMap::new())),
        }
    }

    /// Insert a named property, replacing any previous binding
    pub fn insert(&self, name: impl Into<String>, property: Property) {
        self.inner
            .lock()
            .expect("lock poisoned")
            .insert(name.into(), property);
    }

    /// Look up a property by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Property> {
        self.inner.lock().expect("lock poisoned").get(name).cloned()
    }

    /// Names in insertion order
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.inner
            .lock()
            .expect("lock poisoned")
            .keys()
            .cloned()
            .collect()
    }

    /// Number of bindings
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().expect("lock poisoned").len()
    }

    /// True if the set has no bindings
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PropertySet {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PropertySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertySet")
            .field("names", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronicle_core::Value;

    #[test]
    fn test_insert_get() {
        let set = PropertySet::new();
        let p = Property::new(Value::Number(1.0));
        set.insert("mass", p.clone());

        assert_eq!(set.len(), 1);
        assert!(set.get("mass").unwrap().same_cell(&p));
        assert!(set.get("velocity").is_none());
    }

    #[test]
    fn test_names_keep_insertion_order() {
        let set = PropertySet::new();
        set.insert("b", Property::new(Value::Null));
        set.insert("a", Property::new(Value::Null));
        assert_eq!(set.names(), vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_insert_replaces() {
        let set = PropertySet::new();
        let first = Property::new(Value::Number(1.0));
        let second = Property::new(Value::Number(2.0));
        set.insert("x", first);
        set.insert("x", second.clone());

        assert_eq!(set.len(), 1);
        assert!(set.get("x").unwrap().same_cell(&second));
    }
}
