//! Keyed registry with shared, reference-counted records
//!
//! One record is usually reachable through several keys: its device type
//! name, every hardware GUID it ships with, and the VID/PID key derived from
//! each GUID. Records are held as `Rc<T>`, so a record's reference count is
//! exactly the number of keys pointing at it and it is freed when the last
//! key goes away.

use std::collections::HashMap;
use std::rc::Rc;

use tracing::trace;

/// Mapping from string key to a shared record
#[derive(Debug)]
pub struct Registry<T> {
    entries: HashMap<String, Rc<T>>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T> Registry<T> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Point `key` at `record`, adding one reference.
    ///
    /// If the key already pointed at a record, that reference is released
    /// and the displaced record is returned (it is freed once the caller
    /// drops it, unless other keys still share it).
    pub fn put(&mut self, key: impl Into<String>, record: &Rc<T>) -> Option<Rc<T>> {
        let key = key.into();
        trace!(key = %key, "Registering key");
        self.entries.insert(key, Rc::clone(record))
    }

    /// Non-owning lookup
    pub fn get(&self, key: &str) -> Option<&Rc<T>> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Remove `key`, dropping its reference. Returns whether the key existed.
    pub fn release(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Number of live references to the record behind `key`, 0 if absent.
    ///
    /// Outside of an in-flight lookup this equals the number of keys sharing
    /// the record.
    pub fn refcount(&self, key: &str) -> usize {
        self.entries.get(key).map_or(0, Rc::strong_count)
    }

    /// Re-point every key that references `old` at `new`.
    ///
    /// Returns how many keys moved.
    pub fn rebind(&mut self, old: &Rc<T>, new: &Rc<T>) -> usize {
        let mut moved = 0;
        for value in self.entries.values_mut() {
            if Rc::ptr_eq(value, old) {
                *value = Rc::clone(new);
                moved += 1;
            }
        }
        moved
    }

    /// Every key that currently references `record`
    pub fn keys_for(&self, record: &Rc<T>) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, value)| Rc::ptr_eq(value, record))
            .map(|(key, _)| key.as_str())
            .collect()
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rc<T>)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Release every key; each record is freed exactly once
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
