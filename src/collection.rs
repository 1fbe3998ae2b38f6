//! Insertion-ordered collection with keyed upsert
//!
//! Results, courses and classes are spliced back into their lists by id whenever one of
//! them is recomputed. [`KeyedCollection`] keeps the list order stable and finds the slot
//! to replace through a key index instead of scanning.

use std::collections::HashMap;
use std::hash::Hash;

use crate::types::{Course, CourseClass, RaceResult};

/// Entities with a natural identity key.
pub trait Keyed {
    type Key: Eq + Hash + Clone;

    fn key(&self) -> Self::Key;
}

impl Keyed for RaceResult {
    type Key = String;

    fn key(&self) -> String {
        self.id.clone()
    }
}

impl Keyed for Course {
    type Key = String;

    fn key(&self) -> String {
        self.id.clone()
    }
}

impl Keyed for CourseClass {
    type Key = String;

    fn key(&self) -> String {
        self.id.clone()
    }
}

/// Values in insertion order, indexed by key.
#[derive(Debug, Clone)]
pub struct KeyedCollection<K, V> {
    values: Vec<V>,
    index: HashMap<K, usize>,
}

impl<K, V> Default for KeyedCollection<K, V> {
    fn default() -> Self {
        Self { values: Vec::new(), index: HashMap::new() }
    }
}

impl<K: Eq + Hash + Clone, V> KeyedCollection<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from values, keeping the last value seen for a repeated key in the slot of
    /// the first.
    pub fn from_values(values: impl IntoIterator<Item = V>, key_fn: impl Fn(&V) -> K) -> Self {
        let mut collection = Self::new();
        for value in values {
            collection.upsert(value, &key_fn);
        }
        collection
    }

    /// Replace the value with the same key in place, or append it.
    ///
    /// Returns the replaced value, if any.
    pub fn upsert(&mut self, value: V, key_fn: impl Fn(&V) -> K) -> Option<V> {
        let key = key_fn(&value);
        match self.index.get(&key) {
            Some(&slot) => Some(std::mem::replace(&mut self.values[slot], value)),
            None => {
                self.index.insert(key, self.values.len());
                self.values.push(value);
                None
            }
        }
    }

    /// Remove the value stored under `key`, shifting later values down.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let slot = self.index.remove(key)?;
        let removed = self.values.remove(slot);
        for position in self.index.values_mut() {
            if *position > slot {
                *position -= 1;
            }
        }
        Some(removed)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.index.get(key).map(|&slot| &self.values[slot])
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.index.get(key).map(|&slot| &mut self.values[slot])
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, V> {
        self.values.iter()
    }

    pub fn as_slice(&self) -> &[V] {
        &self.values
    }

    pub fn into_vec(self) -> Vec<V> {
        self.values
    }
}

impl<V: Keyed> KeyedCollection<V::Key, V> {
    /// Upsert using the value's own key.
    pub fn upsert_keyed(&mut self, value: V) -> Option<V> {
        self.upsert(value, V::key)
    }
}

impl<V: Keyed> FromIterator<V> for KeyedCollection<V::Key, V> {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self::from_values(iter, V::key)
    }
}

impl<K, V> IntoIterator for KeyedCollection<K, V> {
    type Item = V;
    type IntoIter = std::vec::IntoIter<V>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}
