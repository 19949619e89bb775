#![forbid(unsafe_code)]

//! Hash map with change notifications.
//!
//! Change records carry `(key, value)` pairs. Iteration order is the hash
//! map's and is not insertion order.
//!
//! # Invariants
//!
//! 1. Keys are unique.
//! 2. Batch operations (`add_range`, `remove_range`) validate the whole batch
//!    before touching the map: a rejected batch leaves the map untouched and
//!    dispatches nothing.
//! 3. `set` with a value equal to the current one is silent.

use std::fmt;
use std::hash::Hash;

use ahash::{AHashMap, AHashSet};

use crate::change::{ChangeSet, Subscribers, Subscription};
use crate::error::{CollectionError, Result, absent_as_none};

pub struct ObservableMap<K, V> {
    entries: AHashMap<K, V>,
    subscribers: Subscribers<(K, V)>,
}

impl<K, V> ObservableMap<K, V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: AHashMap::new(),
            subscribers: Subscribers::new(),
        }
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: AHashMap::with_capacity(capacity),
            subscribers: Subscribers::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values()
    }

    #[must_use = "dropping the Subscription unsubscribes immediately"]
    pub fn subscribe(&self, callback: impl Fn(&ChangeSet<(K, V)>) + 'static) -> Subscription {
        self.subscribers.subscribe(callback)
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Drop every entry as one notification.
    pub fn clear(&mut self) -> Vec<(K, V)> {
        if self.entries.is_empty() {
            return Vec::new();
        }
        let removed: Vec<(K, V)> = self.entries.drain().collect();
        self.dispatch_removed(removed)
    }

    fn dispatch_removed(&self, removed: Vec<(K, V)>) -> Vec<(K, V)> {
        let change = ChangeSet::removed(removed);
        self.subscribers.notify(&change);
        change.removed
    }
}

impl<K: Eq + Hash, V> ObservableMap<K, V> {
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// # Errors
    ///
    /// [`CollectionError::KeyNotFound`] when `key` is absent.
    pub fn get(&self, key: &K) -> Result<&V> {
        self.entries.get(key).ok_or(CollectionError::KeyNotFound)
    }

    #[must_use]
    pub fn try_get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    /// # Errors
    ///
    /// [`CollectionError::KeyNotFound`] when `key` is absent.
    pub fn remove(&mut self, key: &K) -> Result<V> {
        let (key, value) = self
            .entries
            .remove_entry(key)
            .ok_or(CollectionError::KeyNotFound)?;
        let mut removed = self.dispatch_removed(vec![(key, value)]);
        Ok(removed.swap_remove(0).1)
    }

    pub fn try_remove(&mut self, key: &K) -> Option<V> {
        self.remove(key).ok()
    }

    /// Remove every entry matching `predicate` in one notification.
    ///
    /// # Errors
    ///
    /// [`CollectionError::NotFound`] when nothing matches.
    pub fn remove_where(&mut self, predicate: impl FnMut(&K, &V) -> bool) -> Result<Vec<(K, V)>> {
        let removed = self.try_remove_where(predicate);
        if removed.is_empty() {
            return Err(CollectionError::NotFound);
        }
        Ok(removed)
    }

    pub fn try_remove_where(&mut self, mut predicate: impl FnMut(&K, &V) -> bool) -> Vec<(K, V)> {
        let mut removed = Vec::new();
        let old = std::mem::take(&mut self.entries);
        self.entries.reserve(old.len());
        for (key, value) in old {
            if predicate(&key, &value) {
                removed.push((key, value));
            } else {
                self.entries.insert(key, value);
            }
        }
        if removed.is_empty() {
            return removed;
        }
        self.dispatch_removed(removed)
    }

    /// # Errors
    ///
    /// [`CollectionError::NotFound`] when no key matches.
    pub fn remove_where_key(&mut self, mut predicate: impl FnMut(&K) -> bool) -> Result<Vec<(K, V)>> {
        self.remove_where(|k, _| predicate(k))
    }

    pub fn try_remove_where_key(&mut self, mut predicate: impl FnMut(&K) -> bool) -> Vec<(K, V)> {
        self.try_remove_where(|k, _| predicate(k))
    }

    /// # Errors
    ///
    /// [`CollectionError::NotFound`] when no value matches.
    pub fn remove_where_value(
        &mut self,
        mut predicate: impl FnMut(&V) -> bool,
    ) -> Result<Vec<(K, V)>> {
        self.remove_where(|_, v| predicate(v))
    }

    pub fn try_remove_where_value(&mut self, mut predicate: impl FnMut(&V) -> bool) -> Vec<(K, V)> {
        self.try_remove_where(|_, v| predicate(v))
    }

    /// Remove a batch of keys as one notification, or nothing at all.
    ///
    /// # Errors
    ///
    /// - [`CollectionError::DuplicateKeyInBatch`] when `keys` repeats a key.
    /// - [`CollectionError::KeyNotFound`] when any key is absent.
    pub fn remove_range<'k>(&mut self, keys: impl IntoIterator<Item = &'k K>) -> Result<Vec<(K, V)>>
    where
        K: 'k,
    {
        let keys: Vec<&K> = keys.into_iter().collect();
        let mut seen = AHashSet::with_capacity(keys.len());
        for key in &keys {
            if !seen.insert(*key) {
                return Err(CollectionError::DuplicateKeyInBatch);
            }
        }
        if keys.iter().any(|key| !self.entries.contains_key(*key)) {
            return Err(CollectionError::KeyNotFound);
        }
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let removed: Vec<(K, V)> = keys
            .into_iter()
            .filter_map(|key| self.entries.remove_entry(key))
            .collect();
        Ok(self.dispatch_removed(removed))
    }

    /// [`remove_range`](Self::remove_range), except a missing key turns the
    /// whole call into a no-op. A repeated key still fails.
    ///
    /// # Errors
    ///
    /// [`CollectionError::DuplicateKeyInBatch`] when `keys` repeats a key.
    pub fn try_remove_range<'k>(
        &mut self,
        keys: impl IntoIterator<Item = &'k K>,
    ) -> Result<Vec<(K, V)>>
    where
        K: 'k,
    {
        absent_as_none(self.remove_range(keys)).map(Option::unwrap_or_default)
    }

    /// Remove whichever of `keys` are present as one removal record.
    pub(crate) fn evict(&mut self, keys: &[K]) -> Vec<(K, V)> {
        let evicted: Vec<(K, V)> = keys
            .iter()
            .filter_map(|key| self.entries.remove_entry(key))
            .collect();
        if evicted.is_empty() {
            return evicted;
        }
        self.dispatch_removed(evicted)
    }

    /// Reject a batch that repeats a key or names one already present.
    pub(crate) fn check_new_keys(&self, batch: &[(K, V)]) -> Result<()> {
        let mut seen = AHashSet::with_capacity(batch.len());
        for (key, _) in batch {
            if self.entries.contains_key(key) {
                return Err(CollectionError::DuplicateKey);
            }
            if !seen.insert(key) {
                return Err(CollectionError::DuplicateKeyInBatch);
            }
        }
        Ok(())
    }
}

impl<K: Eq + Hash, V: PartialEq> ObservableMap<K, V> {
    /// Remove `key` only when it currently maps to `value`.
    ///
    /// # Errors
    ///
    /// [`CollectionError::NotFound`] when the pair is absent.
    pub fn remove_entry(&mut self, key: &K, value: &V) -> Result<(K, V)> {
        if self.entries.get(key) != Some(value) {
            return Err(CollectionError::NotFound);
        }
        let entry = self
            .entries
            .remove_entry(key)
            .ok_or(CollectionError::NotFound)?;
        let mut removed = self.dispatch_removed(vec![entry]);
        Ok(removed.swap_remove(0))
    }

    pub fn try_remove_entry(&mut self, key: &K, value: &V) -> Option<(K, V)> {
        self.remove_entry(key, value).ok()
    }
}

impl<K: Eq + Hash + Clone, V: Clone> ObservableMap<K, V> {
    /// # Errors
    ///
    /// [`CollectionError::DuplicateKey`] when `key` already exists.
    pub fn add(&mut self, key: K, value: V) -> Result<()> {
        if self.entries.contains_key(&key) {
            return Err(CollectionError::DuplicateKey);
        }
        self.entries.insert(key.clone(), value.clone());
        self.subscribers.notify(&ChangeSet::added(vec![(key, value)]));
        Ok(())
    }

    /// Add a batch as one notification, or nothing at all.
    ///
    /// # Errors
    ///
    /// - [`CollectionError::DuplicateKey`] when any key already exists.
    /// - [`CollectionError::DuplicateKeyInBatch`] when the batch repeats a key.
    pub fn add_range(&mut self, items: impl IntoIterator<Item = (K, V)>) -> Result<()> {
        let batch: Vec<(K, V)> = items.into_iter().collect();
        self.check_new_keys(&batch)?;
        self.insert_then_evict(batch, |_| Vec::new());
        Ok(())
    }

    /// Insert a batch of keys known to be new, then remove the keys `pick`
    /// chooses from the grown map. Both sides go out as one record. Returns
    /// the removed entries.
    pub(crate) fn insert_then_evict(
        &mut self,
        batch: Vec<(K, V)>,
        pick: impl FnOnce(&Self) -> Vec<K>,
    ) -> Vec<(K, V)> {
        if batch.is_empty() {
            return Vec::new();
        }
        self.entries.reserve(batch.len());
        self.entries.extend(batch.iter().cloned());
        let keys = pick(self);
        let evicted: Vec<(K, V)> = keys
            .iter()
            .filter_map(|key| self.entries.remove_entry(key))
            .collect();
        let change = ChangeSet::new(batch, evicted);
        self.subscribers.notify(&change);
        change.removed
    }
}

impl<K: Eq + Hash + Clone, V: Clone + PartialEq> ObservableMap<K, V> {
    /// Insert or replace. A new key dispatches an addition, a changed value
    /// dispatches one old/new pair, an equal value dispatches nothing.
    pub fn set(&mut self, key: K, value: V) {
        match self.entries.get_mut(&key) {
            Some(current) if *current == value => {}
            Some(current) => {
                let old = std::mem::replace(current, value.clone());
                self.subscribers
                    .notify(&ChangeSet::replaced((key.clone(), old), (key, value)));
            }
            None => {
                self.entries.insert(key.clone(), value.clone());
                self.subscribers.notify(&ChangeSet::added(vec![(key, value)]));
            }
        }
    }
}

impl<K, V> Default for ObservableMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Clones entries. Subscribers stay with the original.
impl<K: Clone, V: Clone> Clone for ObservableMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            subscribers: Subscribers::new(),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for ObservableMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableMap")
            .field("entries", &self.entries)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

/// Later duplicates overwrite earlier ones.
/// Adopt an existing map without rehashing it.
impl<K, V> From<AHashMap<K, V>> for ObservableMap<K, V> {
    fn from(entries: AHashMap<K, V>) -> Self {
        Self {
            entries,
            subscribers: Subscribers::new(),
        }
    }
}

impl<K: Eq + Hash, V> FromIterator<(K, V)> for ObservableMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
            subscribers: Subscribers::new(),
        }
    }
}

impl<K: Eq + Hash, V: PartialEq> PartialEq for ObservableMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<K: Eq + Hash, V: Eq> Eq for ObservableMap<K, V> {}
