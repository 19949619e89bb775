#![forbid(unsafe_code)]

//! [`ObservableMap`] with a size limit, evicting in insertion order.
//!
//! The hash map has no order of its own, so the wrapper keeps an insertion
//! ledger: a queue of `(key, stamp)` records plus the live stamp of every
//! key. A record is live while its key is still in the map with the same
//! stamp; removing a key (or removing and re-adding it) leaves a stale record
//! that is skipped during eviction and dropped by periodic compaction.

use std::collections::VecDeque;
use std::fmt;
use std::hash::Hash;
use std::ops::Deref;

use ahash::AHashMap;

use super::{EvictionConfig, TrimEnd};
use crate::change::{ChangeSet, Subscription};
use crate::error::Result;
use crate::map::ObservableMap;

/// Compact once stale records outnumber live ones by this factor.
const COMPACT_FACTOR: usize = 2;
const COMPACT_SLACK: usize = 16;

struct Ledger<K> {
    order: VecDeque<(K, u64)>,
    stamps: AHashMap<K, u64>,
    next_stamp: u64,
}

impl<K: Eq + Hash + Clone> Ledger<K> {
    fn new() -> Self {
        Self {
            order: VecDeque::new(),
            stamps: AHashMap::new(),
            next_stamp: 0,
        }
    }

    fn record(&mut self, key: K) {
        let stamp = self.next_stamp;
        self.next_stamp += 1;
        self.stamps.insert(key.clone(), stamp);
        self.order.push_back((key, stamp));
    }

    fn is_live<V>(&self, map: &ObservableMap<K, V>, key: &K, stamp: u64) -> bool {
        map.contains_key(key) && self.stamps.get(key) == Some(&stamp)
    }

    /// Pop up to `count` live keys from `end`, dropping stale records on the way.
    fn take<V>(&mut self, map: &ObservableMap<K, V>, end: TrimEnd, count: usize) -> Vec<K> {
        let mut keys = Vec::with_capacity(count);
        while keys.len() < count {
            let next = match end {
                TrimEnd::Start => self.order.pop_front(),
                TrimEnd::End => self.order.pop_back(),
            };
            let Some((key, stamp)) = next else {
                break;
            };
            if self.is_live(map, &key, stamp) {
                self.stamps.remove(&key);
                keys.push(key);
            } else if !map.contains_key(&key) && self.stamps.get(&key) == Some(&stamp) {
                self.stamps.remove(&key);
            }
        }
        keys
    }

    fn compact_if_sparse<V>(&mut self, map: &ObservableMap<K, V>) {
        if self.order.len() <= map.len() * COMPACT_FACTOR + COMPACT_SLACK {
            return;
        }
        self.stamps.retain(|key, _| map.contains_key(key));
        let stamps = &self.stamps;
        self.order
            .retain(|(key, stamp)| stamps.get(key) == Some(stamp));
    }

    fn clear(&mut self) {
        self.order.clear();
        self.stamps.clear();
    }
}

/// A map that evicts its oldest (or newest) keys whenever it grows past its
/// limit.
pub struct CachingMap<K, V> {
    map: ObservableMap<K, V>,
    ledger: Ledger<K>,
    config: EvictionConfig,
}

impl<K: Eq + Hash + Clone, V> CachingMap<K, V> {
    /// Unbounded until a limit is set.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EvictionConfig::default())
    }

    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self::with_config(EvictionConfig::default().with_limit(limit))
    }

    #[must_use]
    pub fn with_config(config: EvictionConfig) -> Self {
        Self {
            map: ObservableMap::new(),
            ledger: Ledger::new(),
            config,
        }
    }

    /// Wrap an existing map. Its current entries count as inserted in the
    /// map's iteration order. Trims to the limit right away.
    #[must_use]
    pub fn from_map(map: ObservableMap<K, V>, config: EvictionConfig) -> Self {
        let mut ledger = Ledger::new();
        for key in map.keys() {
            ledger.record(key.clone());
        }
        let mut cache = Self {
            map,
            ledger,
            config,
        };
        cache.enforce_limit();
        cache
    }

    #[must_use]
    pub fn limit(&self) -> usize {
        self.config.limit
    }

    #[must_use]
    pub fn trim_end(&self) -> TrimEnd {
        self.config.trim_end
    }

    #[must_use]
    pub fn config(&self) -> EvictionConfig {
        self.config
    }

    pub fn set_limit(&mut self, limit: usize) -> Vec<(K, V)> {
        #[cfg(feature = "tracing")]
        super::log_limit("map", self.config.limit, limit);
        self.config.limit = limit;
        self.enforce_limit()
    }

    pub fn set_trim_end(&mut self, trim_end: TrimEnd) {
        self.config.trim_end = trim_end;
    }

    /// Evict the oldest keys until `len() <= n`.
    pub fn trim_start_down_to(&mut self, n: usize) -> Vec<(K, V)> {
        let overflow = self.map.len().saturating_sub(n);
        self.evict(TrimEnd::Start, overflow)
    }

    /// Evict the newest keys until `len() <= n`.
    pub fn trim_end_down_to(&mut self, n: usize) -> Vec<(K, V)> {
        let overflow = self.map.len().saturating_sub(n);
        self.evict(TrimEnd::End, overflow)
    }

    #[must_use = "dropping the Subscription unsubscribes immediately"]
    pub fn subscribe(&self, callback: impl Fn(&ChangeSet<(K, V)>) + 'static) -> Subscription {
        self.map.subscribe(callback)
    }

    #[must_use]
    pub fn into_inner(self) -> ObservableMap<K, V> {
        self.map
    }

    /// # Errors
    ///
    /// Same as [`ObservableMap::remove`].
    pub fn remove(&mut self, key: &K) -> Result<V> {
        let value = self.map.remove(key)?;
        self.ledger.compact_if_sparse(&self.map);
        Ok(value)
    }

    pub fn try_remove(&mut self, key: &K) -> Option<V> {
        self.remove(key).ok()
    }

    /// # Errors
    ///
    /// Same as [`ObservableMap::remove_where`].
    pub fn remove_where(&mut self, predicate: impl FnMut(&K, &V) -> bool) -> Result<Vec<(K, V)>> {
        let removed = self.map.remove_where(predicate)?;
        self.ledger.compact_if_sparse(&self.map);
        Ok(removed)
    }

    pub fn try_remove_where(&mut self, predicate: impl FnMut(&K, &V) -> bool) -> Vec<(K, V)> {
        let removed = self.map.try_remove_where(predicate);
        self.ledger.compact_if_sparse(&self.map);
        removed
    }

    /// # Errors
    ///
    /// Same as [`ObservableMap::remove_where_key`].
    pub fn remove_where_key(&mut self, mut predicate: impl FnMut(&K) -> bool) -> Result<Vec<(K, V)>> {
        self.remove_where(|k, _| predicate(k))
    }

    pub fn try_remove_where_key(&mut self, mut predicate: impl FnMut(&K) -> bool) -> Vec<(K, V)> {
        self.try_remove_where(|k, _| predicate(k))
    }

    /// # Errors
    ///
    /// Same as [`ObservableMap::remove_where_value`].
    pub fn remove_where_value(
        &mut self,
        mut predicate: impl FnMut(&V) -> bool,
    ) -> Result<Vec<(K, V)>> {
        self.remove_where(|_, v| predicate(v))
    }

    pub fn try_remove_where_value(&mut self, mut predicate: impl FnMut(&V) -> bool) -> Vec<(K, V)> {
        self.try_remove_where(|_, v| predicate(v))
    }

    /// # Errors
    ///
    /// Same as [`ObservableMap::remove_range`].
    pub fn remove_range<'k>(&mut self, keys: impl IntoIterator<Item = &'k K>) -> Result<Vec<(K, V)>>
    where
        K: 'k,
    {
        let removed = self.map.remove_range(keys)?;
        self.ledger.compact_if_sparse(&self.map);
        Ok(removed)
    }

    /// # Errors
    ///
    /// Same as [`ObservableMap::try_remove_range`].
    pub fn try_remove_range<'k>(
        &mut self,
        keys: impl IntoIterator<Item = &'k K>,
    ) -> Result<Vec<(K, V)>>
    where
        K: 'k,
    {
        let removed = self.map.try_remove_range(keys)?;
        self.ledger.compact_if_sparse(&self.map);
        Ok(removed)
    }

    pub fn clear(&mut self) -> Vec<(K, V)> {
        self.ledger.clear();
        self.map.clear()
    }

    fn enforce_limit(&mut self) -> Vec<(K, V)> {
        let overflow = self.config.overflow(self.map.len());
        self.evict(self.config.trim_end, overflow)
    }

    fn evict(&mut self, end: TrimEnd, count: usize) -> Vec<(K, V)> {
        if count == 0 {
            return Vec::new();
        }
        let keys = self.ledger.take(&self.map, end, count);
        let evicted = self.map.evict(&keys);
        debug_assert_eq!(evicted.len(), count, "insertion ledger out of step with map");
        #[cfg(feature = "tracing")]
        super::log_evict("map", evicted.len(), self.map.len(), self.config.limit);
        evicted
    }
}

impl<K: Eq + Hash + Clone, V: PartialEq> CachingMap<K, V> {
    /// # Errors
    ///
    /// Same as [`ObservableMap::remove_entry`].
    pub fn remove_entry(&mut self, key: &K, value: &V) -> Result<(K, V)> {
        let entry = self.map.remove_entry(key, value)?;
        self.ledger.compact_if_sparse(&self.map);
        Ok(entry)
    }

    pub fn try_remove_entry(&mut self, key: &K, value: &V) -> Option<(K, V)> {
        self.remove_entry(key, value).ok()
    }
}

impl<K: Eq + Hash + Clone, V: Clone> CachingMap<K, V> {
    /// Any eviction the new key causes is reported in the same record as
    /// the addition.
    ///
    /// # Errors
    ///
    /// Same as [`ObservableMap::add`].
    pub fn add(&mut self, key: K, value: V) -> Result<()> {
        self.add_range(std::iter::once((key, value)))
    }

    /// # Errors
    ///
    /// Same as [`ObservableMap::add_range`].
    pub fn add_range(&mut self, items: impl IntoIterator<Item = (K, V)>) -> Result<()> {
        let batch: Vec<(K, V)> = items.into_iter().collect();
        self.map.check_new_keys(&batch)?;
        self.grow(batch);
        Ok(())
    }

    /// Record and insert keys already known to be new, evicting the overflow
    /// inside the same record.
    fn grow(&mut self, batch: Vec<(K, V)>) -> Vec<(K, V)> {
        for (key, _) in &batch {
            self.ledger.record(key.clone());
        }
        let EvictionConfig { limit, trim_end } = self.config;
        let ledger = &mut self.ledger;
        let evicted = self.map.insert_then_evict(batch, |map| {
            ledger.take(map, trim_end, map.len().saturating_sub(limit))
        });
        #[cfg(feature = "tracing")]
        super::log_evict("map", evicted.len(), self.map.len(), limit);
        evicted
    }
}

impl<K: Eq + Hash + Clone, V: Clone + PartialEq> CachingMap<K, V> {
    /// Upsert. Replacing an existing key keeps its place in the eviction
    /// order; a new key may evict in the same record as its addition.
    pub fn set(&mut self, key: K, value: V) {
        if self.map.contains_key(&key) {
            self.map.set(key, value);
        } else {
            self.grow(vec![(key, value)]);
        }
    }
}

impl<K, V> Deref for CachingMap<K, V> {
    type Target = ObservableMap<K, V>;

    fn deref(&self) -> &ObservableMap<K, V> {
        &self.map
    }
}

impl<K: Eq + Hash + Clone, V> Default for CachingMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Clone for CachingMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            map: self.map.clone(),
            ledger: Ledger {
                order: self.ledger.order.clone(),
                stamps: self.ledger.stamps.clone(),
                next_stamp: self.ledger.next_stamp,
            },
            config: self.config,
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for CachingMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachingMap")
            .field("map", &self.map)
            .field("limit", &self.config.limit)
            .field("trim_end", &self.config.trim_end)
            .finish()
    }
}

/// Contents and limit must both match.
impl<K: Eq + Hash, V: PartialEq> PartialEq for CachingMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.config.limit == other.config.limit && self.map == other.map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn evicts_oldest_insertions() {
        let mut cache = CachingMap::with_limit(3);
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let _sub = cache.subscribe(move |c: &ChangeSet<(i32, char)>| {
            sink.borrow_mut().push(c.clone());
        });

        for (i, c) in ('a'..='e').enumerate() {
            cache.add(i as i32, c).unwrap();
        }

        assert_eq!(cache.len(), 3);
        assert!(cache.contains_key(&2) && cache.contains_key(&3) && cache.contains_key(&4));
        let log = log.borrow();
        assert_eq!(log.len(), 5);
        assert_eq!(log[3], ChangeSet::new(vec![(3, 'd')], vec![(0, 'a')]));
        assert_eq!(log[4], ChangeSet::new(vec![(4, 'e')], vec![(1, 'b')]));
    }

    #[test]
    fn end_trim_evicts_newest() {
        let config = EvictionConfig::default()
            .with_limit(2)
            .with_trim_end(TrimEnd::End);
        let mut cache = CachingMap::with_config(config);
        cache.add(1, "a").unwrap();
        cache.add(2, "b").unwrap();
        cache.add(3, "c").unwrap();
        assert!(!cache.contains_key(&3));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn removed_then_readded_key_is_newest() {
        let mut cache = CachingMap::with_limit(3);
        cache.add_range([(1, 'a'), (2, 'b'), (3, 'c')]).unwrap();
        cache.remove(&1).unwrap();
        cache.add(1, 'z').unwrap();
        cache.add(4, 'd').unwrap();

        // 2 is now the oldest live key.
        assert!(!cache.contains_key(&2));
        assert_eq!(cache.get(&1), Ok(&'z'));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn set_existing_key_keeps_position() {
        let mut cache = CachingMap::with_limit(2);
        cache.set(1, "a");
        cache.set(2, "b");
        cache.set(1, "updated");
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let _sub = cache.subscribe(move |c: &ChangeSet<(i32, &'static str)>| {
            sink.borrow_mut().push(c.clone());
        });
        cache.set(3, "c");
        assert!(!cache.contains_key(&1));
        assert_eq!(cache.get(&2), Ok(&"b"));
        assert_eq!(
            *log.borrow(),
            vec![ChangeSet::new(vec![(3, "c")], vec![(1, "updated")])]
        );
    }

    #[test]
    fn rejected_add_records_nothing() {
        let mut cache = CachingMap::with_limit(1);
        cache.add(1, 'a').unwrap();
        assert!(cache.add(1, 'b').is_err());
        assert_eq!(cache.ledger.order.len(), 1);
        cache.add(2, 'c').unwrap();
        assert_eq!(cache.get(&2), Ok(&'c'));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn set_limit_evicts_in_one_batch() {
        let mut cache = CachingMap::new();
        cache.add_range((0..5).map(|i| (i, i * 10))).unwrap();
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let _sub = cache.subscribe(move |c: &ChangeSet<(i32, i32)>| {
            sink.borrow_mut().push(c.clone());
        });

        let evicted = cache.set_limit(2);
        assert_eq!(evicted, vec![(0, 0), (1, 10), (2, 20)]);
        assert_eq!(log.borrow().len(), 1);
        assert!(log.borrow()[0].added.is_empty());
    }

    #[test]
    fn rejected_batch_leaves_ledger_alone() {
        let mut cache = CachingMap::with_limit(2);
        cache.add(1, 'a').unwrap();
        assert!(cache.add_range([(2, 'b'), (1, 'x')]).is_err());
        cache.add(3, 'c').unwrap();
        cache.add(4, 'd').unwrap();
        assert!(cache.contains_key(&3) && cache.contains_key(&4));
    }

    #[test]
    fn ledger_compacts_after_churn() {
        let mut cache = CachingMap::with_limit(4);
        for i in 0..200 {
            cache.add(i, i).unwrap();
            cache.remove(&i).unwrap();
        }
        assert!(cache.is_empty());
        assert!(cache.ledger.order.len() <= COMPACT_SLACK + 1);
        cache.add_range([(1, 1), (2, 2)]).unwrap();
        assert_eq!(cache.trim_start_down_to(1), vec![(1, 1)]);
    }

    #[test]
    fn explicit_trims_are_idempotent() {
        let mut cache = CachingMap::new();
        cache.add_range([(1, 'a'), (2, 'b'), (3, 'c'), (4, 'd')]).unwrap();
        assert_eq!(cache.trim_end_down_to(3), vec![(4, 'd')]);
        assert!(cache.trim_end_down_to(3).is_empty());
        assert_eq!(cache.trim_start_down_to(1), vec![(1, 'a'), (2, 'b')]);
        assert!(cache.trim_start_down_to(1).is_empty());
        assert_eq!(cache.get(&3), Ok(&'c'));
    }

    #[test]
    fn clear_resets_ledger() {
        let mut cache = CachingMap::with_limit(2);
        cache.add_range([(1, 'a'), (2, 'b')]).unwrap();
        cache.clear();
        cache.add_range([(3, 'c'), (4, 'd')]).unwrap();
        cache.add(5, 'e').unwrap();
        assert!(!cache.contains_key(&3));
        assert_eq!(cache.len(), 2);
    }
}
