#![forbid(unsafe_code)]

//! [`ObservableList`] with a size limit.

use std::fmt;
use std::ops::Deref;

use super::{EvictionConfig, TrimEnd};
use crate::change::{ChangeSet, Subscription};
use crate::error::Result;
use crate::list::ObservableList;

/// A list that evicts from one end whenever it grows past its limit.
///
/// Lists evict from the front (oldest first) unless configured otherwise.
///
/// ```
/// use ripple_collections::CachingList;
///
/// let mut recent = CachingList::with_limit(3);
/// for i in 1..=5 {
///     recent.add(i);
/// }
/// assert_eq!(recent.as_slice(), &[3, 4, 5]);
/// ```
pub struct CachingList<T> {
    list: ObservableList<T>,
    config: EvictionConfig,
}

impl<T> CachingList<T> {
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
            list: ObservableList::new(),
            config,
        }
    }

    /// Wrap an existing list, trimming it to the limit right away.
    #[must_use]
    pub fn from_list(list: ObservableList<T>, config: EvictionConfig) -> Self {
        let mut cache = Self { list, config };
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

    /// Change the limit and evict the overflow immediately.
    pub fn set_limit(&mut self, limit: usize) -> Vec<T> {
        #[cfg(feature = "tracing")]
        super::log_limit("list", self.config.limit, limit);
        self.config.limit = limit;
        self.enforce_limit()
    }

    /// Change the eviction end. Takes effect on the next trim pass.
    pub fn set_trim_end(&mut self, trim_end: TrimEnd) {
        self.config.trim_end = trim_end;
    }

    /// Remove from the front until `len() <= n`.
    pub fn trim_start_down_to(&mut self, n: usize) -> Vec<T> {
        let overflow = self.list.len().saturating_sub(n);
        self.evict(TrimEnd::Start, overflow)
    }

    /// Remove from the back until `len() <= n`.
    pub fn trim_end_down_to(&mut self, n: usize) -> Vec<T> {
        let overflow = self.list.len().saturating_sub(n);
        self.evict(TrimEnd::End, overflow)
    }

    #[must_use = "dropping the Subscription unsubscribes immediately"]
    pub fn subscribe(&self, callback: impl Fn(&ChangeSet<T>) + 'static) -> Subscription {
        self.list.subscribe(callback)
    }

    #[must_use]
    pub fn into_inner(self) -> ObservableList<T> {
        self.list
    }

    /// # Errors
    ///
    /// Same as [`ObservableList::swap`].
    pub fn swap(&mut self, a: usize, b: usize) -> Result<()> {
        self.list.swap(a, b)
    }

    /// # Errors
    ///
    /// Same as [`ObservableList::remove_at`].
    pub fn remove_at(&mut self, index: usize) -> Result<T> {
        self.list.remove_at(index)
    }

    /// # Errors
    ///
    /// Same as [`ObservableList::remove_range`].
    pub fn remove_range(&mut self, start: usize, count: usize) -> Result<Vec<T>> {
        self.list.remove_range(start, count)
    }

    /// # Errors
    ///
    /// Same as [`ObservableList::remove_first_where`].
    pub fn remove_first_where(&mut self, predicate: impl FnMut(&T) -> bool) -> Result<T> {
        self.list.remove_first_where(predicate)
    }

    pub fn try_remove_first_where(&mut self, predicate: impl FnMut(&T) -> bool) -> Option<T> {
        self.list.try_remove_first_where(predicate)
    }

    /// # Errors
    ///
    /// Same as [`ObservableList::remove_last_where`].
    pub fn remove_last_where(&mut self, predicate: impl FnMut(&T) -> bool) -> Result<T> {
        self.list.remove_last_where(predicate)
    }

    pub fn try_remove_last_where(&mut self, predicate: impl FnMut(&T) -> bool) -> Option<T> {
        self.list.try_remove_last_where(predicate)
    }

    /// # Errors
    ///
    /// Same as [`ObservableList::remove_all_where`].
    pub fn remove_all_where(&mut self, predicate: impl FnMut(&T) -> bool) -> Result<Vec<T>> {
        self.list.remove_all_where(predicate)
    }

    pub fn try_remove_all_where(&mut self, predicate: impl FnMut(&T) -> bool) -> Vec<T> {
        self.list.try_remove_all_where(predicate)
    }

    pub fn clear(&mut self) -> Vec<T> {
        self.list.clear()
    }

    /// Trim pass after a limit change. Removals never push the list over its
    /// limit, and growing calls trim inside their own record.
    fn enforce_limit(&mut self) -> Vec<T> {
        let overflow = self.config.overflow(self.list.len());
        self.evict(self.config.trim_end, overflow)
    }

    fn evict(&mut self, end: TrimEnd, count: usize) -> Vec<T> {
        let evicted = self.list.evict(end, count);
        #[cfg(feature = "tracing")]
        super::log_evict("list", evicted.len(), self.list.len(), self.config.limit);
        evicted
    }
}

impl<T: Clone> CachingList<T> {
    /// Append one item. Any eviction it causes is reported in the same
    /// record as the addition.
    pub fn add(&mut self, item: T) {
        self.grow(self.list.len(), vec![item]);
    }

    pub fn add_range(&mut self, items: impl IntoIterator<Item = T>) {
        self.grow(self.list.len(), items.into_iter().collect());
    }

    /// # Errors
    ///
    /// Same as [`ObservableList::insert`].
    pub fn insert(&mut self, index: usize, item: T) -> Result<()> {
        self.insert_range(index, std::iter::once(item))
    }

    /// # Errors
    ///
    /// Same as [`ObservableList::insert_range`].
    pub fn insert_range(&mut self, index: usize, items: impl IntoIterator<Item = T>) -> Result<()> {
        self.list.check_index(index)?;
        self.grow(index, items.into_iter().collect());
        Ok(())
    }

    fn grow(&mut self, index: usize, batch: Vec<T>) -> Vec<T> {
        let EvictionConfig { limit, trim_end } = self.config;
        let evicted = self.list.splice_in_bounded(index, batch, limit, trim_end);
        #[cfg(feature = "tracing")]
        super::log_evict("list", evicted.len(), self.list.len(), limit);
        evicted
    }

    /// Unbounded snapshot of a slice of the contents.
    ///
    /// # Errors
    ///
    /// Same as [`ObservableList::copy`].
    pub fn copy(&self, start: usize, count: usize) -> Result<ObservableList<T>> {
        self.list.copy(start, count)
    }
}

impl<T: Clone + PartialEq> CachingList<T> {
    /// # Errors
    ///
    /// Same as [`ObservableList::set`].
    pub fn set(&mut self, index: usize, value: T) -> Result<()> {
        self.list.set(index, value)
    }

    /// # Errors
    ///
    /// Same as [`ObservableList::remove_first`].
    pub fn remove_first(&mut self, item: &T) -> Result<T> {
        self.list.remove_first(item)
    }

    pub fn try_remove_first(&mut self, item: &T) -> Option<T> {
        self.list.try_remove_first(item)
    }

    /// # Errors
    ///
    /// Same as [`ObservableList::remove_last`].
    pub fn remove_last(&mut self, item: &T) -> Result<T> {
        self.list.remove_last(item)
    }

    pub fn try_remove_last(&mut self, item: &T) -> Option<T> {
        self.list.try_remove_last(item)
    }

    /// # Errors
    ///
    /// Same as [`ObservableList::remove_all`].
    pub fn remove_all(&mut self, item: &T) -> Result<Vec<T>> {
        self.list.remove_all(item)
    }

    pub fn try_remove_all(&mut self, item: &T) -> Vec<T> {
        self.list.try_remove_all(item)
    }
}

impl<T> Deref for CachingList<T> {
    type Target = ObservableList<T>;

    fn deref(&self) -> &ObservableList<T> {
        &self.list
    }
}

impl<T> Default for CachingList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for CachingList<T> {
    fn clone(&self) -> Self {
        Self {
            list: self.list.clone(),
            config: self.config,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for CachingList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachingList")
            .field("items", &self.list.as_slice())
            .field("limit", &self.config.limit)
            .field("trim_end", &self.config.trim_end)
            .finish()
    }
}

impl<T: Clone> Extend<T> for CachingList<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.add_range(iter);
    }
}

/// Contents and limit must both match.
impl<T: PartialEq> PartialEq for CachingList<T> {
    fn eq(&self, other: &Self) -> bool {
        self.config.limit == other.config.limit && self.list == other.list
    }
}
