#![forbid(unsafe_code)]

//! Growable, index-addressable list with change notifications.
//!
//! # Design
//!
//! [`ObservableList<T>`] keeps its items in a contiguous buffer and manages
//! the buffer's logical capacity itself: when an append or insert would
//! overflow, capacity grows to `max(MIN_CAPACITY, 2 * capacity)`, clipped to
//! [`MAX_CAPACITY`] and widened again if the incoming batch still does not
//! fit. Appends are amortized O(1).
//!
//! Every structural mutation (add, insert, remove, clear) bumps a version
//! counter. A [`Cursor`] captures that version when it is created and
//! refuses to advance once the list has changed underneath it.
//!
//! # Invariants
//!
//! 1. `len() <= capacity()`; capacity never shrinks, including on `clear()`.
//! 2. `version()` increments exactly once per structural mutation that
//!    changes the contents. `set` and `swap` are positional and leave it
//!    untouched.
//! 3. Each public mutation dispatches at most one [`ChangeSet`]; mutations
//!    that leave the contents unchanged dispatch nothing.
//! 4. `swap` never dispatches.
//!
//! # Failure Modes
//!
//! - **Bounds**: any index `>= len()` (and any range running past the end)
//!   returns [`CollectionError::IndexOutOfRange`] or
//!   [`CollectionError::RangeOutOfBounds`] without side effects.
//! - **Absence**: `remove_first`/`remove_last`/`remove_all` return
//!   [`CollectionError::NotFound`]; their `try_*` forms report `None` or an empty `Vec`.
//! - **Stale cursor**: [`Cursor::next`] returns
//!   [`CollectionError::StaleCursor`] after a structural mutation.

use std::fmt;
use std::ops::Index;

use crate::caching::TrimEnd;
use crate::change::{ChangeSet, Subscribers, Subscription};
use crate::error::{CollectionError, Result};

/// Capacity of the first allocation made by an empty list.
pub const MIN_CAPACITY: usize = 4;

/// Clip applied to doubling. A batch that needs more still gets it.
pub const MAX_CAPACITY: usize = 0x7FFF_FFC7;

/// A growable list that reports every structural change to its subscribers.
pub struct ObservableList<T> {
    items: Vec<T>,
    capacity: usize,
    version: u64,
    subscribers: Subscribers<T>,
}

impl<T> ObservableList<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            capacity,
            version: 0,
            subscribers: Subscribers::new(),
        }
    }

    /// Take ownership of `items` without copying them.
    #[must_use]
    pub fn from_vec(items: Vec<T>) -> Self {
        let capacity = items.len();
        Self {
            items,
            capacity,
            version: 0,
            subscribers: Subscribers::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Logical capacity: slots available before the next growth step.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Structural mutation counter.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// # Errors
    ///
    /// [`CollectionError::IndexOutOfRange`] when `index >= len()`.
    pub fn get(&self, index: usize) -> Result<&T> {
        self.items
            .get(index)
            .ok_or_else(|| CollectionError::index(index, self.items.len()))
    }

    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.items.last()
    }

    /// Register a change callback.
    #[must_use = "dropping the Subscription unsubscribes immediately"]
    pub fn subscribe(&self, callback: impl Fn(&ChangeSet<T>) + 'static) -> Subscription {
        self.subscribers.subscribe(callback)
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Start a version-checked enumeration at index 0.
    #[must_use]
    pub fn cursor(&self) -> Cursor {
        Cursor {
            version: self.version,
            position: 0,
        }
    }

    /// Exchange two items in place.
    ///
    /// Positional only: no version bump and no notification.
    ///
    /// # Errors
    ///
    /// [`CollectionError::IndexOutOfRange`] when either index is `>= len()`.
    pub fn swap(&mut self, a: usize, b: usize) -> Result<()> {
        self.check_index(a)?;
        self.check_index(b)?;
        if a != b {
            self.items.swap(a, b);
        }
        Ok(())
    }

    #[must_use]
    pub fn first_index_where(&self, mut predicate: impl FnMut(&T) -> bool) -> Option<usize> {
        self.items.iter().position(|item| predicate(item))
    }

    #[must_use]
    pub fn last_index_where(&self, mut predicate: impl FnMut(&T) -> bool) -> Option<usize> {
        self.items.iter().rposition(|item| predicate(item))
    }

    /// Every index whose item matches, ascending.
    #[must_use]
    pub fn indexes_where(&self, mut predicate: impl FnMut(&T) -> bool) -> Vec<usize> {
        self.items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| predicate(item).then_some(i))
            .collect()
    }

    /// Remove the item at `index`, closing the gap.
    ///
    /// # Errors
    ///
    /// [`CollectionError::IndexOutOfRange`] when `index >= len()`.
    pub fn remove_at(&mut self, index: usize) -> Result<T> {
        self.check_index(index)?;
        let item = self.items.remove(index);
        self.version += 1;
        let mut removed = self.dispatch_removed(vec![item]);
        // dispatch_removed hands back exactly what it was given.
        Ok(removed.swap_remove(0))
    }

    /// Remove `count` items starting at `start`, in their original order.
    ///
    /// # Errors
    ///
    /// - [`CollectionError::InvalidCount`] when `count == 0`.
    /// - [`CollectionError::IndexOutOfRange`] when `start >= len()`.
    /// - [`CollectionError::RangeOutOfBounds`] when the range runs past the end.
    pub fn remove_range(&mut self, start: usize, count: usize) -> Result<Vec<T>> {
        if count == 0 {
            return Err(CollectionError::InvalidCount { count });
        }
        self.check_index(start)?;
        let len = self.items.len();
        if count > len - start {
            return Err(CollectionError::range(start, count, len));
        }
        let removed: Vec<T> = self.items.drain(start..start + count).collect();
        self.version += 1;
        Ok(self.dispatch_removed(removed))
    }

    /// # Errors
    ///
    /// [`CollectionError::NotFound`] when nothing matches.
    pub fn remove_first_where(&mut self, predicate: impl FnMut(&T) -> bool) -> Result<T> {
        let index = self
            .first_index_where(predicate)
            .ok_or(CollectionError::NotFound)?;
        self.remove_at(index)
    }

    pub fn try_remove_first_where(&mut self, predicate: impl FnMut(&T) -> bool) -> Option<T> {
        let index = self.first_index_where(predicate)?;
        self.remove_at(index).ok()
    }

    /// # Errors
    ///
    /// [`CollectionError::NotFound`] when nothing matches.
    pub fn remove_last_where(&mut self, predicate: impl FnMut(&T) -> bool) -> Result<T> {
        let index = self
            .last_index_where(predicate)
            .ok_or(CollectionError::NotFound)?;
        self.remove_at(index)
    }

    pub fn try_remove_last_where(&mut self, predicate: impl FnMut(&T) -> bool) -> Option<T> {
        let index = self.last_index_where(predicate)?;
        self.remove_at(index).ok()
    }

    /// Remove every match in one notification, in encounter order.
    ///
    /// # Errors
    ///
    /// [`CollectionError::NotFound`] when nothing matches.
    pub fn remove_all_where(&mut self, predicate: impl FnMut(&T) -> bool) -> Result<Vec<T>> {
        let removed = self.try_remove_all_where(predicate);
        if removed.is_empty() {
            return Err(CollectionError::NotFound);
        }
        Ok(removed)
    }

    /// Like [`remove_all_where`](Self::remove_all_where), but no match is an
    /// empty result instead of an error.
    pub fn try_remove_all_where(&mut self, mut predicate: impl FnMut(&T) -> bool) -> Vec<T> {
        let old = std::mem::replace(&mut self.items, Vec::with_capacity(self.capacity));
        let mut removed = Vec::new();
        for item in old {
            if predicate(&item) {
                removed.push(item);
            } else {
                self.items.push(item);
            }
        }
        if removed.is_empty() {
            return removed;
        }
        self.version += 1;
        self.dispatch_removed(removed)
    }

    /// Drop every item. Capacity is retained.
    pub fn clear(&mut self) -> Vec<T> {
        if self.items.is_empty() {
            return Vec::new();
        }
        let removed: Vec<T> = self.items.drain(..).collect();
        self.version += 1;
        self.dispatch_removed(removed)
    }

    /// Evict up to `count` items from `end` as one removal record.
    pub(crate) fn evict(&mut self, end: TrimEnd, count: usize) -> Vec<T> {
        let evicted = self.take_from(end, count);
        if evicted.is_empty() {
            return evicted;
        }
        self.version += 1;
        self.dispatch_removed(evicted)
    }

    /// Detach up to `count` items from `end`, in list order. No bookkeeping.
    fn take_from(&mut self, end: TrimEnd, count: usize) -> Vec<T> {
        let count = count.min(self.items.len());
        match end {
            TrimEnd::Start => self.items.drain(..count).collect(),
            TrimEnd::End => {
                let keep = self.items.len() - count;
                self.items.drain(keep..).collect()
            }
        }
    }

    pub(crate) fn check_index(&self, index: usize) -> Result<()> {
        if index < self.items.len() {
            Ok(())
        } else {
            Err(CollectionError::index(index, self.items.len()))
        }
    }

    fn dispatch_removed(&self, removed: Vec<T>) -> Vec<T> {
        let change = ChangeSet::removed(removed);
        self.subscribers.notify(&change);
        change.removed
    }

    /// Make room for `additional` more items using the doubling policy.
    fn reserve_for(&mut self, additional: usize) {
        let required = self.items.len().saturating_add(additional);
        if required <= self.capacity {
            return;
        }
        let mut grown = MIN_CAPACITY.max(self.capacity.saturating_mul(2));
        if grown > MAX_CAPACITY {
            grown = MAX_CAPACITY;
        }
        if grown < required {
            grown = required;
        }
        #[cfg(feature = "tracing")]
        Self::log_grow(self.capacity, grown);
        self.items.reserve_exact(grown - self.items.len());
        self.capacity = grown;
    }

    #[cfg(feature = "tracing")]
    fn log_grow(from: usize, to: usize) {
        tracing::trace!(message = "list.grow", from, to);
    }
}

impl<T: Clone> ObservableList<T> {
    /// Append one item.
    pub fn add(&mut self, item: T) {
        self.add_range(std::iter::once(item));
    }

    /// Append a batch as one notification. An empty batch is a no-op.
    pub fn add_range(&mut self, items: impl IntoIterator<Item = T>) {
        let batch: Vec<T> = items.into_iter().collect();
        if batch.is_empty() {
            return;
        }
        self.reserve_for(batch.len());
        self.items.extend(batch.iter().cloned());
        self.version += 1;
        self.subscribers.notify(&ChangeSet::added(batch));
    }

    /// Insert one item before the existing item at `index`.
    ///
    /// # Errors
    ///
    /// [`CollectionError::IndexOutOfRange`] when `index >= len()`. Appending
    /// is [`add`](Self::add)'s job.
    pub fn insert(&mut self, index: usize, item: T) -> Result<()> {
        self.insert_range(index, std::iter::once(item))
    }

    /// Insert a batch before the existing item at `index`, shifting the tail.
    ///
    /// # Errors
    ///
    /// [`CollectionError::IndexOutOfRange`] when `index >= len()`.
    pub fn insert_range(&mut self, index: usize, items: impl IntoIterator<Item = T>) -> Result<()> {
        self.check_index(index)?;
        self.splice_in(index, items.into_iter().collect());
        Ok(())
    }

    /// Unchecked counterpart of `insert_range`; `index` may equal `len()`.
    pub(crate) fn splice_in(&mut self, index: usize, batch: Vec<T>) {
        self.splice_in_bounded(index, batch, usize::MAX, TrimEnd::Start);
    }

    /// Splice `batch` in at `index`, then evict from `end` until
    /// `len() <= limit`. One version bump and one record carrying both the
    /// batch and the evicted items. Returns the evicted items.
    pub(crate) fn splice_in_bounded(
        &mut self,
        index: usize,
        batch: Vec<T>,
        limit: usize,
        end: TrimEnd,
    ) -> Vec<T> {
        if batch.is_empty() {
            return Vec::new();
        }
        self.reserve_for(batch.len());
        self.items.splice(index..index, batch.iter().cloned());
        let overflow = self.items.len().saturating_sub(limit);
        let evicted = self.take_from(end, overflow);
        self.version += 1;
        let change = ChangeSet::new(batch, evicted);
        self.subscribers.notify(&change);
        change.removed
    }

    /// Independent snapshot of `count` items starting at `start`.
    ///
    /// # Errors
    ///
    /// - [`CollectionError::IndexOutOfRange`] when `start > len()`.
    /// - [`CollectionError::RangeOutOfBounds`] when the range runs past the end.
    pub fn copy(&self, start: usize, count: usize) -> Result<Self> {
        let len = self.items.len();
        if start > len {
            return Err(CollectionError::index(start, len));
        }
        if count > len - start {
            return Err(CollectionError::range(start, count, len));
        }
        Ok(Self::from_vec(self.items[start..start + count].to_vec()))
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.items.clone()
    }
}

impl<T: Clone + PartialEq> ObservableList<T> {
    /// Replace the item at `index`. Dispatches one old/new pair, and nothing
    /// at all when `value` equals the current item.
    ///
    /// # Errors
    ///
    /// [`CollectionError::IndexOutOfRange`] when `index >= len()`.
    pub fn set(&mut self, index: usize, value: T) -> Result<()> {
        self.check_index(index)?;
        if self.items[index] == value {
            return Ok(());
        }
        let old = std::mem::replace(&mut self.items[index], value.clone());
        self.subscribers.notify(&ChangeSet::replaced(old, value));
        Ok(())
    }

    #[must_use]
    pub fn contains(&self, item: &T) -> bool {
        self.items.contains(item)
    }

    #[must_use]
    pub fn first_index_of(&self, item: &T) -> Option<usize> {
        self.first_index_where(|x| x == item)
    }

    #[must_use]
    pub fn last_index_of(&self, item: &T) -> Option<usize> {
        self.last_index_where(|x| x == item)
    }

    #[must_use]
    pub fn indexes_of(&self, item: &T) -> Vec<usize> {
        self.indexes_where(|x| x == item)
    }

    /// # Errors
    ///
    /// [`CollectionError::NotFound`] when `item` is absent.
    pub fn remove_first(&mut self, item: &T) -> Result<T> {
        self.remove_first_where(|x| x == item)
    }

    pub fn try_remove_first(&mut self, item: &T) -> Option<T> {
        self.try_remove_first_where(|x| x == item)
    }

    /// # Errors
    ///
    /// [`CollectionError::NotFound`] when `item` is absent.
    pub fn remove_last(&mut self, item: &T) -> Result<T> {
        self.remove_last_where(|x| x == item)
    }

    pub fn try_remove_last(&mut self, item: &T) -> Option<T> {
        self.try_remove_last_where(|x| x == item)
    }

    /// # Errors
    ///
    /// [`CollectionError::NotFound`] when `item` is absent.
    pub fn remove_all(&mut self, item: &T) -> Result<Vec<T>> {
        self.remove_all_where(|x| x == item)
    }

    pub fn try_remove_all(&mut self, item: &T) -> Vec<T> {
        self.try_remove_all_where(|x| x == item)
    }
}

/// Version-stamped enumeration state for an [`ObservableList`].
///
/// The cursor does not borrow the list, so the list can be mutated while the
/// cursor is alive; the next advance then fails with
/// [`CollectionError::StaleCursor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    version: u64,
    position: usize,
}

impl Cursor {
    /// Advance and return the next item, or `None` past the end.
    ///
    /// # Errors
    ///
    /// [`CollectionError::StaleCursor`] when `list` was structurally mutated
    /// since this cursor was created or last reset.
    pub fn next<'a, T>(&mut self, list: &'a ObservableList<T>) -> Result<Option<&'a T>> {
        if list.version != self.version {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                message = "list.stale_cursor",
                expected = self.version,
                actual = list.version
            );
            return Err(CollectionError::StaleCursor {
                expected: self.version,
                actual: list.version,
            });
        }
        let item = list.items.get(self.position);
        if item.is_some() {
            self.position += 1;
        }
        Ok(item)
    }

    /// Restart from index 0 against the list's current version.
    pub fn reset<T>(&mut self, list: &ObservableList<T>) {
        *self = list.cursor();
    }

    /// Number of items yielded so far.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }
}

impl<T> Default for ObservableList<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Clones contents and capacity. Subscribers stay with the original.
impl<T: Clone> Clone for ObservableList<T> {
    fn clone(&self) -> Self {
        let mut items = Vec::with_capacity(self.capacity);
        items.extend(self.items.iter().cloned());
        Self {
            items,
            capacity: self.capacity,
            version: 0,
            subscribers: Subscribers::new(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableList")
            .field("items", &self.items)
            .field("capacity", &self.capacity)
            .field("version", &self.version)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl<T> From<Vec<T>> for ObservableList<T> {
    fn from(items: Vec<T>) -> Self {
        Self::from_vec(items)
    }
}

impl<T> FromIterator<T> for ObservableList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl<T: Clone> Extend<T> for ObservableList<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.add_range(iter);
    }
}

impl<T> Index<usize> for ObservableList<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.items[index]
    }
}

impl<'a, T> IntoIterator for &'a ObservableList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T> IntoIterator for ObservableList<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<T: PartialEq> PartialEq for ObservableList<T> {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl<T: Eq> Eq for ObservableList<T> {}

impl<T: PartialEq> PartialEq<[T]> for ObservableList<T> {
    fn eq(&self, other: &[T]) -> bool {
        self.items.as_slice() == other
    }
}

impl<T: PartialEq> PartialEq<&[T]> for ObservableList<T> {
    fn eq(&self, other: &&[T]) -> bool {
        self.items.as_slice() == *other
    }
}

impl<T: PartialEq> PartialEq<Vec<T>> for ObservableList<T> {
    fn eq(&self, other: &Vec<T>) -> bool {
        &self.items == other
    }
}

impl<T: PartialEq, const N: usize> PartialEq<[T; N]> for ObservableList<T> {
    fn eq(&self, other: &[T; N]) -> bool {
        self.items.as_slice() == other.as_slice()
    }
}
