#![forbid(unsafe_code)]

//! LIFO stack backed by an [`ObservableList`].
//!
//! The top of the stack is index 0 of the backing list, so notifications
//! list items top-first. Pushing `[a, b, c]` as one batch leaves `c` on top,
//! the same as pushing them one at a time, and dispatches
//! `added = [c, b, a]`.

use std::fmt;

use crate::change::{ChangeSet, Subscription};
use crate::error::{CollectionError, Result};
use crate::list::ObservableList;

pub struct ObservableStack<T> {
    list: ObservableList<T>,
}

impl<T> ObservableStack<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            list: ObservableList::new(),
        }
    }

    /// Build from items ordered top to bottom.
    #[must_use]
    pub fn from_top_first(items: Vec<T>) -> Self {
        Self {
            list: ObservableList::from_vec(items),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// # Errors
    ///
    /// [`CollectionError::Empty`] when the stack has no items.
    pub fn peek(&self) -> Result<&T> {
        self.list.first().ok_or(CollectionError::Empty)
    }

    #[must_use]
    pub fn try_peek(&self) -> Option<&T> {
        self.list.first()
    }

    /// Remove and return the top item.
    ///
    /// # Errors
    ///
    /// [`CollectionError::Empty`] when the stack has no items.
    pub fn pop(&mut self) -> Result<T> {
        if self.list.is_empty() {
            return Err(CollectionError::Empty);
        }
        self.list.remove_at(0)
    }

    pub fn try_pop(&mut self) -> Option<T> {
        self.pop().ok()
    }

    /// Pop `count` items at once, top first, as one notification.
    ///
    /// # Errors
    ///
    /// - [`CollectionError::InvalidCount`] when `count == 0`.
    /// - [`CollectionError::Empty`] when the stack has no items.
    /// - [`CollectionError::RangeOutOfBounds`] when `count > len()`.
    pub fn pop_range(&mut self, count: usize) -> Result<Vec<T>> {
        if count == 0 {
            return Err(CollectionError::InvalidCount { count });
        }
        if self.list.is_empty() {
            return Err(CollectionError::Empty);
        }
        self.list.remove_range(0, count)
    }

    /// Top to bottom.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.list.iter()
    }

    pub fn clear(&mut self) -> Vec<T> {
        self.list.clear()
    }

    #[must_use = "dropping the Subscription unsubscribes immediately"]
    pub fn subscribe(&self, callback: impl Fn(&ChangeSet<T>) + 'static) -> Subscription {
        self.list.subscribe(callback)
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.list.subscriber_count()
    }

    /// Items top to bottom, as the backing list stores them.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        self.list.as_slice()
    }

    pub(crate) fn list_mut(&mut self) -> &mut ObservableList<T> {
        &mut self.list
    }
}

impl<T: Clone> ObservableStack<T> {
    pub fn push(&mut self, item: T) {
        self.list.splice_in(0, vec![item]);
    }

    /// Push a batch; the last item ends on top.
    pub fn push_range(&mut self, items: impl IntoIterator<Item = T>) {
        let mut batch: Vec<T> = items.into_iter().collect();
        batch.reverse();
        self.list.splice_in(0, batch);
    }

    /// Items top to bottom.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.list.to_vec()
    }
}

impl<T: Clone + PartialEq> ObservableStack<T> {
    #[must_use]
    pub fn contains(&self, item: &T) -> bool {
        self.list.contains(item)
    }
}

impl<T> Default for ObservableStack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for ObservableStack<T> {
    fn clone(&self) -> Self {
        Self {
            list: self.list.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableStack<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableStack")
            .field("top_first", &self.list.as_slice())
            .finish()
    }
}

/// Pushes in iteration order, so the last item ends on top.
impl<T> FromIterator<T> for ObservableStack<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut items: Vec<T> = iter.into_iter().collect();
        items.reverse();
        Self::from_top_first(items)
    }
}

impl<'a, T> IntoIterator for &'a ObservableStack<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.list.iter()
    }
}

impl<T: PartialEq> PartialEq for ObservableStack<T> {
    fn eq(&self, other: &Self) -> bool {
        self.list == other.list
    }
}

impl<T: Eq> Eq for ObservableStack<T> {}
