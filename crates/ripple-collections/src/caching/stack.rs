#![forbid(unsafe_code)]

//! [`ObservableStack`] with a size limit. Evicts from the bottom by default.

use std::fmt;
use std::ops::Deref;

use super::{EvictionConfig, TrimEnd};
use crate::change::{ChangeSet, Subscription};
use crate::error::Result;
use crate::stack::ObservableStack;

pub struct CachingStack<T> {
    stack: ObservableStack<T>,
    config: EvictionConfig,
}

impl<T> CachingStack<T> {
    /// Unbounded until a limit is set; evicts from the bottom.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limit(usize::MAX)
    }

    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self::with_config(
            EvictionConfig::default()
                .with_limit(limit)
                .with_trim_end(TrimEnd::End),
        )
    }

    #[must_use]
    pub fn with_config(config: EvictionConfig) -> Self {
        Self {
            stack: ObservableStack::new(),
            config,
        }
    }

    /// Wrap an existing stack, trimming it to the limit right away.
    #[must_use]
    pub fn from_stack(stack: ObservableStack<T>, config: EvictionConfig) -> Self {
        let mut cache = Self { stack, config };
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

    pub fn set_limit(&mut self, limit: usize) -> Vec<T> {
        #[cfg(feature = "tracing")]
        super::log_limit("stack", self.config.limit, limit);
        self.config.limit = limit;
        self.enforce_limit()
    }

    pub fn set_trim_end(&mut self, trim_end: TrimEnd) {
        self.config.trim_end = trim_end;
    }

    /// Remove from the top until `len() <= n`.
    pub fn trim_start_down_to(&mut self, n: usize) -> Vec<T> {
        let overflow = self.stack.len().saturating_sub(n);
        self.evict(TrimEnd::Start, overflow)
    }

    /// Remove from the bottom until `len() <= n`.
    pub fn trim_end_down_to(&mut self, n: usize) -> Vec<T> {
        let overflow = self.stack.len().saturating_sub(n);
        self.evict(TrimEnd::End, overflow)
    }

    /// # Errors
    ///
    /// Same as [`ObservableStack::pop`].
    pub fn pop(&mut self) -> Result<T> {
        self.stack.pop()
    }

    pub fn try_pop(&mut self) -> Option<T> {
        self.stack.try_pop()
    }

    /// # Errors
    ///
    /// Same as [`ObservableStack::pop_range`].
    pub fn pop_range(&mut self, count: usize) -> Result<Vec<T>> {
        self.stack.pop_range(count)
    }

    pub fn clear(&mut self) -> Vec<T> {
        self.stack.clear()
    }

    #[must_use = "dropping the Subscription unsubscribes immediately"]
    pub fn subscribe(&self, callback: impl Fn(&ChangeSet<T>) + 'static) -> Subscription {
        self.stack.subscribe(callback)
    }

    #[must_use]
    pub fn into_inner(self) -> ObservableStack<T> {
        self.stack
    }

    fn enforce_limit(&mut self) -> Vec<T> {
        let overflow = self.config.overflow(self.stack.len());
        self.evict(self.config.trim_end, overflow)
    }

    fn evict(&mut self, end: TrimEnd, count: usize) -> Vec<T> {
        let evicted = self.stack.list_mut().evict(end, count);
        #[cfg(feature = "tracing")]
        super::log_evict("stack", evicted.len(), self.stack.len(), self.config.limit);
        evicted
    }
}

impl<T: Clone> CachingStack<T> {
    /// Push one item. Any eviction it causes is reported in the same record
    /// as the push.
    pub fn push(&mut self, item: T) {
        self.grow(vec![item]);
    }

    /// Push a batch; the last item ends on top.
    pub fn push_range(&mut self, items: impl IntoIterator<Item = T>) {
        let mut batch: Vec<T> = items.into_iter().collect();
        batch.reverse();
        self.grow(batch);
    }

    fn grow(&mut self, top_first: Vec<T>) -> Vec<T> {
        let EvictionConfig { limit, trim_end } = self.config;
        let evicted = self
            .stack
            .list_mut()
            .splice_in_bounded(0, top_first, limit, trim_end);
        #[cfg(feature = "tracing")]
        super::log_evict("stack", evicted.len(), self.stack.len(), limit);
        evicted
    }
}

impl<T> Deref for CachingStack<T> {
    type Target = ObservableStack<T>;

    fn deref(&self) -> &ObservableStack<T> {
        &self.stack
    }
}

impl<T> Default for CachingStack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for CachingStack<T> {
    fn clone(&self) -> Self {
        Self {
            stack: self.stack.clone(),
            config: self.config,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for CachingStack<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachingStack")
            .field("top_first", &self.stack.as_slice())
            .field("limit", &self.config.limit)
            .field("trim_end", &self.config.trim_end)
            .finish()
    }
}

/// Contents and limit must both match.
impl<T: PartialEq> PartialEq for CachingStack<T> {
    fn eq(&self, other: &Self) -> bool {
        self.config.limit == other.config.limit && self.stack == other.stack
    }
}
