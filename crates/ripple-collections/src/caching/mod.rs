#![forbid(unsafe_code)]

//! Size-bounded wrappers that evict from one end after every mutation.
//!
//! # Design
//!
//! Each wrapper owns its inner container and mirrors the inner container's
//! mutating methods. A call that grows the container trims the overflow from
//! the configured [`TrimEnd`] before it dispatches, so subscribers get one
//! record holding both the new items and the evicted ones. Lowering the
//! limit or trimming explicitly dispatches a removal-only record. Read
//! access goes through `Deref` to the inner container.
//!
//! | Wrapper | `TrimEnd::Start` evicts | `TrimEnd::End` evicts | Default |
//! |---------|-------------------------|-----------------------|---------|
//! | [`CachingList`] | index 0 (oldest) | last index (newest) | `Start` |
//! | [`CachingStack`] | top | bottom | `End` |
//! | [`CachingMap`] | oldest inserted key | newest inserted key | `Start` |
//!
//! # Invariants
//!
//! 1. When any public method returns, `len() <= limit()`.
//! 2. Every public call dispatches at most one notification. Evicted items
//!    appear in its `removed` side in container order.
//! 3. Trimming never grows the container, so it always terminates.
//! 4. `trim_start_down_to(n)` and `trim_end_down_to(n)` are idempotent.

mod list;
mod map;
mod stack;

pub use list::CachingList;
pub use map::CachingMap;
pub use stack::CachingStack;

/// Which end of a bounded container gives way when it overflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TrimEnd {
    /// Evict from the front: index 0, the stack top, or the oldest map key.
    #[default]
    Start,
    /// Evict from the back: the last index, the stack bottom, or the newest
    /// map key.
    End,
}

/// Size limit and eviction direction for a caching container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvictionConfig {
    /// Maximum number of items. `usize::MAX` means unbounded.
    pub limit: usize,
    /// End to evict from.
    pub trim_end: TrimEnd,
}

impl EvictionConfig {
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            limit: usize::MAX,
            trim_end: TrimEnd::Start,
        }
    }

    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    #[must_use]
    pub const fn with_trim_end(mut self, trim_end: TrimEnd) -> Self {
        self.trim_end = trim_end;
        self
    }

    #[must_use]
    pub const fn is_bounded(&self) -> bool {
        self.limit != usize::MAX
    }

    /// How many items must go for `len` to fit.
    #[must_use]
    pub(crate) const fn overflow(&self, len: usize) -> usize {
        len.saturating_sub(self.limit)
    }
}

impl Default for EvictionConfig {
    fn default() -> Self {
        Self::unbounded()
    }
}

#[cfg(feature = "tracing")]
pub(crate) fn log_evict(kind: &'static str, evicted: usize, len: usize, limit: usize) {
    if evicted > 0 {
        tracing::debug!(message = "cache.evict", kind, evicted, len, limit);
    }
}

#[cfg(feature = "tracing")]
pub(crate) fn log_limit(kind: &'static str, old: usize, new: usize) {
    tracing::debug!(message = "cache.limit", kind, old, new);
}
