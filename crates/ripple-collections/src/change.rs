#![forbid(unsafe_code)]

//! Change records and the observer list every container dispatches through.
//!
//! # Architecture
//!
//! Each container owns a [`Subscribers<T>`]. Subscribing hands back a
//! [`Subscription`] guard; the observer list only holds a weak handle to that
//! guard's liveness token, so dropping the guard removes the callback before
//! the next dispatch. Dead entries are pruned lazily during notification.
//!
//! # Invariants
//!
//! 1. A dispatched [`ChangeSet`] is never empty (at least one of `added` or
//!    `removed` has an item). [`Subscribers::notify`] drops empty records.
//! 2. Subscribers are notified synchronously, in registration order.
//! 3. A callback registered or dropped while a dispatch is in flight takes
//!    effect from the next dispatch on.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// One batch of additions and removals produced by a single mutation.
///
/// Order inside each vector follows the logical operation: a ranged removal
/// lists items in their original index order, a predicate removal lists them
/// in the order they were encountered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSet<T> {
    /// Items that entered the container.
    pub added: Vec<T>,
    /// Items that left the container.
    pub removed: Vec<T>,
}

impl<T> ChangeSet<T> {
    #[must_use]
    pub fn new(added: Vec<T>, removed: Vec<T>) -> Self {
        Self { added, removed }
    }

    /// A record of items that only entered the container.
    #[must_use]
    pub fn added(items: Vec<T>) -> Self {
        Self::new(items, Vec::new())
    }

    /// A record of items that only left the container.
    #[must_use]
    pub fn removed(items: Vec<T>) -> Self {
        Self::new(Vec::new(), items)
    }

    /// A single in-place replacement: one old entry out, one new entry in.
    #[must_use]
    pub fn replaced(old: T, new: T) -> Self {
        Self::new(vec![new], vec![old])
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Total number of items the record mentions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len()
    }

    #[must_use]
    pub fn into_parts(self) -> (Vec<T>, Vec<T>) {
        (self.added, self.removed)
    }
}

type Callback<T> = Rc<dyn Fn(&ChangeSet<T>)>;

struct Entry<T> {
    alive: Weak<()>,
    callback: Callback<T>,
}

/// Ordered list of change callbacks owned by a container.
pub struct Subscribers<T> {
    entries: RefCell<Vec<Entry<T>>>,
}

impl<T> Subscribers<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
        }
    }

    /// Register a callback. It stays registered for as long as the returned
    /// [`Subscription`] is alive.
    #[must_use = "dropping the Subscription unsubscribes immediately"]
    pub fn subscribe(&self, callback: impl Fn(&ChangeSet<T>) + 'static) -> Subscription {
        let token = Rc::new(());
        self.entries.borrow_mut().push(Entry {
            alive: Rc::downgrade(&token),
            callback: Rc::new(callback),
        });
        Subscription { _token: token }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|e| e.alive.strong_count() > 0)
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dispatch `change` to every live subscriber in registration order.
    ///
    /// Empty records are dropped without dispatch.
    pub fn notify(&self, change: &ChangeSet<T>) {
        if change.is_empty() {
            return;
        }
        // Snapshot so callbacks can subscribe or unsubscribe without
        // tripping the RefCell.
        let live: Vec<Callback<T>> = {
            let mut entries = self.entries.borrow_mut();
            entries.retain(|e| e.alive.strong_count() > 0);
            entries.iter().map(|e| Rc::clone(&e.callback)).collect()
        };
        for callback in live {
            callback(change);
        }
    }
}

impl<T> Default for Subscribers<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Subscribers<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribers")
            .field("live", &self.len())
            .finish()
    }
}

/// RAII guard for a registered change callback.
///
/// Dropping it (or calling [`unsubscribe`](Subscription::unsubscribe))
/// removes the callback before the next dispatch.
pub struct Subscription {
    _token: Rc<()>,
}

impl Subscription {
    /// Explicitly unsubscribe. Same as dropping the guard.
    pub fn unsubscribe(self) {}
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
