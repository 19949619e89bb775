#![forbid(unsafe_code)]

//! Growable list, stack and map containers that report every change.
//!
//! - [`ObservableList`]: growable array with amortized O(1) append, ranged
//!   removal, predicate search and version-checked [`Cursor`] enumeration.
//! - [`ObservableStack`]: LIFO view over an `ObservableList` (top = index 0).
//! - [`ObservableMap`]: hash map with all-or-nothing batch operations.
//! - [`CachingList`], [`CachingStack`], [`CachingMap`]: the same containers
//!   with a size limit, evicting from a configurable end after every mutation.
//!
//! Every mutation that changes the contents dispatches one [`ChangeSet`]
//! (`added`, `removed`) synchronously to the container's subscribers, in
//! registration order.
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use ripple_collections::{ChangeSet, ObservableList};
//!
//! let mut list = ObservableList::new();
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let sink = Rc::clone(&seen);
//! let _sub = list.subscribe(move |change: &ChangeSet<char>| {
//!     sink.borrow_mut().push(change.clone());
//! });
//!
//! list.add_range("abcde".chars());
//! let removed = list.remove_range(1, 2).unwrap();
//!
//! assert_eq!(removed, vec!['b', 'c']);
//! assert_eq!(list, ['a', 'd', 'e']);
//! assert_eq!(seen.borrow()[1], ChangeSet::removed(vec!['b', 'c']));
//! ```
//!
//! # Concurrency
//!
//! Containers are single-threaded (`!Send`, `!Sync`): subscribers are
//! reference counted with `Rc`. Interference is only detected for
//! [`Cursor`]-based enumeration of a list.
//!
//! # Features
//!
//! - `tracing`: debug events for evictions and limit changes, trace events
//!   for list growth.
//! - `serde`: containers serialize as their contents.

pub mod caching;
pub mod change;
pub mod error;
pub mod list;
pub mod map;
pub mod stack;

#[cfg(feature = "serde")]
mod serde_impl;

pub use caching::{CachingList, CachingMap, CachingStack, EvictionConfig, TrimEnd};
pub use change::{ChangeSet, Subscribers, Subscription};
pub use error::{CollectionError, Result};
pub use list::{Cursor, MAX_CAPACITY, MIN_CAPACITY, ObservableList};
pub use map::ObservableMap;
pub use stack::ObservableStack;
