#![forbid(unsafe_code)]

//! Error taxonomy shared by every container in the crate.
//!
//! Errors fall into five families:
//!
//! - **Bounds**: [`IndexOutOfRange`](CollectionError::IndexOutOfRange),
//!   [`RangeOutOfBounds`](CollectionError::RangeOutOfBounds).
//! - **Precondition**: [`InvalidCount`](CollectionError::InvalidCount).
//! - **Absence**: [`NotFound`](CollectionError::NotFound),
//!   [`KeyNotFound`](CollectionError::KeyNotFound),
//!   [`Empty`](CollectionError::Empty).
//! - **Duplicate key**: [`DuplicateKey`](CollectionError::DuplicateKey),
//!   [`DuplicateKeyInBatch`](CollectionError::DuplicateKeyInBatch).
//! - **Iterator invalidation**: [`StaleCursor`](CollectionError::StaleCursor).
//!
//! Only the absence family is converted into a no-op by the `try_*` entry
//! points. Every other error always surfaces.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CollectionError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectionError {
    #[error("index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("range starting at {start} with count {count} exceeds len {len}")]
    RangeOutOfBounds {
        start: usize,
        count: usize,
        len: usize,
    },

    #[error("count must be positive (got {count})")]
    InvalidCount { count: usize },

    #[error("no matching item")]
    NotFound,

    #[error("key not found")]
    KeyNotFound,

    #[error("container is empty")]
    Empty,

    #[error("an item with the same key has already been added")]
    DuplicateKey,

    #[error("batch contains the same key more than once")]
    DuplicateKeyInBatch,

    #[error("collection was modified during enumeration (cursor version {expected}, live version {actual})")]
    StaleCursor { expected: u64, actual: u64 },
}

impl CollectionError {
    /// Whether this error reports that nothing matched.
    ///
    /// `try_*` variants swallow exactly these errors.
    #[must_use]
    pub fn is_absence(&self) -> bool {
        matches!(self, Self::NotFound | Self::KeyNotFound | Self::Empty)
    }

    #[must_use]
    pub(crate) fn index(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }

    #[must_use]
    pub(crate) fn range(start: usize, count: usize, len: usize) -> Self {
        Self::RangeOutOfBounds { start, count, len }
    }
}

/// Turns an absence error into `Ok(None)`, passing every other outcome through.
pub(crate) fn absent_as_none<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_absence() => Ok(None),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absence_family() {
        assert!(CollectionError::NotFound.is_absence());
        assert!(CollectionError::KeyNotFound.is_absence());
        assert!(CollectionError::Empty.is_absence());
        assert!(!CollectionError::DuplicateKey.is_absence());
        assert!(!CollectionError::index(3, 2).is_absence());
        assert!(!CollectionError::InvalidCount { count: 0 }.is_absence());
    }

    #[test]
    fn absent_as_none_only_swallows_absence() {
        assert_eq!(absent_as_none::<u8>(Err(CollectionError::KeyNotFound)), Ok(None));
        assert_eq!(absent_as_none(Ok(7)), Ok(Some(7)));
        assert_eq!(
            absent_as_none::<u8>(Err(CollectionError::DuplicateKeyInBatch)),
            Err(CollectionError::DuplicateKeyInBatch)
        );
    }

    #[test]
    fn display_messages() {
        assert_eq!(
            CollectionError::index(5, 2).to_string(),
            "index 5 out of range (len 2)"
        );
        assert_eq!(
            CollectionError::range(1, 4, 3).to_string(),
            "range starting at 1 with count 4 exceeds len 3"
        );
        let stale = CollectionError::StaleCursor {
            expected: 1,
            actual: 2,
        };
        assert!(stale.to_string().contains("modified during enumeration"));
    }
}
