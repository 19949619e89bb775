#![no_main]

use std::cell::Cell;
use std::rc::Rc;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use ripple_collections::{CachingList, ChangeSet, CollectionError, EvictionConfig, TrimEnd};

#[derive(Arbitrary, Debug)]
enum ListOp {
    Add(u8),
    AddRange(Vec<u8>),
    Insert { index: u8, value: u8 },
    InsertRange { index: u8, values: Vec<u8> },
    Set { index: u8, value: u8 },
    RemoveAt(u8),
    RemoveRange { start: u8, count: u8 },
    RemoveAll(u8),
    Swap(u8, u8),
    Copy { start: u8, count: u8 },
    SetLimit(u8),
    FlipTrimEnd,
    TrimStartTo(u8),
    TrimEndTo(u8),
    Clear,
}

#[derive(Arbitrary, Debug)]
struct Input {
    limit: u8,
    from_end: bool,
    ops: Vec<ListOp>,
}

fuzz_target!(|input: Input| {
    let end = if input.from_end { TrimEnd::End } else { TrimEnd::Start };
    let config = EvictionConfig::default()
        .with_limit(usize::from(input.limit))
        .with_trim_end(end);
    let mut cache = CachingList::with_config(config);

    // Net item count according to the notifications alone.
    let tracked = Rc::new(Cell::new(0isize));
    let counter = Rc::clone(&tracked);
    let _sub = cache.subscribe(move |change: &ChangeSet<u8>| {
        assert!(!change.is_empty());
        counter.set(counter.get() + change.added.len() as isize - change.removed.len() as isize);
    });

    for op in input.ops.into_iter().take(256) {
        let len = cache.len();
        match op {
            ListOp::Add(v) => cache.add(v),
            ListOp::AddRange(vs) => cache.add_range(vs),
            ListOp::Insert { index, value } => {
                let result = cache.insert(usize::from(index), value);
                assert_eq!(result.is_ok(), usize::from(index) < len);
            }
            ListOp::InsertRange { index, values } => {
                let _ = cache.insert_range(usize::from(index), values);
            }
            ListOp::Set { index, value } => {
                let version = cache.version();
                let _ = cache.set(usize::from(index), value);
                assert_eq!(cache.version(), version);
                assert_eq!(cache.len(), len);
            }
            ListOp::RemoveAt(i) => {
                let _ = cache.remove_at(usize::from(i));
            }
            ListOp::RemoveRange { start, count } => {
                match cache.remove_range(usize::from(start), usize::from(count)) {
                    Ok(removed) => assert_eq!(removed.len(), usize::from(count)),
                    Err(err) => assert!(matches!(
                        err,
                        CollectionError::InvalidCount { .. }
                            | CollectionError::IndexOutOfRange { .. }
                            | CollectionError::RangeOutOfBounds { .. }
                    )),
                }
            }
            ListOp::RemoveAll(v) => {
                let removed = cache.try_remove_all(&v);
                assert!(removed.iter().all(|x| *x == v));
                assert!(!cache.contains(&v));
            }
            ListOp::Swap(a, b) => {
                let _ = cache.swap(usize::from(a), usize::from(b));
            }
            ListOp::Copy { start, count } => {
                if let Ok(copy) = cache.copy(usize::from(start), usize::from(count)) {
                    let start = usize::from(start);
                    assert_eq!(copy.as_slice(), &cache.as_slice()[start..start + copy.len()]);
                }
            }
            ListOp::SetLimit(n) => {
                let evicted = cache.set_limit(usize::from(n));
                assert_eq!(evicted.len(), len.saturating_sub(usize::from(n)));
            }
            ListOp::FlipTrimEnd => {
                let flipped = match cache.trim_end() {
                    TrimEnd::Start => TrimEnd::End,
                    TrimEnd::End => TrimEnd::Start,
                };
                cache.set_trim_end(flipped);
            }
            ListOp::TrimStartTo(n) => {
                cache.trim_start_down_to(usize::from(n));
                assert!(cache.trim_start_down_to(usize::from(n)).is_empty());
            }
            ListOp::TrimEndTo(n) => {
                cache.trim_end_down_to(usize::from(n));
                assert!(cache.trim_end_down_to(usize::from(n)).is_empty());
            }
            ListOp::Clear => {
                cache.clear();
            }
        }

        assert!(cache.len() <= cache.limit());
        assert!(cache.len() <= cache.capacity());
        assert_eq!(tracked.get(), cache.len() as isize);
    }
});
