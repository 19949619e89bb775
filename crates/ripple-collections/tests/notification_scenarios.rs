#![forbid(unsafe_code)]

//! End-to-end notification scenarios across the public container API.

use std::cell::RefCell;
use std::rc::Rc;

use ripple_collections::{
    CachingList, CachingMap, CachingStack, ChangeSet, CollectionError, EvictionConfig,
    ObservableList, ObservableMap, ObservableStack, TrimEnd,
};

type Log<T> = Rc<RefCell<Vec<ChangeSet<T>>>>;

fn sink<T: Clone + 'static>(log: &Log<T>) -> impl Fn(&ChangeSet<T>) + 'static {
    let log = Rc::clone(log);
    move |change: &ChangeSet<T>| log.borrow_mut().push(change.clone())
}

fn new_log<T>() -> Log<T> {
    Rc::new(RefCell::new(Vec::new()))
}

// ─── Bounded list, front trim ───────────────────────────────────────────

#[test]
fn limit_three_front_trim_keeps_last_three() {
    let mut cache = CachingList::with_limit(3);
    let log = new_log();
    let _sub = cache.subscribe(sink(&log));

    for i in 1..=5 {
        cache.add(i);
    }

    assert_eq!(*cache, [3, 4, 5]);

    // One record per add. The last two carry the evictions of 1 and then 2
    // alongside the item that pushed them out.
    let log = log.borrow();
    assert_eq!(log.len(), 5);
    let additions: Vec<i32> = log.iter().flat_map(|c| c.added.iter().copied()).collect();
    assert_eq!(additions, vec![1, 2, 3, 4, 5]);
    assert!(log[..3].iter().all(|c| c.removed.is_empty()));
    assert_eq!(log[3], ChangeSet::new(vec![4], vec![1]));
    assert_eq!(log[4], ChangeSet::new(vec![5], vec![2]));
}

#[test]
fn limit_three_back_trim_rejects_newcomers() {
    let config = EvictionConfig::default()
        .with_limit(3)
        .with_trim_end(TrimEnd::End);
    let mut cache = CachingList::with_config(config);
    for i in 1..=5 {
        cache.add(i);
    }
    assert_eq!(*cache, [1, 2, 3]);
}

#[test]
fn bounded_stack_evicts_bottom() {
    let mut cache = CachingStack::with_limit(3);
    let log = new_log();
    let _sub = cache.subscribe(sink(&log));

    for i in 1..=5 {
        cache.push(i);
    }

    assert_eq!(cache.to_vec(), vec![5, 4, 3]);
    let evicted: Vec<i32> = log
        .borrow()
        .iter()
        .flat_map(|c| c.removed.iter().copied())
        .collect();
    assert_eq!(evicted, vec![1, 2]);
    assert_eq!(log.borrow().len(), 5);
}

#[test]
fn bounded_map_evicts_oldest_key() {
    let mut cache = CachingMap::with_limit(2);
    let log = new_log();
    let _sub = cache.subscribe(sink(&log));

    cache.add("a", 1).unwrap();
    cache.add("b", 2).unwrap();
    cache.set("a", 10);
    cache.add("c", 3).unwrap();

    // Replacing "a" kept its original slot, so it is still the oldest.
    assert!(!cache.contains_key(&"a"));
    assert_eq!(cache.get(&"b"), Ok(&2));
    assert_eq!(cache.get(&"c"), Ok(&3));
    assert_eq!(
        log.borrow().last(),
        Some(&ChangeSet::new(vec![("c", 3)], vec![("a", 10)]))
    );
}

#[test]
fn lowering_limit_is_a_removal_only_record() {
    let mut cache = CachingList::new();
    cache.add_range(1..=5);
    let log = new_log();
    let _sub = cache.subscribe(sink(&log));

    assert_eq!(cache.set_limit(3), vec![1, 2]);
    assert_eq!(cache.trim_end_down_to(2), vec![5]);
    assert_eq!(
        *log.borrow(),
        vec![ChangeSet::removed(vec![1, 2]), ChangeSet::removed(vec![5])]
    );
}

// ─── Map key rules ──────────────────────────────────────────────────────

#[test]
fn duplicate_add_leaves_map_untouched() {
    let mut map = ObservableMap::new();
    let log = new_log();
    let _sub = map.subscribe(sink(&log));

    map.add(1, "a").unwrap();
    assert_eq!(map.add(1, "b"), Err(CollectionError::DuplicateKey));

    assert_eq!(map.len(), 1);
    assert_eq!(map.get(&1), Ok(&"a"));
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn set_same_value_is_silent_and_change_is_one_pair() {
    let mut map = ObservableMap::new();
    map.add("k", 1).unwrap();
    let log = new_log();
    let _sub = map.subscribe(sink(&log));

    map.set("k", 1);
    assert!(log.borrow().is_empty());

    map.set("k", 2);
    assert_eq!(
        *log.borrow(),
        vec![ChangeSet::replaced(("k", 1), ("k", 2))]
    );
}

#[test]
fn batch_add_with_existing_key_is_all_or_nothing() {
    let mut map = ObservableMap::new();
    map.add(2, 'x').unwrap();
    let log = new_log();
    let _sub = map.subscribe(sink(&log));

    assert_eq!(
        map.add_range([(1, 'a'), (2, 'b'), (3, 'c')]),
        Err(CollectionError::DuplicateKey)
    );
    assert_eq!(
        map.add_range([(4, 'd'), (4, 'e')]),
        Err(CollectionError::DuplicateKeyInBatch)
    );
    assert_eq!(map.len(), 1);
    assert!(log.borrow().is_empty());
}

#[test]
fn missing_key_in_batch_removal_removes_nothing() {
    let mut map: ObservableMap<i32, i32> = (0..4).map(|i| (i, i * i)).collect();
    assert_eq!(map.remove_range(&[1, 9]), Err(CollectionError::KeyNotFound));
    assert_eq!(map.try_remove_range(&[1, 9]), Ok(Vec::new()));
    assert_eq!(map.len(), 4);

    let removed = map.remove_range(&[3, 1]).unwrap();
    assert_eq!(removed, vec![(3, 9), (1, 1)]);
    assert_eq!(map.len(), 2);
}

// ─── List ranges and cursors ────────────────────────────────────────────

#[test]
fn ranged_removal_is_one_ordered_batch() {
    let mut list: ObservableList<char> = "abcde".chars().collect();
    let log = new_log();
    let _sub = list.subscribe(sink(&log));

    assert_eq!(list.remove_range(1, 2), Ok(vec!['b', 'c']));
    assert_eq!(list, ['a', 'd', 'e']);
    assert_eq!(*log.borrow(), vec![ChangeSet::removed(vec!['b', 'c'])]);
}

#[test]
fn mutation_during_enumeration_is_detected() {
    let mut list: ObservableList<i32> = (0..4).collect();
    let mut cursor = list.cursor();
    assert_eq!(cursor.next(&list), Ok(Some(&0)));

    list.add(4);
    assert!(matches!(
        cursor.next(&list),
        Err(CollectionError::StaleCursor { .. })
    ));

    cursor.reset(&list);
    let mut seen = Vec::new();
    while let Some(item) = cursor.next(&list).unwrap() {
        seen.push(*item);
    }
    assert_eq!(seen, vec![0, 1, 2, 3, 4]);
}

#[test]
fn in_place_set_keeps_cursor_valid() {
    let mut list: ObservableList<i32> = vec![1, 2, 3].into();
    let mut cursor = list.cursor();
    cursor.next(&list).unwrap();
    list.set(2, 30).unwrap();
    assert_eq!(cursor.next(&list), Ok(Some(&2)));
    assert_eq!(cursor.next(&list), Ok(Some(&30)));
}

// ─── Stack ordering ─────────────────────────────────────────────────────

#[test]
fn push_range_reports_top_first() {
    let mut stack = ObservableStack::new();
    let log = new_log();
    let _sub = stack.subscribe(sink(&log));

    stack.push_range(['a', 'b', 'c']);
    assert_eq!(stack.peek(), Ok(&'c'));
    assert_eq!(stack.pop_range(2), Ok(vec!['c', 'b']));

    assert_eq!(
        *log.borrow(),
        vec![
            ChangeSet::added(vec!['c', 'b', 'a']),
            ChangeSet::removed(vec!['c', 'b']),
        ]
    );
}

#[test]
fn empty_stack_reports_empty() {
    let mut stack: ObservableStack<u8> = ObservableStack::new();
    assert_eq!(stack.pop(), Err(CollectionError::Empty));
    assert_eq!(stack.peek(), Err(CollectionError::Empty));
    assert_eq!(stack.try_pop(), None);
}

// ─── Subscription lifecycle ─────────────────────────────────────────────

#[test]
fn dropped_subscription_stops_delivery() {
    let mut list = ObservableList::new();
    let first = new_log();
    let second = new_log();
    let sub_first = list.subscribe(sink(&first));
    let _sub_second = list.subscribe(sink(&second));

    list.add(1);
    drop(sub_first);
    list.add(2);

    assert_eq!(first.borrow().len(), 1);
    assert_eq!(second.borrow().len(), 2);
    assert_eq!(list.subscriber_count(), 1);
}

#[test]
fn subscribers_run_in_registration_order() {
    let mut list = ObservableList::new();
    let order = Rc::new(RefCell::new(Vec::new()));
    let subs: Vec<_> = (0..3)
        .map(|id| {
            let order = Rc::clone(&order);
            list.subscribe(move |_: &ChangeSet<u8>| order.borrow_mut().push(id))
        })
        .collect();

    list.add(7);
    assert_eq!(*order.borrow(), vec![0, 1, 2]);
    drop(subs);
}
