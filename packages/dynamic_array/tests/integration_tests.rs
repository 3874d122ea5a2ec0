//! Integration tests for `DynamicArray` covering growth, lifetime and failure behavior.
#![allow(
    missing_docs,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    clippy::unwrap_used,
    reason = "tests focus on succinct code and do not need to tick all the boxes"
)]

use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use dynamic_array::DynamicArray;

/// Shared bookkeeping for `Tracked` items.
#[derive(Debug, Default)]
struct Counters {
    clones: Cell<usize>,
    drops: Cell<usize>,

    /// If set, the clone that would bring the clone count to this value panics instead.
    fail_on_clone: Cell<Option<usize>>,
}

#[derive(Debug)]
struct Tracked {
    value: u32,
    counters: Rc<Counters>,
}

impl Tracked {
    fn new(value: u32, counters: &Rc<Counters>) -> Self {
        Self {
            value,
            counters: Rc::clone(counters),
        }
    }
}

impl Clone for Tracked {
    fn clone(&self) -> Self {
        let attempt = self.counters.clones.get() + 1;

        if self.counters.fail_on_clone.get() == Some(attempt) {
            panic!("clone #{attempt} fails on purpose");
        }

        self.counters.clones.set(attempt);
        Self::new(self.value, &self.counters)
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.counters.drops.set(self.counters.drops.get() + 1);
    }
}

thread_local! {
    static DEFAULTS_CONSTRUCTED: Cell<usize> = const { Cell::new(0) };
    static DEFAULTS_DROPPED: Cell<usize> = const { Cell::new(0) };
    static DEFAULT_FAILS_AT: Cell<Option<usize>> = const { Cell::new(None) };
}

/// Default construction panics on a configurable attempt. Each test runs on its own thread,
/// so the thread-local counters are isolated per test.
#[derive(Debug)]
struct FlakyDefault(u32);

impl Default for FlakyDefault {
    fn default() -> Self {
        let attempt = DEFAULTS_CONSTRUCTED.get() + 1;

        if DEFAULT_FAILS_AT.get() == Some(attempt) {
            panic!("default #{attempt} fails on purpose");
        }

        DEFAULTS_CONSTRUCTED.set(attempt);
        Self(0)
    }
}

impl Drop for FlakyDefault {
    fn drop(&mut self) {
        DEFAULTS_DROPPED.set(DEFAULTS_DROPPED.get() + 1);
    }
}

fn tracked_array(len: u32, counters: &Rc<Counters>) -> DynamicArray<Tracked> {
    let mut array = DynamicArray::new();

    for value in 0..len {
        array.push(Tracked::new(value, counters));
    }

    array
}

fn values(array: &DynamicArray<Tracked>) -> Vec<u32> {
    array.iter().map(|item| item.value).collect()
}

fn flaky_values(array: &DynamicArray<FlakyDefault>) -> Vec<u32> {
    array.iter().map(|item| item.0).collect()
}

#[test]
fn push_three_scenario() {
    let mut array = DynamicArray::new();
    let mut capacities = vec![array.capacity()];

    for value in [1, 2, 3] {
        array.push(value);
        capacities.push(array.capacity());
    }

    assert_eq!(array.len(), 3);
    assert_eq!(capacities, vec![0, 1, 2, 4]);
    assert_eq!(array, [1, 2, 3]);
}

#[test]
fn insert_then_erase_scenario() {
    let mut array = DynamicArray::from([1, 2, 3]);

    array.insert(1, 9);
    assert_eq!(array, [1, 9, 2, 3]);
    assert_eq!(array.len(), 4);

    array.erase(0);
    assert_eq!(array, [9, 2, 3]);
    assert_eq!(array.len(), 3);
}

#[test]
fn resize_scenario_drops_trailing_items_once() {
    let mut array = DynamicArray::<FlakyDefault>::new();
    array.push(FlakyDefault(1));
    array.push(FlakyDefault(2));
    array.push(FlakyDefault(3));

    array.resize(5);
    assert_eq!(array.len(), 5);
    assert_eq!(DEFAULTS_CONSTRUCTED.get(), 2);
    assert_eq!(flaky_values(&array), vec![1, 2, 3, 0, 0]);

    array.resize(2);
    assert_eq!(array.len(), 2);
    assert_eq!(flaky_values(&array), vec![1, 2]);
    assert_eq!(DEFAULTS_DROPPED.get(), 3);

    drop(array);
    assert_eq!(DEFAULTS_DROPPED.get(), 5);
}

#[test]
fn capacity_changes_only_on_reallocation() {
    let mut array = DynamicArray::new();
    let mut previous_capacity = array.capacity();

    for value in 0..64_u32 {
        let was_full = array.len() == array.capacity();

        array.push(value);

        if was_full {
            assert_eq!(array.capacity(), (previous_capacity * 2).max(1));
        } else {
            assert_eq!(array.capacity(), previous_capacity);
        }

        assert!(array.capacity() >= array.len());
        previous_capacity = array.capacity();
    }

    // Non-growing operations leave the capacity alone.
    array.erase(10);
    array.pop_back();
    array.truncate(20);
    array.insert(5, 500);
    array.resize(30);
    assert_eq!(array.capacity(), previous_capacity);
}

#[test]
fn erase_preserves_relative_order() {
    for index in 0..8 {
        let mut array: DynamicArray<u32> = (0..8).collect();
        let mut expected: Vec<u32> = (0..8).collect();

        array.erase(index);
        expected.remove(index);

        assert_eq!(array.len(), 7);
        assert_eq!(array.as_slice(), expected.as_slice());
    }
}

#[test]
fn growth_moves_items_without_cloning() {
    let counters = Rc::new(Counters::default());

    let array = tracked_array(100, &counters);

    assert_eq!(counters.clones.get(), 0);
    assert_eq!(counters.drops.get(), 0);
    assert_eq!(values(&array), (0..100).collect::<Vec<_>>());

    drop(array);
    assert_eq!(counters.drops.get(), 100);
}

#[test]
fn insert_growth_moves_items_without_cloning() {
    let counters = Rc::new(Counters::default());
    let mut array = tracked_array(4, &counters);
    assert_eq!(array.len(), array.capacity());

    array.insert(2, Tracked::new(99, &counters));
    array.reserve(100);

    assert_eq!(values(&array), vec![0, 1, 99, 2, 3]);
    assert_eq!(counters.clones.get(), 0);
    assert_eq!(counters.drops.get(), 0);
}

#[test]
fn clone_copies_each_item_once() {
    let counters = Rc::new(Counters::default());
    let array = tracked_array(10, &counters);

    let copy = array.clone();

    assert_eq!(counters.clones.get(), 10);
    assert_eq!(values(&copy), values(&array));

    drop(copy);
    assert_eq!(counters.drops.get(), 10);
}

#[test]
fn failed_append_into_full_array_leaves_it_unchanged() {
    let counters = Rc::new(Counters::default());
    let mut array = tracked_array(4, &counters);
    assert_eq!(array.capacity(), 4);
    let base = array.as_ptr();

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        array.emplace_back_with(|| panic!("constructor fails"));
    }));

    assert!(result.is_err());
    assert_eq!(array.len(), 4);
    assert_eq!(array.capacity(), 4);
    assert_eq!(array.as_ptr(), base);
    assert_eq!(values(&array), vec![0, 1, 2, 3]);
    assert_eq!(counters.drops.get(), 0);
}

#[test]
fn failed_append_with_room_leaves_array_unchanged() {
    let counters = Rc::new(Counters::default());
    let mut array = tracked_array(3, &counters);
    assert_eq!(array.capacity(), 4);

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        array.emplace_back_with(|| panic!("constructor fails"));
    }));

    assert!(result.is_err());
    assert_eq!(values(&array), vec![0, 1, 2]);
    assert_eq!(array.capacity(), 4);
    assert_eq!(counters.drops.get(), 0);
}

#[test]
fn failed_insert_leaves_array_unchanged() {
    let counters = Rc::new(Counters::default());

    // Once with room to spare and once with a full array that must grow.
    for len in [3, 4] {
        let mut array = tracked_array(len, &counters);
        let capacity = array.capacity();

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            array.emplace_with(1, || panic!("constructor fails"));
        }));

        assert!(result.is_err());
        assert_eq!(values(&array), (0..len).collect::<Vec<_>>());
        assert_eq!(array.capacity(), capacity);
    }

    assert_eq!(counters.drops.get(), 7);
}

#[test]
fn failed_resize_growth_leaves_array_unchanged() {
    let mut array = DynamicArray::<FlakyDefault>::new();
    array.push(FlakyDefault(1));
    array.push(FlakyDefault(2));
    let capacity = array.capacity();
    let base = array.as_ptr();

    DEFAULT_FAILS_AT.set(Some(3));

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        array.resize(10);
    }));

    assert!(result.is_err());
    assert_eq!(flaky_values(&array), vec![1, 2]);
    assert_eq!(array.capacity(), capacity);
    assert_eq!(array.as_ptr(), base);

    // The two defaults constructed before the failure were dropped again.
    assert_eq!(DEFAULTS_CONSTRUCTED.get(), 2);
    assert_eq!(DEFAULTS_DROPPED.get(), 2);
}

#[test]
fn failed_resize_within_capacity_leaves_array_unchanged() {
    let mut array = DynamicArray::<FlakyDefault>::with_capacity(10);
    array.push(FlakyDefault(1));

    DEFAULT_FAILS_AT.set(Some(4));

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        array.resize(8);
    }));

    assert!(result.is_err());
    assert_eq!(flaky_values(&array), vec![1]);
    assert_eq!(array.capacity(), 10);
    assert_eq!(DEFAULTS_DROPPED.get(), 3);
}

#[test]
fn failed_with_len_drops_partial_items() {
    DEFAULT_FAILS_AT.set(Some(5));

    let result = panic::catch_unwind(|| DynamicArray::<FlakyDefault>::with_len(10));

    assert!(result.is_err());
    assert_eq!(DEFAULTS_DROPPED.get(), 4);
}

#[test]
fn failed_clone_leaves_source_intact_and_drops_partial_copy() {
    let counters = Rc::new(Counters::default());
    let array = tracked_array(5, &counters);
    counters.fail_on_clone.set(Some(3));

    let result = panic::catch_unwind(AssertUnwindSafe(|| array.clone()));

    assert!(result.is_err());
    assert_eq!(counters.clones.get(), 2);
    assert_eq!(counters.drops.get(), 2);
    assert_eq!(values(&array), vec![0, 1, 2, 3, 4]);
}

#[test]
fn failed_clone_from_leaves_valid_array() {
    let counters = Rc::new(Counters::default());
    let source = tracked_array(6, &counters);
    let mut target = DynamicArray::with_capacity(8);
    target.push(Tracked::new(100, &counters));

    // clone_from() clone-assigns the overlapping item and clone-constructs the rest. The default
    // `Clone::clone_from` goes through `clone()`, so the fourth clone is the third new item.
    counters.fail_on_clone.set(Some(4));

    let result = panic::catch_unwind(AssertUnwindSafe(|| target.clone_from(&source)));

    assert!(result.is_err());

    // The overwritten first item survives, the partially constructed tail is gone.
    assert_eq!(values(&target), vec![0]);
    assert_eq!(target.capacity(), 8);
    assert_eq!(values(&source), vec![0, 1, 2, 3, 4, 5]);

    // The replaced original item plus the two tail clones were dropped.
    assert_eq!(counters.drops.get(), 3);
}

#[test]
fn take_leaves_source_empty_without_touching_items() {
    let counters = Rc::new(Counters::default());
    let mut source = tracked_array(3, &counters);

    let target = std::mem::take(&mut source);

    assert!(source.is_empty());
    assert_eq!(source.capacity(), 0);
    assert_eq!(values(&target), vec![0, 1, 2]);
    assert_eq!(counters.clones.get(), 0);
    assert_eq!(counters.drops.get(), 0);
}

#[test]
fn owning_iteration_moves_items_out() {
    let counters = Rc::new(Counters::default());
    let array = tracked_array(4, &counters);

    let collected: Vec<u32> = array.into_iter().map(|item| item.value).collect();

    assert_eq!(collected, vec![0, 1, 2, 3]);
    assert_eq!(counters.drops.get(), 4);
    assert_eq!(counters.clones.get(), 0);
}
