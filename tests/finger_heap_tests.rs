//! Integration tests for FingerHeap.

#![allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]

use finger_collections::persistent::FingerHeap;
use rstest::rstest;
use std::cmp::Ordering;

/// Deterministic, unordered sample data with values below `bound`.
fn scrambled(size: usize, bound: usize) -> Vec<i32> {
    (0..size)
        .map(|index| ((index * 7919 + 13) % bound) as i32)
        .collect()
}

/// Pops every item, in heap order.
fn heap_sort<T: Clone, C: Fn(&T, &T) -> Ordering>(heap: &FingerHeap<T, C>) -> Vec<T> {
    let mut sorted = Vec::new();
    let mut current = heap.clone();
    while !current.is_empty() {
        let (item, rest) = current.pop().unwrap();
        sorted.push(item.clone());
        current = rest;
    }
    sorted
}

fn descending(left: &i32, right: &i32) -> Ordering {
    right.cmp(left)
}

// =============================================================================
// Concrete scenario
// =============================================================================

#[rstest]
fn test_push_then_pop_in_order() {
    let heap = [5, 3, 8, 1, 9, 2]
        .into_iter()
        .fold(FingerHeap::new(), |heap, item| heap.push(item));

    assert_eq!(heap_sort(&heap), vec![1, 2, 3, 5, 8, 9]);
}

// =============================================================================
// Heapify
// =============================================================================

#[rstest]
#[case(0)]
#[case(1)]
#[case(10)]
#[case(100)]
#[case(1000)]
fn test_heapify_sorts(#[case] size: usize) {
    let items = scrambled(size, 100_000);
    let mut expected = items.clone();
    expected.sort_unstable();

    let heap = FingerHeap::heapify(items, i32::cmp);
    assert_eq!(heap_sort(&heap), expected);
}

// =============================================================================
// Push / Pop
// =============================================================================

#[rstest]
#[case(1)]
#[case(10)]
#[case(100)]
#[case(1000)]
fn test_singleton_then_push(#[case] size: usize) {
    let items = scrambled(size, 100_000);
    let mut expected = items.clone();
    expected.sort_unstable();

    let heap = items[1..]
        .iter()
        .fold(FingerHeap::singleton(items[0]), |heap, item| heap.push(*item));

    let mut current = heap;
    for expected_item in expected {
        let (item, rest) = current.pop().unwrap();
        assert_eq!(*item, expected_item);
        current = rest;
    }
    assert!(current.is_empty());
}

#[rstest]
#[case(1)]
#[case(10)]
#[case(100)]
#[case(1000)]
fn test_max_heap(#[case] size: usize) {
    let items = scrambled(size, 100_000);
    let mut expected = items.clone();
    expected.sort_unstable_by(descending);

    let heap = items
        .iter()
        .fold(FingerHeap::with_comparator(descending), |heap, item| heap.push(*item));

    assert_eq!(heap_sort(&heap), expected);
}

#[rstest]
fn test_many_same() {
    let items = scrambled(100, 10);
    let mut expected = items.clone();
    expected.sort_unstable();

    assert_eq!(heap_sort(&FingerHeap::heapify(items.clone(), i32::cmp)), expected);

    let pushed = items
        .iter()
        .fold(FingerHeap::new(), |heap, item| heap.push(*item));
    assert_eq!(heap_sort(&pushed), expected);
}

#[rstest]
fn test_all_same() {
    let items = vec![29; 7];

    assert_eq!(heap_sort(&FingerHeap::heapify(items.clone(), i32::cmp)), items);

    let pushed = items
        .iter()
        .fold(FingerHeap::new(), |heap, item| heap.push(*item));
    assert_eq!(heap_sort(&pushed), items);
}

#[rstest]
fn test_equal_keys_are_distinct_items() {
    let heap = FingerHeap::heapify(
        [(1, "first"), (0, "second"), (0, "third")],
        |left: &(i32, &str), right: &(i32, &str)| left.0.cmp(&right.0),
    );

    let (item, rest) = heap.pop().unwrap();
    assert_eq!(*item, (0, "second"));
    let (item, rest) = rest.pop().unwrap();
    assert_eq!(*item, (0, "third"));
    let (item, rest) = rest.pop().unwrap();
    assert_eq!(*item, (1, "first"));
    assert!(rest.pop().is_none());
}

// =============================================================================
// Persistence
// =============================================================================

#[rstest]
fn test_persistence_push_ascending() {
    let mut heaps = vec![FingerHeap::new()];
    for item in 0..10 {
        let next = heaps[heaps.len() - 1].push(item);
        heaps.push(next);
    }

    for (count, heap) in heaps.iter().enumerate() {
        assert_eq!(heap_sort(heap), (0..count as i32).collect::<Vec<_>>());
    }
}

#[rstest]
fn test_persistence_push_descending() {
    let mut heaps = vec![FingerHeap::new()];
    for item in (0..10).rev() {
        let next = heaps[heaps.len() - 1].push(item);
        heaps.push(next);
    }

    for (count, heap) in heaps.iter().enumerate() {
        let expected: Vec<i32> = (10 - count as i32..10).collect();
        assert_eq!(heap_sort(heap), expected);
    }
}

#[rstest]
fn test_persistence_pop() {
    let expected: Vec<i32> = (0..10).collect();
    let mut heaps = vec![FingerHeap::heapify(expected.clone(), i32::cmp)];
    for _ in 0..expected.len() {
        let (_, next) = heaps[heaps.len() - 1].pop().unwrap();
        heaps.push(next);
    }

    for (popped, heap) in heaps.iter().enumerate() {
        assert_eq!(heap_sort(heap), expected[popped..]);
    }
}

// =============================================================================
// Merge and peek
// =============================================================================

#[rstest]
fn test_merge_interleaves() {
    let evens: FingerHeap<i32> = (0..20).step_by(2).collect();
    let odds: FingerHeap<i32> = (1..20).step_by(2).collect();

    let merged = evens.merge(&odds);
    assert_eq!(merged.peek(), Some(&0));
    assert_eq!(heap_sort(&merged), (0..20).collect::<Vec<_>>());
}

#[rstest]
fn test_peek_does_not_remove() {
    let heap: FingerHeap<i32> = [7, 3, 5].into_iter().collect();

    assert_eq!(heap.peek(), Some(&3));
    assert_eq!(heap.peek(), Some(&3));
    assert_eq!(heap.iter().count(), 3);
}

#[rstest]
fn test_peek_matches_pop() {
    let heap = FingerHeap::heapify(scrambled(500, 1_000), i32::cmp);
    let mut current = heap;
    while let Some(expected) = current.peek().copied() {
        let (item, rest) = current.pop().unwrap();
        assert_eq!(*item, expected);
        current = rest;
    }
}
