//! IAI-Callgrind benchmark for finger tree operations.
//!
//! Measures instruction counts for construction, indexing, splitting,
//! concatenation, and heap pops.
//!
//! # Data Sizes
//!
//! - **get_sequential / split_middle**: 100, 1000, 10000 (multi-size for regression detection)
//! - **push_back / push_front / iter / heap_pop_all**: 1000 (single size)
//!
//! # Design Notes
//!
//! - **Setup functions**: The `#[bench::with_setup]` attribute ensures setup costs are NOT
//!   attributed to the benchmark measurement.

use iai_callgrind::{library_benchmark, library_benchmark_group, main};
use finger_collections::persistent::{FingerHeap, FingerVector};
use std::hint::black_box;

fn setup_vector_100() -> FingerVector<i32> {
    (0..100).collect()
}

fn setup_vector_1000() -> FingerVector<i32> {
    (0..1000).collect()
}

fn setup_vector_10000() -> FingerVector<i32> {
    (0..10000).collect()
}

fn setup_heap_1000() -> FingerHeap<i32> {
    (0..1000).map(|index| (index * 7919) % 1009).collect()
}

#[library_benchmark]
fn push_back_1000() -> FingerVector<i32> {
    let mut vector = FingerVector::new();
    for index in 0..1000 {
        vector = vector.push_back(black_box(index));
    }
    black_box(vector)
}

#[library_benchmark]
fn push_front_1000() -> FingerVector<i32> {
    let mut vector = FingerVector::new();
    for index in 0..1000 {
        vector = vector.push_front(black_box(index));
    }
    black_box(vector)
}

#[library_benchmark]
#[bench::with_setup(setup_vector_100())]
fn get_sequential_100(vector: FingerVector<i32>) -> i32 {
    let vector = black_box(vector);
    let mut sum = 0;
    for index in 0..100 {
        if let Some(&value) = vector.get(black_box(index)) {
            sum += value;
        }
    }
    black_box(sum)
}

#[library_benchmark]
#[bench::with_setup(setup_vector_1000())]
fn get_sequential_1000(vector: FingerVector<i32>) -> i32 {
    let vector = black_box(vector);
    let mut sum = 0;
    for index in 0..1000 {
        if let Some(&value) = vector.get(black_box(index)) {
            sum += value;
        }
    }
    black_box(sum)
}

#[library_benchmark]
#[bench::with_setup(setup_vector_10000())]
fn get_sequential_10000(vector: FingerVector<i32>) -> i32 {
    let vector = black_box(vector);
    let mut sum = 0;
    for index in 0..10000 {
        if let Some(&value) = vector.get(black_box(index)) {
            sum += value;
        }
    }
    black_box(sum)
}

#[library_benchmark]
#[bench::with_setup(setup_vector_100())]
fn split_middle_100(vector: FingerVector<i32>) -> (FingerVector<i32>, FingerVector<i32>) {
    black_box(black_box(vector).split_at(50))
}

#[library_benchmark]
#[bench::with_setup(setup_vector_1000())]
fn split_middle_1000(vector: FingerVector<i32>) -> (FingerVector<i32>, FingerVector<i32>) {
    black_box(black_box(vector).split_at(500))
}

#[library_benchmark]
#[bench::with_setup(setup_vector_10000())]
fn split_middle_10000(vector: FingerVector<i32>) -> (FingerVector<i32>, FingerVector<i32>) {
    black_box(black_box(vector).split_at(5000))
}

#[library_benchmark]
#[bench::with_setup(setup_vector_1000())]
fn append_self_1000(vector: FingerVector<i32>) -> FingerVector<i32> {
    let vector = black_box(vector);
    black_box(vector.append(&vector))
}

#[library_benchmark]
#[bench::with_setup(setup_vector_1000())]
fn iter_1000(vector: FingerVector<i32>) -> i32 {
    black_box(black_box(vector).iter().sum())
}

#[library_benchmark]
#[bench::with_setup(setup_heap_1000())]
fn heap_pop_all_1000(heap: FingerHeap<i32>) -> i32 {
    let mut current = black_box(heap);
    let mut sum = 0;
    while let Some((item, rest)) = current.pop() {
        sum += *item;
        current = rest;
    }
    black_box(sum)
}

library_benchmark_group!(
    name = finger_tree_group;
    benchmarks =
        push_back_1000, push_front_1000,
        get_sequential_100, get_sequential_1000, get_sequential_10000,
        split_middle_100, split_middle_1000, split_middle_10000,
        append_self_1000,
        iter_1000,
        heap_pop_all_1000
);

main!(library_benchmark_groups = finger_tree_group);
