//! Persistent (immutable) measured sequences.
//!
//! This module provides a finger tree annotated with a user-chosen monoid,
//! and two structures derived from it by fixing the monoid:
//!
//! - [`FingerTree`]: Generic finger tree over any [`MeasureMonoid`]
//! - [`FingerVector`]: Random-access sequence (count monoid)
//! - [`FingerHeap`]: Priority queue (minimum monoid)
//!
//! # Structural Sharing
//!
//! All data structures in this module use structural sharing: every
//! operation returns a new version and leaves the original intact, sharing
//! every unchanged subtree with it.
//!
//! # Examples
//!
//! ## `FingerTree`
//!
//! ```rust
//! use finger_collections::persistent::{FingerTree, MeasureFn};
//!
//! let sums = MeasureFn::new(|item: &u32| u64::from(*item), 0, |left: &u64, right: &u64| left + right);
//! let tree = FingerTree::from_items([5, 1, 7, 2], sums);
//! assert_eq!(tree.measure(), 15);
//!
//! // Everything before the running sum exceeds 6.
//! let prefix = tree.split_left(|total| *total > 6);
//! assert_eq!(prefix.iter().copied().collect::<Vec<_>>(), vec![5, 1]);
//! assert_eq!(tree.measure(), 15); // Original unchanged
//! ```
//!
//! ## `FingerVector`
//!
//! ```rust
//! use finger_collections::persistent::FingerVector;
//!
//! let vector: FingerVector<i32> = (0..100).collect();
//! assert_eq!(vector.get(50), Some(&50));
//!
//! let dropped = vector.drop_first(90);
//! assert_eq!(dropped.len(), 10);
//! assert_eq!(vector.len(), 100); // Original unchanged
//! ```
//!
//! ## `FingerHeap`
//!
//! ```rust
//! use finger_collections::persistent::FingerHeap;
//!
//! let heap: FingerHeap<i32> = [4, 9, 1, 7].into_iter().collect();
//! let (minimum, rest) = heap.pop().unwrap();
//! assert_eq!(*minimum, 1);
//! assert_eq!(rest.peek(), Some(&4));
//! ```

// =============================================================================
// Reference Counter Type Alias
// =============================================================================

/// Reference-counted smart pointer type.
///
/// When the `arc` feature is enabled, this is `std::sync::Arc`,
/// which is thread-safe but has slightly higher overhead.
///
/// When the `arc` feature is disabled (default), this is `std::rc::Rc`,
/// which is faster but not thread-safe.
///
/// Items are stored behind this pointer, and measure monoids receive it in
/// [`MeasureMonoid::measure`].
#[cfg(feature = "arc")]
pub type ReferenceCounter<T> = std::sync::Arc<T>;

/// Reference-counted smart pointer type (`std::rc::Rc` without the `arc` feature).
#[cfg(not(feature = "arc"))]
pub type ReferenceCounter<T> = std::rc::Rc<T>;

/// Write-once cell holding a lazily computed annotation.
#[cfg(feature = "arc")]
pub(crate) type MeasureCell<V> = std::sync::OnceLock<V>;

#[cfg(not(feature = "arc"))]
pub(crate) type MeasureCell<V> = std::cell::OnceCell<V>;

mod finger_heap;
mod finger_tree;
mod finger_vector;
mod measure;

pub use finger_heap::FingerHeap;
pub use finger_heap::MinBy;
pub use finger_heap::OrdBox;
pub use finger_tree::FingerTree;
pub use finger_tree::FingerTreeIterator;
pub use finger_vector::FingerVector;
pub use finger_vector::Size;
pub use measure::MeasureContractViolation;
pub use measure::MeasureFn;
pub use measure::MeasureMonoid;

// =============================================================================
// Tests
// =============================================================================
