//! Persistent priority queue built on [`FingerTree`].
//!
//! Every level of the tree caches the minimum of the items below it, so the
//! minimum of the whole heap is always available in O(1). Removing it
//! splits the tree where the cached minimum first appears and joins the two
//! halves again.
//!
//! # Time Complexity
//!
//! | Operation | Complexity |
//! |-----------|------------|
//! | `peek` | O(1) |
//! | `push` | O(1) amortized |
//! | `pop` | O(log n) |
//! | `merge` | O(log(min(n1, n2))) |
//! | `heapify` | O(n) |
//!
//! # Examples
//!
//! ```rust
//! use finger_collections::persistent::FingerHeap;
//!
//! let heap = FingerHeap::new().push(5).push(3).push(8);
//! assert_eq!(heap.peek(), Some(&3));
//!
//! let (minimum, rest) = heap.pop().unwrap();
//! assert_eq!(*minimum, 3);
//! assert_eq!(rest.peek(), Some(&5));
//!
//! // Structural sharing: the original heap is preserved
//! assert_eq!(heap.peek(), Some(&3));
//! ```

use std::cmp::Ordering;
use std::fmt;

use super::finger_tree::{FingerTree, FingerTreeIterator};
use super::measure::MeasureMonoid;
use super::ReferenceCounter;

/// The annotation of a heap subtree: its minimum item, if any.
///
/// The item is held by the same shared handle the tree stores it under, so a
/// minimum can be told apart from equal items by identity.
pub enum OrdBox<T> {
    /// No items.
    Empty,
    /// The minimum item.
    Boxed(ReferenceCounter<T>),
}

impl<T> OrdBox<T> {
    /// Returns the boxed item, if any.
    #[inline]
    #[must_use]
    pub fn item(&self) -> Option<&T> {
        match self {
            Self::Empty => None,
            Self::Boxed(item) => Some(&**item),
        }
    }

    /// Returns `true` if this box holds exactly the given shared item.
    #[inline]
    #[must_use]
    pub fn holds(&self, item: &ReferenceCounter<T>) -> bool {
        matches!(self, Self::Boxed(boxed) if ReferenceCounter::ptr_eq(boxed, item))
    }
}

impl<T> Clone for OrdBox<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Empty => Self::Empty,
            Self::Boxed(item) => Self::Boxed(item.clone()),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for OrdBox<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => formatter.write_str("Empty"),
            Self::Boxed(item) => formatter.debug_tuple("Boxed").field(item).finish(),
        }
    }
}

/// Measure monoid keeping the minimum item under a comparator.
///
/// On ties the left operand wins, which makes the monoid associative even
/// though equal items are distinguishable by identity.
#[derive(Clone, Copy)]
pub struct MinBy<C> {
    comparator: C,
}

impl<C> MinBy<C> {
    /// Creates the monoid for the given comparator.
    #[must_use]
    pub const fn new(comparator: C) -> Self {
        Self { comparator }
    }
}

impl<C> fmt::Debug for MinBy<C> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("MinBy").finish_non_exhaustive()
    }
}

impl<T, C> MeasureMonoid<T> for MinBy<C>
where
    C: Fn(&T, &T) -> Ordering,
{
    type Value = OrdBox<T>;

    #[inline]
    fn measure(&self, item: &ReferenceCounter<T>) -> OrdBox<T> {
        OrdBox::Boxed(item.clone())
    }

    #[inline]
    fn empty(&self) -> OrdBox<T> {
        OrdBox::Empty
    }

    fn append(&self, left: &OrdBox<T>, right: &OrdBox<T>) -> OrdBox<T> {
        match (left, right) {
            (OrdBox::Empty, _) => right.clone(),
            (_, OrdBox::Empty) => left.clone(),
            (OrdBox::Boxed(first), OrdBox::Boxed(second)) => {
                if (self.comparator)(first, second) == Ordering::Greater {
                    right.clone()
                } else {
                    left.clone()
                }
            }
        }
    }
}

/// A persistent min-heap ordered by a comparator.
///
/// The default comparator is the natural order of `T`; a reversed
/// comparator gives a max-heap.
///
/// Items are stored in insertion order; only the cached annotations know
/// where the minimum is.
///
/// # Examples
///
/// ```rust
/// use finger_collections::persistent::FingerHeap;
///
/// let max_heap = FingerHeap::heapify([2, 7, 4], |left: &i32, right: &i32| right.cmp(left));
/// assert_eq!(max_heap.peek(), Some(&7));
/// ```
pub struct FingerHeap<T, C = fn(&T, &T) -> Ordering>
where
    C: Fn(&T, &T) -> Ordering,
{
    tree: FingerTree<T, MinBy<C>>,
}

impl<T: Ord> FingerHeap<T> {
    /// Creates an empty heap in the natural order of `T`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_comparator(T::cmp)
    }

    /// Creates a heap holding one item, in the natural order of `T`.
    #[must_use]
    pub fn singleton(item: T) -> Self {
        Self::singleton_with(item, T::cmp)
    }
}

impl<T: Ord> Default for FingerHeap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, C> FingerHeap<T, C>
where
    C: Fn(&T, &T) -> Ordering,
{
    /// Creates an empty heap ordered by `comparator`.
    #[must_use]
    pub fn with_comparator(comparator: C) -> Self {
        Self {
            tree: FingerTree::new(MinBy::new(comparator)),
        }
    }

    /// Creates a heap holding one item, ordered by `comparator`.
    #[must_use]
    pub fn singleton_with(item: T, comparator: C) -> Self {
        Self {
            tree: FingerTree::singleton(item, MinBy::new(comparator)),
        }
    }

    /// Builds a heap from `items`, keeping their order in storage.
    #[must_use]
    pub fn heapify<I>(items: I, comparator: C) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        Self {
            tree: FingerTree::from_items(items, MinBy::new(comparator)),
        }
    }

    /// Returns `true` if the heap contains no items.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns the minimum item without removing it.
    ///
    /// Among equal minima, the one stored first is returned.
    #[must_use]
    pub fn peek(&self) -> Option<&T> {
        match self.tree.cached_measure() {
            Some(minimum) => minimum.item(),
            None => self.tree.peek_left(),
        }
    }

    /// Inserts an item.
    #[must_use]
    pub fn push(&self, item: T) -> Self {
        Self {
            tree: self.tree.cons(item),
        }
    }

    /// Removes the minimum item, returning it with the remaining heap.
    ///
    /// Exactly one item is removed, even when several compare equal to it.
    #[must_use]
    pub fn pop(&self) -> Option<(&T, Self)> {
        let OrdBox::Boxed(minimum) = self.tree.measure() else {
            return None;
        };

        let (before, item, after) = self.tree.split(|running| running.holds(&minimum));
        item.map(|item| {
            (
                item,
                Self {
                    tree: before.concat(&after),
                },
            )
        })
    }

    /// Combines two heaps.
    ///
    /// Both heaps must be ordered by equivalent comparators; the receiver's
    /// comparator is kept.
    #[must_use]
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            tree: self.tree.concat(&other.tree),
        }
    }

    /// Iterates over the items in storage order, which is not sorted.
    #[must_use]
    pub fn iter(&self) -> FingerTreeIterator<'_, T, OrdBox<T>> {
        self.tree.iter()
    }
}

impl<T, C> Clone for FingerHeap<T, C>
where
    C: Fn(&T, &T) -> Ordering,
{
    fn clone(&self) -> Self {
        Self {
            tree: self.tree.clone(),
        }
    }
}

impl<T: fmt::Debug, C> fmt::Debug for FingerHeap<T, C>
where
    C: Fn(&T, &T) -> Ordering,
{
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("FingerHeap")
            .field("minimum", &self.peek())
            .field("items", &self.tree)
            .finish()
    }
}

impl<T: Ord> FromIterator<T> for FingerHeap<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::heapify(iter, T::cmp)
    }
}

impl<'a, T, C> IntoIterator for &'a FingerHeap<T, C>
where
    C: Fn(&T, &T) -> Ordering,
{
    type Item = &'a T;
    type IntoIter = FingerTreeIterator<'a, T, OrdBox<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(feature = "arc")]
static_assertions::assert_impl_all!(FingerHeap<i32>: Send, Sync);

#[cfg(not(feature = "arc"))]
static_assertions::assert_not_impl_any!(FingerHeap<i32>: Send, Sync);
