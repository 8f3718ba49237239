//! Persistent random-access sequence built on [`FingerTree`].
//!
//! The tree is annotated with item counts, so the measure of any subtree is
//! its length. Indexing then becomes a split at the first position where
//! the running count exceeds the index.
//!
//! # Time Complexity
//!
//! | Operation | Complexity |
//! |-----------|------------|
//! | `len`, `head`, `last` | O(1) |
//! | `push_front`, `push_back` | O(1) amortized |
//! | `pop_front`, `pop_back`, `tail`, `init` | O(1) amortized |
//! | `get`, `take`, `drop_first`, `split_at` | O(log n) |
//! | `append` | O(log(min(n1, n2))) |
//! | `map`, `fold_left`, `fold_right` | O(n) |

use std::fmt;
use std::hash::{Hash, Hasher};

use super::ReferenceCounter;
use super::finger_tree::{FingerTree, FingerTreeIterator};
use super::measure::MeasureMonoid;

/// The count monoid: every item measures one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Size;

impl<T> MeasureMonoid<T> for Size {
    type Value = usize;

    #[inline]
    fn measure(&self, _item: &ReferenceCounter<T>) -> usize {
        1
    }

    #[inline]
    fn empty(&self) -> usize {
        0
    }

    #[inline]
    fn append(&self, left: &usize, right: &usize) -> usize {
        left + right
    }
}

/// A persistent sequence with efficient access at both ends and
/// logarithmic indexing.
///
/// # Examples
///
/// ```rust
/// use finger_collections::persistent::FingerVector;
///
/// let vector: FingerVector<i32> = [10, 20, 30, 40, 50].into_iter().collect();
/// assert_eq!(vector.len(), 5);
/// assert_eq!(vector.get(2), Some(&30));
///
/// let (left, right) = vector.split_at(2);
/// assert_eq!(left.iter().copied().collect::<Vec<_>>(), vec![10, 20]);
/// assert_eq!(right.iter().copied().collect::<Vec<_>>(), vec![30, 40, 50]);
///
/// // Structural sharing: the original vector is preserved
/// assert_eq!(vector.len(), 5);
/// ```
pub struct FingerVector<T> {
    tree: FingerTree<T, Size>,
}

impl<T> FingerVector<T> {
    /// Creates an empty vector.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            tree: FingerTree::new(Size),
        }
    }

    /// Creates a vector containing a single element.
    #[inline]
    #[must_use]
    pub fn singleton(element: T) -> Self {
        Self {
            tree: FingerTree::singleton(element, Size),
        }
    }

    /// Returns `true` if the vector contains no elements.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns the number of elements.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.measure()
    }

    /// Prepends an element.
    #[must_use]
    pub fn push_front(&self, element: T) -> Self {
        Self {
            tree: self.tree.cons(element),
        }
    }

    /// Appends an element.
    #[must_use]
    pub fn push_back(&self, element: T) -> Self {
        Self {
            tree: self.tree.snoc(element),
        }
    }

    /// Concatenates this vector with another.
    #[must_use]
    pub fn append(&self, other: &Self) -> Self {
        Self {
            tree: self.tree.concat(&other.tree),
        }
    }

    /// Returns the first element.
    #[inline]
    #[must_use]
    pub fn head(&self) -> Option<&T> {
        self.tree.peek_left()
    }

    /// Returns the last element.
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.tree.peek_right()
    }

    /// Removes the first element, returning it with the remaining vector.
    #[must_use]
    pub fn pop_front(&self) -> Option<(&T, Self)> {
        self.tree
            .pop_left()
            .map(|(element, tree)| (element, Self { tree }))
    }

    /// Removes the last element, returning it with the remaining vector.
    #[must_use]
    pub fn pop_back(&self) -> Option<(&T, Self)> {
        self.tree
            .pop_right()
            .map(|(element, tree)| (element, Self { tree }))
    }

    /// Returns all elements but the first, or `None` if empty.
    #[must_use]
    pub fn tail(&self) -> Option<Self> {
        self.pop_front().map(|(_, rest)| rest)
    }

    /// Returns all elements but the last, or `None` if empty.
    #[must_use]
    pub fn init(&self) -> Option<Self> {
        self.pop_back().map(|(_, rest)| rest)
    }

    /// Returns the element at `index`, or `None` if out of bounds.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use finger_collections::persistent::FingerVector;
    ///
    /// let vector: FingerVector<char> = "abc".chars().collect();
    /// assert_eq!(vector.get(1), Some(&'b'));
    /// assert_eq!(vector.get(3), None);
    /// ```
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.tree.search(|count| index < *count)
    }

    /// Returns the first `count` elements, or the whole vector if it is shorter.
    #[must_use]
    pub fn take(&self, count: usize) -> Self {
        Self {
            tree: self.tree.split_left(|running| count < *running),
        }
    }

    /// Returns the vector without its first `count` elements; empty if it
    /// is not longer than `count`.
    #[must_use]
    pub fn drop_first(&self, count: usize) -> Self {
        Self {
            tree: self.tree.split_right(|running| count < *running),
        }
    }

    /// Splits into the elements before `index` and the elements from `index` on.
    ///
    /// An out-of-range `index` yields the whole vector and an empty one.
    #[must_use]
    pub fn split_at(&self, index: usize) -> (Self, Self) {
        let (left, right) = self.tree.split_before(|count| index < *count);
        (Self { tree: left }, Self { tree: right })
    }

    /// Applies `function` to every element, in order.
    #[must_use]
    pub fn map<U, F>(&self, function: F) -> FingerVector<U>
    where
        F: FnMut(&T) -> U,
    {
        FingerVector {
            tree: self.tree.map(function, Size),
        }
    }

    /// Folds the elements from left to right.
    pub fn fold_left<B, F>(&self, init: B, function: F) -> B
    where
        F: FnMut(B, &T) -> B,
    {
        self.tree.fold_left(init, function)
    }

    /// Folds the elements from right to left.
    pub fn fold_right<B, F>(&self, init: B, function: F) -> B
    where
        F: FnMut(&T, B) -> B,
    {
        self.tree.fold_right(init, function)
    }

    /// Returns an iterator over references to the elements.
    #[must_use]
    pub fn iter(&self) -> FingerTreeIterator<'_, T, usize> {
        self.tree.iter()
    }
}

impl<T> Clone for FingerVector<T> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree.clone(),
        }
    }
}

impl<T> Default for FingerVector<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for FingerVector<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            tree: FingerTree::from_items(iter, Size),
        }
    }
}

impl<'a, T> IntoIterator for &'a FingerVector<T> {
    type Item = &'a T;
    type IntoIter = FingerTreeIterator<'a, T, usize>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: PartialEq> PartialEq for FingerVector<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.tree == other.tree
    }
}

impl<T: Eq> Eq for FingerVector<T> {}

impl<T: Hash> Hash for FingerVector<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for element in self {
            element.hash(state);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for FingerVector<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_list().entries(self.iter()).finish()
    }
}

#[cfg(feature = "arc")]
static_assertions::assert_impl_all!(FingerVector<i32>: Send, Sync);

#[cfg(not(feature = "arc"))]
static_assertions::assert_not_impl_any!(FingerVector<i32>: Send, Sync);
