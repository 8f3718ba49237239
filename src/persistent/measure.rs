//! Measure monoids for annotated persistent structures.
//!
//! A measure monoid tells a [`FingerTree`](super::FingerTree) what to
//! aggregate. It consists of:
//!
//! 1. A measurement `measure: item -> V` applied to every stored item
//! 2. An identity annotation `empty: V`
//! 3. An associative operation `append: (V, V) -> V`
//!
//! The operation does not need to be commutative: the tree always combines
//! annotations in left-to-right order of the items they summarize.
//!
//! # Laws
//!
//! For all annotations `a`, `b`, `c`:
//!
//! ```text
//! append(empty, a) == a
//! append(a, empty) == a
//! append(append(a, b), c) == append(a, append(b, c))
//! ```
//!
//! Invertibility is not required.
//!
//! # Examples
//!
//! ```rust
//! use finger_collections::persistent::{FingerTree, MeasureFn};
//!
//! // Sum of all items, usable for prefix-sum searches.
//! let sums = MeasureFn::new(|item: &u32| u64::from(*item), 0, |left: &u64, right: &u64| left + right);
//! let tree = FingerTree::from_items([3, 1, 4, 1, 5], sums);
//!
//! assert_eq!(tree.measure(), 14);
//! // The first item at which the running sum exceeds 4.
//! assert_eq!(tree.search(|total| *total > 4), Some(&4));
//! ```

use std::error::Error;
use std::fmt;
use std::marker::PhantomData;

use super::ReferenceCounter;

/// A monoid over annotations, together with the measurement of single items.
///
/// Implementations are supplied once when a tree is created and threaded
/// through every operation on that tree and on every tree derived from it.
///
/// # Contract
///
/// `empty` must be an identity of `append`, and `append` must be associative.
/// A violation cannot be repaired locally; the split family detects the cases
/// where it leads to an impossible tree shape and panics with
/// [`MeasureContractViolation`].
///
/// # Examples
///
/// ```rust
/// use finger_collections::persistent::{MeasureMonoid, ReferenceCounter};
///
/// /// Measures the total byte length of a sequence of strings.
/// struct ByteLength;
///
/// impl MeasureMonoid<String> for ByteLength {
///     type Value = usize;
///
///     fn measure(&self, item: &ReferenceCounter<String>) -> usize {
///         item.len()
///     }
///
///     fn empty(&self) -> usize {
///         0
///     }
///
///     fn append(&self, left: &usize, right: &usize) -> usize {
///         left + right
///     }
/// }
/// ```
pub trait MeasureMonoid<T> {
    /// The annotation type.
    type Value: Clone;

    /// Measures a single stored item.
    ///
    /// The item is passed as its shared handle, so a measurement may keep
    /// a reference to the item itself and later recognize it by identity.
    fn measure(&self, item: &ReferenceCounter<T>) -> Self::Value;

    /// Returns the identity annotation.
    fn empty(&self) -> Self::Value;

    /// Combines two annotations, `left` summarizing the items before `right`.
    fn append(&self, left: &Self::Value, right: &Self::Value) -> Self::Value;
}

/// A measure monoid assembled from plain functions.
///
/// Useful for one-off annotations where declaring a dedicated type would be
/// noise.
///
/// # Examples
///
/// ```rust
/// use finger_collections::persistent::{FingerTree, MeasureFn};
///
/// let longest = MeasureFn::new(|word: &&str| word.len(), 0, |left: &usize, right: &usize| *left.max(right));
/// let tree = FingerTree::from_items(["finger", "tree", "monoid"], longest);
///
/// assert_eq!(tree.measure(), 6);
/// ```
pub struct MeasureFn<T, V, F, A> {
    measure: F,
    empty: V,
    append: A,
    item: PhantomData<fn(&T)>,
}

impl<T, V, F, A> MeasureFn<T, V, F, A>
where
    V: Clone,
    F: Fn(&T) -> V,
    A: Fn(&V, &V) -> V,
{
    /// Creates a measure monoid from a measurement, an identity and an
    /// associative combining operation.
    #[must_use]
    pub const fn new(measure: F, empty: V, append: A) -> Self {
        Self {
            measure,
            empty,
            append,
            item: PhantomData,
        }
    }
}

impl<T, V, F, A> MeasureMonoid<T> for MeasureFn<T, V, F, A>
where
    V: Clone,
    F: Fn(&T) -> V,
    A: Fn(&V, &V) -> V,
{
    type Value = V;

    #[inline]
    fn measure(&self, item: &ReferenceCounter<T>) -> V {
        (self.measure)(&**item)
    }

    #[inline]
    fn empty(&self) -> V {
        self.empty.clone()
    }

    #[inline]
    fn append(&self, left: &V, right: &V) -> V {
        (self.append)(left, right)
    }
}

impl<T, V: fmt::Debug, F, A> fmt::Debug for MeasureFn<T, V, F, A> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("MeasureFn")
            .field("empty", &self.empty)
            .finish_non_exhaustive()
    }
}

/// Raised when a tree operation reaches a state that is only possible if the
/// measure monoid or the search predicate broke its contract.
///
/// This is never returned as a recoverable value. The operation that detects
/// it panics with this error's message, because the fault lies in
/// caller-supplied code and no correct result exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasureContractViolation {
    /// The tree operation that detected the violation.
    pub operation: &'static str,
}

impl MeasureContractViolation {
    /// Logs the violation and aborts the current operation.
    ///
    /// # Panics
    ///
    /// Always.
    #[cold]
    #[track_caller]
    pub(crate) fn raise(operation: &'static str) -> ! {
        let violation = Self { operation };
        tracing::error!(operation, "{violation}");
        panic!("{violation}")
    }
}

impl fmt::Display for MeasureContractViolation {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "inconsistent measure monoid: `{}` expected a non-empty spine \
             (the monoid is not associative with a true identity, or the predicate is not monotonic)",
            self.operation
        )
    }
}

impl Error for MeasureContractViolation {}
