//! # finger-collections
//!
//! Persistent finger trees annotated with measure monoids, and the
//! sequence and priority-queue structures built from them.
//!
//! ## Overview
//!
//! A finger tree stores a sequence of items and caches, at every level, a
//! monoidal summary ("measure") of the items below. The choice of monoid
//! decides what the tree is good at:
//!
//! - **Generic trees**: [`FingerTree`](persistent::FingerTree) over any
//!   [`MeasureMonoid`](persistent::MeasureMonoid)
//! - **Vectors**: [`FingerVector`](persistent::FingerVector), counting items
//!   for logarithmic indexing, `take` and `drop_first`
//! - **Heaps**: [`FingerHeap`](persistent::FingerHeap), caching the minimum
//!   for constant-time `peek`
//!
//! All structures are immutable and share structure between versions.
//!
//! ## Feature Flags
//!
//! - `arc`: Use `Arc` and `OnceLock` internally so that structures are
//!   `Send + Sync` (default: `Rc` and `OnceCell`)
//!
//! ## Example
//!
//! ```rust
//! use finger_collections::prelude::*;
//!
//! let vector: FingerVector<&str> = ["finger", "trees", "split", "well"].into_iter().collect();
//! let (left, right) = vector.split_at(2);
//!
//! assert_eq!(left.last(), Some(&"trees"));
//! assert_eq!(right.head(), Some(&"split"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Prelude module for convenient imports.
///
/// Re-exports commonly used types and traits.
///
/// # Usage
///
/// ```rust
/// use finger_collections::prelude::*;
/// ```
pub mod prelude {
    pub use crate::persistent::*;
}

pub mod persistent;
