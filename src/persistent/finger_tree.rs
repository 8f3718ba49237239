//! Persistent (immutable) finger tree annotated with a measure monoid.
//!
//! This module provides the generic finger tree of Hinze & Paterson's
//! "Finger Trees: A Simple General-purpose Data Structure" (2006): a
//! 2-3 tree flattened into a spine, with "fingers" (digits of one to four
//! elements) at both ends and a cached monoidal annotation at every level.
//!
//! # Overview
//!
//! `FingerTree` provides:
//!
//! - Amortized O(1) `cons` and `snoc` (worst case O(log n))
//! - Amortized O(1) `pop_left` and `pop_right` (worst case O(log n))
//! - O(1) `peek_left`, `peek_right` and `measure`
//! - O(log(min(n1, n2))) `concat`
//! - O(log n) `split`, `search`, `split_left` and `split_right`
//!
//! The annotation is chosen by the [`MeasureMonoid`] supplied at creation.
//! A count monoid turns the tree into a random-access sequence
//! ([`FingerVector`](super::FingerVector)), a minimum monoid turns it into
//! a priority queue ([`FingerHeap`](super::FingerHeap)).
//!
//! # Finger Tree Structure
//!
//! A finger tree is one of:
//! - Empty: no items
//! - Single: exactly one element
//! - Deep: a left digit, a spine and a right digit, plus the cached
//!   annotation of the whole subtree
//!
//! The spine of a Deep tree is itself a finger tree whose elements are node
//! groups of two or three elements of the level above. Every level therefore
//! groups the items of the previous level into units of 2-3, and the nesting
//! depth stays logarithmic in the number of items.
//!
//! # Implementation Note
//!
//! The textbook formulation nests types (`FingerTree<Node<T>>` inside
//! `FingerTree<T>`), which Rust cannot monomorphize. Here every level stores
//! the same element type, either a leaf item or a shared node group, so the
//! spine is an ordinary `Tree<T, V>` and the recursion is monomorphic.
//! The level an element lives on is implied by its position.
//!
//! Node groups and digits of two or more elements cache their annotation in
//! a write-once cell, filled on first demand. Deep nodes compute their
//! annotation eagerly when they are built, and [`Tree::deep`] is the only
//! way to build one.
//!
//! # Examples
//!
//! ```rust
//! use finger_collections::persistent::{FingerTree, MeasureFn};
//!
//! let count = MeasureFn::new(|_: &char| 1_usize, 0, |left: &usize, right: &usize| left + right);
//! let tree = FingerTree::from_items("finger".chars(), count);
//!
//! assert_eq!(tree.measure(), 6);
//! assert_eq!(tree.peek_left(), Some(&'f'));
//! assert_eq!(tree.peek_right(), Some(&'r'));
//!
//! // Split before the fourth item.
//! let (left, item, right) = tree.split(|count| *count > 3);
//! assert_eq!(left.iter().collect::<String>(), "fin");
//! assert_eq!(item, Some(&'g'));
//! assert_eq!(right.iter().collect::<String>(), "er");
//!
//! // Structural sharing: the original tree is preserved
//! assert_eq!(tree.iter().collect::<String>(), "finger");
//! ```
//!
//! # References
//!
//! - Hinze & Paterson, "Finger Trees: A Simple General-purpose Data Structure" (2006)
//! - Okasaki, "Purely Functional Data Structures" (1998)

use std::fmt;

use arrayvec::ArrayVec;
use smallvec::SmallVec;

use super::measure::{MeasureContractViolation, MeasureMonoid};
use super::{MeasureCell, ReferenceCounter};

// =============================================================================
// Elements
// =============================================================================

/// An entry of a digit or of a single-element tree.
///
/// Top-level trees hold leaves; every spine below holds node groups.
enum Element<T, V> {
    Leaf(ReferenceCounter<T>),
    /// A node group: always a `Two` or `Three` digit.
    Node(ReferenceCounter<Digit<T, V>>),
}

impl<T, V> Clone for Element<T, V> {
    fn clone(&self) -> Self {
        match self {
            Self::Leaf(item) => Self::Leaf(item.clone()),
            Self::Node(node) => Self::Node(node.clone()),
        }
    }
}

impl<T, V> Element<T, V> {
    fn leaf(item: T) -> Self {
        Self::Leaf(ReferenceCounter::new(item))
    }

    fn node(group: Digit<T, V>) -> Self {
        debug_assert!(matches!(group.len(), 2 | 3), "node groups hold two or three elements");
        Self::Node(ReferenceCounter::new(group))
    }

    fn as_item(&self) -> &T {
        match self {
            Self::Leaf(item) => item,
            Self::Node(_) => unreachable!("top-level elements are always leaves"),
        }
    }

    fn as_group(&self) -> &Digit<T, V> {
        match self {
            Self::Node(group) => group,
            Self::Leaf(_) => unreachable!("spine elements are always node groups"),
        }
    }

    fn fold_left<'a, B, F>(&'a self, init: B, function: &mut F) -> B
    where
        F: FnMut(B, &'a T) -> B,
    {
        match self {
            Self::Leaf(item) => function(init, item),
            Self::Node(group) => group.fold_left(init, function),
        }
    }

    fn fold_right<'a, B, F>(&'a self, init: B, function: &mut F) -> B
    where
        F: FnMut(&'a T, B) -> B,
    {
        match self {
            Self::Leaf(item) => function(item, init),
            Self::Node(group) => group.fold_right(init, function),
        }
    }

    fn map<U, W, F>(&self, function: &mut F) -> Element<U, W>
    where
        F: FnMut(&T) -> U,
    {
        match self {
            Self::Leaf(item) => Element::leaf(function(item)),
            Self::Node(group) => Element::node(group.map(function)),
        }
    }
}

impl<T, V: Clone> Element<T, V> {
    /// Leaves are measured by the monoid, node groups by their cached annotation.
    fn measure<M>(&self, monoid: &M) -> V
    where
        M: MeasureMonoid<T, Value = V>,
    {
        match self {
            Self::Leaf(item) => monoid.measure(item),
            Self::Node(group) => group.measure(monoid),
        }
    }
}

// =============================================================================
// Digits
// =============================================================================

/// One to four elements at the fringe of a tree level.
///
/// Restricted to `Two` and `Three`, a digit is a node group of the spine.
enum Digit<T, V> {
    One(Element<T, V>),
    Two(Element<T, V>, Element<T, V>, MeasureCell<V>),
    Three(Element<T, V>, Element<T, V>, Element<T, V>, MeasureCell<V>),
    Four(
        Element<T, V>,
        Element<T, V>,
        Element<T, V>,
        Element<T, V>,
        MeasureCell<V>,
    ),
}

impl<T, V: Clone> Clone for Digit<T, V> {
    fn clone(&self) -> Self {
        match self {
            Self::One(first) => Self::One(first.clone()),
            Self::Two(first, second, cache) => Self::Two(first.clone(), second.clone(), cache.clone()),
            Self::Three(first, second, third, cache) => {
                Self::Three(first.clone(), second.clone(), third.clone(), cache.clone())
            }
            Self::Four(first, second, third, fourth, cache) => Self::Four(
                first.clone(),
                second.clone(),
                third.clone(),
                fourth.clone(),
                cache.clone(),
            ),
        }
    }
}

impl<T, V> Digit<T, V> {
    fn two(first: Element<T, V>, second: Element<T, V>) -> Self {
        Self::Two(first, second, MeasureCell::new())
    }

    fn three(first: Element<T, V>, second: Element<T, V>, third: Element<T, V>) -> Self {
        Self::Three(first, second, third, MeasureCell::new())
    }

    fn four(
        first: Element<T, V>,
        second: Element<T, V>,
        third: Element<T, V>,
        fourth: Element<T, V>,
    ) -> Self {
        Self::Four(first, second, third, fourth, MeasureCell::new())
    }

    /// Builds a digit from zero to four elements; zero yields `None`.
    fn from_elements<I>(elements: I) -> Option<Self>
    where
        I: IntoIterator<Item = Element<T, V>>,
    {
        let mut elements = elements.into_iter();
        let digit = match (
            elements.next(),
            elements.next(),
            elements.next(),
            elements.next(),
        ) {
            (None, _, _, _) => None,
            (Some(first), None, _, _) => Some(Self::One(first)),
            (Some(first), Some(second), None, _) => Some(Self::two(first, second)),
            (Some(first), Some(second), Some(third), None) => {
                Some(Self::three(first, second, third))
            }
            (Some(first), Some(second), Some(third), Some(fourth)) => {
                Some(Self::four(first, second, third, fourth))
            }
        };
        debug_assert!(elements.next().is_none(), "digits hold at most four elements");
        digit
    }

    const fn len(&self) -> usize {
        match self {
            Self::One(_) => 1,
            Self::Two(..) => 2,
            Self::Three(..) => 3,
            Self::Four(..) => 4,
        }
    }

    const fn first(&self) -> &Element<T, V> {
        match self {
            Self::One(first)
            | Self::Two(first, _, _)
            | Self::Three(first, _, _, _)
            | Self::Four(first, _, _, _, _) => first,
        }
    }

    const fn last(&self) -> &Element<T, V> {
        match self {
            Self::One(last)
            | Self::Two(_, last, _)
            | Self::Three(_, _, last, _)
            | Self::Four(_, _, _, last, _) => last,
        }
    }

    fn elements(&self) -> ArrayVec<&Element<T, V>, 4> {
        let mut elements = ArrayVec::new();
        match self {
            Self::One(first) => elements.push(first),
            Self::Two(first, second, _) => elements.extend([first, second]),
            Self::Three(first, second, third, _) => elements.extend([first, second, third]),
            Self::Four(first, second, third, fourth, _) => {
                elements.extend([first, second, third, fourth]);
            }
        }
        elements
    }

    /// The elements strictly before `index`.
    fn prefix(&self, index: usize) -> Option<Self> {
        Self::from_elements(self.elements()[..index].iter().map(|element| (*element).clone()))
    }

    /// The elements strictly after `index`.
    fn suffix(&self, index: usize) -> Option<Self> {
        Self::from_elements(self.elements()[index + 1..].iter().map(|element| (*element).clone()))
    }

    /// Prepends to a digit that is not yet full.
    fn prepend(&self, element: Element<T, V>) -> Self {
        match self {
            Self::One(first) => Self::two(element, first.clone()),
            Self::Two(first, second, _) => Self::three(element, first.clone(), second.clone()),
            Self::Three(first, second, third, _) => {
                Self::four(element, first.clone(), second.clone(), third.clone())
            }
            Self::Four(..) => unreachable!("a full digit overflows into the spine instead"),
        }
    }

    /// Appends to a digit that is not yet full.
    fn append(&self, element: Element<T, V>) -> Self {
        match self {
            Self::One(first) => Self::two(first.clone(), element),
            Self::Two(first, second, _) => Self::three(first.clone(), second.clone(), element),
            Self::Three(first, second, third, _) => {
                Self::four(first.clone(), second.clone(), third.clone(), element)
            }
            Self::Four(..) => unreachable!("a full digit overflows into the spine instead"),
        }
    }

    fn pop_front(&self) -> (Option<Self>, &Element<T, V>) {
        match self {
            Self::One(first) => (None, first),
            Self::Two(first, second, _) => (Some(Self::One(second.clone())), first),
            Self::Three(first, second, third, _) => {
                (Some(Self::two(second.clone(), third.clone())), first)
            }
            Self::Four(first, second, third, fourth, _) => (
                Some(Self::three(second.clone(), third.clone(), fourth.clone())),
                first,
            ),
        }
    }

    fn pop_back(&self) -> (Option<Self>, &Element<T, V>) {
        match self {
            Self::One(first) => (None, first),
            Self::Two(first, second, _) => (Some(Self::One(first.clone())), second),
            Self::Three(first, second, third, _) => {
                (Some(Self::two(first.clone(), second.clone())), third)
            }
            Self::Four(first, second, third, fourth, _) => (
                Some(Self::three(first.clone(), second.clone(), third.clone())),
                fourth,
            ),
        }
    }

    fn fold_left<'a, B, F>(&'a self, init: B, function: &mut F) -> B
    where
        F: FnMut(B, &'a T) -> B,
    {
        let mut accumulator = init;
        for element in self.elements() {
            accumulator = element.fold_left(accumulator, function);
        }
        accumulator
    }

    fn fold_right<'a, B, F>(&'a self, init: B, function: &mut F) -> B
    where
        F: FnMut(&'a T, B) -> B,
    {
        let mut accumulator = init;
        for element in self.elements().into_iter().rev() {
            accumulator = element.fold_right(accumulator, function);
        }
        accumulator
    }

    /// Rebuilds the digit with fresh, empty caches.
    fn map<U, W, F>(&self, function: &mut F) -> Digit<U, W>
    where
        F: FnMut(&T) -> U,
    {
        match self {
            Self::One(first) => Digit::One(first.map(function)),
            Self::Two(first, second, _) => Digit::two(first.map(function), second.map(function)),
            Self::Three(first, second, third, _) => Digit::three(
                first.map(function),
                second.map(function),
                third.map(function),
            ),
            Self::Four(first, second, third, fourth, _) => Digit::four(
                first.map(function),
                second.map(function),
                third.map(function),
                fourth.map(function),
            ),
        }
    }
}

impl<T, V: Clone> Digit<T, V> {
    fn measure<M>(&self, monoid: &M) -> V
    where
        M: MeasureMonoid<T, Value = V>,
    {
        match self {
            Self::One(first) => first.measure(monoid),
            Self::Two(_, _, cache) | Self::Three(_, _, _, cache) | Self::Four(_, _, _, _, cache) => {
                cache.get_or_init(|| self.measure_uncached(monoid)).clone()
            }
        }
    }

    /// Recomputes the annotation from the elements, ignoring the cache.
    fn measure_uncached<M>(&self, monoid: &M) -> V
    where
        M: MeasureMonoid<T, Value = V>,
    {
        let elements = self.elements();
        elements[1..]
            .iter()
            .fold(elements[0].measure(monoid), |accumulated, element| {
                monoid.append(&accumulated, &element.measure(monoid))
            })
    }

    /// Finds the first element at which `predicate` holds on the running
    /// annotation, falling back to the last element.
    ///
    /// Returns its index and the annotation accumulated before it.
    fn locate<M, P>(&self, accumulated: &V, predicate: &mut P, monoid: &M) -> (usize, V)
    where
        M: MeasureMonoid<T, Value = V>,
        P: FnMut(&V) -> bool,
    {
        let elements = self.elements();
        let last = elements.len() - 1;
        let mut before = accumulated.clone();
        for (index, element) in elements.iter().enumerate().take(last) {
            let through = monoid.append(&before, &element.measure(monoid));
            if predicate(&through) {
                return (index, before);
            }
            before = through;
        }
        (last, before)
    }
}

// =============================================================================
// Trees
// =============================================================================

enum Tree<T, V> {
    Empty,
    Single(Element<T, V>),
    Deep(ReferenceCounter<Deep<T, V>>),
}

struct Deep<T, V> {
    /// `append(append(left, spine), right)`, fixed at construction.
    measure: V,
    left: Digit<T, V>,
    spine: Tree<T, V>,
    right: Digit<T, V>,
}

impl<T, V> Clone for Tree<T, V> {
    fn clone(&self) -> Self {
        match self {
            Self::Empty => Self::Empty,
            Self::Single(element) => Self::Single(element.clone()),
            Self::Deep(deep) => Self::Deep(deep.clone()),
        }
    }
}

impl<T, V> Tree<T, V> {
    const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    fn first(&self) -> Option<&Element<T, V>> {
        match self {
            Self::Empty => None,
            Self::Single(element) => Some(element),
            Self::Deep(deep) => Some(deep.left.first()),
        }
    }

    fn last(&self) -> Option<&Element<T, V>> {
        match self {
            Self::Empty => None,
            Self::Single(element) => Some(element),
            Self::Deep(deep) => Some(deep.right.last()),
        }
    }

    fn fold_left<'a, B, F>(&'a self, init: B, function: &mut F) -> B
    where
        F: FnMut(B, &'a T) -> B,
    {
        match self {
            Self::Empty => init,
            Self::Single(element) => element.fold_left(init, function),
            Self::Deep(deep) => {
                let accumulator = deep.left.fold_left(init, function);
                let accumulator = deep.spine.fold_left(accumulator, function);
                deep.right.fold_left(accumulator, function)
            }
        }
    }

    fn fold_right<'a, B, F>(&'a self, init: B, function: &mut F) -> B
    where
        F: FnMut(&'a T, B) -> B,
    {
        match self {
            Self::Empty => init,
            Self::Single(element) => element.fold_right(init, function),
            Self::Deep(deep) => {
                let accumulator = deep.right.fold_right(init, function);
                let accumulator = deep.spine.fold_right(accumulator, function);
                deep.left.fold_right(accumulator, function)
            }
        }
    }
}

impl<T, V: Clone> Tree<T, V> {
    fn measure<M>(&self, monoid: &M) -> V
    where
        M: MeasureMonoid<T, Value = V>,
    {
        match self {
            Self::Empty => monoid.empty(),
            Self::Single(element) => element.measure(monoid),
            Self::Deep(deep) => deep.measure.clone(),
        }
    }

    /// The only constructor of Deep nodes.
    fn deep<M>(left: Digit<T, V>, spine: Self, right: Digit<T, V>, monoid: &M) -> Self
    where
        M: MeasureMonoid<T, Value = V>,
    {
        let measure = monoid.append(
            &monoid.append(&left.measure(monoid), &spine.measure(monoid)),
            &right.measure(monoid),
        );
        Self::Deep(ReferenceCounter::new(Deep {
            measure,
            left,
            spine,
            right,
        }))
    }

    fn from_digit<M>(digit: Digit<T, V>, monoid: &M) -> Self
    where
        M: MeasureMonoid<T, Value = V>,
    {
        match digit {
            Digit::One(first) => Self::Single(first),
            Digit::Two(first, second, _) => {
                Self::deep(Digit::One(first), Self::Empty, Digit::One(second), monoid)
            }
            Digit::Three(first, second, third, _) => Self::deep(
                Digit::two(first, second),
                Self::Empty,
                Digit::One(third),
                monoid,
            ),
            Digit::Four(first, second, third, fourth, _) => Self::deep(
                Digit::two(first, second),
                Self::Empty,
                Digit::two(third, fourth),
                monoid,
            ),
        }
    }

    fn from_optional_digit<M>(digit: Option<Digit<T, V>>, monoid: &M) -> Self
    where
        M: MeasureMonoid<T, Value = V>,
    {
        digit.map_or(Self::Empty, |digit| Self::from_digit(digit, monoid))
    }

    fn cons<M>(&self, element: Element<T, V>, monoid: &M) -> Self
    where
        M: MeasureMonoid<T, Value = V>,
    {
        match self {
            Self::Empty => Self::Single(element),
            Self::Single(existing) => Self::deep(
                Digit::One(element),
                Self::Empty,
                Digit::One(existing.clone()),
                monoid,
            ),
            Self::Deep(deep) => {
                if let Digit::Four(first, second, third, fourth, _) = &deep.left {
                    let overflow =
                        Element::node(Digit::three(second.clone(), third.clone(), fourth.clone()));
                    Self::deep(
                        Digit::two(element, first.clone()),
                        deep.spine.cons(overflow, monoid),
                        deep.right.clone(),
                        monoid,
                    )
                } else {
                    Self::deep(
                        deep.left.prepend(element),
                        deep.spine.clone(),
                        deep.right.clone(),
                        monoid,
                    )
                }
            }
        }
    }

    fn snoc<M>(&self, element: Element<T, V>, monoid: &M) -> Self
    where
        M: MeasureMonoid<T, Value = V>,
    {
        match self {
            Self::Empty => Self::Single(element),
            Self::Single(existing) => Self::deep(
                Digit::One(existing.clone()),
                Self::Empty,
                Digit::One(element),
                monoid,
            ),
            Self::Deep(deep) => {
                if let Digit::Four(first, second, third, fourth, _) = &deep.right {
                    let overflow =
                        Element::node(Digit::three(first.clone(), second.clone(), third.clone()));
                    Self::deep(
                        deep.left.clone(),
                        deep.spine.snoc(overflow, monoid),
                        Digit::two(fourth.clone(), element),
                        monoid,
                    )
                } else {
                    Self::deep(
                        deep.left.clone(),
                        deep.spine.clone(),
                        deep.right.append(element),
                        monoid,
                    )
                }
            }
        }
    }

    fn view_left<M>(&self, monoid: &M) -> Option<(&Element<T, V>, Self)>
    where
        M: MeasureMonoid<T, Value = V>,
    {
        match self {
            Self::Empty => None,
            Self::Single(element) => Some((element, Self::Empty)),
            Self::Deep(deep) => {
                let (rest, first) = deep.left.pop_front();
                let remainder =
                    Self::deep_left(rest, deep.spine.clone(), deep.right.clone(), monoid);
                Some((first, remainder))
            }
        }
    }

    fn view_right<M>(&self, monoid: &M) -> Option<(&Element<T, V>, Self)>
    where
        M: MeasureMonoid<T, Value = V>,
    {
        match self {
            Self::Empty => None,
            Self::Single(element) => Some((element, Self::Empty)),
            Self::Deep(deep) => {
                let (rest, last) = deep.right.pop_back();
                let remainder =
                    Self::deep_right(deep.left.clone(), deep.spine.clone(), rest, monoid);
                Some((last, remainder))
            }
        }
    }

    /// Like [`Tree::deep`], refilling a missing left digit from the spine.
    fn deep_left<M>(left: Option<Digit<T, V>>, spine: Self, right: Digit<T, V>, monoid: &M) -> Self
    where
        M: MeasureMonoid<T, Value = V>,
    {
        match left {
            Some(left) => Self::deep(left, spine, right, monoid),
            None => match spine.view_left(monoid) {
                None => Self::from_digit(right, monoid),
                Some((group, rest)) => Self::deep(group.as_group().clone(), rest, right, monoid),
            },
        }
    }

    /// Like [`Tree::deep`], refilling a missing right digit from the spine.
    fn deep_right<M>(left: Digit<T, V>, spine: Self, right: Option<Digit<T, V>>, monoid: &M) -> Self
    where
        M: MeasureMonoid<T, Value = V>,
    {
        match right {
            Some(right) => Self::deep(left, spine, right, monoid),
            None => match spine.view_right(monoid) {
                None => Self::from_digit(left, monoid),
                Some((group, rest)) => Self::deep(left, rest, group.as_group().clone(), monoid),
            },
        }
    }

    /// Concatenates `self`, the loose `middle` elements and `other`.
    fn concat<M>(&self, middle: &[Element<T, V>], other: &Self, monoid: &M) -> Self
    where
        M: MeasureMonoid<T, Value = V>,
    {
        match (self, other) {
            (Self::Empty, _) => middle
                .iter()
                .rev()
                .fold(other.clone(), |tree, element| tree.cons(element.clone(), monoid)),
            (_, Self::Empty) => middle
                .iter()
                .fold(self.clone(), |tree, element| tree.snoc(element.clone(), monoid)),
            (Self::Single(element), _) => Self::Empty
                .concat(middle, other, monoid)
                .cons(element.clone(), monoid),
            (_, Self::Single(element)) => self
                .concat(middle, &Self::Empty, monoid)
                .snoc(element.clone(), monoid),
            (Self::Deep(left), Self::Deep(right)) => {
                let mut inner: SmallVec<[Element<T, V>; 12]> = SmallVec::new();
                inner.extend(left.right.elements().into_iter().cloned());
                inner.extend(middle.iter().cloned());
                inner.extend(right.left.elements().into_iter().cloned());

                let spine = left.spine.concat(&make_nodes(&inner), &right.spine, monoid);
                Self::deep(left.left.clone(), spine, right.right.clone(), monoid)
            }
        }
    }

    /// Splits a non-empty tree around the first element at which `predicate`
    /// holds on `accumulated` extended by the running annotation.
    fn split<'a, M, P>(
        &'a self,
        accumulated: &V,
        predicate: &mut P,
        monoid: &M,
    ) -> (Self, &'a Element<T, V>, Self)
    where
        M: MeasureMonoid<T, Value = V>,
        P: FnMut(&V) -> bool,
    {
        match self {
            Self::Empty => MeasureContractViolation::raise("split"),
            Self::Single(element) => (Self::Empty, element, Self::Empty),
            Self::Deep(deep) => {
                let through_left = monoid.append(accumulated, &deep.left.measure(monoid));
                if predicate(&through_left) {
                    let (index, _) = deep.left.locate(accumulated, predicate, monoid);
                    return (
                        Self::from_optional_digit(deep.left.prefix(index), monoid),
                        deep.left.elements()[index],
                        Self::deep_left(
                            deep.left.suffix(index),
                            deep.spine.clone(),
                            deep.right.clone(),
                            monoid,
                        ),
                    );
                }

                let through_spine = monoid.append(&through_left, &deep.spine.measure(monoid));
                if predicate(&through_spine) {
                    let (spine_before, group, spine_after) =
                        deep.spine.split(&through_left, predicate, monoid);
                    let group = group.as_group();
                    let before_group =
                        monoid.append(&through_left, &spine_before.measure(monoid));
                    let (index, _) = group.locate(&before_group, predicate, monoid);
                    return (
                        Self::deep_right(
                            deep.left.clone(),
                            spine_before,
                            group.prefix(index),
                            monoid,
                        ),
                        group.elements()[index],
                        Self::deep_left(group.suffix(index), spine_after, deep.right.clone(), monoid),
                    );
                }

                let (index, _) = deep.right.locate(&through_spine, predicate, monoid);
                (
                    Self::deep_right(
                        deep.left.clone(),
                        deep.spine.clone(),
                        deep.right.prefix(index),
                        monoid,
                    ),
                    deep.right.elements()[index],
                    Self::from_optional_digit(deep.right.suffix(index), monoid),
                )
            }
        }
    }

    /// The element `split` would find, with the annotation accumulated before it.
    fn search<'a, M, P>(
        &'a self,
        accumulated: &V,
        predicate: &mut P,
        monoid: &M,
    ) -> (V, &'a Element<T, V>)
    where
        M: MeasureMonoid<T, Value = V>,
        P: FnMut(&V) -> bool,
    {
        match self {
            Self::Empty => MeasureContractViolation::raise("search"),
            Self::Single(element) => (accumulated.clone(), element),
            Self::Deep(deep) => {
                let through_left = monoid.append(accumulated, &deep.left.measure(monoid));
                if predicate(&through_left) {
                    let (index, before) = deep.left.locate(accumulated, predicate, monoid);
                    return (before, deep.left.elements()[index]);
                }

                let through_spine = monoid.append(&through_left, &deep.spine.measure(monoid));
                if predicate(&through_spine) {
                    let (before_group, group) = deep.spine.search(&through_left, predicate, monoid);
                    let group = group.as_group();
                    let (index, before) = group.locate(&before_group, predicate, monoid);
                    return (before, group.elements()[index]);
                }

                let (index, before) = deep.right.locate(&through_spine, predicate, monoid);
                (before, deep.right.elements()[index])
            }
        }
    }

    /// The element `split` would find and everything before it.
    fn split_left<'a, M, P>(
        &'a self,
        accumulated: &V,
        predicate: &mut P,
        monoid: &M,
    ) -> (V, &'a Element<T, V>, Self)
    where
        M: MeasureMonoid<T, Value = V>,
        P: FnMut(&V) -> bool,
    {
        match self {
            Self::Empty => MeasureContractViolation::raise("split_left"),
            Self::Single(element) => (accumulated.clone(), element, Self::Empty),
            Self::Deep(deep) => {
                let through_left = monoid.append(accumulated, &deep.left.measure(monoid));
                if predicate(&through_left) {
                    let (index, before) = deep.left.locate(accumulated, predicate, monoid);
                    return (
                        before,
                        deep.left.elements()[index],
                        Self::from_optional_digit(deep.left.prefix(index), monoid),
                    );
                }

                let through_spine = monoid.append(&through_left, &deep.spine.measure(monoid));
                if predicate(&through_spine) {
                    let (before_group, group, spine_before) =
                        deep.spine.split_left(&through_left, predicate, monoid);
                    let group = group.as_group();
                    let (index, before) = group.locate(&before_group, predicate, monoid);
                    return (
                        before,
                        group.elements()[index],
                        Self::deep_right(
                            deep.left.clone(),
                            spine_before,
                            group.prefix(index),
                            monoid,
                        ),
                    );
                }

                let (index, before) = deep.right.locate(&through_spine, predicate, monoid);
                (
                    before,
                    deep.right.elements()[index],
                    Self::deep_right(
                        deep.left.clone(),
                        deep.spine.clone(),
                        deep.right.prefix(index),
                        monoid,
                    ),
                )
            }
        }
    }

    /// The element `split` would find and everything after it.
    fn split_right<'a, M, P>(
        &'a self,
        accumulated: &V,
        predicate: &mut P,
        monoid: &M,
    ) -> (V, &'a Element<T, V>, Self)
    where
        M: MeasureMonoid<T, Value = V>,
        P: FnMut(&V) -> bool,
    {
        match self {
            Self::Empty => MeasureContractViolation::raise("split_right"),
            Self::Single(element) => (accumulated.clone(), element, Self::Empty),
            Self::Deep(deep) => {
                let through_left = monoid.append(accumulated, &deep.left.measure(monoid));
                if predicate(&through_left) {
                    let (index, before) = deep.left.locate(accumulated, predicate, monoid);
                    return (
                        before,
                        deep.left.elements()[index],
                        Self::deep_left(
                            deep.left.suffix(index),
                            deep.spine.clone(),
                            deep.right.clone(),
                            monoid,
                        ),
                    );
                }

                let through_spine = monoid.append(&through_left, &deep.spine.measure(monoid));
                if predicate(&through_spine) {
                    let (before_group, group, spine_after) =
                        deep.spine.split_right(&through_left, predicate, monoid);
                    let group = group.as_group();
                    let (index, before) = group.locate(&before_group, predicate, monoid);
                    return (
                        before,
                        group.elements()[index],
                        Self::deep_left(group.suffix(index), spine_after, deep.right.clone(), monoid),
                    );
                }

                let (index, before) = deep.right.locate(&through_spine, predicate, monoid);
                (
                    before,
                    deep.right.elements()[index],
                    Self::from_optional_digit(deep.right.suffix(index), monoid),
                )
            }
        }
    }

    fn map<U, W, N, F>(&self, function: &mut F, monoid: &N) -> Tree<U, W>
    where
        W: Clone,
        N: MeasureMonoid<U, Value = W>,
        F: FnMut(&T) -> U,
    {
        match self {
            Self::Empty => Tree::Empty,
            Self::Single(element) => Tree::Single(element.map(function)),
            Self::Deep(deep) => {
                let left = deep.left.map(function);
                let spine = deep.spine.map(function, monoid);
                let right = deep.right.map(function);
                Tree::deep(left, spine, right, monoid)
            }
        }
    }
}

/// Packs 2 to 12 elements into node groups of two or three, in order.
fn make_nodes<T, V>(elements: &[Element<T, V>]) -> SmallVec<[Element<T, V>; 4]> {
    let mut nodes = SmallVec::new();
    let mut rest = elements;
    loop {
        match rest {
            [first, second] => {
                nodes.push(Element::node(Digit::two(first.clone(), second.clone())));
                return nodes;
            }
            [first, second, third] => {
                nodes.push(Element::node(Digit::three(
                    first.clone(),
                    second.clone(),
                    third.clone(),
                )));
                return nodes;
            }
            [first, second, third, fourth] => {
                nodes.push(Element::node(Digit::two(first.clone(), second.clone())));
                nodes.push(Element::node(Digit::two(third.clone(), fourth.clone())));
                return nodes;
            }
            [first, second, third, tail @ ..] => {
                nodes.push(Element::node(Digit::three(
                    first.clone(),
                    second.clone(),
                    third.clone(),
                )));
                rest = tail;
            }
            _ => unreachable!("node groups are packed from at least two elements"),
        }
    }
}

// =============================================================================
// FingerTree
// =============================================================================

/// A persistent sequence annotated with a measure monoid.
///
/// Every operation returns a new tree and leaves the receiver untouched;
/// unchanged subtrees are shared between versions.
///
/// # Time Complexity
///
/// | Operation | Complexity |
/// |-----------|------------|
/// | `new`, `singleton` | O(1) |
/// | `cons`, `snoc` | O(1) amortized, O(log n) worst |
/// | `pop_left`, `pop_right` | O(1) amortized, O(log n) worst |
/// | `peek_left`, `peek_right` | O(1) |
/// | `measure` | O(1) |
/// | `concat` | O(log(min(n1, n2))) |
/// | `split`, `search`, `split_left`, `split_right` | O(log n) |
/// | `map`, `fold_left`, `fold_right` | O(n) |
///
/// # Preconditions
///
/// Trees combined with [`FingerTree::concat`] must have been built from
/// equivalent monoids. This is not checked; the receiver's monoid is used
/// for the result.
///
/// # Examples
///
/// ```rust
/// use finger_collections::persistent::{FingerTree, MeasureFn};
///
/// let count = MeasureFn::new(|_: &i32| 1_usize, 0, |left: &usize, right: &usize| left + right);
/// let tree = FingerTree::new(count).snoc(2).snoc(3).cons(1);
///
/// assert_eq!(tree.measure(), 3);
/// assert_eq!(tree.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
/// ```
pub struct FingerTree<T, M: MeasureMonoid<T>> {
    tree: Tree<T, M::Value>,
    monoid: ReferenceCounter<M>,
}

impl<T, M: MeasureMonoid<T>> Clone for FingerTree<T, M> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree.clone(),
            monoid: self.monoid.clone(),
        }
    }
}

impl<T, M: MeasureMonoid<T>> FingerTree<T, M> {
    /// Creates an empty tree measured by `monoid`.
    #[inline]
    #[must_use]
    pub fn new(monoid: M) -> Self {
        Self {
            tree: Tree::Empty,
            monoid: ReferenceCounter::new(monoid),
        }
    }

    /// Creates a tree containing a single item.
    #[inline]
    #[must_use]
    pub fn singleton(item: T, monoid: M) -> Self {
        Self {
            tree: Tree::Single(Element::leaf(item)),
            monoid: ReferenceCounter::new(monoid),
        }
    }

    /// Creates a tree holding `items` in iteration order.
    #[must_use]
    pub fn from_items<I>(items: I, monoid: M) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        items
            .into_iter()
            .fold(Self::new(monoid), |tree, item| tree.snoc(item))
    }

    fn with_tree(&self, tree: Tree<T, M::Value>) -> Self {
        Self {
            tree,
            monoid: ReferenceCounter::clone(&self.monoid),
        }
    }

    /// Returns the monoid this tree is measured by.
    #[inline]
    #[must_use]
    pub fn monoid(&self) -> &M {
        &self.monoid
    }

    /// Returns `true` if the tree contains no items.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns the annotation of the whole tree.
    ///
    /// The identity for an empty tree; cached for deep trees.
    #[inline]
    #[must_use]
    pub fn measure(&self) -> M::Value {
        self.tree.measure(&*self.monoid)
    }

    /// The annotation stored on a deep root; `None` for trees of at most one item.
    pub(crate) fn cached_measure(&self) -> Option<&M::Value> {
        match &self.tree {
            Tree::Deep(deep) => Some(&deep.measure),
            Tree::Empty | Tree::Single(_) => None,
        }
    }

    /// Prepends an item.
    #[must_use]
    pub fn cons(&self, item: T) -> Self {
        self.with_tree(self.tree.cons(Element::leaf(item), &*self.monoid))
    }

    /// Appends an item.
    #[must_use]
    pub fn snoc(&self, item: T) -> Self {
        self.with_tree(self.tree.snoc(Element::leaf(item), &*self.monoid))
    }

    /// Returns the leftmost item, if any.
    #[inline]
    #[must_use]
    pub fn peek_left(&self) -> Option<&T> {
        self.tree.first().map(Element::as_item)
    }

    /// Returns the rightmost item, if any.
    #[inline]
    #[must_use]
    pub fn peek_right(&self) -> Option<&T> {
        self.tree.last().map(Element::as_item)
    }

    /// Removes the leftmost item, returning it with the remaining tree.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use finger_collections::persistent::{FingerTree, MeasureFn};
    ///
    /// let count = MeasureFn::new(|_: &i32| 1_usize, 0, |left: &usize, right: &usize| left + right);
    /// let tree = FingerTree::from_items(1..=3, count);
    ///
    /// let (first, rest) = tree.pop_left().unwrap();
    /// assert_eq!(*first, 1);
    /// assert_eq!(rest.measure(), 2);
    /// ```
    #[must_use]
    pub fn pop_left(&self) -> Option<(&T, Self)> {
        self.tree
            .view_left(&*self.monoid)
            .map(|(element, rest)| (element.as_item(), self.with_tree(rest)))
    }

    /// Removes the rightmost item, returning it with the remaining tree.
    #[must_use]
    pub fn pop_right(&self) -> Option<(&T, Self)> {
        self.tree
            .view_right(&*self.monoid)
            .map(|(element, rest)| (element.as_item(), self.with_tree(rest)))
    }

    /// Concatenates this tree with `other`.
    ///
    /// Both trees must be measured by equivalent monoids; the receiver's
    /// monoid is kept.
    #[must_use]
    pub fn concat(&self, other: &Self) -> Self {
        self.with_tree(self.tree.concat(&[], &other.tree, &*self.monoid))
    }

    /// Splits the tree at the first item where a monotonic `predicate`
    /// becomes true on the running annotation.
    ///
    /// Returns `(left, item, right)` where `predicate` is false on the
    /// measure of `left` and true once `item` is included. If `predicate` is
    /// false on the measure of the whole tree, the whole tree is returned on
    /// the left with no item and an empty right side. An empty tree yields
    /// two empty trees and no item.
    ///
    /// # Panics
    ///
    /// Panics with a [`MeasureContractViolation`] message if the monoid or
    /// the predicate break their contract in a way that makes the split
    /// point unreachable.
    #[must_use]
    pub fn split<P>(&self, mut predicate: P) -> (Self, Option<&T>, Self)
    where
        P: FnMut(&M::Value) -> bool,
    {
        if self.is_empty() {
            return (self.clone(), None, self.clone());
        }
        if !predicate(&self.measure()) {
            return (self.clone(), None, self.with_tree(Tree::Empty));
        }

        let (left, item, right) =
            self.tree
                .split(&self.monoid.empty(), &mut predicate, &*self.monoid);
        (
            self.with_tree(left),
            Some(item.as_item()),
            self.with_tree(right),
        )
    }

    /// Like [`FingerTree::split`], with the found item leading the right side.
    pub(crate) fn split_before<P>(&self, mut predicate: P) -> (Self, Self)
    where
        P: FnMut(&M::Value) -> bool,
    {
        if self.is_empty() {
            return (self.clone(), self.clone());
        }
        if !predicate(&self.measure()) {
            return (self.clone(), self.with_tree(Tree::Empty));
        }

        let (left, item, right) =
            self.tree
                .split(&self.monoid.empty(), &mut predicate, &*self.monoid);
        (
            self.with_tree(left),
            self.with_tree(right.cons(item.clone(), &*self.monoid)),
        )
    }

    /// Returns the item [`FingerTree::split`] would split at, without
    /// building either side.
    ///
    /// `None` if the tree is empty or `predicate` is false on its whole measure.
    ///
    /// # Panics
    ///
    /// Panics with a [`MeasureContractViolation`] message on a broken
    /// monoid or predicate.
    #[must_use]
    pub fn search<P>(&self, mut predicate: P) -> Option<&T>
    where
        P: FnMut(&M::Value) -> bool,
    {
        if self.is_empty() || !predicate(&self.measure()) {
            return None;
        }

        let (_, element) = self
            .tree
            .search(&self.monoid.empty(), &mut predicate, &*self.monoid);
        Some(element.as_item())
    }

    /// Returns the left side of [`FingerTree::split`], without building the
    /// right side.
    ///
    /// The whole tree if `predicate` is false on its whole measure.
    ///
    /// # Panics
    ///
    /// Panics with a [`MeasureContractViolation`] message on a broken
    /// monoid or predicate.
    #[must_use]
    pub fn split_left<P>(&self, mut predicate: P) -> Self
    where
        P: FnMut(&M::Value) -> bool,
    {
        if self.is_empty() || !predicate(&self.measure()) {
            return self.clone();
        }

        let (_, _, left) = self
            .tree
            .split_left(&self.monoid.empty(), &mut predicate, &*self.monoid);
        self.with_tree(left)
    }

    /// Returns the found item followed by the right side of
    /// [`FingerTree::split`], without building the left side.
    ///
    /// Empty if `predicate` is false on the whole measure.
    ///
    /// # Panics
    ///
    /// Panics with a [`MeasureContractViolation`] message on a broken
    /// monoid or predicate.
    #[must_use]
    pub fn split_right<P>(&self, mut predicate: P) -> Self
    where
        P: FnMut(&M::Value) -> bool,
    {
        if self.is_empty() {
            return self.clone();
        }
        if !predicate(&self.measure()) {
            return self.with_tree(Tree::Empty);
        }

        let (_, item, right) =
            self.tree
                .split_right(&self.monoid.empty(), &mut predicate, &*self.monoid);
        self.with_tree(right.cons(item.clone(), &*self.monoid))
    }

    /// Applies `function` to every item, in order, measuring the result with
    /// `monoid`.
    ///
    /// Every annotation is recomputed under the new monoid.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use finger_collections::persistent::{FingerTree, MeasureFn};
    ///
    /// let count = MeasureFn::new(|_: &i32| 1_usize, 0, |left: &usize, right: &usize| left + right);
    /// let tree = FingerTree::from_items(1..=4, count);
    ///
    /// let total = MeasureFn::new(|item: &i64| *item, 0, |left: &i64, right: &i64| left + right);
    /// let scaled = tree.map(|item| i64::from(*item) * 10, total);
    /// assert_eq!(scaled.measure(), 100);
    /// ```
    #[must_use]
    pub fn map<U, N, F>(&self, mut function: F, monoid: N) -> FingerTree<U, N>
    where
        N: MeasureMonoid<U>,
        F: FnMut(&T) -> U,
    {
        FingerTree {
            tree: self.tree.map(&mut function, &monoid),
            monoid: ReferenceCounter::new(monoid),
        }
    }

    /// Folds the items from left to right.
    pub fn fold_left<B, F>(&self, init: B, mut function: F) -> B
    where
        F: FnMut(B, &T) -> B,
    {
        self.tree.fold_left(init, &mut function)
    }

    /// Folds the items from right to left.
    pub fn fold_right<B, F>(&self, init: B, mut function: F) -> B
    where
        F: FnMut(&T, B) -> B,
    {
        self.tree.fold_right(init, &mut function)
    }

    /// Creates a left-to-right iterator over references to the items.
    #[must_use]
    pub fn iter(&self) -> FingerTreeIterator<'_, T, M::Value> {
        FingerTreeIterator {
            stack: vec![Frame::Tree(&self.tree)],
        }
    }
}

impl<T, M: MeasureMonoid<T> + Default> Default for FingerTree<T, M> {
    fn default() -> Self {
        Self::new(M::default())
    }
}

impl<T: PartialEq, M: MeasureMonoid<T>> PartialEq for FingerTree<T, M> {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl<T: Eq, M: MeasureMonoid<T>> Eq for FingerTree<T, M> {}

impl<T: fmt::Debug, M: MeasureMonoid<T>> fmt::Debug for FingerTree<T, M> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_list().entries(self.iter()).finish()
    }
}

impl<'a, T, M: MeasureMonoid<T>> IntoIterator for &'a FingerTree<T, M> {
    type Item = &'a T;
    type IntoIter = FingerTreeIterator<'a, T, M::Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// =============================================================================
// Iterator
// =============================================================================

enum Frame<'a, T, V> {
    Tree(&'a Tree<T, V>),
    Element(&'a Element<T, V>),
}

/// A left-to-right iterator over references to the items of a [`FingerTree`].
pub struct FingerTreeIterator<'a, T, V> {
    stack: Vec<Frame<'a, T, V>>,
}

impl<'a, T, V> Iterator for FingerTreeIterator<'a, T, V> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(frame) = self.stack.pop() {
            match frame {
                Frame::Tree(Tree::Empty) => {}
                Frame::Tree(Tree::Single(element)) => self.stack.push(Frame::Element(element)),
                Frame::Tree(Tree::Deep(deep)) => {
                    let deep: &'a Deep<T, V> = deep;
                    self.stack
                        .extend(deep.right.elements().into_iter().rev().map(Frame::Element));
                    self.stack.push(Frame::Tree(&deep.spine));
                    self.stack
                        .extend(deep.left.elements().into_iter().rev().map(Frame::Element));
                }
                Frame::Element(Element::Leaf(item)) => return Some(&**item),
                Frame::Element(Element::Node(group)) => {
                    let group: &'a Digit<T, V> = group;
                    self.stack
                        .extend(group.elements().into_iter().rev().map(Frame::Element));
                }
            }
        }
        None
    }
}

// =============================================================================
// Invariant checks
// =============================================================================

#[cfg(test)]
impl<T, V: Clone + PartialEq + fmt::Debug> Element<T, V> {
    fn check<M>(&self, depth: usize, monoid: &M) -> V
    where
        M: MeasureMonoid<T, Value = V>,
    {
        match self {
            Self::Leaf(item) => {
                assert_eq!(depth, 0, "leaf item nested inside the spine");
                monoid.measure(item)
            }
            Self::Node(group) => {
                assert!(depth > 0, "node group at the top level");
                assert!(matches!(group.len(), 2 | 3), "node group of {} elements", group.len());
                group.check(depth - 1, monoid)
            }
        }
    }
}

#[cfg(test)]
impl<T, V: Clone + PartialEq + fmt::Debug> Digit<T, V> {
    fn cached(&self) -> Option<&V> {
        match self {
            Self::One(_) => None,
            Self::Two(_, _, cache) | Self::Three(_, _, _, cache) | Self::Four(_, _, _, _, cache) => {
                cache.get()
            }
        }
    }

    fn check<M>(&self, depth: usize, monoid: &M) -> V
    where
        M: MeasureMonoid<T, Value = V>,
    {
        let elements = self.elements();
        let recomputed = elements[1..]
            .iter()
            .fold(elements[0].check(depth, monoid), |accumulated, element| {
                monoid.append(&accumulated, &element.check(depth, monoid))
            });
        if let Some(cached) = self.cached() {
            assert_eq!(cached, &recomputed, "stale digit annotation");
        }
        recomputed
    }
}

#[cfg(test)]
impl<T, V: Clone + PartialEq + fmt::Debug> Tree<T, V> {
    fn check<M>(&self, depth: usize, monoid: &M) -> V
    where
        M: MeasureMonoid<T, Value = V>,
    {
        match self {
            Self::Empty => monoid.empty(),
            Self::Single(element) => element.check(depth, monoid),
            Self::Deep(deep) => {
                let left = deep.left.check(depth, monoid);
                let spine = deep.spine.check(depth + 1, monoid);
                let right = deep.right.check(depth, monoid);
                let recomputed = monoid.append(&monoid.append(&left, &spine), &right);
                assert_eq!(deep.measure, recomputed, "stale deep annotation");
                recomputed
            }
        }
    }
}

#[cfg(test)]
impl<T, M> FingerTree<T, M>
where
    M: MeasureMonoid<T>,
    M::Value: PartialEq + fmt::Debug,
{
    /// Recomputes every annotation from scratch and checks the level
    /// structure, panicking on the first discrepancy.
    pub(crate) fn assert_invariants(&self) {
        let recomputed = self.tree.check(0, &*self.monoid);
        assert_eq!(self.measure(), recomputed, "stale root annotation");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistent::MeasureFn;
    use rstest::rstest;

    type Concatenation =
        MeasureFn<char, String, fn(&char) -> String, fn(&String, &String) -> String>;

    fn spell(item: &char) -> String {
        item.to_string()
    }

    #[allow(clippy::ptr_arg)]
    fn join(left: &String, right: &String) -> String {
        format!("{left}{right}")
    }

    /// Concatenates the items. Not commutative, so any reordering in cached
    /// annotations shows up in the measure.
    fn concatenation() -> Concatenation {
        MeasureFn::new(
            spell as fn(&char) -> String,
            String::new(),
            join as fn(&String, &String) -> String,
        )
    }

    /// Counts items but adds one on every combination, so `0` is no identity.
    fn broken_count() -> impl MeasureMonoid<u8, Value = u32> {
        MeasureFn::new(|_: &u8| 1_u32, 0, |left: &u32, right: &u32| left + right + 1)
    }

    fn text(text: &str) -> FingerTree<char, Concatenation> {
        FingerTree::from_items(text.chars(), concatenation())
    }

    fn collect(tree: &FingerTree<char, Concatenation>) -> String {
        tree.iter().collect()
    }

    const ALPHABET: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

    mod digit_representation {
        use super::*;

        fn leaves(items: &str) -> Vec<Element<char, String>> {
            items.chars().map(Element::leaf).collect()
        }

        #[rstest]
        fn test_from_elements_sizes() {
            assert!(Digit::<char, String>::from_elements(leaves("")).is_none());
            for (items, length) in [("a", 1), ("ab", 2), ("abc", 3), ("abcd", 4)] {
                let digit = Digit::from_elements(leaves(items)).unwrap();
                assert_eq!(digit.len(), length);
            }
        }

        #[rstest]
        fn test_prefix_and_suffix() {
            let monoid = concatenation();
            let digit = Digit::from_elements(leaves("abcd")).unwrap();

            assert!(digit.prefix(0).is_none());
            assert_eq!(digit.prefix(2).unwrap().measure(&monoid), "ab");
            assert_eq!(digit.suffix(1).unwrap().measure(&monoid), "cd");
            assert!(digit.suffix(3).is_none());
        }

        #[rstest]
        fn test_cached_measure_matches_recomputation() {
            let monoid = concatenation();
            let digit = Digit::from_elements(leaves("wxyz")).unwrap();

            assert!(digit.cached().is_none());
            let first = digit.measure(&monoid);
            assert_eq!(digit.cached(), Some(&first));
            assert_eq!(digit.measure_uncached(&monoid), first);
            assert_eq!(digit.measure(&monoid), "wxyz");
        }

        #[rstest]
        fn test_clone_keeps_filled_cache() {
            let monoid = concatenation();
            let digit = Digit::from_elements(leaves("abc")).unwrap();
            let _ = digit.measure(&monoid);

            assert_eq!(digit.clone().cached(), Some(&"abc".to_string()));
        }

        #[rstest]
        fn test_one_has_no_cache() {
            let monoid = concatenation();
            let digit = Digit::from_elements(leaves("q")).unwrap();

            assert_eq!(digit.measure(&monoid), "q");
            assert!(digit.cached().is_none());
        }

        #[rstest]
        fn test_locate_falls_back_to_last_element() {
            let monoid = concatenation();
            let digit = Digit::from_elements(leaves("abc")).unwrap();

            let (index, before) = digit.locate(&String::new(), &mut |value: &String| value.ends_with('b'), &monoid);
            assert_eq!((index, before.as_str()), (1, "a"));

            let (index, before) = digit.locate(&String::new(), &mut |_: &String| false, &monoid);
            assert_eq!((index, before.as_str()), (2, "ab"));
        }

        #[rstest]
        #[case(2, &[2])]
        #[case(3, &[3])]
        #[case(4, &[2, 2])]
        #[case(5, &[3, 2])]
        #[case(6, &[3, 3])]
        #[case(7, &[3, 2, 2])]
        #[case(8, &[3, 3, 2])]
        #[case(12, &[3, 3, 3, 3])]
        fn test_make_nodes_group_sizes(#[case] count: usize, #[case] expected: &[usize]) {
            let elements = leaves(&ALPHABET[..count]);
            let nodes = make_nodes(&elements);
            let sizes: Vec<usize> = nodes.iter().map(|node| node.as_group().len()).collect();
            assert_eq!(sizes, expected);

            let monoid = concatenation();
            let packed: String = nodes.iter().map(|node| node.measure(&monoid)).collect();
            assert_eq!(packed, &ALPHABET[..count]);
        }
    }

    mod push_and_pop {
        use super::*;

        #[rstest]
        fn test_cons_builds_in_reverse() {
            let tree = ALPHABET
                .chars()
                .fold(FingerTree::new(concatenation()), |tree, item| tree.cons(item));
            tree.assert_invariants();

            let reversed: String = ALPHABET.chars().rev().collect();
            assert_eq!(collect(&tree), reversed);
            assert_eq!(tree.measure(), reversed);
        }

        #[rstest]
        fn test_snoc_overflows_into_spine() {
            let tree = text(ALPHABET);
            tree.assert_invariants();

            let Tree::Deep(deep) = &tree.tree else {
                panic!("expected a deep tree");
            };
            assert!(!deep.spine.is_empty());
            assert_eq!(tree.measure(), ALPHABET);
        }

        #[rstest]
        fn test_pop_left_drains_in_order() {
            let mut tree = text(ALPHABET);
            let mut drained = String::new();
            while let Some((item, rest)) = tree.pop_left() {
                drained.push(*item);
                rest.assert_invariants();
                tree = rest;
            }
            assert_eq!(drained, ALPHABET);
            assert!(tree.is_empty());
        }

        #[rstest]
        fn test_pop_right_drains_in_reverse() {
            let mut tree = text(ALPHABET);
            let mut drained = String::new();
            while let Some((item, rest)) = tree.pop_right() {
                drained.push(*item);
                rest.assert_invariants();
                tree = rest;
            }
            assert_eq!(drained, ALPHABET.chars().rev().collect::<String>());
        }

        #[rstest]
        fn test_alternating_ends() {
            let mut tree = FingerTree::new(concatenation());
            for (index, item) in ALPHABET.chars().enumerate() {
                tree = if index % 2 == 0 { tree.cons(item) } else { tree.snoc(item) };
                tree.assert_invariants();
            }
            assert_eq!(tree.measure(), collect(&tree));
        }

        #[rstest]
        fn test_pop_empty_is_none() {
            let tree = FingerTree::new(concatenation());
            assert!(tree.pop_left().is_none());
            assert!(tree.pop_right().is_none());
            assert_eq!(tree.peek_left(), None);
            assert_eq!(tree.peek_right(), None);
        }
    }

    mod concatenation_and_split {
        use super::*;

        #[rstest]
        fn test_concat_all_size_pairs() {
            for left_size in 0..30 {
                for right_size in 0..30 {
                    let left = text(&ALPHABET[..left_size]);
                    let right = text(&ALPHABET[left_size..left_size + right_size]);
                    let joined = left.concat(&right);
                    joined.assert_invariants();
                    assert_eq!(joined.measure(), &ALPHABET[..left_size + right_size]);
                }
            }
        }

        #[rstest]
        fn test_split_every_position() {
            let tree = text(ALPHABET);
            for position in 0..ALPHABET.len() {
                let (left, item, right) = tree.split(|value: &String| value.len() > position);
                left.assert_invariants();
                right.assert_invariants();

                assert_eq!(left.measure(), &ALPHABET[..position]);
                assert_eq!(item.copied(), ALPHABET.chars().nth(position));
                assert_eq!(right.measure(), &ALPHABET[position + 1..]);
            }
        }

        #[rstest]
        fn test_specializations_agree_with_split() {
            let tree = text(&ALPHABET[..40]);
            for position in 0..40 {
                let predicate = |value: &String| value.len() > position;
                let (left, item, right) = tree.split(predicate);

                assert_eq!(tree.search(predicate), item);

                let taken = tree.split_left(predicate);
                taken.assert_invariants();
                assert_eq!(collect(&taken), collect(&left));

                let dropped = tree.split_right(predicate);
                dropped.assert_invariants();
                let expected: String = item.into_iter().copied().chain(right.iter().copied()).collect();
                assert_eq!(collect(&dropped), expected);
            }
        }

        #[rstest]
        #[case(0)]
        #[case(1)]
        #[case(17)]
        #[case(2500)]
        #[case(4999)]
        fn test_deep_tree_split_and_rejoin(#[case] position: usize) {
            let counting = MeasureFn::new(|_: &u32| 1_usize, 0, |left: &usize, right: &usize| left + right);
            let mut expected = std::collections::VecDeque::new();
            let mut tree = FingerTree::new(counting);
            for item in 0..5000_u32 {
                if item % 3 == 0 {
                    tree = tree.cons(item);
                    expected.push_front(item);
                } else {
                    tree = tree.snoc(item);
                    expected.push_back(item);
                }
            }
            tree.assert_invariants();

            let predicate = |count: &usize| *count > position;
            let (left, item, right) = tree.split(predicate);
            left.assert_invariants();
            right.assert_invariants();
            assert_eq!(item, expected.get(position));

            let taken = tree.split_left(predicate);
            let dropped = tree.split_right(predicate);
            taken.assert_invariants();
            dropped.assert_invariants();
            assert_eq!(taken.measure(), position);

            let rejoined = taken.concat(&dropped);
            rejoined.assert_invariants();
            assert!(rejoined.iter().eq(expected.iter()));

            let (last, rest) = rejoined.pop_right().unwrap();
            rest.assert_invariants();
            assert_eq!(Some(last), expected.back());
        }

        #[rstest]
        fn test_map_recomputes_annotations() {
            let tree = text("abcdefghij");
            let uppercase = tree.map(char::to_ascii_uppercase, concatenation());
            uppercase.assert_invariants();
            assert_eq!(uppercase.measure(), "ABCDEFGHIJ");
        }

        #[rstest]
        fn test_folds_visit_in_order() {
            let tree = text(ALPHABET);
            let forward = tree.fold_left(String::new(), |mut accumulator, item| {
                accumulator.push(*item);
                accumulator
            });
            let backward = tree.fold_right(String::new(), |item, mut accumulator| {
                accumulator.push(*item);
                accumulator
            });

            assert_eq!(forward, ALPHABET);
            assert_eq!(backward, ALPHABET.chars().rev().collect::<String>());
        }
    }

    mod contract_violation {
        use super::*;

        #[rstest]
        #[should_panic(expected = "inconsistent measure monoid: `split`")]
        fn test_split_with_broken_identity() {
            let tree = FingerTree::from_items([1_u8, 2], broken_count());
            assert_eq!(tree.measure(), 4);
            let _ = tree.split(|value| *value >= 3);
        }

        #[rstest]
        #[should_panic(expected = "inconsistent measure monoid: `search`")]
        fn test_search_with_broken_identity() {
            let tree = FingerTree::from_items([1_u8, 2], broken_count());
            let _ = tree.search(|value| *value >= 3);
        }

        #[rstest]
        #[should_panic(expected = "inconsistent measure monoid: `split_left`")]
        fn test_split_left_with_broken_identity() {
            let tree = FingerTree::from_items([1_u8, 2], broken_count());
            let _ = tree.split_left(|value| *value >= 3);
        }

        #[rstest]
        #[should_panic(expected = "inconsistent measure monoid: `split_right`")]
        fn test_split_right_with_broken_identity() {
            let tree = FingerTree::from_items([1_u8, 2], broken_count());
            let _ = tree.split_right(|value| *value >= 3);
        }
    }
}
