//! Cursor vocabulary shared by both containers.
//!
//! A cursor is a position inside a container. It can be read (yielding
//! `None` at an end position), stepped forward and stepped backward. Two
//! cursors over different containers never compare equal.
//!
//! - [`ArrayCursor`] walks contiguous storage and supports arbitrary offset
//!   arithmetic ([`RandomAccess`]).
//! - [`TreeCursor`](crate::TreeCursor) walks a tree in key order.
//! - [`Reverse`] flips the direction of any cursor.
//! - [`Range`] turns a half-open pair `[first, last)` into a Rust iterator.
//!
//! Moving a cursor outside `[begin, end]` is a caller error. Array cursors
//! tolerate it (reads return `None`), tree cursors saturate at the ends.

use std::cmp::Ordering;
use std::fmt;
use std::iter::FusedIterator;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// A bidirectional position inside a container.
pub trait Cursor: Clone + PartialEq {
    type Item;

    /// The element at this position, or `None` at an end position.
    fn get(&self) -> Option<Self::Item>;

    fn move_next(&mut self);

    fn move_prev(&mut self);

    /// Number of forward steps from `self` to `end`, when it can be computed
    /// without walking.
    fn steps_to(&self, _end: &Self) -> Option<usize> {
        None
    }
}

/// A cursor supporting constant-time jumps and signed distances.
pub trait RandomAccess: Cursor + PartialOrd {
    /// Moves by `n` positions (backward when negative).
    fn advance_by(&mut self, n: isize);

    /// Signed number of positions from `origin` to `self`.
    fn offset_from(&self, origin: &Self) -> isize;

    /// The element `n` positions away, without moving.
    fn at_offset(&self, n: isize) -> Option<Self::Item> {
        let mut c = self.clone();
        c.advance_by(n);
        c.get()
    }
}

/// Number of forward steps needed to get from `first` to `last`.
///
/// `last` must be reachable from `first`.
pub fn distance<C: Cursor>(first: &C, last: &C) -> usize {
    if let Some(n) = first.steps_to(last) {
        return n;
    }
    let mut c = first.clone();
    let mut n = 0;
    while c != *last {
        c.move_next();
        n += 1;
    }
    n
}

// =============================================================================
// Array cursor
// =============================================================================

/// Random-access cursor over contiguous storage.
pub struct ArrayCursor<'a, T> {
    slice: &'a [T],
    pos: isize,
}

impl<'a, T> ArrayCursor<'a, T> {
    #[inline]
    pub(crate) fn new(slice: &'a [T], pos: usize) -> Self {
        debug_assert!(pos <= slice.len());
        Self {
            slice,
            pos: pos as isize,
        }
    }

    /// Index of this position, when it lies within `[begin, end]`.
    pub fn index(&self) -> Option<usize> {
        usize::try_from(self.pos)
            .ok()
            .filter(|&i| i <= self.slice.len())
    }

    #[inline]
    fn same_storage(&self, other: &Self) -> bool {
        std::ptr::eq(self.slice.as_ptr(), other.slice.as_ptr())
    }
}

impl<T> Clone for ArrayCursor<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ArrayCursor<'_, T> {}

impl<T> PartialEq for ArrayCursor<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.same_storage(other) && self.pos == other.pos
    }
}

impl<T> Eq for ArrayCursor<'_, T> {}

impl<T> PartialOrd for ArrayCursor<'_, T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.same_storage(other) {
            Some(self.pos.cmp(&other.pos))
        } else {
            None
        }
    }
}

impl<T> fmt::Debug for ArrayCursor<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayCursor")
            .field("pos", &self.pos)
            .field("len", &self.slice.len())
            .finish()
    }
}

impl<'a, T> Cursor for ArrayCursor<'a, T> {
    type Item = &'a T;

    #[inline]
    fn get(&self) -> Option<&'a T> {
        usize::try_from(self.pos)
            .ok()
            .and_then(|i| self.slice.get(i))
    }

    #[inline]
    fn move_next(&mut self) {
        self.pos += 1;
    }

    #[inline]
    fn move_prev(&mut self) {
        self.pos -= 1;
    }

    fn steps_to(&self, end: &Self) -> Option<usize> {
        usize::try_from(end.offset_from(self)).ok()
    }
}

impl<T> RandomAccess for ArrayCursor<'_, T> {
    #[inline]
    fn advance_by(&mut self, n: isize) {
        self.pos += n;
    }

    #[inline]
    fn offset_from(&self, origin: &Self) -> isize {
        debug_assert!(self.same_storage(origin));
        self.pos - origin.pos
    }
}

impl<T> Add<isize> for ArrayCursor<'_, T> {
    type Output = Self;

    fn add(mut self, n: isize) -> Self {
        self.advance_by(n);
        self
    }
}

impl<T> Sub<isize> for ArrayCursor<'_, T> {
    type Output = Self;

    fn sub(mut self, n: isize) -> Self {
        self.advance_by(-n);
        self
    }
}

impl<T> AddAssign<isize> for ArrayCursor<'_, T> {
    fn add_assign(&mut self, n: isize) {
        self.advance_by(n);
    }
}

impl<T> SubAssign<isize> for ArrayCursor<'_, T> {
    fn sub_assign(&mut self, n: isize) {
        self.advance_by(-n);
    }
}

impl<'a, T> Sub for ArrayCursor<'a, T> {
    type Output = isize;

    fn sub(self, origin: Self) -> isize {
        self.offset_from(&origin)
    }
}

// =============================================================================
// Reverse adapter
// =============================================================================

/// Walks the wrapped cursor backwards.
///
/// The logical element of `Reverse(c)` is the one immediately before `c`, so
/// `Reverse(end)` reads the last element and `Reverse(begin)` is the reverse
/// end position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reverse<C> {
    base: C,
}

impl<C> Reverse<C> {
    pub fn new(base: C) -> Self {
        Self { base }
    }

    /// The wrapped cursor, one position after the logical element.
    pub fn base(&self) -> &C {
        &self.base
    }

    pub fn into_base(self) -> C {
        self.base
    }
}

impl<C: Cursor> Cursor for Reverse<C> {
    type Item = C::Item;

    fn get(&self) -> Option<C::Item> {
        let mut c = self.base.clone();
        c.move_prev();
        c.get()
    }

    #[inline]
    fn move_next(&mut self) {
        self.base.move_prev();
    }

    #[inline]
    fn move_prev(&mut self) {
        self.base.move_next();
    }

    fn steps_to(&self, end: &Self) -> Option<usize> {
        end.base.steps_to(&self.base)
    }
}

impl<C: PartialOrd> PartialOrd for Reverse<C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        other.base.partial_cmp(&self.base)
    }
}

impl<C: RandomAccess> RandomAccess for Reverse<C> {
    #[inline]
    fn advance_by(&mut self, n: isize) {
        self.base.advance_by(-n);
    }

    #[inline]
    fn offset_from(&self, origin: &Self) -> isize {
        origin.base.offset_from(&self.base)
    }
}

impl<C: RandomAccess> Add<isize> for Reverse<C> {
    type Output = Self;

    fn add(mut self, n: isize) -> Self {
        self.advance_by(n);
        self
    }
}

impl<C: RandomAccess> Sub<isize> for Reverse<C> {
    type Output = Self;

    fn sub(mut self, n: isize) -> Self {
        self.advance_by(-n);
        self
    }
}

impl<C: RandomAccess> Sub for Reverse<C> {
    type Output = isize;

    fn sub(self, origin: Self) -> isize {
        self.offset_from(&origin)
    }
}

// =============================================================================
// Half-open range
// =============================================================================

/// Iterator over the half-open cursor range `[first, last)`.
#[derive(Clone, Debug)]
pub struct Range<C> {
    front: C,
    back: C,
}

impl<C: Cursor> Range<C> {
    pub fn new(first: C, last: C) -> Self {
        Self {
            front: first,
            back: last,
        }
    }

    /// Cursor at the next element `next` would yield.
    pub fn front(&self) -> &C {
        &self.front
    }

    /// Exclusive end cursor.
    pub fn back(&self) -> &C {
        &self.back
    }
}

impl<C: Cursor> Iterator for Range<C> {
    type Item = C::Item;

    fn next(&mut self) -> Option<C::Item> {
        if self.front == self.back {
            return None;
        }
        let item = self.front.get();
        self.front.move_next();
        item
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.front.steps_to(&self.back) {
            Some(n) => (n, Some(n)),
            None => (0, None),
        }
    }
}

impl<C: Cursor> DoubleEndedIterator for Range<C> {
    fn next_back(&mut self) -> Option<C::Item> {
        if self.front == self.back {
            return None;
        }
        self.back.move_prev();
        self.back.get()
    }
}

impl<C: RandomAccess> ExactSizeIterator for Range<C> {}

impl<C: Cursor> FusedIterator for Range<C> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_cursor_arithmetic() {
        let data = [10, 20, 30, 40];
        let begin = ArrayCursor::new(&data, 0);
        let end = ArrayCursor::new(&data, data.len());

        assert_eq!(end - begin, 4);
        assert_eq!(begin - end, -4);
        assert_eq!((begin + 2).get(), Some(&30));
        assert_eq!((end - 1).get(), Some(&40));
        assert_eq!(begin.at_offset(3), Some(&40));
        assert_eq!(end.get(), None);
        assert!(begin < end);
        assert!(begin + 4 == end);

        let mut c = begin;
        c += 3;
        c -= 1;
        assert_eq!(c.get(), Some(&30));
        assert_eq!(c.index(), Some(2));
    }

    #[test]
    fn test_array_cursor_out_of_bounds_reads_none() {
        let data = [1, 2];
        let begin = ArrayCursor::new(&data, 0);
        let before = begin - 1;
        assert_eq!(before.get(), None);
        assert_eq!(before.index(), None);
        assert_eq!((begin + 5).get(), None);
        // Stepping back restores a valid position.
        assert_eq!((before + 1).get(), Some(&1));
    }

    #[test]
    fn test_cursors_over_different_storage_never_equal() {
        let a = [1, 2, 3];
        let b = [1, 2, 3];
        let ca = ArrayCursor::new(&a, 1);
        let cb = ArrayCursor::new(&b, 1);
        assert_ne!(ca, cb);
        assert_eq!(ca.partial_cmp(&cb), None);
    }

    #[test]
    fn test_reverse_reads_element_before_base() {
        let data = [1, 2, 3];
        let rbegin = Reverse::new(ArrayCursor::new(&data, 3));
        let rend = Reverse::new(ArrayCursor::new(&data, 0));

        assert_eq!(rbegin.get(), Some(&3));
        // Reading does not move the stored cursor.
        assert_eq!(rbegin.base().index(), Some(3));
        assert_eq!(rend.get(), None);
        assert_eq!(rend - rbegin, 3);
        assert!(rbegin < rend);
        assert_eq!((rbegin + 2).get(), Some(&1));
        assert_eq!(rbegin.at_offset(1), Some(&2));

        let mut r = rend;
        r.move_prev();
        assert_eq!(r.get(), Some(&1));

        // Unwrapping gives back the base cursor unchanged.
        assert_eq!(r.into_base(), ArrayCursor::new(&data, 1));
        assert_eq!(rbegin.into_base().index(), Some(3));
    }

    #[test]
    fn test_range_iterates_both_ways() {
        let data = [1, 2, 3, 4, 5];
        let range = Range::new(ArrayCursor::new(&data, 1), ArrayCursor::new(&data, 4));
        assert_eq!(range.len(), 3);
        assert_eq!(range.clone().copied().collect::<Vec<_>>(), vec![2, 3, 4]);
        assert_eq!(range.rev().copied().collect::<Vec<_>>(), vec![4, 3, 2]);

        let mut range = Range::new(ArrayCursor::new(&data, 0), ArrayCursor::new(&data, 5));
        assert_eq!(range.next(), Some(&1));
        assert_eq!(range.next_back(), Some(&5));
        assert_eq!(range.len(), 3);
        assert_eq!(range.front().get(), Some(&2));
        assert_eq!(range.back().get(), Some(&5));
    }

    #[test]
    fn test_reverse_range() {
        let data = [1, 2, 3];
        let range = Range::new(
            Reverse::new(ArrayCursor::new(&data, 3)),
            Reverse::new(ArrayCursor::new(&data, 0)),
        );
        assert_eq!(range.len(), 3);
        assert_eq!(range.copied().collect::<Vec<_>>(), vec![3, 2, 1]);
    }

    #[test]
    fn test_distance() {
        let data = [0u8; 7];
        let a = ArrayCursor::new(&data, 2);
        let b = ArrayCursor::new(&data, 7);
        assert_eq!(distance(&a, &b), 5);
        assert_eq!(distance(&Reverse::new(b), &Reverse::new(a)), 5);
    }
}
