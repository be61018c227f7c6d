//! Contiguous, growable sequence container.
//!
//! Storage is one block obtained from the allocation strategy. The first
//! `len` slots hold live values, the remaining `cap - len` slots are
//! allocated but uninitialized.
//!
//! Growth policy: when `push` or `insert` runs out of room the capacity
//! doubles (or becomes 1 when empty); bulk inserts grow to exactly the
//! required size when that exceeds the doubled capacity. `reserve` and the
//! `assign_*` family allocate exactly what they are asked for.
//!
//! Every operation that can fail validates its request before touching the
//! buffer, so an `Err` leaves the array unchanged. Reallocation invalidates
//! all cursors; the borrow checker already forbids holding one across it.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::ptr::{self, NonNull};

use tracing::trace;

use crate::alloc::{AllocStrategy, Global};
use crate::cursor::{ArrayCursor, Reverse};
use crate::error::{Error, Result};

pub struct Array<T, A: AllocStrategy = Global> {
    ptr: NonNull<T>,
    len: usize,
    cap: usize,
    alloc: A,
    _marker: PhantomData<T>,
}

// SAFETY: `Array` owns its values the same way `Vec` does.
unsafe impl<T: Send, A: AllocStrategy + Send> Send for Array<T, A> {}
// SAFETY: shared access only hands out `&T`.
unsafe impl<T: Sync, A: AllocStrategy + Sync> Sync for Array<T, A> {}

impl<T> Array<T, Global> {
    pub fn new() -> Self {
        Self::new_in(Global)
    }

    /// `n` clones of `value`.
    pub fn filled(n: usize, value: &T) -> Result<Self>
    where
        T: Clone,
    {
        Self::filled_in(n, value, Global)
    }

    pub fn with_capacity(n: usize) -> Result<Self> {
        let mut array = Self::new();
        array.reserve(n)?;
        Ok(array)
    }
}

impl<T, A: AllocStrategy> Array<T, A> {
    /// Empty array; does not allocate.
    pub fn new_in(alloc: A) -> Self {
        Self {
            ptr: NonNull::dangling(),
            len: 0,
            cap: 0,
            alloc,
            _marker: PhantomData,
        }
    }

    /// `n` clones of `value`, with capacity exactly `n`.
    pub fn filled_in(n: usize, value: &T, alloc: A) -> Result<Self>
    where
        T: Clone,
    {
        let mut array = Self::new_in(alloc);
        array.reserve(n)?;
        for _ in 0..n {
            array.push(value.clone())?;
        }
        Ok(array)
    }

    /// Builds an array from a range of values, preserving their order.
    ///
    /// When the iterator reports an exact length the capacity equals that
    /// length.
    pub fn from_iter_in<I: IntoIterator<Item = T>>(iter: I, alloc: A) -> Result<Self> {
        let iter = iter.into_iter();
        let mut array = Self::new_in(alloc);
        if let (lo, Some(hi)) = iter.size_hint() {
            if lo == hi {
                array.reserve(lo)?;
            }
        }
        for value in iter {
            array.push(value)?;
        }
        Ok(array)
    }

    /// Fallible counterpart of `clone`; the copy's capacity equals its length.
    pub fn try_clone(&self) -> Result<Self>
    where
        T: Clone,
        A: Clone,
    {
        Self::from_iter_in(self.iter().cloned(), self.alloc.clone())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// Largest length the allocation strategy can represent.
    pub fn max_len(&self) -> usize {
        self.alloc.max_count::<T>()
    }

    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: `[0, len)` is initialized; `ptr` is aligned even when dangling.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: as above, and `&mut self` guarantees uniqueness.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.as_mut_slice().iter_mut()
    }

    pub fn begin(&self) -> ArrayCursor<'_, T> {
        ArrayCursor::new(self.as_slice(), 0)
    }

    pub fn end(&self) -> ArrayCursor<'_, T> {
        ArrayCursor::new(self.as_slice(), self.len)
    }

    pub fn rbegin(&self) -> Reverse<ArrayCursor<'_, T>> {
        Reverse::new(self.end())
    }

    pub fn rend(&self) -> Reverse<ArrayCursor<'_, T>> {
        Reverse::new(self.begin())
    }

    /// Cursor at `index`; `index == len()` gives the end cursor.
    ///
    /// # Panics
    ///
    /// If `index > len()`.
    pub fn cursor_at(&self, index: usize) -> ArrayCursor<'_, T> {
        assert!(index <= self.len, "cursor index {index} past end {}", self.len);
        ArrayCursor::new(self.as_slice(), index)
    }

    /// Bounds-checked access.
    pub fn at(&self, index: usize) -> Result<&T> {
        let len = self.len;
        self.as_slice()
            .get(index)
            .ok_or(Error::OutOfRange { index, len })
    }

    pub fn at_mut(&mut self, index: usize) -> Result<&mut T> {
        let len = self.len;
        self.as_mut_slice()
            .get_mut(index)
            .ok_or(Error::OutOfRange { index, len })
    }

    pub fn front(&self) -> Option<&T> {
        self.as_slice().first()
    }

    pub fn back(&self) -> Option<&T> {
        self.as_slice().last()
    }

    #[inline]
    fn slot(&self, index: usize) -> NonNull<T> {
        debug_assert!(index <= self.cap);
        // SAFETY: `index` is within the allocation (or one past it).
        unsafe { NonNull::new_unchecked(self.ptr.as_ptr().add(index)) }
    }

    fn check_count(&self, requested: usize) -> Result<()> {
        let max = self.max_len();
        if requested > max {
            return Err(Error::CapacityOverflow { requested, max });
        }
        Ok(())
    }

    /// Moves the live values into a fresh block of exactly `new_cap` slots.
    fn reallocate(&mut self, new_cap: usize) -> Result<()> {
        debug_assert!(new_cap >= self.len);
        let new_ptr = self.alloc.allocate::<T>(new_cap)?;
        // SAFETY: both blocks hold at least `len` slots and do not overlap.
        unsafe {
            ptr::copy_nonoverlapping(self.ptr.as_ptr(), new_ptr.as_ptr(), self.len);
            if self.cap != 0 {
                self.alloc.deallocate(self.ptr, self.cap);
            }
        }
        trace!(
            old_capacity = self.cap,
            new_capacity = new_cap,
            len = self.len,
            "array reallocated"
        );
        self.ptr = new_ptr;
        self.cap = new_cap;
        Ok(())
    }

    /// Makes room for `additional` more values using the doubling policy.
    fn grow_for(&mut self, additional: usize) -> Result<()> {
        let max = self.max_len();
        let required = self
            .len
            .checked_add(additional)
            .ok_or(Error::CapacityOverflow {
                requested: usize::MAX,
                max,
            })?;
        if required <= self.cap {
            return Ok(());
        }
        self.check_count(required)?;
        let doubled = if self.cap == 0 {
            1
        } else {
            self.cap.saturating_mul(2)
        };
        self.reallocate(doubled.min(max).max(required))
    }

    /// Ensures `capacity() >= n`, allocating exactly `n` slots if needed.
    ///
    /// Never shrinks, never changes the values.
    pub fn reserve(&mut self, n: usize) -> Result<()> {
        if n <= self.cap {
            return Ok(());
        }
        self.check_count(n)?;
        self.reallocate(n)
    }

    /// Swaps in an empty block of exactly `new_cap` slots, dropping all
    /// values. The new block is obtained before anything is released.
    fn replace_buffer(&mut self, new_cap: usize) -> Result<()> {
        let new_ptr = self.alloc.allocate::<T>(new_cap)?;
        self.clear();
        if self.cap != 0 {
            // SAFETY: `ptr`/`cap` describe our current block, now empty.
            unsafe { self.alloc.deallocate(self.ptr, self.cap) };
        }
        self.ptr = new_ptr;
        self.cap = new_cap;
        Ok(())
    }

    pub fn push(&mut self, value: T) -> Result<()> {
        self.grow_for(1)?;
        // SAFETY: `len < cap` after growing.
        unsafe { self.alloc.construct(self.slot(self.len), value) };
        self.len += 1;
        Ok(())
    }

    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        // SAFETY: the slot was live and is now past `len`.
        Some(unsafe { self.alloc.take(self.slot(self.len)) })
    }

    /// Drops values from the back until `len() == n`.
    pub fn truncate(&mut self, n: usize) {
        while self.len > n {
            self.len -= 1;
            // SAFETY: the slot was live and is now past `len`.
            unsafe { self.alloc.destroy(self.slot(self.len)) };
        }
    }

    /// Drops every value, last to first. Capacity is kept.
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Shrinks to `n` values, or appends clones of `value` up to `n`.
    pub fn resize(&mut self, n: usize, value: &T) -> Result<()>
    where
        T: Clone,
    {
        if n < self.len {
            self.truncate(n);
            return Ok(());
        }
        self.insert_n(self.len, n - self.len, value).map(|_| ())
    }

    /// Inserts `value` before `index`; returns `index`.
    ///
    /// # Panics
    ///
    /// If `index > len()`.
    pub fn insert(&mut self, index: usize, value: T) -> Result<usize> {
        assert!(index <= self.len, "insert index {index} past end {}", self.len);
        self.grow_for(1)?;
        // SAFETY: there is room for one more value; the tail is moved up by
        // one slot before the gap is filled.
        unsafe {
            let at = self.slot(index).as_ptr();
            ptr::copy(at, at.add(1), self.len - index);
            self.alloc.construct(self.slot(index), value);
        }
        self.len += 1;
        Ok(index)
    }

    /// Inserts `n` clones of `value` before `index`; returns `index`.
    ///
    /// # Panics
    ///
    /// If `index > len()`.
    pub fn insert_n(&mut self, index: usize, n: usize, value: &T) -> Result<usize>
    where
        T: Clone,
    {
        assert!(index <= self.len, "insert index {index} past end {}", self.len);
        if n == 0 {
            return Ok(index);
        }
        self.grow_for(n)?;
        let old_len = self.len;
        for _ in 0..n {
            // SAFETY: capacity for `n` more values was reserved above.
            unsafe { self.alloc.construct(self.slot(self.len), value.clone()) };
            self.len += 1;
        }
        let added = self.len - old_len;
        self.as_mut_slice()[index..].rotate_right(added);
        Ok(index)
    }

    /// Inserts the values of `iter` before `index`, keeping their order;
    /// returns `index`.
    ///
    /// # Panics
    ///
    /// If `index > len()`.
    pub fn insert_iter<I>(&mut self, index: usize, iter: I) -> Result<usize>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: ExactSizeIterator,
    {
        assert!(index <= self.len, "insert index {index} past end {}", self.len);
        let iter = iter.into_iter();
        let n = iter.len();
        if n == 0 {
            return Ok(index);
        }
        self.grow_for(n)?;
        let old_len = self.len;
        for value in iter {
            if let Err(err) = self.push(value) {
                self.truncate(old_len);
                return Err(err);
            }
        }
        let added = self.len - old_len;
        self.as_mut_slice()[index..].rotate_right(added);
        Ok(index)
    }

    /// Drops the value at `index` and closes the gap; returns `index`, now
    /// the position of the value that followed.
    ///
    /// # Panics
    ///
    /// If `index >= len()`.
    pub fn erase(&mut self, index: usize) -> usize {
        self.erase_range(index..index + 1)
    }

    /// Removes and returns the value at `index`, closing the gap.
    ///
    /// # Panics
    ///
    /// If `index >= len()`.
    pub fn remove(&mut self, index: usize) -> T {
        assert!(index < self.len, "remove index {index} out of range {}", self.len);
        // SAFETY: the value is read out once and the tail moved down over it.
        unsafe {
            let at = self.slot(index);
            let value = self.alloc.take(at);
            let at = at.as_ptr();
            ptr::copy(at.add(1), at, self.len - index - 1);
            self.len -= 1;
            value
        }
    }

    /// Drops the values in `range` (front to back) and moves the tail down;
    /// returns `range.start`.
    ///
    /// # Panics
    ///
    /// If the range is decreasing or extends past `len()`.
    pub fn erase_range(&mut self, range: std::ops::Range<usize>) -> usize {
        let std::ops::Range { start, end } = range;
        assert!(
            start <= end && end <= self.len,
            "erase range {start}..{end} out of bounds {}",
            self.len
        );
        let old_len = self.len;
        // Tail values are leaked rather than double-dropped if a drop panics.
        self.len = start;
        for i in start..end {
            // SAFETY: every slot in the range is live and dropped once.
            unsafe { self.alloc.destroy(self.slot(i)) };
        }
        if end < old_len {
            // SAFETY: moves the live tail down over the dropped slots.
            unsafe {
                ptr::copy(
                    self.slot(end).as_ptr(),
                    self.slot(start).as_ptr(),
                    old_len - end,
                )
            };
        }
        self.len = old_len - (end - start);
        start
    }

    /// Replaces the contents with `n` clones of `value`.
    ///
    /// Existing capacity is reused when sufficient; otherwise the storage is
    /// replaced by a block of exactly `n` slots.
    pub fn assign_n(&mut self, n: usize, value: &T) -> Result<()>
    where
        T: Clone,
    {
        self.check_count(n)?;
        if n > self.cap {
            self.replace_buffer(n)?;
        } else {
            self.clear();
        }
        for _ in 0..n {
            self.push(value.clone())?;
        }
        Ok(())
    }

    /// Replaces the contents with the values of `iter`.
    ///
    /// Capacity behaves as in [`assign_n`](Self::assign_n).
    pub fn assign_iter<I>(&mut self, iter: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: ExactSizeIterator,
    {
        let iter = iter.into_iter();
        let n = iter.len();
        self.check_count(n)?;
        if n > self.cap {
            self.replace_buffer(n)?;
        } else {
            self.clear();
        }
        for value in iter {
            self.push(value)?;
        }
        Ok(())
    }

    /// Exchanges contents, capacity and allocator with `other`.
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(self, other);
    }
}

impl<T, A: AllocStrategy> Drop for Array<T, A> {
    fn drop(&mut self) {
        self.clear();
        if self.cap != 0 {
            // SAFETY: `ptr`/`cap` describe our block, which is now empty.
            unsafe { self.alloc.deallocate(self.ptr, self.cap) };
        }
    }
}

impl<T> Default for Array<T, Global> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, A: AllocStrategy> Deref for Array<T, A> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, A: AllocStrategy> DerefMut for Array<T, A> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: Clone, A: AllocStrategy> Clone for Array<T, A> {
    /// # Panics
    ///
    /// If the allocation strategy refuses the copy.
    fn clone(&self) -> Self {
        match self.try_clone() {
            Ok(array) => array,
            Err(err) => panic!("Array::clone: {err}"),
        }
    }
}

impl<T> FromIterator<T> for Array<T, Global> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        match Self::from_iter_in(iter, Global) {
            Ok(array) => array,
            Err(err) => panic!("Array::from_iter: {err}"),
        }
    }
}

impl<T, A: AllocStrategy> Extend<T> for Array<T, A> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            if let Err(err) = self.push(value) {
                panic!("Array::extend: {err}");
            }
        }
    }
}

impl<'a, T, A: AllocStrategy> IntoIterator for &'a Array<T, A> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, A: AllocStrategy> IntoIterator for &'a mut Array<T, A> {
    type Item = &'a mut T;
    type IntoIter = std::slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<T: PartialEq, A: AllocStrategy, B: AllocStrategy> PartialEq<Array<T, B>> for Array<T, A> {
    fn eq(&self, other: &Array<T, B>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq, A: AllocStrategy> Eq for Array<T, A> {}

impl<T: PartialOrd, A: AllocStrategy> PartialOrd for Array<T, A> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.as_slice().partial_cmp(other.as_slice())
    }
}

impl<T: Ord, A: AllocStrategy> Ord for Array<T, A> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_slice().cmp(other.as_slice())
    }
}

impl<T: Hash, A: AllocStrategy> Hash for Array<T, A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state);
    }
}

impl<T: fmt::Debug, A: AllocStrategy> fmt::Debug for Array<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
