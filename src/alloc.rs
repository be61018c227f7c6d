//! Allocation strategies.
//!
//! The containers never talk to the global heap directly. They go through an
//! [`AllocStrategy`], which hands out raw slots for `count` values of `T`,
//! constructs and destroys values in those slots, and reports the largest
//! count it can represent. Length violations are detected here, before any
//! memory is touched.
//!
//! [`Global`] (re-exported from `allocator-api2`) is the default strategy.
//! [`Counting`] wraps any `allocator-api2` allocator and records allocation
//! and construction traffic; it can also impose an artificially small
//! maximum count.
//!
//! ```
//! use cursor_collections::{Array, Counting};
//!
//! let alloc = Counting::new();
//! let mut v = Array::new_in(alloc.clone());
//! v.push(1u32)?;
//! v.push(2)?;
//! drop(v);
//!
//! assert_eq!(alloc.live_values(), 0);
//! assert_eq!(alloc.live_slots(), 0);
//! # Ok::<(), cursor_collections::Error>(())
//! ```

use core::alloc::Layout;
use core::ptr::NonNull;
use std::cell::Cell;
use std::rc::Rc;

pub use allocator_api2::alloc::Global;
use allocator_api2::alloc::Allocator;
use tracing::debug;

use crate::error::{Error, Result};

/// The allocation capability consumed by [`Array`](crate::Array) and
/// [`OrderedMap`](crate::OrderedMap).
pub trait AllocStrategy: Clone {
    /// Allocates uninitialized storage for `count` values of `T`.
    ///
    /// Zero-sized requests (either `count == 0` or a zero-sized `T`) return a
    /// dangling, well-aligned pointer without allocating.
    fn allocate<T>(&self, count: usize) -> Result<NonNull<T>>;

    /// Releases storage obtained from [`allocate`](Self::allocate).
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by `allocate::<T>(count)` on this
    /// strategy (or a clone of it) and not released since. Values still
    /// living in the storage are not dropped.
    unsafe fn deallocate<T>(&self, ptr: NonNull<T>, count: usize);

    /// Largest element count a single allocation of `T` may hold.
    fn max_count<T>(&self) -> usize {
        max_count_for::<T>()
    }

    /// Moves `value` into an uninitialized slot.
    ///
    /// # Safety
    ///
    /// `slot` must be valid for writes and must not hold a live value.
    unsafe fn construct<T>(&self, slot: NonNull<T>, value: T) {
        // SAFETY: upheld by caller.
        unsafe { slot.as_ptr().write(value) }
    }

    /// Drops the value in `slot`, leaving it uninitialized.
    ///
    /// # Safety
    ///
    /// `slot` must hold a live value which is not used afterwards.
    unsafe fn destroy<T>(&self, slot: NonNull<T>) {
        // SAFETY: upheld by caller.
        unsafe { slot.as_ptr().drop_in_place() }
    }

    /// Moves the value out of `slot`, leaving it uninitialized. Counts as
    /// the end of the value's life in the slot, like [`destroy`](Self::destroy).
    ///
    /// # Safety
    ///
    /// `slot` must hold a live value which is not used afterwards.
    unsafe fn take<T>(&self, slot: NonNull<T>) -> T {
        // SAFETY: upheld by caller.
        unsafe { slot.as_ptr().read() }
    }
}

/// Largest count of `T` for which `Layout::array::<T>` can succeed.
#[inline]
pub fn max_count_for<T>() -> usize {
    match std::mem::size_of::<T>() {
        0 => usize::MAX,
        size => isize::MAX as usize / size,
    }
}

fn allocate_with<T, A: Allocator>(alloc: &A, count: usize, max: usize) -> Result<NonNull<T>> {
    if count > max {
        debug!(requested = count, max, "allocation exceeds maximum count");
        return Err(Error::CapacityOverflow {
            requested: count,
            max,
        });
    }
    let layout = Layout::array::<T>(count).map_err(|_| Error::CapacityOverflow {
        requested: count,
        max,
    })?;
    if layout.size() == 0 {
        return Ok(NonNull::dangling());
    }
    match alloc.allocate(layout) {
        Ok(block) => Ok(block.cast()),
        Err(_) => {
            let size = std::mem::size_of::<T>();
            debug!(count, size, "allocator refused request");
            Err(Error::AllocFailed { count, size })
        }
    }
}

unsafe fn deallocate_with<T, A: Allocator>(alloc: &A, ptr: NonNull<T>, count: usize) {
    // The layout was validated when the block was handed out.
    if let Ok(layout) = Layout::array::<T>(count) {
        if layout.size() != 0 {
            // SAFETY: `ptr` came from `alloc.allocate(layout)`.
            unsafe { alloc.deallocate(ptr.cast(), layout) }
        }
    }
}

impl AllocStrategy for Global {
    fn allocate<T>(&self, count: usize) -> Result<NonNull<T>> {
        allocate_with(self, count, max_count_for::<T>())
    }

    unsafe fn deallocate<T>(&self, ptr: NonNull<T>, count: usize) {
        // SAFETY: upheld by caller.
        unsafe { deallocate_with(self, ptr, count) }
    }
}

#[derive(Debug, Default)]
struct Stats {
    allocations: Cell<usize>,
    deallocations: Cell<usize>,
    live_slots: Cell<usize>,
    constructed: Cell<usize>,
    destroyed: Cell<usize>,
    limit: Cell<Option<usize>>,
}

fn bump(cell: &Cell<usize>, by: usize) {
    cell.set(cell.get() + by);
}

/// Allocation strategy that counts what passes through it.
///
/// Clones share their counters, so a strategy handed to a container can be
/// inspected after the container is gone.
#[derive(Clone, Debug, Default)]
pub struct Counting<A = Global> {
    inner: A,
    stats: Rc<Stats>,
}

impl Counting<Global> {
    pub fn new() -> Self {
        Self::new_in(Global)
    }

    /// A counting strategy whose `max_count` is capped at `limit`.
    pub fn with_limit(limit: usize) -> Self {
        let alloc = Self::default();
        alloc.stats.limit.set(Some(limit));
        alloc
    }
}

impl<A> Counting<A> {
    pub fn new_in(inner: A) -> Self {
        Self {
            inner,
            stats: Rc::default(),
        }
    }

    /// Number of non-empty allocations handed out.
    pub fn allocations(&self) -> usize {
        self.stats.allocations.get()
    }

    /// Number of non-empty allocations released.
    pub fn deallocations(&self) -> usize {
        self.stats.deallocations.get()
    }

    /// Slots currently allocated and not yet released.
    pub fn live_slots(&self) -> usize {
        self.stats.live_slots.get()
    }

    pub fn constructed(&self) -> usize {
        self.stats.constructed.get()
    }

    pub fn destroyed(&self) -> usize {
        self.stats.destroyed.get()
    }

    /// Values constructed through this strategy and not yet destroyed.
    pub fn live_values(&self) -> usize {
        self.constructed() - self.destroyed()
    }
}

impl<A: Allocator + Clone> AllocStrategy for Counting<A> {
    fn allocate<T>(&self, count: usize) -> Result<NonNull<T>> {
        let ptr = allocate_with(&self.inner, count, self.max_count::<T>())?;
        if count != 0 {
            bump(&self.stats.allocations, 1);
            bump(&self.stats.live_slots, count);
        }
        Ok(ptr)
    }

    unsafe fn deallocate<T>(&self, ptr: NonNull<T>, count: usize) {
        if count != 0 {
            bump(&self.stats.deallocations, 1);
            self.stats.live_slots.set(self.stats.live_slots.get() - count);
        }
        // SAFETY: upheld by caller.
        unsafe { deallocate_with(&self.inner, ptr, count) }
    }

    fn max_count<T>(&self) -> usize {
        let max = max_count_for::<T>();
        match self.stats.limit.get() {
            Some(limit) => max.min(limit),
            None => max,
        }
    }

    unsafe fn construct<T>(&self, slot: NonNull<T>, value: T) {
        bump(&self.stats.constructed, 1);
        // SAFETY: upheld by caller.
        unsafe { slot.as_ptr().write(value) }
    }

    unsafe fn destroy<T>(&self, slot: NonNull<T>) {
        bump(&self.stats.destroyed, 1);
        // SAFETY: upheld by caller.
        unsafe { slot.as_ptr().drop_in_place() }
    }

    unsafe fn take<T>(&self, slot: NonNull<T>) -> T {
        bump(&self.stats.destroyed, 1);
        // SAFETY: upheld by caller.
        unsafe { slot.as_ptr().read() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_requests_are_not_counted() {
        let alloc = Counting::new();
        let p = alloc.allocate::<u64>(0).unwrap();
        let q = alloc.allocate::<()>(1000).unwrap();
        assert_eq!(alloc.allocations(), 1);
        unsafe {
            alloc.deallocate(p, 0);
            alloc.deallocate(q, 1000);
        }
        assert_eq!(alloc.deallocations(), 1);
        assert_eq!(alloc.live_slots(), 0);
    }

    #[test]
    fn test_max_count() {
        assert_eq!(Global.max_count::<()>(), usize::MAX);
        assert_eq!(Global.max_count::<u64>(), isize::MAX as usize / 8);
        assert_eq!(Counting::with_limit(4).max_count::<u64>(), 4);
    }

    #[test]
    fn test_overflow_is_rejected_before_allocating() {
        let alloc = Counting::with_limit(4);
        assert_eq!(
            alloc.allocate::<u32>(5),
            Err(Error::CapacityOverflow {
                requested: 5,
                max: 4
            })
        );
        assert_eq!(alloc.allocations(), 0);
        assert!(AllocStrategy::allocate::<u64>(&Global, usize::MAX).is_err());
    }

    #[test]
    fn test_construct_destroy_counts() {
        let alloc = Counting::new();
        let p = alloc.allocate::<String>(2).unwrap();
        unsafe {
            let q = NonNull::new_unchecked(p.as_ptr().add(1));
            alloc.construct(p, "a".to_string());
            alloc.construct(q, "b".to_string());
            assert_eq!(&*q.as_ptr(), "b");
            alloc.destroy(p);
            alloc.destroy(q);
            alloc.deallocate(p, 2);
        }
        assert_eq!(alloc.constructed(), 2);
        assert_eq!(alloc.live_values(), 0);
        assert_eq!(alloc.live_slots(), 0);
    }

    #[test]
    fn test_take_ends_value_life() {
        let alloc = Counting::new();
        let p = alloc.allocate::<String>(1).unwrap();
        let s = unsafe {
            alloc.construct(p, "moved".to_string());
            let s = alloc.take(p);
            alloc.deallocate(p, 1);
            s
        };
        assert_eq!(s, "moved");
        assert_eq!(alloc.destroyed(), 1);
        assert_eq!(alloc.live_values(), 0);
    }
}
