//! # cursor-collections
//!
//! Two allocator-parameterized containers that share one cursor vocabulary:
//!
//! - [`Array`]: a contiguous, growable sequence with all-or-nothing
//!   insertion and explicit capacity control.
//! - [`OrderedMap`]: an ordered, unique-key map backed by an unbalanced
//!   binary search tree, with bidirectional cursors that can step back from
//!   the end position.
//!
//! Both hand out cursors implementing [`Cursor`]; [`Reverse`] flips the
//! direction of any of them and [`Range`] turns a `[first, last)` pair into
//! an iterator.
//!
//! ## Example
//!
//! ```rust
//! use cursor_collections::{Array, Cursor, OrderedMap, Range};
//!
//! let mut map = OrderedMap::new();
//! map.insert(3, "c")?;
//! map.insert(1, "a")?;
//! map.insert(2, "b")?;
//!
//! let mut end = map.end();
//! end.move_prev();
//! assert_eq!(end.key(), Some(&3));
//!
//! let keys: Array<i32> = map.keys().copied().collect();
//! let back: Vec<i32> = Range::new(keys.rbegin(), keys.rend()).copied().collect();
//! assert_eq!(back, vec![3, 2, 1]);
//! # Ok::<(), cursor_collections::Error>(())
//! ```
//!
//! Allocation goes through an [`AllocStrategy`]. [`Global`] is the default;
//! [`Counting`] wraps another strategy and records its traffic, and can cap
//! the number of slots to exercise the capacity error paths.

#![deny(unsafe_op_in_unsafe_fn)]

mod alloc;
mod array;
pub mod cursor;
mod entry;
mod error;
mod map;
mod tree;

pub use alloc::{max_count_for, AllocStrategy, Counting, Global};
pub use array::Array;
pub use compare::{natural, Compare, Natural};
pub use cursor::{distance, ArrayCursor, Cursor, RandomAccess, Range, Reverse};
pub use entry::EntryCompare;
pub use error::{Error, Result};
pub use map::{IntoIter, Iter, IterMut, OrderedMap};
pub use tree::{Position, TreeCursor, TreeCursorMut};

#[cfg(test)]
mod proptests;
