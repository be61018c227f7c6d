//! # Error Types
//!
//! Both containers report the same two misuse conditions the caller can
//! recover from, plus allocation failure from the allocation strategy:
//!
//! - a requested element count beyond what the strategy can represent
//!   ([`Error::CapacityOverflow`]),
//! - a checked lookup past the logical size ([`Error::OutOfRange`]),
//! - the strategy refusing to hand out memory ([`Error::AllocFailed`]).
//!
//! Every fallible operation validates before it touches storage, so an `Err`
//! always means the container is exactly as it was before the call.
//!
//! Misuse the containers cannot detect cheaply (reading through an end
//! cursor, holding a [`Position`](crate::Position) across an erase) is not an
//! error: cursor reads return `None` and stale positions are rejected or
//! resolve to whatever node now occupies their slot.

use thiserror::Error;

/// Errors returned by container operations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The requested element count exceeds the allocation strategy's
    /// maximum representable count.
    #[error("requested count {requested} exceeds maximum of {max}")]
    CapacityOverflow { requested: usize, max: usize },

    /// A checked access referred to an index at or past the logical size.
    #[error("index {index} out of range for length {len}")]
    OutOfRange { index: usize, len: usize },

    /// The allocation strategy could not provide storage.
    #[error("allocation of {count} slots of {size} bytes failed")]
    AllocFailed { count: usize, size: usize },
}

/// A Result type alias using the crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
