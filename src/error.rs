//! Error types for checked pool operations.

use thiserror::Error;

/// Result type for checked pool operations.
pub type Result<T> = core::result::Result<T, PoolError>;

/// Errors reported by the checked half of the pool API.
///
/// The unchecked (`unsafe`) accessors never construct these: passing them a
/// bad handle is undefined behavior instead, by contract.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    /// The handle does not designate any slot of this pool.
    ///
    /// Raised for the sentinel where a live node is required, and for raw
    /// values past the end of the backing store (for example a handle issued
    /// by a different pool).
    #[error("invalid handle {handle}: pool has {allocated} nodes")]
    InvalidHandle {
        /// Raw value of the offending handle (`0` is the sentinel).
        handle: usize,
        /// Number of node slots the pool has allocated.
        allocated: usize,
    },

    /// The handle designates a slot that currently sits on the free list.
    ///
    /// This is the detectable form of a stale handle: the node was freed by
    /// `pop` or `free_stack` and has not been reused yet. A stale handle
    /// whose node *was* reused is indistinguishable from a live one.
    #[error("stale handle {handle}: node is on the free list")]
    StaleHandle {
        /// Raw value of the offending handle.
        handle: usize,
    },

    /// `pop` was called with the end-of-stack sentinel.
    #[error("cannot pop an empty stack")]
    EmptyStack,

    /// The pool's handle width cannot address one more node.
    ///
    /// Only reachable through `try_push`; `push` panics instead, the same
    /// way `Vec` treats capacity overflow.
    #[error("handle width exhausted: {limit} nodes already addressable")]
    HandleOverflow {
        /// Maximum number of slots the handle width can address.
        limit: usize,
    },
}
