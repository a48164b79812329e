//! Pools of singly-linked stacks backed by one growable arena.
//!
//! A [`StackPool`] stores the nodes of many independent stacks in a single
//! contiguous backing store and identifies them by small integer
//! [`Handle`]s instead of addresses. A stack is not a stored object: its
//! entire identity is the handle of its top node, threaded through
//! [`push`](StackPool::push)/[`pop`](StackPool::pop) calls by the caller.
//! Freed nodes land on an internal free list, linked through the same
//! successor field live chains use, and are recycled before any new
//! storage is grown. This suits workloads that churn through many
//! short-lived lists, such as adjacency lists or parser work-stacks,
//! without a heap allocation per node.
//!
//! The API comes in two halves, per operation:
//! - checked methods ([`value`](StackPool::value), [`pop`](StackPool::pop),
//!   ...) that report misuse as [`PoolError`];
//! - `unsafe` unchecked methods
//!   ([`value_unchecked`](StackPool::value_unchecked),
//!   [`pop_unchecked`](StackPool::pop_unchecked), ...) that skip every
//!   bounds and liveness check for the hot path.
//!
//! # Example
//!
//! ```
//! use stack_pool::StackPool;
//!
//! let mut pool: StackPool<u32> = StackPool::new();
//!
//! // Two stacks sharing one arena.
//! let mut evens = pool.new_stack();
//! let mut odds = pool.new_stack();
//! for n in 0..6 {
//!     if n % 2 == 0 {
//!         evens = pool.push(n, evens);
//!     } else {
//!         odds = pool.push(n, odds);
//!     }
//! }
//!
//! assert_eq!(pool.iter(evens).copied().collect::<Vec<_>>(), [4, 2, 0]);
//! assert_eq!(pool.iter(odds).copied().collect::<Vec<_>>(), [5, 3, 1]);
//!
//! // Releasing one stack leaves the other untouched and queues its nodes
//! // for reuse.
//! let evens = pool.free_stack(evens);
//! assert!(pool.is_empty(evens));
//! assert_eq!(pool.available(), 3);
//! ```
//!
//! # Features
//!
//! - `stats`: per-pool operation counters (`PoolStats`).
//! - `tracing`: trace-level events on storage growth and stack release.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

mod error;
mod handle;
mod iter;
mod pool;
#[cfg(feature = "stats")]
mod stats;

pub use error::{PoolError, Result};
pub use handle::{Handle, PoolIndex};
pub use iter::{Handles, StackIter, StackIterMut};
pub use pool::StackPool;
#[cfg(feature = "stats")]
#[cfg_attr(docsrs, doc(cfg(feature = "stats")))]
pub use stats::PoolStats;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
