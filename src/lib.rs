//! dense-handle-map: a single-threaded, sorted, dense map for fixed-size
//! byte keys, with optional stable handles to entries.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: fast lookups over a few thousand keyed records (per-peer session
//!   state and the like) inserted and removed in arbitrary order, while
//!   callers keep durable references to individual entries.
//! - Layers:
//!   - Dense<K, V>: index-aligned columns of order values, keys and values,
//!     grown together by doubling.
//!   - SortedMap<K, V, S>: keeps the columns sorted by `(order value, key
//!     bytes)`; binary search for lookup, shift right to insert, shift left
//!     to remove.
//!   - HandleMap<K, V, S>: wraps `SortedMap<K, Tagged<V>, S>`; every entry
//!     carries a monotonically issued `Handle` and a secondary index maps
//!     handles to their current slot.
//!
//! Constraints
//! - Single owner, no interior mutability, no background work.
//! - No duplicate keys: putting an existing key overwrites its value in
//!   place and keeps its slot and handle.
//! - Columns are strictly ordered between operations.
//! - Handles are never reused; a removed entry's handle never resolves again.
//!
//! Order values
//! - Any `BuildHasher` serves as the ordering function. The key bytes are
//!   hashed once on insert and the result is stored next to the key, so
//!   the hasher is never re-run over stored keys. Equal order values are
//!   resolved by comparing raw bytes; they are never taken as equality.
//!
//! Failure
//! - Absent keys and handles are `None`.
//! - Out-of-range `remove` panics.
//! - Growth failure and handle exhaustion are fatal in `put` and returned
//!   as `MapError` by `try_put`.
//!
//! Non-goals
//! - No concurrent access, no load-factor tuning, no persistence.

pub mod dense;
pub mod error;
pub mod handle_map;
mod handle_map_proptest;
pub mod order;
pub mod sorted_map;
mod sorted_map_proptest;

pub use dense::MIN_CAPACITY;
pub use error::{InvariantError, MapError};
pub use handle_map::{Handle, HandleMap};
pub use order::{DefaultOrder, PrefixOrder};
pub use sorted_map::{Put, SortedMap};
