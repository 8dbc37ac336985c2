//! Error types for fallible map operations and invariant checks.
//!
//! Lookups never fail: an absent key or handle is `None`. The errors here
//! cover the two remaining outcomes, running out of room while growing and
//! finding a broken structural invariant during `check_invariants`.

use std::collections::TryReserveError;
use std::fmt;

/// Failure to make room for a new entry.
///
/// `put` treats every variant as fatal and panics; `try_put` hands it back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    /// The allocator refused to grow the dense arrays.
    AllocationFailed(TryReserveError),
    /// Doubling the capacity would overflow `usize`.
    CapacityOverflow,
    /// Every `u32` handle value has already been issued.
    HandlesExhausted,
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::AllocationFailed(e) => write!(f, "dense storage growth failed: {e}"),
            MapError::CapacityOverflow => f.write_str("dense storage capacity overflow"),
            MapError::HandlesExhausted => f.write_str("handle space exhausted"),
        }
    }
}

impl std::error::Error for MapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MapError::AllocationFailed(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TryReserveError> for MapError {
    fn from(e: TryReserveError) -> Self {
        MapError::AllocationFailed(e)
    }
}

/// A structural invariant did not hold.
///
/// Produced by `check_invariants`; carries a description of what failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}
