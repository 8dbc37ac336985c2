//! Order values: the scalar each key is sorted by.
//!
//! Any `BuildHasher` can act as the ordering function. The key's raw bytes
//! are written into a single fresh hasher and `finish()` is the order value,
//! so equal keys always produce equal order values. Distinct keys may
//! collide; the dense storage breaks ties by comparing the raw bytes, and an
//! order-value match is never taken as key equality.

use core::cmp::Ordering;
use core::hash::{BuildHasher, BuildHasherDefault, Hasher};
use std::collections::hash_map::DefaultHasher;

/// SipHash with fixed keys: the same key maps to the same order value for
/// every map in the process.
pub type DefaultOrder = BuildHasherDefault<DefaultHasher>;

/// Derive the order value of `key` under `order`.
#[inline]
pub fn order_value<S: BuildHasher>(order: &S, key: &[u8]) -> u64 {
    let mut h = order.build_hasher();
    h.write(key);
    h.finish()
}

/// Total order over stored entries: order value first, raw bytes second.
#[inline]
pub(crate) fn compare(a_order: u64, a_key: &[u8], b_order: u64, b_key: &[u8]) -> Ordering {
    a_order.cmp(&b_order).then_with(|| a_key.cmp(b_key))
}

/// Uses the first eight key bytes, big-endian, as the order value.
///
/// Cheap for keys that are already uniformly distributed, such as public
/// keys. Keys shorter than eight bytes are zero-padded.
#[derive(Clone, Copy, Debug, Default)]
pub struct PrefixOrder;

/// Hasher for [`PrefixOrder`]: keeps the first eight bytes written.
#[derive(Default)]
pub struct PrefixHasher {
    prefix: [u8; 8],
    filled: usize,
}

impl BuildHasher for PrefixOrder {
    type Hasher = PrefixHasher;
    fn build_hasher(&self) -> Self::Hasher {
        PrefixHasher::default()
    }
}

impl Hasher for PrefixHasher {
    fn write(&mut self, bytes: &[u8]) {
        let take = bytes.len().min(self.prefix.len() - self.filled);
        self.prefix[self.filled..self.filled + take].copy_from_slice(&bytes[..take]);
        self.filled += take;
    }

    fn finish(&self) -> u64 {
        u64::from_be_bytes(self.prefix)
    }
}
