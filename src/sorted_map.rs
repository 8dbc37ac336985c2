//! SortedMap: dense storage kept sorted by order value, with binary-search
//! lookup and shift-based insert and remove.

use crate::dense::Dense;
use crate::error::{InvariantError, MapError};
use crate::order::{self, DefaultOrder};
use core::cmp::Ordering;
use core::fmt;
use core::hash::BuildHasher;

/// Outcome of [`SortedMap::put`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Put<V> {
    /// The key was new; it now lives at `index`.
    Inserted { index: usize },
    /// The key was present at `index`; its value was overwritten in place.
    Replaced { index: usize, old: V },
}

impl<V> Put<V> {
    /// Physical index of the entry right after the put.
    #[inline]
    pub fn index(&self) -> usize {
        match self {
            Put::Inserted { index } | Put::Replaced { index, .. } => *index,
        }
    }

    #[inline]
    pub fn is_inserted(&self) -> bool {
        matches!(self, Put::Inserted { .. })
    }

    /// The overwritten value, if there was one.
    pub fn into_old(self) -> Option<V> {
        match self {
            Put::Inserted { .. } => None,
            Put::Replaced { old, .. } => Some(old),
        }
    }
}

/// Where a key sits, or would sit, in the dense arrays.
pub(crate) struct Located {
    pub(crate) order: u64,
    pub(crate) slot: Result<usize, usize>,
}

pub struct SortedMap<K, V, S = DefaultOrder> {
    order: S,
    dense: Dense<K, V>,
}

impl<K, V> SortedMap<K, V>
where
    K: AsRef<[u8]>,
{
    pub fn new() -> Self {
        Self::with_order(Default::default())
    }

    /// Pre-size for `hint` entries. Panics if the allocation fails.
    pub fn with_capacity(hint: usize) -> Self {
        Self::with_capacity_and_order(hint, Default::default())
    }
}

impl<K, V> Default for SortedMap<K, V>
where
    K: AsRef<[u8]>,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over entries in sorted order.
pub struct Iter<'a, K, V> {
    keys: core::slice::Iter<'a, K>,
    values: core::slice::Iter<'a, V>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        Some((self.keys.next()?, self.values.next()?))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.keys.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        Some((self.keys.next_back()?, self.values.next_back()?))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// Iterator over entries in sorted order with mutable values.
pub struct IterMut<'a, K, V> {
    keys: core::slice::Iter<'a, K>,
    values: core::slice::IterMut<'a, V>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        Some((self.keys.next()?, self.values.next()?))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.keys.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

impl<K, V, S> SortedMap<K, V, S>
where
    K: AsRef<[u8]>,
    S: BuildHasher,
{
    pub fn with_order(order: S) -> Self {
        Self {
            order,
            dense: Dense::new(),
        }
    }

    pub fn with_capacity_and_order(hint: usize, order: S) -> Self {
        let dense = match Dense::with_capacity(hint) {
            Ok(d) => d,
            Err(e) => panic!("{e}"),
        };
        Self { order, dense }
    }

    /// The ordering function this map sorts by.
    pub fn order(&self) -> &S {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.dense.len()
    }
    pub fn is_empty(&self) -> bool {
        self.dense.len() == 0
    }
    pub fn capacity(&self) -> usize {
        self.dense.capacity()
    }

    /// Keys in storage order.
    pub fn keys(&self) -> &[K] {
        self.dense.keys()
    }

    /// Values, index-aligned with [`keys`](Self::keys).
    pub fn values(&self) -> &[V] {
        self.dense.values()
    }

    /// Values may be edited in place; that never affects ordering.
    pub fn values_mut(&mut self) -> &mut [V] {
        self.dense.values_mut()
    }

    /// Binary search for the first entry with this order value, then walk the
    /// run of equal order values comparing bytes. The run is itself sorted by
    /// bytes, so the walk stops at the first larger key.
    pub(crate) fn locate(&self, key: &[u8]) -> Located {
        let order = order::order_value(&self.order, key);
        let orders = self.dense.orders();
        let keys = self.dense.keys();
        let mut i = orders.partition_point(|&o| o < order);
        while i < orders.len() && orders[i] == order {
            match keys[i].as_ref().cmp(key) {
                Ordering::Less => i += 1,
                Ordering::Equal => {
                    return Located {
                        order,
                        slot: Ok(i),
                    }
                }
                Ordering::Greater => break,
            }
        }
        Located {
            order,
            slot: Err(i),
        }
    }

    /// Physical index of `key`, or `None` if it is not in the map.
    pub fn index_for_key<Q>(&self, key: &Q) -> Option<usize>
    where
        Q: AsRef<[u8]> + ?Sized,
    {
        self.locate(key.as_ref()).slot.ok()
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        Q: AsRef<[u8]> + ?Sized,
    {
        self.index_for_key(key).is_some()
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        Q: AsRef<[u8]> + ?Sized,
    {
        let i = self.index_for_key(key)?;
        self.dense.values().get(i)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        Q: AsRef<[u8]> + ?Sized,
    {
        let i = self.index_for_key(key)?;
        self.dense.values_mut().get_mut(i)
    }

    pub fn key_at(&self, index: usize) -> Option<&K> {
        self.dense.keys().get(index)
    }

    pub fn value_at(&self, index: usize) -> Option<&V> {
        self.dense.values().get(index)
    }

    pub fn value_at_mut(&mut self, index: usize) -> Option<&mut V> {
        self.dense.values_mut().get_mut(index)
    }

    /// Insert `key`, or overwrite its value if it is already present.
    ///
    /// Panics if the table has to grow and cannot; use [`try_put`](Self::try_put)
    /// to handle that instead.
    pub fn put(&mut self, key: K, value: V) -> Put<V> {
        match self.try_put(key, value) {
            Ok(p) => p,
            Err(e) => panic!("{e}"),
        }
    }

    pub fn try_put(&mut self, key: K, value: V) -> Result<Put<V>, MapError> {
        let at = self.locate(key.as_ref());
        match at.slot {
            Ok(index) => {
                let old = core::mem::replace(&mut self.dense.values_mut()[index], value);
                Ok(Put::Replaced { index, old })
            }
            Err(index) => {
                self.insert_located(index, at.order, key, value)?;
                Ok(Put::Inserted { index })
            }
        }
    }

    /// Insert at a slot previously returned by `locate` as vacant.
    pub(crate) fn insert_located(
        &mut self,
        index: usize,
        order: u64,
        key: K,
        value: V,
    ) -> Result<(), MapError> {
        self.dense.reserve_one()?;
        self.dense.insert_at(index, order, key, value);
        Ok(())
    }

    /// Remove the entry at `index`, shifting every later entry left by one.
    ///
    /// # Panics
    ///
    /// If `index >= len()`.
    pub fn remove(&mut self, index: usize) -> (K, V) {
        let len = self.len();
        assert!(
            index < len,
            "remove index {index} out of range for map of {len} entries"
        );
        self.dense.remove_at(index)
    }

    pub fn remove_key<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        Q: AsRef<[u8]> + ?Sized,
    {
        let i = self.index_for_key(key)?;
        Some(self.dense.remove_at(i))
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            keys: self.dense.keys().iter(),
            values: self.dense.values().iter(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        let (keys, values) = self.dense.split_mut();
        IterMut {
            keys: keys.iter(),
            values: values.iter_mut(),
        }
    }

    /// Verify column alignment, cached order values and strict ordering.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        if !self.dense.columns_aligned() {
            return Err(InvariantError::new(format!(
                "columns misaligned: {} orders, {} keys, {} values, capacity {}",
                self.dense.orders().len(),
                self.dense.keys().len(),
                self.dense.values().len(),
                self.dense.capacity()
            )));
        }
        let orders = self.dense.orders();
        let keys = self.dense.keys();
        for (i, key) in keys.iter().enumerate() {
            let expected = order::order_value(&self.order, key.as_ref());
            if orders[i] != expected {
                return Err(InvariantError::new(format!(
                    "stale order value at {i}: stored {:#x}, key hashes to {expected:#x}",
                    orders[i]
                )));
            }
            if i > 0
                && order::compare(orders[i - 1], keys[i - 1].as_ref(), orders[i], key.as_ref())
                    != Ordering::Less
            {
                return Err(InvariantError::new(format!(
                    "entries {} and {i} out of order or duplicated",
                    i - 1
                )));
            }
        }
        Ok(())
    }
}

impl<K, V, S> Clone for SortedMap<K, V, S>
where
    K: Clone,
    V: Clone,
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            order: self.order.clone(),
            dense: self.dense.clone(),
        }
    }
}

impl<K, V, S> fmt::Debug for SortedMap<K, V, S>
where
    K: AsRef<[u8]> + fmt::Debug,
    V: fmt::Debug,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> Extend<(K, V)> for SortedMap<K, V, S>
where
    K: AsRef<[u8]>,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.put(k, v);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for SortedMap<K, V, S>
where
    K: AsRef<[u8]>,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut m = Self::with_order(S::default());
        m.extend(iter);
        m
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::hash::Hasher;

    #[derive(Clone, Default)]
    struct ConstOrder;
    struct ConstHasher;
    impl BuildHasher for ConstOrder {
        type Hasher = ConstHasher;
        fn build_hasher(&self) -> Self::Hasher {
            ConstHasher
        }
    }
    impl Hasher for ConstHasher {
        fn write(&mut self, _bytes: &[u8]) {}
        fn finish(&self) -> u64 {
            0
        } // every key lands in one collision run
    }

    /// Invariant: a repeated put overwrites in place and does not grow len.
    #[test]
    fn duplicate_put_overwrites() {
        let mut m: SortedMap<[u8; 4], i32> = SortedMap::new();
        let first = m.put(*b"abcd", 1);
        assert!(first.is_inserted());
        let second = m.put(*b"abcd", 2);
        assert_eq!(
            second,
            Put::Replaced {
                index: first.index(),
                old: 1
            }
        );
        assert_eq!(m.len(), 1);
        assert_eq!(m.get(b"abcd"), Some(&2));
    }

    /// Invariant: `index_for_key` on an absent key is `None`, never a stale slot.
    #[test]
    fn absent_key_not_found() {
        let mut m: SortedMap<[u8; 4], i32> = SortedMap::new();
        assert_eq!(m.index_for_key(b"none"), None);
        m.put(*b"some", 1);
        assert_eq!(m.index_for_key(b"none"), None);
        assert!(m.contains_key(b"some"));
        assert!(!m.contains_key(&b"some"[..3]));
    }

    /// Invariant: entries are ordered by (order value, bytes) after mixed ops.
    #[test]
    fn stays_sorted_after_mixed_ops() {
        let mut m: SortedMap<[u8; 2], u16> = SortedMap::new();
        for i in (0u16..200).rev() {
            m.put(i.to_be_bytes(), i);
        }
        for i in (0u16..200).step_by(3) {
            assert!(m.remove_key(&i.to_be_bytes()).is_some());
        }
        m.check_invariants().unwrap();
        for i in 0u16..200 {
            assert_eq!(m.get(&i.to_be_bytes()).is_some(), i % 3 != 0);
        }
    }

    /// Invariant: colliding order values fall back to byte comparison, and
    /// every colliding key stays independently retrievable.
    #[test]
    fn collisions_resolve_by_bytes() {
        let mut m: SortedMap<Vec<u8>, i32, ConstOrder> = SortedMap::with_order(ConstOrder);
        m.put(b"b".to_vec(), 2);
        m.put(b"c".to_vec(), 3);
        m.put(b"a".to_vec(), 1);
        assert_eq!(m.keys(), &[b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
        assert_eq!(m.get(b"b"), Some(&2));
        assert_eq!(m.index_for_key(b"bb"), None);
        m.remove(1);
        assert_eq!(m.get(b"c"), Some(&3));
        m.check_invariants().unwrap();
    }

    /// Invariant: removing with an out-of-range index panics rather than
    /// corrupting the table.
    #[test]
    #[should_panic(expected = "out of range")]
    fn remove_out_of_range_panics() {
        let mut m: SortedMap<[u8; 1], ()> = SortedMap::new();
        m.put([1], ());
        m.remove(1);
    }

    /// Invariant: capacity follows the growth policy and never drops below len.
    #[test]
    fn capacity_grows_by_doubling() {
        let mut m: SortedMap<[u8; 4], u32> = SortedMap::with_capacity(3);
        assert_eq!(m.capacity(), 8);
        for i in 0u32..9 {
            m.put(i.to_le_bytes(), i);
        }
        assert_eq!(m.capacity(), 16);
        assert!(m.len() <= m.capacity());
    }

    /// Invariant: `iter_mut` edits are visible through lookups and `iter`
    /// visits entries in storage order.
    #[test]
    fn iteration_follows_storage_order() {
        let mut m: SortedMap<[u8; 1], u32> =
            [([3], 30), ([1], 10), ([2], 20)].into_iter().collect();
        for (_, v) in m.iter_mut() {
            *v += 1;
        }
        let from_iter: Vec<_> = m.iter().map(|(k, _)| *k).collect();
        assert_eq!(from_iter, m.keys().to_vec());
        assert_eq!(m.get(&[2u8]), Some(&21));
        assert_eq!(m.iter().rev().count(), 3);
    }
}
