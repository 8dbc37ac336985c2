//! HandleMap: SortedMap plus monotonic handles that survive entries moving.
//!
//! Each stored value carries the handle it was issued, so the handle column
//! shifts in lockstep with keys and values. A secondary index maps every
//! live handle to its current physical position and is refreshed for the
//! shifted suffix after each insert or remove.

use crate::error::{InvariantError, MapError};
use crate::order::DefaultOrder;
use crate::sorted_map::{Put, SortedMap};
use core::fmt;
use core::hash::BuildHasher;
use hashbrown::HashMap;
use tracing::trace;

/// Durable identifier for one logical entry.
///
/// Issued on insert as one more than the highest handle the map has ever
/// issued, and never reused. It stops resolving once its entry is removed.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Handle(u32);

impl Handle {
    /// Raw handle value.
    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }

    pub fn key<'a, K, V, S>(&self, map: &'a HandleMap<K, V, S>) -> Option<&'a K>
    where
        K: AsRef<[u8]>,
        S: BuildHasher,
    {
        map.key_at(map.index_for_handle(*self)?)
    }

    pub fn value<'a, K, V, S>(&self, map: &'a HandleMap<K, V, S>) -> Option<&'a V>
    where
        K: AsRef<[u8]>,
        S: BuildHasher,
    {
        map.value_at(map.index_for_handle(*self)?)
    }

    pub fn value_mut<'a, K, V, S>(&self, map: &'a mut HandleMap<K, V, S>) -> Option<&'a mut V>
    where
        K: AsRef<[u8]>,
        S: BuildHasher,
    {
        let i = map.index_for_handle(*self)?;
        map.value_at_mut(i)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Tagged<V> {
    handle: Handle,
    value: V,
}

pub struct HandleMap<K, V, S = DefaultOrder> {
    inner: SortedMap<K, Tagged<V>, S>,
    positions: HashMap<Handle, usize>,
    last_handle: u32,
}

impl<K, V> HandleMap<K, V>
where
    K: AsRef<[u8]>,
{
    pub fn new() -> Self {
        Self::with_order(Default::default())
    }

    pub fn with_capacity(hint: usize) -> Self {
        Self::with_capacity_and_order(hint, Default::default())
    }
}

impl<K, V> Default for HandleMap<K, V>
where
    K: AsRef<[u8]>,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over `(handle, key, value)` in storage order.
pub struct Iter<'a, K, V> {
    it: crate::sorted_map::Iter<'a, K, Tagged<V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (Handle, &'a K, &'a V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(k, t)| (t.handle, k, &t.value))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// Iterator over `(handle, key, mutable value)` in storage order.
pub struct IterMut<'a, K, V> {
    it: crate::sorted_map::IterMut<'a, K, Tagged<V>>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (Handle, &'a K, &'a mut V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(k, t)| (t.handle, k, &mut t.value))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

impl<K, V, S> HandleMap<K, V, S>
where
    K: AsRef<[u8]>,
    S: BuildHasher,
{
    pub fn with_order(order: S) -> Self {
        Self {
            inner: SortedMap::with_order(order),
            positions: HashMap::new(),
            last_handle: 0,
        }
    }

    pub fn with_capacity_and_order(hint: usize, order: S) -> Self {
        Self {
            inner: SortedMap::with_capacity_and_order(hint, order),
            positions: HashMap::with_capacity(hint),
            last_handle: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    /// Highest handle value issued so far; 0 before the first insert.
    pub fn last_handle(&self) -> u32 {
        self.last_handle
    }

    pub fn keys(&self) -> &[K] {
        self.inner.keys()
    }

    pub fn index_for_key<Q>(&self, key: &Q) -> Option<usize>
    where
        Q: AsRef<[u8]> + ?Sized,
    {
        self.inner.index_for_key(key)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        Q: AsRef<[u8]> + ?Sized,
    {
        self.inner.contains_key(key)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        Q: AsRef<[u8]> + ?Sized,
    {
        self.inner.get(key).map(|t| &t.value)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        Q: AsRef<[u8]> + ?Sized,
    {
        self.inner.get_mut(key).map(|t| &mut t.value)
    }

    pub fn key_at(&self, index: usize) -> Option<&K> {
        self.inner.key_at(index)
    }

    pub fn value_at(&self, index: usize) -> Option<&V> {
        self.inner.value_at(index).map(|t| &t.value)
    }

    pub fn value_at_mut(&mut self, index: usize) -> Option<&mut V> {
        self.inner.value_at_mut(index).map(|t| &mut t.value)
    }

    /// Handle of the entry currently at `index`.
    #[inline]
    pub fn handle_for_index(&self, index: usize) -> Option<Handle> {
        self.inner.value_at(index).map(|t| t.handle)
    }

    /// Current physical index of the entry `handle` was issued to, or `None`
    /// once that entry has been removed.
    #[inline]
    pub fn index_for_handle(&self, handle: Handle) -> Option<usize> {
        self.positions.get(&handle).copied()
    }

    pub fn handle_for_key<Q>(&self, key: &Q) -> Option<Handle>
    where
        Q: AsRef<[u8]> + ?Sized,
    {
        self.inner.get(key).map(|t| t.handle)
    }

    /// Insert `key` with a fresh handle, or overwrite the value of an
    /// existing entry, which keeps its handle.
    ///
    /// Panics if growth fails or the handle space is exhausted.
    pub fn put(&mut self, key: K, value: V) -> Put<V> {
        match self.try_put(key, value) {
            Ok(p) => p,
            Err(e) => panic!("{e}"),
        }
    }

    pub fn try_put(&mut self, key: K, value: V) -> Result<Put<V>, MapError> {
        let at = self.inner.locate(key.as_ref());
        let index = match at.slot {
            Ok(index) => {
                let slot = &mut self.inner.values_mut()[index].value;
                let old = core::mem::replace(slot, value);
                return Ok(Put::Replaced { index, old });
            }
            Err(index) => index,
        };
        let next = self
            .last_handle
            .checked_add(1)
            .ok_or(MapError::HandlesExhausted)?;
        let handle = Handle(next);
        self.inner
            .insert_located(index, at.order, key, Tagged { handle, value })?;
        self.last_handle = next;
        self.reindex_from(index);
        Ok(Put::Inserted { index })
    }

    /// Remove the entry at `index`; its handle is retired for good.
    ///
    /// # Panics
    ///
    /// If `index >= len()`.
    pub fn remove(&mut self, index: usize) -> (K, V) {
        let (key, tagged) = self.inner.remove(index);
        self.positions.remove(&tagged.handle);
        self.reindex_from(index);
        trace!(handle = tagged.handle.0, index, "retired handle");
        (key, tagged.value)
    }

    pub fn remove_key<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        Q: AsRef<[u8]> + ?Sized,
    {
        let i = self.inner.index_for_key(key)?;
        Some(self.remove(i))
    }

    pub fn remove_handle(&mut self, handle: Handle) -> Option<(K, V)> {
        let i = self.index_for_handle(handle)?;
        Some(self.remove(i))
    }

    /// Point every handle at or after `start` at its current slot.
    fn reindex_from(&mut self, start: usize) {
        for (offset, (_, t)) in self.inner.iter().skip(start).enumerate() {
            self.positions.insert(t.handle, start + offset);
        }
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            it: self.inner.iter(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            it: self.inner.iter_mut(),
        }
    }

    /// Sorted-storage invariants plus: every live handle is unique, nonzero,
    /// no larger than `last_handle`, and indexed at its current slot.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.inner.check_invariants()?;
        if self.positions.len() != self.len() {
            return Err(InvariantError::new(format!(
                "handle index holds {} handles for {} entries",
                self.positions.len(),
                self.len()
            )));
        }
        for (i, (h, _, _)) in self.iter().enumerate() {
            if h.0 == 0 || h.0 > self.last_handle {
                return Err(InvariantError::new(format!(
                    "handle {h} at {i} was never issued (last issued #{})",
                    self.last_handle
                )));
            }
            match self.positions.get(&h) {
                Some(&at) if at == i => {}
                other => {
                    return Err(InvariantError::new(format!(
                        "handle {h} lives at {i} but resolves to {other:?}"
                    )))
                }
            }
        }
        Ok(())
    }
}

impl<K, V, S> Clone for HandleMap<K, V, S>
where
    K: Clone,
    V: Clone,
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            positions: self.positions.clone(),
            last_handle: self.last_handle,
        }
    }
}

impl<K, V, S> fmt::Debug for HandleMap<K, V, S>
where
    K: AsRef<[u8]> + fmt::Debug,
    V: fmt::Debug,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(h, k, v)| ((h, k), v)))
            .finish()
    }
}
