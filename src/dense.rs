//! Dense storage: index-aligned columns of order values, keys and values.
//!
//! The columns are always the same length and grow together. Capacity is
//! tracked here rather than read back from the `Vec`s so that growth follows
//! one policy (minimum of `MIN_CAPACITY`, then doubling) and is observable.

use crate::error::MapError;
use tracing::trace;

/// Smallest capacity allocated on first growth.
pub const MIN_CAPACITY: usize = 8;

/// Capacity the policy picks for a table that must hold `wanted` entries.
pub(crate) fn capacity_for(wanted: usize) -> Result<usize, MapError> {
    let mut cap = 0;
    while cap < wanted {
        cap = next_capacity(cap)?;
    }
    Ok(cap)
}

#[inline]
fn next_capacity(cap: usize) -> Result<usize, MapError> {
    if cap < MIN_CAPACITY {
        Ok(MIN_CAPACITY)
    } else {
        cap.checked_mul(2).ok_or(MapError::CapacityOverflow)
    }
}

#[derive(Clone)]
pub(crate) struct Dense<K, V> {
    orders: Vec<u64>,
    keys: Vec<K>,
    values: Vec<V>,
    capacity: usize,
}

impl<K, V> Dense<K, V> {
    pub(crate) const fn new() -> Self {
        Self {
            orders: Vec::new(),
            keys: Vec::new(),
            values: Vec::new(),
            capacity: 0,
        }
    }

    pub(crate) fn with_capacity(hint: usize) -> Result<Self, MapError> {
        let mut d = Self::new();
        d.grow_to(capacity_for(hint)?)?;
        Ok(d)
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub(crate) fn orders(&self) -> &[u64] {
        &self.orders
    }

    #[inline]
    pub(crate) fn keys(&self) -> &[K] {
        &self.keys
    }

    #[inline]
    pub(crate) fn values(&self) -> &[V] {
        &self.values
    }

    #[inline]
    pub(crate) fn values_mut(&mut self) -> &mut [V] {
        &mut self.values
    }

    /// Keys read-only and values mutable at the same time.
    #[inline]
    pub(crate) fn split_mut(&mut self) -> (&[K], &mut [V]) {
        (&self.keys, &mut self.values)
    }

    /// Make sure one more entry fits, doubling if the table is full.
    pub(crate) fn reserve_one(&mut self) -> Result<(), MapError> {
        if self.len() < self.capacity {
            return Ok(());
        }
        let target = next_capacity(self.capacity)?;
        self.grow_to(target)
    }

    fn grow_to(&mut self, target: usize) -> Result<(), MapError> {
        let extra = target - self.len();
        self.orders.try_reserve_exact(extra)?;
        self.keys.try_reserve_exact(extra)?;
        self.values.try_reserve_exact(extra)?;
        trace!(from = self.capacity, to = target, len = self.len(), "grew dense storage");
        self.capacity = target;
        Ok(())
    }

    /// Open a slot at `index` by shifting the tail right, then fill it.
    pub(crate) fn insert_at(&mut self, index: usize, order: u64, key: K, value: V) {
        debug_assert!(index <= self.len(), "insert index {index} past len {}", self.len());
        debug_assert!(self.len() < self.capacity, "insert without reserved room");
        self.orders.insert(index, order);
        self.keys.insert(index, key);
        self.values.insert(index, value);
    }

    /// Close the slot at `index` by shifting the tail left.
    pub(crate) fn remove_at(&mut self, index: usize) -> (K, V) {
        debug_assert!(index < self.len());
        self.orders.remove(index);
        (self.keys.remove(index), self.values.remove(index))
    }

    /// Every column has the same length and fits the tracked capacity.
    pub(crate) fn columns_aligned(&self) -> bool {
        self.orders.len() == self.keys.len()
            && self.keys.len() == self.values.len()
            && self.keys.len() <= self.capacity
    }
}
