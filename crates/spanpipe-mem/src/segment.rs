//! RAII heap segment.
//!
//! A `Segment` owns one heap vector for a `GrowableBuffer`. When it came from a
//! pool, dropping the segment gives the vector back (panic-safe). Segments
//! allocated without a pool are freed normally.

use std::fmt;

use spanpipe_core::pool::SegmentPool;

pub struct Segment<'p, T> {
    items: Vec<T>,
    /// Logical capacity; pools may hand out more room than this.
    capacity: usize,
    pool: Option<&'p dyn SegmentPool<T>>,
}

impl<'p, T> Segment<'p, T> {
    /// Rent from `pool` (or allocate) a segment holding `capacity` elements.
    pub fn acquire(pool: Option<&'p dyn SegmentPool<T>>, capacity: usize) -> Self {
        let items = match pool {
            Some(pool) => pool.rent(capacity),
            None => Vec::with_capacity(capacity),
        };
        Self {
            items,
            capacity,
            pool,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    pub fn is_pooled(&self) -> bool {
        self.pool.is_some()
    }

    /// Append `value`; the caller checks `is_full` first.
    pub(crate) fn push(&mut self, value: T) {
        debug_assert!(!self.is_full());
        self.items.push(value);
    }

    /// Drain the filled portion, keeping the allocation for the pool.
    pub(crate) fn drain(&mut self) -> std::vec::Drain<'_, T> {
        self.items.drain(..)
    }

    /// Move the filled portion into `out`, leaving the segment empty.
    pub(crate) fn drain_into(&mut self, out: &mut Vec<T>) {
        out.extend(self.items.drain(..));
    }
}

impl<T> Drop for Segment<'_, T> {
    fn drop(&mut self) {
        if let Some(pool) = self.pool.take() {
            pool.give_back(std::mem::take(&mut self.items));
        }
    }
}

impl<T> fmt::Debug for Segment<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Segment")
            .field("len", &self.items.len())
            .field("capacity", &self.capacity)
            .field("pooled", &self.pool.is_some())
            .finish()
    }
}
