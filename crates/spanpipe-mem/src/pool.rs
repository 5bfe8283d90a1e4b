//! Reusable segment pool.
//!
//! A `Mutex`-guarded free list of emptied vectors plus rent/return counters.
//! Pools are shared across calls (and threads); pipelines themselves never
//! hold the lock while running user code.

use std::sync::{Mutex, MutexGuard};

use spanpipe_core::pool::SegmentPool;

use crate::tracking::{PoolStats, SegmentTracker};

/// Default number of free segments a pool keeps around.
pub const DEFAULT_MAX_RETAINED: usize = 16;

pub struct VecPool<T> {
    free: Mutex<Vec<Vec<T>>>,
    max_retained: usize,
    tracker: SegmentTracker,
}

impl<T> Default for VecPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> VecPool<T> {
    pub fn new() -> Self {
        Self::with_max_retained(DEFAULT_MAX_RETAINED)
    }

    /// Create a pool that keeps at most `max_retained` free segments. Extra
    /// segments handed back are simply dropped.
    pub fn with_max_retained(max_retained: usize) -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            max_retained,
            tracker: SegmentTracker::new(),
        }
    }

    /// This pool as the trait object buffers and operators accept.
    pub fn as_pool(&self) -> &dyn SegmentPool<T> {
        self
    }

    pub fn stats(&self) -> PoolStats {
        self.tracker.snapshot()
    }

    /// Segments currently rented out.
    pub fn outstanding(&self) -> usize {
        self.tracker.outstanding()
    }

    /// Number of free segments ready for reuse.
    pub fn free_len(&self) -> usize {
        self.lock().len()
    }

    // A poisoned lock only means another thread panicked mid-push; the free
    // list itself is still a valid Vec.
    fn lock(&self) -> MutexGuard<'_, Vec<Vec<T>>> {
        self.free.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<T> SegmentPool<T> for VecPool<T> {
    fn rent(&self, min_len: usize) -> Vec<T> {
        let reused = {
            let mut free = self.lock();
            free.iter()
                .position(|v| v.capacity() >= min_len)
                .map(|idx| free.swap_remove(idx))
        };
        self.tracker.record_rent(reused.is_some());

        #[cfg(feature = "tracing")]
        tracing::trace!(min_len, reused = reused.is_some(), "segment rent");

        reused.unwrap_or_else(|| Vec::with_capacity(min_len))
    }

    fn give_back(&self, mut segment: Vec<T>) {
        segment.clear();
        self.tracker.record_return();

        #[cfg(feature = "tracing")]
        tracing::trace!(capacity = segment.capacity(), "segment return");

        let mut free = self.lock();
        if free.len() < self.max_retained {
            free.push(segment);
        }
    }
}
