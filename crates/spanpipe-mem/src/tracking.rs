//! Lightweight rent/return accounting for segment pools.
//!
//! Keep this cheap: plain atomics, no locking. Tests use the snapshot to prove
//! that every rented segment came back.

use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PoolStats {
    pub rented: usize,
    pub returned: usize,
    /// Segments rented and not yet returned.
    pub outstanding: usize,
    /// Highest `outstanding` ever observed.
    pub peak_outstanding: usize,
    /// Rent requests served from the free list instead of a fresh allocation.
    pub reused: usize,
}

#[derive(Default)]
pub struct SegmentTracker {
    rented: AtomicUsize,
    returned: AtomicUsize,
    outstanding: AtomicUsize,
    peak_outstanding: AtomicUsize,
    reused: AtomicUsize,
}

impl SegmentTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_rent(&self, reused: bool) {
        self.rented.fetch_add(1, Ordering::Relaxed);
        if reused {
            self.reused.fetch_add(1, Ordering::Relaxed);
        }
        let now = self.outstanding.fetch_add(1, Ordering::AcqRel) + 1;
        self.record_peak(now);
    }

    pub fn record_return(&self) {
        self.returned.fetch_add(1, Ordering::Relaxed);
        self.outstanding.fetch_sub(1, Ordering::AcqRel);
    }

    /// Updates the peak if `outstanding` is higher.
    fn record_peak(&self, outstanding: usize) {
        let mut cur = self.peak_outstanding.load(Ordering::Relaxed);
        while outstanding > cur {
            match self.peak_outstanding.compare_exchange(
                cur,
                outstanding,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(observed) => cur = observed,
            }
        }
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> PoolStats {
        PoolStats {
            rented: self.rented.load(Ordering::Relaxed),
            returned: self.returned.load(Ordering::Relaxed),
            outstanding: self.outstanding.load(Ordering::Relaxed),
            peak_outstanding: self.peak_outstanding.load(Ordering::Relaxed),
            reused: self.reused.load(Ordering::Relaxed),
        }
    }
}
