//! Append-only output buffer with hybrid inline/heap storage.
//!
//! Layout: an inline region of up to `N` elements (never spilled by itself),
//! followed by at most [`MAX_SEGMENTS`] heap segments. Segment capacities
//! double each time; the last one may be clipped to the hard bound. Logical
//! order is inline region first, then segments in allocation order.

use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;
use spanpipe_core::config::DEFAULT_FIRST_SEGMENT_LEN;
use spanpipe_core::pool::SegmentPool;
use spanpipe_planner::CapacityPlan;

use crate::error::{Error, Result};
use crate::segment::Segment;

/// Maximum number of heap segments one buffer may allocate.
pub const MAX_SEGMENTS: usize = 30;

/// Default physical size of the inline region, in elements.
pub const DEFAULT_INLINE: usize = 64;

/// Largest inline region, in bytes, that callers should place on the stack.
/// Inline arrays are moved by value through sink chains, so large element
/// types must take the heap path instead.
pub const MAX_INLINE_BYTES: usize = 8 * 1024;

/// Whether `slots` inline values of `T` stay within [`MAX_INLINE_BYTES`].
pub const fn inline_fits<T>(slots: usize) -> bool {
    slots.saturating_mul(std::mem::size_of::<T>()) <= MAX_INLINE_BYTES
}

pub struct GrowableBuffer<'p, T, const N: usize = DEFAULT_INLINE> {
    inline: SmallVec<[T; N]>,
    /// Usable part of `inline`; always `<= N`.
    inline_capacity: usize,
    segments: SmallVec<[Segment<'p, T>; 4]>,
    pool: Option<&'p dyn SegmentPool<T>>,
    hard_bound: Option<usize>,
    first_segment_len: usize,
    len: usize,
    spilled: bool,
}

impl<'p, T, const N: usize> Default for GrowableBuffer<'p, T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'p, T, const N: usize> GrowableBuffer<'p, T, N> {
    /// An unbounded buffer in heap mode (no inline reservation, no pool).
    pub fn new() -> Self {
        Self {
            inline: SmallVec::new(),
            inline_capacity: 0,
            segments: SmallVec::new(),
            pool: None,
            hard_bound: None,
            first_segment_len: DEFAULT_FIRST_SEGMENT_LEN,
            len: 0,
            spilled: false,
        }
    }

    /// Build a buffer from a capacity plan. Inline capacity is clipped to `N`.
    pub fn from_plan(plan: &CapacityPlan, pool: Option<&'p dyn SegmentPool<T>>) -> Self {
        let mut buf = Self::new().with_inline_capacity(plan.inline_capacity());
        buf.pool = pool;
        buf.hard_bound = plan.hard_bound;
        buf
    }

    pub fn with_inline_capacity(mut self, capacity: usize) -> Self {
        self.inline_capacity = capacity.min(N);
        self
    }

    pub fn with_pool(mut self, pool: &'p dyn SegmentPool<T>) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn with_hard_bound(mut self, bound: usize) -> Self {
        self.hard_bound = Some(bound);
        self
    }

    pub fn with_first_segment_len(mut self, len: usize) -> Self {
        self.first_segment_len = len.max(1);
        self
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True once any element lives on the heap.
    pub fn is_spilled(&self) -> bool {
        self.spilled
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn inline_capacity(&self) -> usize {
        self.inline_capacity
    }

    pub fn hard_bound(&self) -> Option<usize> {
        self.hard_bound
    }

    /// Append one element. Amortized O(1).
    ///
    /// Fails with [`Error::BoundsExceeded`] when the hard bound is already
    /// reached; nothing is written in that case.
    pub fn add(&mut self, value: T) -> Result<()> {
        if let Some(bound) = self.hard_bound {
            if self.len >= bound {
                return Err(Error::BoundsExceeded {
                    bound,
                    attempted: self.len + 1,
                });
            }
        }

        if !self.spilled && self.inline.len() < self.inline_capacity {
            self.inline.push(value);
        } else {
            let needs_segment = self.segments.last().map_or(true, Segment::is_full);
            if needs_segment {
                self.grow()?;
            }
            if let Some(tail) = self.segments.last_mut() {
                tail.push(value);
            }
        }

        self.len += 1;
        Ok(())
    }

    fn grow(&mut self) -> Result<()> {
        if self.segments.len() >= MAX_SEGMENTS {
            return Err(Error::SegmentLimit { max: MAX_SEGMENTS });
        }

        let mut next = match self.segments.last() {
            Some(tail) => tail.capacity().saturating_mul(2),
            None => self
                .first_segment_len
                .max(self.inline_capacity.saturating_mul(2)),
        };
        if let Some(bound) = self.hard_bound {
            // `add` already rejected a full buffer, so this stays > 0.
            next = next.min(bound - self.len);
        }

        #[cfg(feature = "tracing")]
        if !self.spilled {
            tracing::debug!(
                len = self.len,
                inline_capacity = self.inline_capacity,
                segment_len = next,
                pooled = self.pool.is_some(),
                "buffer spilled to heap"
            );
        }

        self.segments.push(Segment::acquire(self.pool, next));
        self.spilled = true;
        Ok(())
    }

    /// Materialize an exact-length `Vec`, inline region first, then segments
    /// in allocation order. Pooled segments go back to the pool on return.
    pub fn into_vec(mut self) -> Vec<T> {
        if self.len == 0 {
            return Vec::new();
        }

        let mut out = Vec::with_capacity(self.len);
        out.extend(self.inline.drain(..));
        for segment in self.segments.iter_mut() {
            segment.drain_into(&mut out);
        }
        debug_assert_eq!(out.len(), self.len);
        out
    }

    /// Same contents as [`GrowableBuffer::into_vec`], as an immutable shared
    /// slice.
    ///
    /// When everything sits in one heap segment the segment drains straight
    /// into the `Arc` allocation. Other layouts go through one exact-length
    /// `Vec` first, which costs a second allocation and copy.
    pub fn into_immutable(mut self) -> Arc<[T]> {
        if self.inline.is_empty() && self.segments.len() == 1 {
            if let Some(segment) = self.segments.first_mut() {
                return segment.drain().collect();
            }
        }
        Arc::from(self.into_vec())
    }
}

impl<T, const N: usize> fmt::Debug for GrowableBuffer<'_, T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrowableBuffer")
            .field("len", &self.len)
            .field("inline_capacity", &self.inline_capacity)
            .field("segments", &self.segments)
            .field("hard_bound", &self.hard_bound)
            .field("spilled", &self.spilled)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::VecPool;
    use spanpipe_planner::{CapacityPlanner, StorageMode};

    #[test]
    fn empty_buffer_allocates_nothing() {
        let pool: VecPool<u32> = VecPool::new();
        let buf: GrowableBuffer<'_, u32> = GrowableBuffer::new().with_pool(pool.as_pool());
        assert_eq!(buf.segment_count(), 0);
        assert!(buf.into_vec().is_empty());
        assert_eq!(pool.stats().rented, 0);
    }

    #[test]
    fn accumulates_in_call_order_across_segments() {
        let mut buf: GrowableBuffer<'_, usize, 8> = GrowableBuffer::new()
            .with_inline_capacity(4)
            .with_first_segment_len(2);
        for i in 0..100 {
            buf.add(i).unwrap();
        }
        assert!(buf.is_spilled());
        assert_eq!(buf.len(), 100);
        assert_eq!(buf.into_vec(), (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn segments_double_and_clip_to_bound() {
        let mut buf: GrowableBuffer<'_, u8, 4> = GrowableBuffer::new()
            .with_inline_capacity(4)
            .with_hard_bound(30);
        for i in 0..30 {
            buf.add(i).unwrap();
        }
        // inline 4, then 16 (max(16, 8)), then min(32, 10) = 10.
        let caps: Vec<usize> = buf.segments.iter().map(Segment::capacity).collect();
        assert_eq!(caps, vec![16, 10]);
        assert_eq!(buf.into_vec(), (0..30).collect::<Vec<u8>>());
    }

    #[test]
    fn inline_capacity_clipped_to_physical_size() {
        let buf: GrowableBuffer<'_, u8, 4> = GrowableBuffer::new().with_inline_capacity(100);
        assert_eq!(buf.inline_capacity(), 4);
    }

    #[test]
    fn bound_plus_one_faults_without_truncating() {
        let mut buf: GrowableBuffer<'_, i32> = GrowableBuffer::new().with_hard_bound(3);
        for i in 0..3 {
            buf.add(i).unwrap();
        }
        let err = buf.add(99).unwrap_err();
        assert_eq!(
            err,
            Error::BoundsExceeded {
                bound: 3,
                attempted: 4
            }
        );
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.into_vec(), vec![0, 1, 2]);
    }

    #[test]
    fn zero_bound_rejects_first_add() {
        let mut buf: GrowableBuffer<'_, i32> = GrowableBuffer::new().with_hard_bound(0);
        assert!(matches!(
            buf.add(1),
            Err(Error::BoundsExceeded { bound: 0, .. })
        ));
    }

    #[test]
    fn inline_plan_stays_off_the_heap() {
        let pool: VecPool<u16> = VecPool::new();
        let plan = CapacityPlanner::new(DEFAULT_INLINE).plan(Some(10));
        assert_eq!(plan.mode, StorageMode::Inline { capacity: 17 });

        let mut buf: GrowableBuffer<'_, u16> = GrowableBuffer::from_plan(&plan, Some(pool.as_pool()));
        for i in 0..10 {
            buf.add(i).unwrap();
        }
        assert!(!buf.is_spilled());
        assert_eq!(buf.into_vec(), (0..10).collect::<Vec<_>>());
        assert_eq!(pool.stats().rented, 0);
    }

    #[test]
    fn pooled_segments_return_on_drop_and_into_vec() {
        let pool: VecPool<String> = VecPool::new();
        {
            let mut buf: GrowableBuffer<'_, String> =
                GrowableBuffer::new().with_pool(pool.as_pool());
            for i in 0..50 {
                buf.add(i.to_string()).unwrap();
            }
            assert!(pool.outstanding() > 0);
            // dropped without materializing
        }
        assert_eq!(pool.outstanding(), 0);

        let mut buf: GrowableBuffer<'_, String> = GrowableBuffer::new().with_pool(pool.as_pool());
        for i in 0..50 {
            buf.add(i.to_string()).unwrap();
        }
        let out = buf.into_vec();
        assert_eq!(out.len(), 50);
        assert_eq!(out[49], "49");
        assert_eq!(pool.outstanding(), 0);
        assert!(pool.stats().reused > 0);
    }

    #[test]
    fn segment_limit_is_enforced() {
        let mut buf: GrowableBuffer<'_, u8, 1> = GrowableBuffer::new().with_first_segment_len(1);
        // Segments of 1, 2, 4, ... never run out before 2^30 elements, so
        // force the limit by filling the segment list directly.
        for _ in 0..MAX_SEGMENTS {
            buf.segments.push(Segment::acquire(None, 0));
        }
        assert_eq!(buf.add(1), Err(Error::SegmentLimit { max: MAX_SEGMENTS }));
    }

    #[test]
    fn immutable_output_matches_vec() {
        let mut buf: GrowableBuffer<'_, char, 2> = GrowableBuffer::new().with_inline_capacity(2);
        for c in "hello".chars() {
            buf.add(c).unwrap();
        }
        let out = buf.into_immutable();
        assert_eq!(&*out, &['h', 'e', 'l', 'l', 'o']);
    }

    #[test]
    fn single_segment_drains_into_shared_slice() {
        let pool: VecPool<u32> = VecPool::new();
        let mut buf: GrowableBuffer<'_, u32, 0> = GrowableBuffer::new()
            .with_hard_bound(20)
            .with_first_segment_len(32)
            .with_pool(pool.as_pool());
        for i in 0..20 {
            buf.add(i).unwrap();
        }
        assert_eq!(buf.segment_count(), 1);

        let out = buf.into_immutable();
        assert_eq!(&out[..], &(0..20).collect::<Vec<_>>()[..]);
        assert_eq!(pool.outstanding(), 0);
        // The drained segment keeps its capacity for the next rent.
        assert_eq!(pool.free_len(), 1);
        assert_eq!(pool.stats().reused, 0);
        let again = pool.as_pool().rent(20);
        assert!(again.capacity() >= 20);
        assert_eq!(pool.stats().reused, 1);
        pool.as_pool().give_back(again);
    }

    #[test]
    fn inline_fits_caps_bytes_not_slots() {
        assert!(inline_fits::<u64>(DEFAULT_INLINE));
        assert!(inline_fits::<u8>(MAX_INLINE_BYTES));
        assert!(!inline_fits::<[u64; 512]>(1));
        assert!(inline_fits::<[u64; 512]>(0));
    }
}
