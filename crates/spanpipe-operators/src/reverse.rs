//! Reverse: a buffered stage that must see all of its input before emitting.
//!
//! Strategy is picked per call from the upstream size hint:
//! - bound `<=` inline threshold and the slot array fits
//!   [`MAX_INLINE_BYTES`](spanpipe_mem::MAX_INLINE_BYTES): fill inline slots back to front, so the filled
//!   tail is already reversed, then replay it downstream;
//! - otherwise (or bound unknown): materialize through a pooled
//!   [`ToVec`](crate::collect::ToVec), reverse in place, replay.
//!
//! Both paths emit the same sequence; the threshold only moves bytes. The
//! prior always runs, so an under-reported bound faults on either path.

use std::iter::{Flatten, Skip};

use smallvec::SmallVec;
use spanpipe_core::config::{DEFAULT_FIRST_SEGMENT_LEN, DEFAULT_REVERSE_INLINE};
use spanpipe_core::{PipelineConfig, SegmentPool, SizeHint};
use spanpipe_mem::inline_fits;

use crate::collect::ToVec;
use crate::engine;
use crate::traits::{Flow, Node, OpError, Sink};

/// Largest number of inline slots `Reverse` can use. Thresholds above this
/// are clipped.
pub const REVERSE_INLINE: usize = 256;

const SMALL_SLOTS: usize = 16;
const MEDIUM_SLOTS: usize = 64;

/// Inline slot arrays, smallest first. The smallest one covering the bound
/// is used, so the stack footprint follows the threshold.
const SLOT_TIERS: [usize; 3] = [SMALL_SLOTS, MEDIUM_SLOTS, REVERSE_INLINE];

pub struct ReverseOptions<'p, T> {
    /// Largest upstream bound buffered inline; `None` always materializes.
    pub inline_threshold: Option<usize>,
    /// Pool for the materialize path.
    pub pool: Option<&'p dyn SegmentPool<T>>,
    pub first_segment_len: usize,
}

impl<T> Default for ReverseOptions<'_, T> {
    fn default() -> Self {
        Self {
            inline_threshold: Some(DEFAULT_REVERSE_INLINE),
            pool: None,
            first_segment_len: DEFAULT_FIRST_SEGMENT_LEN,
        }
    }
}

impl<T> Clone for ReverseOptions<'_, T> {
    fn clone(&self) -> Self {
        Self {
            inline_threshold: self.inline_threshold,
            pool: self.pool,
            first_segment_len: self.first_segment_len,
        }
    }
}

impl<'p, T> ReverseOptions<'p, T> {
    pub fn from_config(cfg: &PipelineConfig) -> Result<Self, OpError> {
        cfg.validate()?;
        Ok(Self {
            inline_threshold: cfg.reverse_inline_threshold,
            pool: None,
            first_segment_len: cfg.first_segment_len,
        })
    }

    pub fn with_inline_threshold(mut self, threshold: Option<usize>) -> Self {
        self.inline_threshold = threshold;
        self
    }

    pub fn with_pool(mut self, pool: &'p dyn SegmentPool<T>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Effective threshold after clipping to the inline slot count.
    pub fn effective_threshold(&self) -> usize {
        self.inline_threshold.unwrap_or(0).min(REVERSE_INLINE)
    }

    /// Inline slot count for an upstream bound of `upper`, or `None` when the
    /// materialize path is taken.
    pub fn inline_slots(&self, upper: Option<usize>) -> Option<usize> {
        let upper = upper?;
        if self.inline_threshold.is_none() || upper > self.effective_threshold() {
            return None;
        }
        SLOT_TIERS
            .into_iter()
            .find(|&slots| upper <= slots && inline_fits::<Option<T>>(slots))
    }
}

pub struct Reverse<'p, Pr: Node> {
    prior: Pr,
    options: ReverseOptions<'p, Pr::Item>,
}

impl<'p, Pr: Node> Reverse<'p, Pr> {
    pub fn new(prior: Pr, options: ReverseOptions<'p, Pr::Item>) -> Self {
        Self { prior, options }
    }

    pub fn options(&self) -> &ReverseOptions<'p, Pr::Item> {
        &self.options
    }

    /// Whether a source of `source_len` elements takes the inline path.
    pub fn buffers_inline(&self, source_len: usize) -> bool {
        self.options
            .inline_slots(self.prior.size_hint(source_len).upper)
            .is_some()
    }

    // Each strategy gets its own frame so the slot array is only on the
    // stack when that path actually runs.
    #[inline(never)]
    fn reverse_inline<S, const N: usize>(
        &self,
        view: &[Pr::Source],
        bound: usize,
        mut sink: S,
    ) -> Result<S::Output, OpError>
    where
        S: Sink<Pr::Item>,
    {
        #[cfg(feature = "tracing")]
        tracing::debug!(bound, slots = N, "reverse: inline slots");

        let reversed = self
            .prior
            .execute(view, InlineReverseSink::<_, N>::with_bound(bound))?;
        engine::run_owned(reversed, &mut sink)?;
        sink.finish()
    }

    #[inline(never)]
    fn reverse_materialized<S>(
        &self,
        view: &[Pr::Source],
        bound: Option<usize>,
        mut sink: S,
    ) -> Result<S::Output, OpError>
    where
        S: Sink<Pr::Item>,
    {
        #[cfg(feature = "tracing")]
        tracing::debug!(bound = ?bound, "reverse: materialize and reverse");

        let collector: ToVec<'_, Pr::Item, 0> =
            ToVec::heap(bound, self.options.pool, self.options.first_segment_len);
        let mut items = self.prior.execute(view, collector)?;
        items.reverse();
        engine::run_owned(items, &mut sink)?;
        sink.finish()
    }
}

impl<Pr: Node + Clone> Clone for Reverse<'_, Pr> {
    fn clone(&self) -> Self {
        Self {
            prior: self.prior.clone(),
            options: self.options.clone(),
        }
    }
}

impl<Pr: Node> Node for Reverse<'_, Pr> {
    type Source = Pr::Source;
    type Item = Pr::Item;

    fn size_hint(&self, source_len: usize) -> SizeHint {
        self.prior.size_hint(source_len)
    }

    fn execute<S>(&self, view: &[Self::Source], sink: S) -> Result<S::Output, OpError>
    where
        S: Sink<Self::Item>,
    {
        let upper = self.prior.size_hint(view.len()).upper;
        match (upper, self.options.inline_slots(upper)) {
            (Some(bound), Some(SMALL_SLOTS)) => {
                self.reverse_inline::<S, SMALL_SLOTS>(view, bound, sink)
            }
            (Some(bound), Some(MEDIUM_SLOTS)) => {
                self.reverse_inline::<S, MEDIUM_SLOTS>(view, bound, sink)
            }
            (Some(bound), Some(_)) => self.reverse_inline::<S, REVERSE_INLINE>(view, bound, sink),
            _ => self.reverse_materialized(view, upper, sink),
        }
    }
}

/// Writes each arriving element one slot closer to the front.
pub struct InlineReverseSink<T, const N: usize> {
    slots: SmallVec<[Option<T>; N]>,
    next: usize,
}

impl<T, const N: usize> InlineReverseSink<T, N> {
    /// `bound` must not exceed `N`, or the slots spill to the heap.
    pub fn with_bound(bound: usize) -> Self {
        debug_assert!(bound <= N);
        let mut slots = SmallVec::new();
        slots.extend(std::iter::repeat_with(|| None).take(bound));
        Self { slots, next: bound }
    }
}

impl<T, const N: usize> Sink<T> for InlineReverseSink<T, N> {
    type Output = InlineReversed<T, N>;

    #[inline]
    fn process_next(&mut self, item: T) -> Result<Flow, OpError> {
        if self.next == 0 {
            let bound = self.slots.len();
            return Err(spanpipe_mem::Error::BoundsExceeded {
                bound,
                attempted: bound + 1,
            }
            .into());
        }
        self.next -= 1;
        self.slots[self.next] = Some(item);
        Ok(Flow::Continue)
    }

    fn finish(self) -> Result<Self::Output, OpError> {
        Ok(InlineReversed {
            slots: self.slots,
            start: self.next,
        })
    }
}

/// The filled tail `slots[start..]`, already in reverse arrival order.
pub struct InlineReversed<T, const N: usize> {
    slots: SmallVec<[Option<T>; N]>,
    start: usize,
}

impl<T, const N: usize> InlineReversed<T, N> {
    pub fn len(&self) -> usize {
        self.slots.len() - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn spilled(&self) -> bool {
        self.slots.spilled()
    }
}

impl<T, const N: usize> IntoIterator for InlineReversed<T, N> {
    type Item = T;
    type IntoIter = Flatten<Skip<smallvec::IntoIter<[Option<T>; N]>>>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.into_iter().skip(self.start).flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ext::NodeExt;
    use crate::root::Root;
    use spanpipe_mem::VecPool;

    #[test]
    fn inline_sink_fills_back_to_front() {
        let mut sink: InlineReverseSink<i32, 8> = InlineReverseSink::with_bound(5);
        for i in 1..=3 {
            sink.process_next(i).unwrap();
        }
        let out = sink.finish().unwrap();
        assert_eq!(out.len(), 3);
        assert!(!out.spilled());
        assert_eq!(out.into_iter().collect::<Vec<_>>(), vec![3, 2, 1]);
    }

    #[test]
    fn inline_sink_faults_past_bound() {
        let mut sink: InlineReverseSink<i32, 4> = InlineReverseSink::with_bound(2);
        sink.process_next(1).unwrap();
        sink.process_next(2).unwrap();
        let err = sink.process_next(3).unwrap_err();
        assert!(matches!(
            err,
            OpError::Mem(spanpipe_mem::Error::BoundsExceeded {
                bound: 2,
                attempted: 3
            })
        ));
    }

    #[test]
    fn both_paths_agree_and_inline_skips_pool() {
        let data: Vec<u64> = (0..40).collect();
        let expected: Vec<u64> = (0..40).rev().collect();
        let pool: VecPool<u64> = VecPool::new();

        let inline = Root::<u64>::new()
            .reverse_with(ReverseOptions::default().with_pool(pool.as_pool()));
        assert!(inline.buffers_inline(data.len()));
        assert_eq!(inline.to_vec(&data).unwrap(), expected);
        assert_eq!(pool.stats().rented, 0);

        let heap = Root::<u64>::new().reverse_with(
            ReverseOptions::default()
                .with_inline_threshold(Some(16))
                .with_pool(pool.as_pool()),
        );
        assert!(!heap.buffers_inline(data.len()));
        assert_eq!(heap.to_vec(&data).unwrap(), expected);
        assert!(pool.stats().rented > 0);
        assert_eq!(pool.outstanding(), 0);
    }

    #[test]
    fn threshold_is_clipped_to_slot_count() {
        let opts: ReverseOptions<'_, u8> =
            ReverseOptions::default().with_inline_threshold(Some(10_000));
        assert_eq!(opts.effective_threshold(), REVERSE_INLINE);
        let none: ReverseOptions<'_, u8> = ReverseOptions::default().with_inline_threshold(None);
        assert_eq!(none.effective_threshold(), 0);
    }

    #[test]
    fn slot_tier_follows_bound_and_element_size() {
        let small: ReverseOptions<'_, u32> = ReverseOptions::default();
        assert_eq!(small.inline_slots(Some(0)), Some(16));
        assert_eq!(small.inline_slots(Some(16)), Some(16));
        assert_eq!(small.inline_slots(Some(17)), Some(64));
        assert_eq!(small.inline_slots(Some(65)), None, "above the threshold");
        assert_eq!(small.inline_slots(None), None);

        let wide: ReverseOptions<'_, [u64; 8]> =
            ReverseOptions::default().with_inline_threshold(Some(REVERSE_INLINE));
        assert_eq!(wide.inline_slots(Some(50)), Some(64));
        assert_eq!(wide.inline_slots(Some(100)), None, "256 slots exceed the byte cap");

        let huge: ReverseOptions<'_, [u64; 512]> =
            ReverseOptions::default().with_inline_threshold(Some(4));
        assert_eq!(huge.inline_slots(Some(3)), None);

        let off: ReverseOptions<'_, u32> = ReverseOptions::default().with_inline_threshold(None);
        assert_eq!(off.inline_slots(Some(0)), None);
    }

    #[test]
    fn large_elements_reverse_on_the_heap() {
        let data: Vec<[u64; 512]> = (0..10u64).map(|i| [i; 512]).collect();
        let expected: Vec<[u64; 512]> = data.iter().rev().copied().collect();

        let reverse = Root::<[u64; 512]>::new().reverse();
        assert!(!reverse.buffers_inline(data.len()));
        assert_eq!(reverse.to_vec(&data).unwrap(), expected);

        let tight = Root::<[u64; 512]>::new()
            .reverse_with(ReverseOptions::default().with_inline_threshold(Some(4)));
        assert_eq!(tight.to_vec(&data[..3]).unwrap(), expected[7..].to_vec());
    }

    #[test]
    fn zero_bound_still_runs_the_prior() {
        let mut sink: InlineReverseSink<u8, 16> = InlineReverseSink::with_bound(0);
        let err = sink.process_next(7).unwrap_err();
        assert!(matches!(
            err,
            OpError::Mem(spanpipe_mem::Error::BoundsExceeded {
                bound: 0,
                attempted: 1
            })
        ));
    }
}
