//! Terminal collectors: materialize a pipeline into a `Vec` or `Arc<[T]>`.
//!
//! Collectors own a [`GrowableBuffer`] sized by the capacity planner before the
//! pipeline runs: inline when the upstream bound fits the inline budget, pooled
//! heap segments otherwise. A known upstream bound is always installed as the
//! buffer's hard bound.
//!
//! The physical inline region is a const parameter of the collector. The
//! runners below only pick the inline-capable collector when its region fits
//! [`MAX_INLINE_BYTES`](spanpipe_mem::MAX_INLINE_BYTES); large element types
//! collect through heap segments from the start.

use std::sync::Arc;

use spanpipe_core::config::{DEFAULT_FIRST_SEGMENT_LEN, DEFAULT_INLINE_BUDGET};
use spanpipe_core::{PipelineConfig, SegmentPool, SizeHint};
use spanpipe_mem::{inline_fits, GrowableBuffer, DEFAULT_INLINE};
use spanpipe_planner::{CapacityPlan, CapacityPlanner};

use crate::engine;
use crate::traits::{Flow, Node, OpError, Sink};

pub struct CollectOptions<'p, T> {
    /// Largest upstream bound that may be collected inline.
    pub inline_budget: Option<usize>,
    /// Pool for heap segments; plain allocation when `None`.
    pub pool: Option<&'p dyn SegmentPool<T>>,
    pub planner: CapacityPlanner,
    pub first_segment_len: usize,
}

impl<T> Default for CollectOptions<'_, T> {
    fn default() -> Self {
        Self {
            inline_budget: Some(DEFAULT_INLINE_BUDGET),
            pool: None,
            planner: CapacityPlanner::new(DEFAULT_INLINE),
            first_segment_len: DEFAULT_FIRST_SEGMENT_LEN,
        }
    }
}

impl<T> Clone for CollectOptions<'_, T> {
    fn clone(&self) -> Self {
        Self {
            inline_budget: self.inline_budget,
            pool: self.pool,
            planner: self.planner,
            first_segment_len: self.first_segment_len,
        }
    }
}

impl<'p, T> CollectOptions<'p, T> {
    pub fn from_config(cfg: &PipelineConfig) -> Result<Self, OpError> {
        cfg.validate()?;
        Ok(Self {
            inline_budget: cfg.inline_budget,
            pool: None,
            planner: CapacityPlanner::from_config(cfg, DEFAULT_INLINE),
            first_segment_len: cfg.first_segment_len,
        })
    }

    pub fn with_pool(mut self, pool: &'p dyn SegmentPool<T>) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn with_inline_budget(mut self, budget: Option<usize>) -> Self {
        self.inline_budget = budget;
        self
    }

    /// Whether a collector with `N` inline slots may be used: inline
    /// collection is enabled and `N` values of `T` fit the inline byte cap.
    pub fn inline_storage<const N: usize>(&self) -> bool {
        self.inline_budget.is_some() && inline_fits::<T>(N)
    }

    /// Storage plan for an upstream with the given size hint.
    pub fn plan(&self, hint: SizeHint) -> CapacityPlan {
        match self.inline_budget {
            Some(budget) if hint.fits_within(budget) => self.planner.plan(hint.upper),
            _ => CapacityPlan::heap(hint.upper),
        }
    }

    fn buffer<const N: usize>(&self, hint: SizeHint) -> GrowableBuffer<'p, T, N> {
        let planner = CapacityPlanner {
            inline_limit: self.planner.inline_limit.min(N),
            ..self.planner
        };
        let plan = CollectOptions {
            planner,
            ..self.clone()
        }
        .plan(hint);

        #[cfg(feature = "tracing")]
        tracing::trace!(?hint, ?plan, "collector plan");

        GrowableBuffer::from_plan(&plan, self.pool).with_first_segment_len(self.first_segment_len)
    }
}

/// Run `node` over `view` into a `Vec`.
pub fn collect_vec<'p, Nd: Node>(
    node: &Nd,
    view: &[Nd::Source],
    options: &CollectOptions<'p, Nd::Item>,
) -> Result<Vec<Nd::Item>, OpError> {
    let hint = node.size_hint(view.len());
    if options.inline_storage::<DEFAULT_INLINE>() {
        vec_with_slots::<Nd, DEFAULT_INLINE>(node, view, hint, options)
    } else {
        vec_with_slots::<Nd, 0>(node, view, hint, options)
    }
}

/// Run `node` over `view` into an `Arc<[T]>`.
pub fn collect_immutable<'p, Nd: Node>(
    node: &Nd,
    view: &[Nd::Source],
    options: &CollectOptions<'p, Nd::Item>,
) -> Result<Arc<[Nd::Item]>, OpError> {
    let hint = node.size_hint(view.len());
    if options.inline_storage::<DEFAULT_INLINE>() {
        immutable_with_slots::<Nd, DEFAULT_INLINE>(node, view, hint, options)
    } else {
        immutable_with_slots::<Nd, 0>(node, view, hint, options)
    }
}

/// Collect owned `items` of at most `hint.upper` elements into a `Vec`.
pub fn collect_owned<'p, T, I>(
    items: I,
    hint: SizeHint,
    options: &CollectOptions<'p, T>,
) -> Result<Vec<T>, OpError>
where
    I: IntoIterator<Item = T>,
{
    if options.inline_storage::<DEFAULT_INLINE>() {
        owned_with_slots::<T, I, DEFAULT_INLINE>(items, hint, options)
    } else {
        owned_with_slots::<T, I, 0>(items, hint, options)
    }
}

// The collector lives in these frames only, so an inline region is never on
// the stack of a call that picked the heap collector.

#[inline(never)]
fn vec_with_slots<'p, Nd: Node, const N: usize>(
    node: &Nd,
    view: &[Nd::Source],
    hint: SizeHint,
    options: &CollectOptions<'p, Nd::Item>,
) -> Result<Vec<Nd::Item>, OpError> {
    let sink: ToVec<'p, Nd::Item, N> = ToVec::planned(hint, options);
    node.execute(view, sink)
}

#[inline(never)]
fn immutable_with_slots<'p, Nd: Node, const N: usize>(
    node: &Nd,
    view: &[Nd::Source],
    hint: SizeHint,
    options: &CollectOptions<'p, Nd::Item>,
) -> Result<Arc<[Nd::Item]>, OpError> {
    let sink: ToImmutable<'p, Nd::Item, N> = ToImmutable::planned(hint, options);
    node.execute(view, sink)
}

#[inline(never)]
fn owned_with_slots<'p, T, I, const N: usize>(
    items: I,
    hint: SizeHint,
    options: &CollectOptions<'p, T>,
) -> Result<Vec<T>, OpError>
where
    I: IntoIterator<Item = T>,
{
    let mut sink: ToVec<'p, T, N> = ToVec::planned(hint, options);
    engine::run_owned(items, &mut sink)?;
    sink.finish()
}

/// Collects into an exact-length `Vec`.
pub struct ToVec<'p, T, const N: usize = DEFAULT_INLINE> {
    buffer: GrowableBuffer<'p, T, N>,
}

impl<'p, T, const N: usize> ToVec<'p, T, N> {
    pub fn planned(hint: SizeHint, options: &CollectOptions<'p, T>) -> Self {
        Self {
            buffer: options.buffer(hint),
        }
    }

    pub fn from_buffer(buffer: GrowableBuffer<'p, T, N>) -> Self {
        Self { buffer }
    }

    /// Heap-mode collector bounded by `bound` (when known).
    pub fn heap(
        bound: Option<usize>,
        pool: Option<&'p dyn SegmentPool<T>>,
        first_segment_len: usize,
    ) -> Self {
        Self::from_buffer(
            GrowableBuffer::from_plan(&CapacityPlan::heap(bound), pool)
                .with_first_segment_len(first_segment_len),
        )
    }

    pub fn buffer(&self) -> &GrowableBuffer<'p, T, N> {
        &self.buffer
    }
}

impl<T, const N: usize> Sink<T> for ToVec<'_, T, N> {
    type Output = Vec<T>;

    #[inline]
    fn process_next(&mut self, item: T) -> Result<Flow, OpError> {
        self.buffer.add(item)?;
        Ok(Flow::Continue)
    }

    fn finish(self) -> Result<Vec<T>, OpError> {
        Ok(self.buffer.into_vec())
    }
}

/// Collects into an immutable shared slice.
pub struct ToImmutable<'p, T, const N: usize = DEFAULT_INLINE> {
    buffer: GrowableBuffer<'p, T, N>,
}

impl<'p, T, const N: usize> ToImmutable<'p, T, N> {
    pub fn planned(hint: SizeHint, options: &CollectOptions<'p, T>) -> Self {
        Self {
            buffer: options.buffer(hint),
        }
    }
}

impl<T, const N: usize> Sink<T> for ToImmutable<'_, T, N> {
    type Output = Arc<[T]>;

    #[inline]
    fn process_next(&mut self, item: T) -> Result<Flow, OpError> {
        self.buffer.add(item)?;
        Ok(Flow::Continue)
    }

    fn finish(self) -> Result<Arc<[T]>, OpError> {
        Ok(self.buffer.into_immutable())
    }
}
