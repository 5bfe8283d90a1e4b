//! Runtime-assembled pipelines.
//!
//! [`StageChain`] holds a list of type-preserving stages (`T -> T`) chosen at
//! runtime, for example from a query description. Each element is dispatched
//! on the stage tag instead of through a monomorphized adapter chain. A
//! `Reverse` stage splits the chain: everything before it is materialized
//! into a planned buffer, reversed, and replayed through the rest.

use std::fmt;

use spanpipe_core::{SegmentPool, SizeHint};

use crate::collect::{self, CollectOptions};
use crate::traits::{Node, OpError, Sink};

type Predicate<'f, T> = Box<dyn Fn(&T) -> bool + 'f>;
type Transform<'f, T> = Box<dyn Fn(&T) -> T + 'f>;

pub enum Stage<'f, T> {
    Filter(Predicate<'f, T>),
    Map(Transform<'f, T>),
    WhereSelect(Predicate<'f, T>, Transform<'f, T>),
    Reverse,
}

impl<T> Stage<'_, T> {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Filter(_) => "filter",
            Stage::Map(_) => "map",
            Stage::WhereSelect(..) => "where_select",
            Stage::Reverse => "reverse",
        }
    }

    /// `None` when the element is dropped.
    #[inline]
    fn apply(&self, item: T) -> Option<T> {
        match self {
            Stage::Filter(predicate) => predicate(&item).then_some(item),
            Stage::Map(selector) => Some(selector(&item)),
            Stage::WhereSelect(predicate, selector) => predicate(&item).then(|| selector(&item)),
            Stage::Reverse => Some(item),
        }
    }

    fn size_hint(&self, upstream: SizeHint) -> SizeHint {
        match self {
            Stage::Filter(_) | Stage::WhereSelect(..) => upstream.reduced(),
            Stage::Map(_) | Stage::Reverse => upstream,
        }
    }
}

impl<T> fmt::Debug for Stage<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn apply_all<T>(stages: &[Stage<'_, T>], item: T) -> Option<T> {
    stages.iter().try_fold(item, |acc, stage| stage.apply(acc))
}

fn hint_through<T>(stages: &[Stage<'_, T>], upstream: SizeHint) -> SizeHint {
    stages
        .iter()
        .fold(upstream, |hint, stage| stage.size_hint(hint))
}

pub struct StageChain<'f, 'p, T> {
    stages: Vec<Stage<'f, T>>,
    /// Storage options for the buffers behind `Reverse` stages.
    buffers: CollectOptions<'p, T>,
}

impl<T> Default for StageChain<'_, '_, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'f, 'p, T> StageChain<'f, 'p, T> {
    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            buffers: CollectOptions::default(),
        }
    }

    pub fn push(mut self, stage: Stage<'f, T>) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn filter(self, predicate: impl Fn(&T) -> bool + 'f) -> Self {
        self.push(Stage::Filter(Box::new(predicate)))
    }

    pub fn map(self, selector: impl Fn(&T) -> T + 'f) -> Self {
        self.push(Stage::Map(Box::new(selector)))
    }

    pub fn where_select(
        self,
        predicate: impl Fn(&T) -> bool + 'f,
        selector: impl Fn(&T) -> T + 'f,
    ) -> Self {
        self.push(Stage::WhereSelect(Box::new(predicate), Box::new(selector)))
    }

    pub fn reverse(self) -> Self {
        self.push(Stage::Reverse)
    }

    pub fn with_pool(mut self, pool: &'p dyn SegmentPool<T>) -> Self {
        self.buffers.pool = Some(pool);
        self
    }

    pub fn with_buffer_options(mut self, options: CollectOptions<'p, T>) -> Self {
        self.buffers = options;
        self
    }

    pub fn stages(&self) -> &[Stage<'f, T>] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    fn drive<I, S>(
        &self,
        stages: &[Stage<'f, T>],
        items: I,
        hint: SizeHint,
        sink: &mut S,
    ) -> Result<(), OpError>
    where
        I: Iterator<Item = T>,
        S: Sink<T>,
    {
        let Some(at) = stages.iter().position(|s| matches!(s, Stage::Reverse)) else {
            for item in items {
                if let Some(out) = apply_all(stages, item) {
                    if sink.process_next(out)?.is_stop() {
                        break;
                    }
                }
            }
            return Ok(());
        };

        let (head, tail) = (&stages[..at], &stages[at + 1..]);
        let head_hint = hint_through(head, hint);

        #[cfg(feature = "tracing")]
        tracing::trace!(stage = at, ?head_hint, "stage chain: materializing before reverse");

        let survivors = items.filter_map(|item| apply_all(head, item));
        let mut reversed = collect::collect_owned(survivors, head_hint, &self.buffers)?;
        reversed.reverse();

        let len = reversed.len();
        self.drive(tail, reversed.into_iter(), SizeHint::exact(len), sink)
    }
}

impl<T: Clone> Node for StageChain<'_, '_, T> {
    type Source = T;
    type Item = T;

    fn size_hint(&self, source_len: usize) -> SizeHint {
        hint_through(&self.stages, SizeHint::exact(source_len))
    }

    fn execute<S>(&self, view: &[T], mut sink: S) -> Result<S::Output, OpError>
    where
        S: Sink<T>,
    {
        self.drive(
            &self.stages,
            view.iter().cloned(),
            SizeHint::exact(view.len()),
            &mut sink,
        )?;
        sink.finish()
    }
}

impl<T> fmt::Debug for StageChain<'_, '_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.stages).finish()
    }
}
