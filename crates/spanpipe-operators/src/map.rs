//! Transform stage for non-root positions.

use std::marker::PhantomData;

use spanpipe_core::SizeHint;

use crate::traits::{Flow, Node, OpError, Sink};

pub struct Select<Pr, F, U> {
    prior: Pr,
    selector: F,
    _out: PhantomData<fn() -> U>,
}

impl<Pr, F, U> Select<Pr, F, U>
where
    Pr: Node,
    F: Fn(&Pr::Item) -> U,
{
    pub fn new(prior: Pr, selector: F) -> Self {
        Self {
            prior,
            selector,
            _out: PhantomData,
        }
    }
}

impl<Pr: Clone, F: Clone, U> Clone for Select<Pr, F, U> {
    fn clone(&self) -> Self {
        Self {
            prior: self.prior.clone(),
            selector: self.selector.clone(),
            _out: PhantomData,
        }
    }
}

impl<Pr, F, U> Node for Select<Pr, F, U>
where
    Pr: Node,
    F: Fn(&Pr::Item) -> U,
{
    type Source = Pr::Source;
    type Item = U;

    fn size_hint(&self, source_len: usize) -> SizeHint {
        self.prior.size_hint(source_len)
    }

    fn execute<S>(&self, view: &[Self::Source], sink: S) -> Result<S::Output, OpError>
    where
        S: Sink<U>,
    {
        self.prior.execute(
            view,
            SelectSink {
                next: sink,
                selector: &self.selector,
                _out: PhantomData,
            },
        )
    }
}

pub struct SelectSink<'a, S, F, U> {
    next: S,
    selector: &'a F,
    _out: PhantomData<fn() -> U>,
}

impl<T, U, S, F> Sink<T> for SelectSink<'_, S, F, U>
where
    S: Sink<U>,
    F: Fn(&T) -> U,
{
    type Output = S::Output;

    #[inline]
    fn process_next(&mut self, item: T) -> Result<Flow, OpError> {
        self.next.process_next((self.selector)(&item))
    }

    fn finish(self) -> Result<S::Output, OpError> {
        self.next.finish()
    }
}
