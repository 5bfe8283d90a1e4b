//! Filter stage for non-root positions.

use spanpipe_core::SizeHint;

use crate::traits::{Flow, Node, OpError, Sink};
use crate::where_select::WhereSelect;

#[derive(Clone)]
pub struct Where<Pr, P> {
    prior: Pr,
    predicate: P,
}

impl<Pr, P> Where<Pr, P>
where
    Pr: Node,
    P: Fn(&Pr::Item) -> bool,
{
    pub fn new(prior: Pr, predicate: P) -> Self {
        Self { prior, predicate }
    }

    /// Fuse a following transform into this stage.
    pub fn select<U, F>(self, selector: F) -> WhereSelect<Pr, P, F, U>
    where
        F: Fn(&Pr::Item) -> U,
    {
        WhereSelect::new(self.prior, self.predicate, selector)
    }
}

impl<Pr, P> Node for Where<Pr, P>
where
    Pr: Node,
    P: Fn(&Pr::Item) -> bool,
{
    type Source = Pr::Source;
    type Item = Pr::Item;

    fn size_hint(&self, source_len: usize) -> SizeHint {
        self.prior.size_hint(source_len).reduced()
    }

    fn execute<S>(&self, view: &[Self::Source], sink: S) -> Result<S::Output, OpError>
    where
        S: Sink<Self::Item>,
    {
        self.prior.execute(
            view,
            WhereSink {
                next: sink,
                predicate: &self.predicate,
            },
        )
    }
}

pub struct WhereSink<'a, S, P> {
    next: S,
    predicate: &'a P,
}

impl<T, S, P> Sink<T> for WhereSink<'_, S, P>
where
    S: Sink<T>,
    P: Fn(&T) -> bool,
{
    type Output = S::Output;

    #[inline]
    fn process_next(&mut self, item: T) -> Result<Flow, OpError> {
        if (self.predicate)(&item) {
            self.next.process_next(item)
        } else {
            Ok(Flow::Continue)
        }
    }

    fn finish(self) -> Result<S::Output, OpError> {
        self.next.finish()
    }
}
