//! Fused filter+transform stage.
//!
//! One adapter instead of a `Where` wrapping a `Select`: the predicate and the
//! selector run back to back on the same element. Observable behavior is
//! identical to filtering first and mapping the survivors.

use std::marker::PhantomData;

use spanpipe_core::SizeHint;

use crate::traits::{Flow, Node, OpError, Sink};

pub struct WhereSelect<Pr, P, F, U> {
    prior: Pr,
    predicate: P,
    selector: F,
    _out: PhantomData<fn() -> U>,
}

impl<Pr, P, F, U> WhereSelect<Pr, P, F, U>
where
    Pr: Node,
    P: Fn(&Pr::Item) -> bool,
    F: Fn(&Pr::Item) -> U,
{
    pub fn new(prior: Pr, predicate: P, selector: F) -> Self {
        Self {
            prior,
            predicate,
            selector,
            _out: PhantomData,
        }
    }
}

impl<Pr: Clone, P: Clone, F: Clone, U> Clone for WhereSelect<Pr, P, F, U> {
    fn clone(&self) -> Self {
        Self {
            prior: self.prior.clone(),
            predicate: self.predicate.clone(),
            selector: self.selector.clone(),
            _out: PhantomData,
        }
    }
}

impl<Pr, P, F, U> Node for WhereSelect<Pr, P, F, U>
where
    Pr: Node,
    P: Fn(&Pr::Item) -> bool,
    F: Fn(&Pr::Item) -> U,
{
    type Source = Pr::Source;
    type Item = U;

    fn size_hint(&self, source_len: usize) -> SizeHint {
        self.prior.size_hint(source_len).reduced()
    }

    fn execute<S>(&self, view: &[Self::Source], sink: S) -> Result<S::Output, OpError>
    where
        S: Sink<U>,
    {
        self.prior.execute(
            view,
            WhereSelectSink {
                next: sink,
                predicate: &self.predicate,
                selector: &self.selector,
                _out: PhantomData,
            },
        )
    }
}

pub struct WhereSelectSink<'a, S, P, F, U> {
    next: S,
    predicate: &'a P,
    selector: &'a F,
    _out: PhantomData<fn() -> U>,
}

impl<T, U, S, P, F> Sink<T> for WhereSelectSink<'_, S, P, F, U>
where
    S: Sink<U>,
    P: Fn(&T) -> bool,
    F: Fn(&T) -> U,
{
    type Output = S::Output;

    #[inline]
    fn process_next(&mut self, item: T) -> Result<Flow, OpError> {
        if !(self.predicate)(&item) {
            return Ok(Flow::Continue);
        }
        self.next.process_next((self.selector)(&item))
    }

    fn finish(self) -> Result<S::Output, OpError> {
        self.next.finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::ext::NodeExt;
    use crate::root::Root;

    #[test]
    fn where_then_select_fuses() {
        let data: Vec<i32> = (0..20).collect();
        // A reverse ahead of the filter keeps it out of the root.
        let fused = Root::<i32>::new()
            .select(|x| x + 1)
            .reverse()
            .filter(|x| x % 3 == 0)
            .select(|x| format!("#{x}"));
        let staged = Root::<i32>::new()
            .select(|x| x + 1)
            .reverse()
            .filter(|x| x % 3 == 0)
            .reverse()
            .reverse()
            .select(|x| format!("#{x}"));

        assert_eq!(fused.to_vec(&data).unwrap(), staged.to_vec(&data).unwrap());
        assert_eq!(fused.to_vec(&data).unwrap()[0], "#18");
    }
}
