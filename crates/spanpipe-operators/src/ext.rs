//! Composition and terminal methods available on every [`Node`].

use std::sync::Arc;

use crate::collect::{self, CollectOptions};
use crate::filter::Where;
use crate::map::Select;
use crate::reverse::{Reverse, ReverseOptions};
use crate::traits::{Node, OpError, Sink};
use crate::where_select::WhereSelect;

pub trait NodeExt: Node + Sized {
    /// Keep elements for which `predicate` holds.
    fn filter<P>(self, predicate: P) -> Where<Self, P>
    where
        P: Fn(&Self::Item) -> bool,
    {
        Where::new(self, predicate)
    }

    /// Transform every element.
    fn select<U, F>(self, selector: F) -> Select<Self, F, U>
    where
        F: Fn(&Self::Item) -> U,
    {
        Select::new(self, selector)
    }

    /// Filter and transform in one stage.
    fn where_select<U, P, F>(self, predicate: P, selector: F) -> WhereSelect<Self, P, F, U>
    where
        P: Fn(&Self::Item) -> bool,
        F: Fn(&Self::Item) -> U,
    {
        WhereSelect::new(self, predicate, selector)
    }

    /// Reverse with default options.
    fn reverse<'p>(self) -> Reverse<'p, Self> {
        Reverse::new(self, ReverseOptions::default())
    }

    fn reverse_with<'p>(self, options: ReverseOptions<'p, Self::Item>) -> Reverse<'p, Self> {
        Reverse::new(self, options)
    }

    /// Run into a caller-supplied sink.
    fn run<S>(&self, view: &[Self::Source], sink: S) -> Result<S::Output, OpError>
    where
        S: Sink<Self::Item>,
    {
        self.execute(view, sink)
    }

    fn to_vec(&self, view: &[Self::Source]) -> Result<Vec<Self::Item>, OpError> {
        self.to_vec_with(view, &CollectOptions::default())
    }

    fn to_vec_with(
        &self,
        view: &[Self::Source],
        options: &CollectOptions<'_, Self::Item>,
    ) -> Result<Vec<Self::Item>, OpError> {
        collect::collect_vec(self, view, options)
    }

    fn to_immutable(&self, view: &[Self::Source]) -> Result<Arc<[Self::Item]>, OpError> {
        self.to_immutable_with(view, &CollectOptions::default())
    }

    fn to_immutable_with(
        &self,
        view: &[Self::Source],
        options: &CollectOptions<'_, Self::Item>,
    ) -> Result<Arc<[Self::Item]>, OpError> {
        collect::collect_immutable(self, view, options)
    }
}

impl<N: Node> NodeExt for N {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::root::Root;
    use spanpipe_mem::VecPool;

    #[test]
    fn chained_stages_compose() {
        let data = [5, 3, 8, 1, 9, 2];
        let out = Root::<i32>::new()
            .filter(|x| x % 2 == 1)
            .select(|x| x * 10)
            .reverse()
            .to_vec(&data)
            .unwrap();
        assert_eq!(out, vec![90, 10, 30, 50]);
    }

    #[test]
    fn immutable_collect_matches_vec() {
        let data: Vec<u32> = (0..200).collect();
        let pipeline = Root::<u32>::new().where_select(|x| x % 7 == 0, |x| x / 7);
        let shared = pipeline.to_immutable(&data).unwrap();
        assert_eq!(&shared[..], &pipeline.to_vec(&data).unwrap()[..]);
        assert_eq!(shared.len(), 29);
    }

    #[test]
    fn pooled_collect_returns_every_segment() {
        let data: Vec<u32> = (0..1_000).collect();
        let pool: VecPool<u32> = VecPool::new();
        let opts = CollectOptions::default().with_pool(pool.as_pool());
        let out = Root::<u32>::new()
            .filter(|x| x % 2 == 0)
            .to_vec_with(&data, &opts)
            .unwrap();
        assert_eq!(out.len(), 500);
        assert!(pool.stats().rented > 0);
        assert_eq!(pool.outstanding(), 0);
    }

    #[test]
    fn empty_source_yields_empty_results() {
        let data: [i32; 0] = [];
        assert!(Root::<i32>::new().reverse().to_vec(&data).unwrap().is_empty());
        assert!(Root::<i32>::new()
            .select(|x| x + 1)
            .to_immutable(&data)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn large_elements_collect_without_inline_region() {
        let data: Vec<[u64; 512]> = (0..10u64).map(|i| [i; 512]).collect();
        let pipeline = Root::<[u64; 512]>::new();

        assert_eq!(pipeline.to_vec(&data).unwrap(), data);
        assert_eq!(&pipeline.to_immutable(&data).unwrap()[..], &data[..]);

        let opts = CollectOptions::default().with_inline_budget(None);
        let evens = Root::<[u64; 512]>::new()
            .filter(|x| x[0] % 2 == 0)
            .to_vec_with(&data, &opts)
            .unwrap();
        assert_eq!(evens.len(), 5);
        assert_eq!(evens[4][511], 8);
    }
}
