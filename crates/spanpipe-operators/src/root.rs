//! Root nodes: the only stages that iterate the real slice.
//!
//! The first filter/transform of a pipeline folds into the root so the loop
//! shape is fixed at composition time: `Root.filter` gives a [`WhereRoot`],
//! `Root.select` a [`SelectRoot`], and `WhereRoot.select` (or
//! `Root.where_select`) a [`WhereSelectRoot`]. `SelectRoot.filter` gives a
//! [`SelectWhereRoot`], whose predicate tests the projected value. These
//! inherent methods shadow the generic [`NodeExt`](crate::ext::NodeExt) ones.

use std::marker::PhantomData;

use spanpipe_core::SizeHint;

use crate::engine;
use crate::traits::{Node, OpError, Sink};

/// Identity root over a `&[T]`.
pub struct Root<T> {
    _source: PhantomData<fn(&T)>,
}

impl<T> Root<T> {
    pub fn new() -> Self {
        Self {
            _source: PhantomData,
        }
    }

    pub fn filter<P>(self, predicate: P) -> WhereRoot<T, P>
    where
        P: Fn(&T) -> bool,
    {
        WhereRoot {
            predicate,
            _source: PhantomData,
        }
    }

    pub fn select<U, F>(self, selector: F) -> SelectRoot<T, U, F>
    where
        F: Fn(&T) -> U,
    {
        SelectRoot {
            selector,
            _types: PhantomData,
        }
    }

    pub fn where_select<U, P, F>(self, predicate: P, selector: F) -> WhereSelectRoot<T, U, P, F>
    where
        P: Fn(&T) -> bool,
        F: Fn(&T) -> U,
    {
        WhereSelectRoot {
            predicate,
            selector,
            _types: PhantomData,
        }
    }
}

impl<T> Default for Root<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Root<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> Copy for Root<T> {}

impl<T: Clone> Node for Root<T> {
    type Source = T;
    type Item = T;

    fn size_hint(&self, source_len: usize) -> SizeHint {
        SizeHint::exact(source_len)
    }

    fn execute<S>(&self, view: &[T], mut sink: S) -> Result<S::Output, OpError>
    where
        S: Sink<T>,
    {
        engine::run_plain(view, &mut sink)?;
        sink.finish()
    }
}

#[derive(Clone)]
pub struct WhereRoot<T, P> {
    predicate: P,
    _source: PhantomData<fn(&T)>,
}

impl<T, P> WhereRoot<T, P>
where
    P: Fn(&T) -> bool,
{
    /// Fuse a transform into the filter loop.
    pub fn select<U, F>(self, selector: F) -> WhereSelectRoot<T, U, P, F>
    where
        F: Fn(&T) -> U,
    {
        WhereSelectRoot {
            predicate: self.predicate,
            selector,
            _types: PhantomData,
        }
    }
}

impl<T, P> Node for WhereRoot<T, P>
where
    T: Clone,
    P: Fn(&T) -> bool,
{
    type Source = T;
    type Item = T;

    fn size_hint(&self, source_len: usize) -> SizeHint {
        SizeHint::exact(source_len).reduced()
    }

    fn execute<S>(&self, view: &[T], mut sink: S) -> Result<S::Output, OpError>
    where
        S: Sink<T>,
    {
        engine::run_where(view, &mut sink, &self.predicate)?;
        sink.finish()
    }
}

#[derive(Clone)]
pub struct SelectRoot<T, U, F> {
    selector: F,
    _types: PhantomData<fn(&T) -> U>,
}

impl<T, U, F> SelectRoot<T, U, F>
where
    F: Fn(&T) -> U,
{
    /// Fuse a filter on the transformed value into the select loop.
    pub fn filter<P>(self, predicate: P) -> SelectWhereRoot<T, U, F, P>
    where
        P: Fn(&U) -> bool,
    {
        SelectWhereRoot {
            selector: self.selector,
            predicate,
            _types: PhantomData,
        }
    }
}

impl<T, U, F> Node for SelectRoot<T, U, F>
where
    F: Fn(&T) -> U,
{
    type Source = T;
    type Item = U;

    fn size_hint(&self, source_len: usize) -> SizeHint {
        SizeHint::exact(source_len)
    }

    fn execute<S>(&self, view: &[T], mut sink: S) -> Result<S::Output, OpError>
    where
        S: Sink<U>,
    {
        engine::run_select(view, &mut sink, &self.selector)?;
        sink.finish()
    }
}

#[derive(Clone)]
pub struct WhereSelectRoot<T, U, P, F> {
    predicate: P,
    selector: F,
    _types: PhantomData<fn(&T) -> U>,
}

impl<T, U, P, F> Node for WhereSelectRoot<T, U, P, F>
where
    P: Fn(&T) -> bool,
    F: Fn(&T) -> U,
{
    type Source = T;
    type Item = U;

    fn size_hint(&self, source_len: usize) -> SizeHint {
        SizeHint::exact(source_len).reduced()
    }

    fn execute<S>(&self, view: &[T], mut sink: S) -> Result<S::Output, OpError>
    where
        S: Sink<U>,
    {
        engine::run_where_select(view, &mut sink, &self.predicate, &self.selector)?;
        sink.finish()
    }
}

#[derive(Clone)]
pub struct SelectWhereRoot<T, U, F, P> {
    selector: F,
    predicate: P,
    _types: PhantomData<fn(&T) -> U>,
}

impl<T, U, F, P> Node for SelectWhereRoot<T, U, F, P>
where
    F: Fn(&T) -> U,
    P: Fn(&U) -> bool,
{
    type Source = T;
    type Item = U;

    fn size_hint(&self, source_len: usize) -> SizeHint {
        SizeHint::exact(source_len).reduced()
    }

    fn execute<S>(&self, view: &[T], mut sink: S) -> Result<S::Output, OpError>
    where
        S: Sink<U>,
    {
        engine::run_select_where(view, &mut sink, &self.selector, &self.predicate)?;
        sink.finish()
    }
}
