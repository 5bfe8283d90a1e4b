//! One-pass loop shapes.
//!
//! Roots pick one of these when the pipeline is composed, so the hot loop
//! carries exactly the predicate/selector calls its shape needs. Every loop
//! walks the input once, front to back, and breaks the moment the sink
//! returns `Flow::Stop` or an error.

use crate::traits::{OpError, Sink};

/// Identity loop: every element, cloned out of the borrowed slice.
pub fn run_plain<T, S>(view: &[T], sink: &mut S) -> Result<(), OpError>
where
    T: Clone,
    S: Sink<T>,
{
    for item in view {
        if sink.process_next(item.clone())?.is_stop() {
            break;
        }
    }
    Ok(())
}

/// Filter-only loop.
pub fn run_where<T, S, P>(view: &[T], sink: &mut S, predicate: &P) -> Result<(), OpError>
where
    T: Clone,
    S: Sink<T>,
    P: Fn(&T) -> bool,
{
    for item in view {
        if predicate(item) && sink.process_next(item.clone())?.is_stop() {
            break;
        }
    }
    Ok(())
}

/// Transform-only loop.
pub fn run_select<T, U, S, F>(view: &[T], sink: &mut S, selector: &F) -> Result<(), OpError>
where
    S: Sink<U>,
    F: Fn(&T) -> U,
{
    for item in view {
        if sink.process_next(selector(item))?.is_stop() {
            break;
        }
    }
    Ok(())
}

/// Filter-then-transform loop.
pub fn run_where_select<T, U, S, P, F>(
    view: &[T],
    sink: &mut S,
    predicate: &P,
    selector: &F,
) -> Result<(), OpError>
where
    S: Sink<U>,
    P: Fn(&T) -> bool,
    F: Fn(&T) -> U,
{
    for item in view {
        if predicate(item) && sink.process_next(selector(item))?.is_stop() {
            break;
        }
    }
    Ok(())
}

/// Transform-then-filter loop: the predicate sees the projected value.
pub fn run_select_where<T, U, S, F, P>(
    view: &[T],
    sink: &mut S,
    selector: &F,
    predicate: &P,
) -> Result<(), OpError>
where
    S: Sink<U>,
    F: Fn(&T) -> U,
    P: Fn(&U) -> bool,
{
    for item in view {
        let next = selector(item);
        if predicate(&next) && sink.process_next(next)?.is_stop() {
            break;
        }
    }
    Ok(())
}

/// Identity loop over owned values. Buffered operators replay their
/// materialized output through this.
pub fn run_owned<I, S>(items: I, sink: &mut S) -> Result<(), OpError>
where
    I: IntoIterator,
    S: Sink<I::Item>,
{
    for item in items {
        if sink.process_next(item)?.is_stop() {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Flow;

    /// Records every element and stops after `limit`.
    struct Recorder {
        seen: Vec<i32>,
        limit: usize,
    }

    impl Sink<i32> for Recorder {
        type Output = Vec<i32>;

        fn process_next(&mut self, item: i32) -> Result<Flow, OpError> {
            self.seen.push(item);
            if self.seen.len() >= self.limit {
                Ok(Flow::Stop)
            } else {
                Ok(Flow::Continue)
            }
        }

        fn finish(self) -> Result<Vec<i32>, OpError> {
            Ok(self.seen)
        }
    }

    fn recorder(limit: usize) -> Recorder {
        Recorder {
            seen: Vec::new(),
            limit,
        }
    }

    #[test]
    fn plain_preserves_order() {
        let mut p = recorder(usize::MAX);
        run_plain(&[3, 1, 2], &mut p).unwrap();
        assert_eq!(p.seen, vec![3, 1, 2]);
    }

    #[test]
    fn where_select_skips_then_maps() {
        let mut p = recorder(usize::MAX);
        run_where_select(&[1, 2, 3, 4], &mut p, &|x: &i32| x % 2 == 0, &|x: &i32| x * 100).unwrap();
        assert_eq!(p.seen, vec![200, 400]);
    }

    #[test]
    fn select_where_tests_the_projection() {
        let mut p = recorder(usize::MAX);
        run_select_where(&[1, 2, 3, 4], &mut p, &|x: &i32| x * 3, &|y: &i32| y % 2 == 0).unwrap();
        assert_eq!(p.seen, vec![6, 12]);

        let mut p = recorder(1);
        run_select_where(&[1, 2, 3, 4], &mut p, &|x: &i32| x + 10, &|y: &i32| *y > 11).unwrap();
        assert_eq!(p.seen, vec![12]);
    }

    #[test]
    fn stop_is_exact_for_every_shape() {
        let data = [1, 2, 3, 4, 5, 6];
        let calls = std::cell::Cell::new(0);
        let counted = |x: &i32| {
            calls.set(calls.get() + 1);
            *x
        };

        let mut p = recorder(2);
        run_select(&data, &mut p, &counted).unwrap();
        assert_eq!(p.seen, vec![1, 2]);
        assert_eq!(calls.get(), 2, "no selector call after stop");

        let mut p = recorder(2);
        run_where(&data, &mut p, &|x: &i32| x % 2 == 1).unwrap();
        assert_eq!(p.seen, vec![1, 3]);

        let mut p = recorder(1);
        run_owned(vec![9, 8, 7], &mut p).unwrap();
        assert_eq!(p.seen, vec![9]);
    }
}
