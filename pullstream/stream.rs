use std::{sync::Arc, time::Duration};

use crate::driver::{run_iteration, IterateOptions};
use crate::errors::{ElementError, ErrorClasses, StreamError};
use crate::op::{
    batch::BatchNode, catch::CatchNode, chain::ChainNode, filter::FilterNode,
    flatten::FlattenNode, map::MapNode, observe::ObserveNode, slow::SlowNode, source::SourceNode,
};
use crate::plan::PlanNode;
use crate::producer::Producer;

/// A fluent, lazily-evaluated pipeline builder.
///
/// `Stream<T>` wraps an immutable plan; building it never runs anything. Iterating `&Stream<T>`
/// (or calling [`iterate`](Stream::iterate)) compiles the plan into a fresh pull-based run — the
/// same `Stream` can be iterated any number of times independently.
pub struct Stream<T> {
    plan: Arc<dyn PlanNode<T>>,
}

impl<T> Clone for Stream<T> {
    fn clone(&self) -> Self {
        Stream {
            plan: self.plan.clone(),
        }
    }
}

impl<T: Send + 'static> Stream<T> {
    /// Build a pipeline whose source calls `factory` once per iteration, pulling from whatever it
    /// returns. Because the bound is `IntoIterator`, a factory can never return something that
    /// isn't iterable — there is no runtime "bad source" failure mode to report.
    pub fn source<I, F>(factory: F) -> Self
    where
        I: IntoIterator<Item = T> + 'static,
        I::IntoIter: Send + 'static,
        F: Fn() -> I + Send + Sync + 'static,
    {
        Stream {
            plan: Arc::new(SourceNode::new(factory)),
        }
    }

    /// Apply `func` to every element, with up to `concurrency` invocations of `func` in flight at
    /// once. Results are yielded in upstream order regardless of `concurrency`. Panics if
    /// `concurrency == 0`.
    pub fn map<R, F>(&self, func: F, concurrency: usize) -> Stream<R>
    where
        R: Send + 'static,
        F: Fn(T) -> R + Send + Sync + 'static,
    {
        self.map_fallible::<R, ElementError, _>(move |v| Ok(func(v)), concurrency)
    }

    /// Like [`map`](Stream::map), but `func` may itself fail; the error becomes an
    /// [`ElementError`] eligible for [`catch`](Stream::catch).
    pub fn map_fallible<R, E, F>(&self, func: F, concurrency: usize) -> Stream<R>
    where
        R: Send + 'static,
        E: std::error::Error + Send + Sync + 'static,
        F: Fn(T) -> Result<R, E> + Send + Sync + 'static,
    {
        let func: Arc<dyn Fn(T) -> Result<R, ElementError> + Send + Sync> =
            Arc::new(move |v| func(v).map_err(ElementError::new));
        Stream {
            plan: Arc::new(MapNode::new(self.plan.clone(), concurrency, "Map", func)),
        }
    }

    /// Single-threaded shorthand for `.map(func, 1)`.
    pub fn map_seq<R, F>(&self, func: F) -> Stream<R>
    where
        R: Send + 'static,
        F: Fn(T) -> R + Send + Sync + 'static,
    {
        self.map(func, 1)
    }

    /// Run `func` for its side effect on every element; the original element is yielded
    /// unchanged. Panics if `concurrency == 0`.
    pub fn do_<F>(&self, func: F, concurrency: usize) -> Stream<T>
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let wrapped: Arc<dyn Fn(T) -> Result<T, ElementError> + Send + Sync> =
            Arc::new(move |v: T| {
                func(&v);
                Ok(v)
            });
        Stream {
            plan: Arc::new(MapNode::new(self.plan.clone(), concurrency, "Do", wrapped)),
        }
    }

    /// Single-threaded shorthand for `.do_(func, 1)`.
    pub fn do_seq<F>(&self, func: F) -> Stream<T>
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.do_(func, 1)
    }

    /// Keep only elements for which `predicate` returns `true`.
    pub fn filter<F>(&self, predicate: F) -> Stream<T>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Stream {
            plan: Arc::new(FilterNode {
                upstream: self.plan.clone(),
                predicate: Arc::new(predicate),
            }),
        }
    }

    /// Concatenate `others` after this stream.
    pub fn chain(&self, others: Vec<Stream<T>>) -> Stream<T> {
        Stream {
            plan: Arc::new(ChainNode {
                first: self.plan.clone(),
                rest: others.into_iter().map(|s| s.plan).collect(),
            }),
        }
    }

    /// Enforce a minimum inter-element interval of `1 / frequency` seconds. Panics if `frequency`
    /// is not finite and positive.
    pub fn slow(&self, frequency: f64) -> Stream<T> {
        Stream {
            plan: Arc::new(SlowNode::new(self.plan.clone(), frequency)),
        }
    }

    /// Suppress upstream errors whose concrete type is one of `classes`, optionally gated by
    /// `when`. `None` for `when` is equivalent to always suppressing a matching error. A worker
    /// panic is never suppressed, regardless of `classes`/`when`.
    pub fn catch(
        &self,
        classes: ErrorClasses,
        when: Option<Arc<dyn Fn(&ElementError) -> bool + Send + Sync>>,
    ) -> Stream<T> {
        Stream {
            plan: Arc::new(CatchNode {
                upstream: self.plan.clone(),
                classes: Arc::new(classes),
                when,
            }),
        }
    }

    /// Shorthand for `.catch(ErrorClasses::All, when)`.
    pub fn catch_all(
        &self,
        when: Option<Arc<dyn Fn(&ElementError) -> bool + Send + Sync>>,
    ) -> Stream<T> {
        self.catch(ErrorClasses::All, when)
    }

    /// Log a line every time the yielded count reaches a power of two (and once more, if not
    /// already logged, at end of stream).
    pub fn observe(&self, what: impl Into<String>, colored: bool) -> Stream<T> {
        Stream {
            plan: Arc::new(ObserveNode {
                upstream: self.plan.clone(),
                what: what.into(),
                colored,
            }),
        }
    }

    /// Render the plan as an indented tree. Pure: repeated calls on the same `Stream` return
    /// identical strings.
    pub fn explain(&self, colored: bool) -> String {
        self.plan.explain(0, colored)
    }

    /// Drive the pipeline to exhaustion with built-in error sampling.
    ///
    /// Unless `options.fail_fast` is set, element errors are suppressed and sampled (up to 8)
    /// rather than aborting iteration; if more than `options.raise_if_more_errors_than` were
    /// seen, the first sample is returned as `Err` after the run completes. The stream is always
    /// fully drained, even if `options.collect_limit` is smaller than the element count.
    pub fn iterate(&self, options: IterateOptions) -> Result<Vec<T>, StreamError> {
        run_iteration(self, options)
    }
}

impl<T: Send + 'static> Stream<T>
where
    T: IntoIterator,
{
    /// Flatten a stream of iterables into a stream of their elements. With `concurrency == 1`
    /// this concatenates sub-iterables in upstream order; with `concurrency >= 2`, up to
    /// `concurrency` sub-iterables are consumed in parallel and elements are yielded in arrival
    /// order instead. Panics if `concurrency == 0`.
    pub fn flatten(&self, concurrency: usize) -> Stream<T::Item>
    where
        T::Item: Send + 'static,
        T::IntoIter: Send + 'static,
    {
        Stream {
            plan: Arc::new(FlattenNode::<T::Item, T>::new(self.plan.clone(), concurrency)),
        }
    }
}

impl<T: Send + 'static> Stream<T> {
    /// Group elements into `Vec`s of up to `size`, flushing early if `timeout` elapses since the
    /// batch became non-empty. `timeout = None` disables the time-based flush. Panics if
    /// `size == 0` or `timeout` is `Some(d)` with `d` not greater than zero.
    pub fn batch(&self, size: usize, timeout: Option<Duration>) -> Stream<Vec<T>> {
        Stream {
            plan: Arc::new(BatchNode::new(self.plan.clone(), size, timeout)),
        }
    }
}

/// A pull-based iterator over one run of a [`Stream`]'s plan.
pub struct StreamIter<T> {
    producer: Box<dyn Producer<T>>,
}

impl<T: Send + 'static> Iterator for StreamIter<T> {
    type Item = Result<T, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.producer.next()
    }
}

impl<'a, T: Send + 'static> IntoIterator for &'a Stream<T> {
    type Item = Result<T, StreamError>;
    type IntoIter = StreamIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        StreamIter {
            producer: self.plan.compile(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::*;

    use super::*;

    #[rstest]
    fn test_plan_is_reusable() {
        let stream = Stream::source(|| 0..5).map(|x| x * 2, 1);
        let first: Vec<_> = (&stream).into_iter().map(Result::unwrap).collect();
        let second: Vec<_> = (&stream).into_iter().map(Result::unwrap).collect();
        assert_eq!(first, second);
        assert_eq!(first, vec![0, 2, 4, 6, 8]);
    }

    #[rstest]
    fn test_explain_is_pure() {
        let stream = Stream::source(|| 0..5).map(|x| x * 2, 1).filter(|x| *x > 2);
        assert_eq!(stream.explain(false), stream.explain(false));
        assert!(stream.explain(false).contains("Filter"));
        assert!(stream.explain(false).contains("Map"));
        assert!(stream.explain(false).contains("Source"));
    }

    #[rstest]
    fn test_scenario_map_square() {
        let stream = Stream::source(|| 0..10).map(|x: i32| x * x, 1);
        let out = stream
            .iterate(IterateOptions {
                collect_limit: 100,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(out, vec![0, 1, 4, 9, 16, 25, 36, 49, 64, 81]);
    }

    #[rstest]
    fn test_scenario_filter_odd() {
        let stream = Stream::source(|| vec![1, 2, 3, 4, 5]).filter(|x: &i32| x % 2 == 1);
        let out = stream
            .iterate(IterateOptions {
                collect_limit: 10,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(out, vec![1, 3, 5]);
    }

    #[rstest]
    fn test_scenario_flatten_nested_vecs() {
        let stream = Stream::source(|| vec![vec![1, 2], vec![3], vec![], vec![4, 5]]).flatten(1);
        let out = stream
            .iterate(IterateOptions {
                collect_limit: 10,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(out, vec![1, 2, 3, 4, 5]);
    }

    #[rstest]
    fn test_empty_source_boundary() {
        let stream = Stream::<i32>::source(Vec::new);
        let out = stream
            .iterate(IterateOptions {
                collect_limit: 10,
                ..Default::default()
            })
            .unwrap();
        assert!(out.is_empty());
    }

    #[rstest]
    fn test_collect_limit_zero_still_drains() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let pulled = Arc::new(AtomicUsize::new(0));
        let pulled2 = pulled.clone();
        let stream = Stream::source(|| 0..20).do_(
            move |_| {
                pulled2.fetch_add(1, Ordering::SeqCst);
            },
            1,
        );
        let out = stream.iterate(IterateOptions::default()).unwrap();
        assert!(out.is_empty());
        assert_eq!(pulled.load(Ordering::SeqCst), 20);
    }
}
