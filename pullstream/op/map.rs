use std::sync::Arc;

use crate::errors::{ElementError, StreamError};
use crate::explain::node_line;
use crate::op::concurrent_map::ConcurrentMapProducer;
use crate::plan::PlanNode;
use crate::producer::Producer;

type MapFn<T, R> = Arc<dyn Fn(T) -> Result<R, ElementError> + Send + Sync>;

/// `map`/`do` plan node. `do`'s side-effect-only semantics are expressed by wrapping the user's
/// `Fn(&T)` into a `Fn(T) -> Result<T, ElementError>` that runs the side effect and hands the
/// original element back, so both combinators share one producer engine (sequential below
/// `concurrency = 2`, [`ConcurrentMapProducer`] above it).
pub(crate) struct MapNode<T, R> {
    pub(crate) upstream: Arc<dyn PlanNode<T>>,
    pub(crate) func: MapFn<T, R>,
    pub(crate) concurrency: usize,
    pub(crate) label: &'static str,
}

impl<T, R> MapNode<T, R> {
    pub(crate) fn new(
        upstream: Arc<dyn PlanNode<T>>,
        concurrency: usize,
        label: &'static str,
        func: MapFn<T, R>,
    ) -> Self {
        assert!(
            concurrency >= 1,
            "{label} concurrency must be >= 1, got {concurrency}"
        );
        MapNode {
            upstream,
            func,
            concurrency,
            label,
        }
    }
}

struct SequentialMapProducer<T, R> {
    upstream: Box<dyn Producer<T>>,
    func: MapFn<T, R>,
}

impl<T: Send + 'static, R: Send + 'static> Producer<R> for SequentialMapProducer<T, R> {
    fn next(&mut self) -> Option<Result<R, StreamError>> {
        match self.upstream.next()? {
            Ok(val) => Some((self.func)(val).map_err(StreamError::Element)),
            Err(e) => Some(Err(e)),
        }
    }
}

impl<T, R> PlanNode<R> for MapNode<T, R>
where
    T: Send + 'static,
    R: Send + 'static,
{
    fn compile(&self) -> Box<dyn Producer<R>> {
        let upstream = self.upstream.compile();
        if self.concurrency <= 1 {
            Box::new(SequentialMapProducer {
                upstream,
                func: self.func.clone(),
            })
        } else {
            Box::new(ConcurrentMapProducer::new(
                upstream,
                self.concurrency,
                self.func.clone(),
            ))
        }
    }

    fn explain(&self, depth: usize, colored: bool) -> String {
        let label = if self.concurrency <= 1 {
            self.label.to_string()
        } else {
            format!("{}(concurrency={})", self.label, self.concurrency)
        };
        node_line(depth, &label, colored) + &self.upstream.explain(depth + 1, colored)
    }
}
