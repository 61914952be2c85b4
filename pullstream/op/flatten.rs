use std::sync::Arc;

use crate::errors::StreamError;
use crate::explain::node_line;
use crate::op::concurrent_flatten::ConcurrentFlattenProducer;
use crate::plan::PlanNode;
use crate::producer::Producer;

pub(crate) struct FlattenNode<T, I> {
    pub(crate) upstream: Arc<dyn PlanNode<I>>,
    pub(crate) concurrency: usize,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T, I> FlattenNode<T, I> {
    pub(crate) fn new(upstream: Arc<dyn PlanNode<I>>, concurrency: usize) -> Self {
        assert!(
            concurrency >= 1,
            "flatten concurrency must be >= 1, got {concurrency}"
        );
        FlattenNode {
            upstream,
            concurrency,
            _marker: std::marker::PhantomData,
        }
    }
}

struct SequentialFlattenProducer<T, I: IntoIterator<Item = T>> {
    upstream: Box<dyn Producer<I>>,
    current: Option<I::IntoIter>,
}

impl<T, I> Producer<T> for SequentialFlattenProducer<T, I>
where
    T: Send + 'static,
    I: IntoIterator<Item = T> + Send + 'static,
    I::IntoIter: Send,
{
    fn next(&mut self) -> Option<Result<T, StreamError>> {
        loop {
            if let Some(iter) = self.current.as_mut() {
                if let Some(val) = iter.next() {
                    return Some(Ok(val));
                }
                self.current = None;
            }
            match self.upstream.next()? {
                Ok(sub) => self.current = Some(sub.into_iter()),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

impl<T, I> PlanNode<T> for FlattenNode<T, I>
where
    T: Send + 'static,
    I: IntoIterator<Item = T> + Send + 'static,
    I::IntoIter: Send + 'static,
{
    fn compile(&self) -> Box<dyn Producer<T>> {
        let upstream = self.upstream.compile();
        if self.concurrency <= 1 {
            Box::new(SequentialFlattenProducer {
                upstream,
                current: None,
            })
        } else {
            Box::new(ConcurrentFlattenProducer::new(upstream, self.concurrency))
        }
    }

    fn explain(&self, depth: usize, colored: bool) -> String {
        let label = if self.concurrency <= 1 {
            "Flatten".to_string()
        } else {
            format!("Flatten(concurrency={})", self.concurrency)
        };
        node_line(depth, &label, colored) + &self.upstream.explain(depth + 1, colored)
    }
}
