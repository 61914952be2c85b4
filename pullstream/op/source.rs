use std::sync::Arc;

use crate::explain::node_line;
use crate::plan::PlanNode;
use crate::producer::Producer;

/// The leaf plan node: calls a factory to obtain a fresh iterator each time it is compiled, so the
/// same `Stream` can be re-iterated independently any number of times.
pub(crate) struct SourceNode<T, I, F>
where
    F: Fn() -> I + Send + Sync,
{
    factory: Arc<F>,
    _marker: std::marker::PhantomData<fn() -> (T, I)>,
}

impl<T, I, F> SourceNode<T, I, F>
where
    F: Fn() -> I + Send + Sync,
{
    pub(crate) fn new(factory: F) -> Self {
        SourceNode {
            factory: Arc::new(factory),
            _marker: std::marker::PhantomData,
        }
    }
}

struct SourceProducer<I: Iterator> {
    iter: I,
}

impl<T, I> Producer<T> for SourceProducer<I>
where
    I: Iterator<Item = T> + Send,
{
    fn next(&mut self) -> Option<Result<T, crate::errors::StreamError>> {
        self.iter.next().map(Ok)
    }
}

impl<T, I, F> PlanNode<T> for SourceNode<T, I, F>
where
    T: Send + 'static,
    I: IntoIterator<Item = T>,
    I::IntoIter: Send + 'static,
    F: Fn() -> I + Send + Sync + 'static,
{
    fn compile(&self) -> Box<dyn Producer<T>> {
        Box::new(SourceProducer {
            iter: (self.factory)().into_iter(),
        })
    }

    fn explain(&self, depth: usize, colored: bool) -> String {
        node_line(depth, "Source", colored)
    }
}
