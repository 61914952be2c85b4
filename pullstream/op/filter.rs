use std::sync::Arc;

use crate::errors::StreamError;
use crate::explain::node_line;
use crate::plan::PlanNode;
use crate::producer::Producer;

type PredicateFn<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

pub(crate) struct FilterNode<T> {
    pub(crate) upstream: Arc<dyn PlanNode<T>>,
    pub(crate) predicate: PredicateFn<T>,
}

struct FilterProducer<T> {
    upstream: Box<dyn Producer<T>>,
    predicate: PredicateFn<T>,
}

impl<T: Send + 'static> Producer<T> for FilterProducer<T> {
    fn next(&mut self) -> Option<Result<T, StreamError>> {
        loop {
            match self.upstream.next()? {
                Ok(val) => {
                    if (self.predicate)(&val) {
                        return Some(Ok(val));
                    }
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

impl<T: Send + 'static> PlanNode<T> for FilterNode<T> {
    fn compile(&self) -> Box<dyn Producer<T>> {
        Box::new(FilterProducer {
            upstream: self.upstream.compile(),
            predicate: self.predicate.clone(),
        })
    }

    fn explain(&self, depth: usize, colored: bool) -> String {
        node_line(depth, "Filter", colored) + &self.upstream.explain(depth + 1, colored)
    }
}

#[cfg(test)]
mod tests {
    use rstest::*;

    use super::*;
    use crate::op::source::SourceNode;

    #[rstest]
    fn test_filter_keeps_matching_in_order() {
        let source = Arc::new(SourceNode::new(|| 1..=5));
        let node = FilterNode {
            upstream: source,
            predicate: Arc::new(|x: &i32| x % 2 == 1),
        };
        let mut producer = node.compile();
        let out: Vec<_> = std::iter::from_fn(|| producer.next())
            .map(Result::unwrap)
            .collect();
        assert_eq!(out, vec![1, 3, 5]);
    }
}
