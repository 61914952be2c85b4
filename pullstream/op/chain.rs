use std::{collections::VecDeque, sync::Arc};

use crate::errors::StreamError;
use crate::explain::node_line;
use crate::plan::PlanNode;
use crate::producer::Producer;

pub(crate) struct ChainNode<T> {
    pub(crate) first: Arc<dyn PlanNode<T>>,
    pub(crate) rest: Vec<Arc<dyn PlanNode<T>>>,
}

struct ChainProducer<T> {
    producers: VecDeque<Box<dyn Producer<T>>>,
}

impl<T: Send + 'static> Producer<T> for ChainProducer<T> {
    fn next(&mut self) -> Option<Result<T, StreamError>> {
        while let Some(front) = self.producers.front_mut() {
            if let Some(item) = front.next() {
                return Some(item);
            }
            self.producers.pop_front();
        }
        None
    }
}

impl<T: Send + 'static> PlanNode<T> for ChainNode<T> {
    fn compile(&self) -> Box<dyn Producer<T>> {
        let mut producers = VecDeque::with_capacity(1 + self.rest.len());
        producers.push_back(self.first.compile());
        for plan in &self.rest {
            producers.push_back(plan.compile());
        }
        Box::new(ChainProducer { producers })
    }

    fn explain(&self, depth: usize, colored: bool) -> String {
        let mut out = node_line(depth, "Chain", colored);
        out += &self.first.explain(depth + 1, colored);
        for plan in &self.rest {
            out += &plan.explain(depth + 1, colored);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use rstest::*;

    use super::*;
    use crate::op::source::SourceNode;

    #[rstest]
    fn test_chain_concatenates_in_order() {
        let a = Arc::new(SourceNode::new(|| 0..3));
        let b = Arc::new(SourceNode::new(|| 10..12));
        let c = Arc::new(SourceNode::new(|| 20..21));
        let node = ChainNode {
            first: a,
            rest: vec![b, c],
        };
        let mut producer = node.compile();
        let out: Vec<_> = std::iter::from_fn(|| producer.next())
            .map(Result::unwrap)
            .collect();
        assert_eq!(out, vec![0, 1, 2, 10, 11, 20]);
    }
}
