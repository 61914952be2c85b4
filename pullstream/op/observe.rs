use std::sync::Arc;

use colored::Colorize;

use crate::errors::StreamError;
use crate::explain::node_line;
use crate::plan::PlanNode;
use crate::producer::Producer;

pub(crate) struct ObserveNode<T> {
    pub(crate) upstream: Arc<dyn PlanNode<T>>,
    pub(crate) what: String,
    pub(crate) colored: bool,
}

struct ObserveProducer<T> {
    upstream: Box<dyn Producer<T>>,
    what: String,
    colored: bool,
    count: u64,
    logged_final: bool,
}

impl<T> ObserveProducer<T> {
    fn is_power_of_two_or_one(n: u64) -> bool {
        n == 1 || (n > 0 && n & (n - 1) == 0)
    }

    fn log(&self, count: u64) {
        let msg = format!("observed {count} {}", self.what);
        if self.colored {
            tracing::info!("{}", msg.green());
        } else {
            tracing::info!("{}", msg);
        }
    }
}

impl<T: Send + 'static> Producer<T> for ObserveProducer<T> {
    fn next(&mut self) -> Option<Result<T, StreamError>> {
        match self.upstream.next() {
            None => {
                // Only log the end-of-stream count if it wasn't already logged as a power of two.
                if self.count > 0 && !self.logged_final {
                    self.log(self.count);
                }
                None
            }
            Some(Ok(val)) => {
                self.count += 1;
                if Self::is_power_of_two_or_one(self.count) {
                    self.log(self.count);
                    self.logged_final = true;
                } else {
                    self.logged_final = false;
                }
                Some(Ok(val))
            }
            Some(Err(e)) => Some(Err(e)),
        }
    }
}

impl<T: Send + 'static> PlanNode<T> for ObserveNode<T> {
    fn compile(&self) -> Box<dyn Producer<T>> {
        Box::new(ObserveProducer {
            upstream: self.upstream.compile(),
            what: self.what.clone(),
            colored: self.colored,
            count: 0,
            logged_final: false,
        })
    }

    fn explain(&self, depth: usize, colored: bool) -> String {
        node_line(depth, &format!("Observe({})", self.what), colored)
            + &self.upstream.explain(depth + 1, colored)
    }
}

#[cfg(test)]
mod tests {
    use rstest::*;

    use super::*;
    use crate::op::source::SourceNode;

    #[rstest]
    fn test_yields_all_elements_unchanged() {
        let source = Arc::new(SourceNode::new(|| 0..10));
        let node = ObserveNode {
            upstream: source,
            what: "elements".to_string(),
            colored: false,
        };
        let mut producer = node.compile();
        let out: Vec<_> = std::iter::from_fn(|| producer.next())
            .map(Result::unwrap)
            .collect();
        assert_eq!(out, (0..10).collect::<Vec<_>>());
    }

    #[rstest]
    fn test_power_of_two_detection() {
        for n in [1, 2, 4, 8, 16] {
            assert!(ObserveProducer::<i32>::is_power_of_two_or_one(n));
        }
        for n in [3, 5, 6, 7, 9] {
            assert!(!ObserveProducer::<i32>::is_power_of_two_or_one(n));
        }
    }
}
