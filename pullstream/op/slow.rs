use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use crate::errors::StreamError;
use crate::explain::node_line;
use crate::misc::sleep_compat;
use crate::plan::PlanNode;
use crate::producer::Producer;

pub(crate) struct SlowNode<T> {
    pub(crate) upstream: Arc<dyn PlanNode<T>>,
    pub(crate) frequency: f64,
}

impl<T> SlowNode<T> {
    pub(crate) fn new(upstream: Arc<dyn PlanNode<T>>, frequency: f64) -> Self {
        assert!(
            frequency.is_finite() && frequency > 0.0,
            "slow frequency must be finite and > 0, got {frequency}"
        );
        SlowNode {
            upstream,
            frequency,
        }
    }
}

struct SlowProducer<T> {
    upstream: Box<dyn Producer<T>>,
    interval: Duration,
    last_yield: Option<Instant>,
}

impl<T: Send + 'static> Producer<T> for SlowProducer<T> {
    fn next(&mut self) -> Option<Result<T, StreamError>> {
        if let Some(last) = self.last_yield {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                sleep_compat(self.interval - elapsed);
            }
        }
        let item = self.upstream.next();
        self.last_yield = Some(Instant::now());
        item
    }
}

impl<T: Send + 'static> PlanNode<T> for SlowNode<T> {
    fn compile(&self) -> Box<dyn Producer<T>> {
        Box::new(SlowProducer {
            upstream: self.upstream.compile(),
            interval: Duration::from_secs_f64(1.0 / self.frequency),
            last_yield: None,
        })
    }

    fn explain(&self, depth: usize, colored: bool) -> String {
        node_line(
            depth,
            &format!("Slow(frequency={})", self.frequency),
            colored,
        ) + &self.upstream.explain(depth + 1, colored)
    }
}
