use std::sync::Arc;

use crate::errors::{ElementError, ErrorClasses, StreamError};
use crate::explain::node_line;
use crate::plan::PlanNode;
use crate::producer::Producer;

type WhenFn = Arc<dyn Fn(&ElementError) -> bool + Send + Sync>;

pub(crate) struct CatchNode<T> {
    pub(crate) upstream: Arc<dyn PlanNode<T>>,
    pub(crate) classes: Arc<ErrorClasses>,
    pub(crate) when: Option<WhenFn>,
}

struct CatchProducer<T> {
    upstream: Box<dyn Producer<T>>,
    classes: Arc<ErrorClasses>,
    when: Option<WhenFn>,
}

impl<T: Send + 'static> Producer<T> for CatchProducer<T> {
    fn next(&mut self) -> Option<Result<T, StreamError>> {
        loop {
            match self.upstream.next()? {
                Ok(val) => return Some(Ok(val)),
                // A worker panic is a broken closure, not a rejected element: never caught.
                Err(StreamError::Worker(report)) => return Some(Err(StreamError::Worker(report))),
                Err(StreamError::Element(err)) => {
                    let class_matches = self.classes.matches(&err);
                    let should_catch = class_matches
                        && self.when.as_ref().map(|f| f(&err)).unwrap_or(true);
                    if should_catch {
                        continue;
                    }
                    return Some(Err(StreamError::Element(err)));
                }
            }
        }
    }
}

impl<T: Send + 'static> PlanNode<T> for CatchNode<T> {
    fn compile(&self) -> Box<dyn Producer<T>> {
        Box::new(CatchProducer {
            upstream: self.upstream.compile(),
            classes: self.classes.clone(),
            when: self.when.clone(),
        })
    }

    fn explain(&self, depth: usize, colored: bool) -> String {
        node_line(depth, "Catch", colored) + &self.upstream.explain(depth + 1, colored)
    }
}
