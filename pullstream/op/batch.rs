use std::{
    sync::{mpsc, Arc},
    thread,
    time::{Duration, Instant},
};

use crate::errors::StreamError;
use crate::explain::node_line;
use crate::plan::PlanNode;
use crate::producer::Producer;

pub(crate) struct BatchNode<T> {
    pub(crate) upstream: Arc<dyn PlanNode<T>>,
    pub(crate) size: usize,
    pub(crate) timeout: Option<Duration>,
}

impl<T> BatchNode<T> {
    pub(crate) fn new(upstream: Arc<dyn PlanNode<T>>, size: usize, timeout: Option<Duration>) -> Self {
        assert!(size >= 1, "batch size must be >= 1, got {size}");
        if let Some(d) = timeout {
            assert!(d > Duration::ZERO, "batch timeout must be > 0 if set");
        }
        BatchNode {
            upstream,
            size,
            timeout,
        }
    }
}

/// A dedicated background thread that pulls `upstream` to exhaustion and forwards each result
/// (or `None` on exhaustion) over a rendezvous channel, so [`BatchProducer`] can wait on it with
/// a deadline via `recv_timeout` — there is no native timed-pull on an arbitrary `Producer`.
fn spawn_puller<T: Send + 'static>(
    mut upstream: Box<dyn Producer<T>>,
) -> mpsc::Receiver<Option<Result<T, StreamError>>> {
    let (tx, rx) = mpsc::sync_channel(0);
    thread::Builder::new()
        .name("pullstream-batch-puller".into())
        .spawn(move || loop {
            let item = upstream.next();
            let exhausted = item.is_none();
            if tx.send(item).is_err() || exhausted {
                return;
            }
        })
        .expect("failed to spawn batch puller thread");
    rx
}

struct BatchProducer<T> {
    rx: mpsc::Receiver<Option<Result<T, StreamError>>>,
    size: usize,
    timeout: Option<Duration>,
    stashed_error: Option<StreamError>,
    done: bool,
}

impl<T: Send + 'static> Producer<Vec<T>> for BatchProducer<T> {
    fn next(&mut self) -> Option<Result<Vec<T>, StreamError>> {
        if self.done {
            return None;
        }
        if let Some(err) = self.stashed_error.take() {
            return Some(Err(err));
        }

        let mut batch = Vec::with_capacity(self.size);
        let mut deadline: Option<Instant> = None;

        loop {
            if batch.len() >= self.size {
                return Some(Ok(batch));
            }

            let received = match deadline {
                Some(d) => {
                    let now = Instant::now();
                    if now >= d {
                        return Some(Ok(batch));
                    }
                    match self.rx.recv_timeout(d - now) {
                        Ok(v) => v,
                        Err(mpsc::RecvTimeoutError::Timeout) => return Some(Ok(batch)),
                        Err(mpsc::RecvTimeoutError::Disconnected) => None,
                    }
                }
                None => self.rx.recv().unwrap_or(None),
            };

            match received {
                None => {
                    self.done = true;
                    return if batch.is_empty() { None } else { Some(Ok(batch)) };
                }
                Some(Err(e)) => {
                    if batch.is_empty() {
                        return Some(Err(e));
                    }
                    self.stashed_error = Some(e);
                    return Some(Ok(batch));
                }
                Some(Ok(val)) => {
                    if batch.is_empty() {
                        deadline = self.timeout.map(|d| Instant::now() + d);
                    }
                    batch.push(val);
                }
            }
        }
    }
}

impl<T: Send + 'static> PlanNode<Vec<T>> for BatchNode<T> {
    fn compile(&self) -> Box<dyn Producer<Vec<T>>> {
        let rx = spawn_puller(self.upstream.compile());
        Box::new(BatchProducer {
            rx,
            size: self.size,
            timeout: self.timeout,
            stashed_error: None,
            done: false,
        })
    }

    fn explain(&self, depth: usize, colored: bool) -> String {
        let label = match self.timeout {
            Some(d) => format!("Batch(size={}, timeout={:?})", self.size, d),
            None => format!("Batch(size={})", self.size),
        };
        node_line(depth, &label, colored) + &self.upstream.explain(depth + 1, colored)
    }
}

#[cfg(test)]
mod tests {
    use rstest::*;

    use super::*;
    use crate::op::source::SourceNode;

    #[rstest]
    fn test_batches_of_fixed_size() {
        let source = Arc::new(SourceNode::new(|| 0..10));
        let node = BatchNode::new(source, 3, None);
        let mut producer = node.compile();
        let out: Vec<_> = std::iter::from_fn(|| producer.next())
            .map(Result::unwrap)
            .collect();
        assert_eq!(
            out,
            vec![vec![0, 1, 2], vec![3, 4, 5], vec![6, 7, 8], vec![9]]
        );
    }

    #[rstest]
    fn test_size_one_yields_singleton_batches() {
        let source = Arc::new(SourceNode::new(|| 0..3));
        let node = BatchNode::new(source, 1, None);
        let mut producer = node.compile();
        let out: Vec<_> = std::iter::from_fn(|| producer.next())
            .map(Result::unwrap)
            .collect();
        assert_eq!(out, vec![vec![0], vec![1], vec![2]]);
    }

    #[rstest]
    fn test_empty_source_yields_nothing() {
        let source = Arc::new(SourceNode::new(Vec::<i32>::new));
        let node = BatchNode::new(source, 4, None);
        let mut producer = node.compile();
        assert!(producer.next().is_none());
    }

    #[rstest]
    fn test_timeout_flushes_partial_batch() {
        let node = BatchNode::new(
            Arc::new(SourceNode::new(|| {
                (0..3).map(|i| {
                    if i > 0 {
                        thread::sleep(Duration::from_millis(60));
                    }
                    i
                })
            })),
            100,
            Some(Duration::from_millis(20)),
        );
        let mut producer = node.compile();
        let first = producer.next().unwrap().unwrap();
        assert_eq!(first, vec![0]);
    }

    #[rstest]
    #[should_panic(expected = "batch size must be >= 1")]
    fn test_zero_size_panics() {
        let source = Arc::new(SourceNode::new(|| 0..1));
        let _ = BatchNode::new(source, 0, None);
    }
}
