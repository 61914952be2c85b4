use std::sync::{mpsc, Arc};

use parking_lot::Mutex;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::errors::{StreamError, WorkerPanic};
use crate::producer::Producer;

/// Runs up to `concurrency` sub-iterables concurrently, each owned exclusively by one worker
/// thread until it is exhausted. Output order is arrival order across workers, not upstream
/// order — the documented trade-off for parallel consumption of multiple sub-iterables.
pub(crate) struct ConcurrentFlattenProducer<T> {
    pool: ThreadPool,
    rx: mpsc::Receiver<Result<T, StreamError>>,
}

impl<T: Send + 'static> ConcurrentFlattenProducer<T> {
    pub(crate) fn new<I>(upstream: Box<dyn Producer<I>>, concurrency: usize) -> Self
    where
        I: IntoIterator<Item = T> + Send + 'static,
        I::IntoIter: Send + 'static,
    {
        let (tx, rx) = mpsc::sync_channel::<Result<T, StreamError>>(concurrency);
        let shared_upstream: Arc<Mutex<Box<dyn Producer<I>>>> = Arc::new(Mutex::new(upstream));
        let pool = ThreadPoolBuilder::new()
            .num_threads(concurrency)
            .thread_name(|i| format!("pullstream-flatten-{i}"))
            .build()
            .expect("failed to build concurrent flatten worker pool");

        for _ in 0..concurrency {
            let shared_upstream = shared_upstream.clone();
            let tx = tx.clone();
            pool.spawn(move || loop {
                let next_sub = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    shared_upstream.lock().next()
                }));
                let next_sub = match next_sub {
                    Ok(next_sub) => next_sub,
                    Err(payload) => {
                        let _ = tx.send(Err(StreamError::Worker(error_stack::Report::new(
                            WorkerPanic::from_payload(payload),
                        ))));
                        return;
                    }
                };
                match next_sub {
                    None => return,
                    Some(Err(e)) => {
                        if tx.send(Err(e)).is_err() {
                            return;
                        }
                    }
                    Some(Ok(sub)) => {
                        let mut iter = sub.into_iter();
                        loop {
                            let next_item = std::panic::catch_unwind(
                                std::panic::AssertUnwindSafe(|| iter.next()),
                            );
                            match next_item {
                                Ok(None) => break,
                                Ok(Some(item)) => {
                                    if tx.send(Ok(item)).is_err() {
                                        return;
                                    }
                                }
                                Err(payload) => {
                                    let _ =
                                        tx.send(Err(StreamError::Worker(error_stack::Report::new(
                                            WorkerPanic::from_payload(payload),
                                        ))));
                                    return;
                                }
                            }
                        }
                    }
                }
            });
        }
        // Drop our own sender so `rx` closes once every worker's clone is gone.
        drop(tx);

        ConcurrentFlattenProducer { pool, rx }
    }
}

impl<T: Send + 'static> Producer<T> for ConcurrentFlattenProducer<T> {
    fn next(&mut self) -> Option<Result<T, StreamError>> {
        let _ = &self.pool;
        self.rx.recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use rstest::*;

    use super::*;
    use crate::op::source::SourceNode;
    use crate::plan::PlanNode;

    #[rstest]
    fn test_yields_every_element_exactly_once() {
        let source = SourceNode::new(|| vec![vec![1, 2], vec![3], Vec::<i32>::new(), vec![4, 5]]);
        let upstream = source.compile();
        let mut producer = ConcurrentFlattenProducer::new(upstream, 3);
        let mut out: Vec<_> = std::iter::from_fn(|| producer.next())
            .map(Result::unwrap)
            .collect();
        out.sort();
        assert_eq!(out, vec![1, 2, 3, 4, 5]);
    }

    /// Panics on its second `next()` call; used to prove a panic inside a sub-iterable's
    /// iteration surfaces as a `StreamError::Worker` rather than silently killing its worker.
    struct PanicOnSecond {
        remaining: std::vec::IntoIter<i32>,
        calls: usize,
    }

    impl PanicOnSecond {
        fn new(items: Vec<i32>) -> Self {
            PanicOnSecond {
                remaining: items.into_iter(),
                calls: 0,
            }
        }
    }

    impl Iterator for PanicOnSecond {
        type Item = i32;

        fn next(&mut self) -> Option<i32> {
            self.calls += 1;
            if self.calls == 2 {
                panic!("boom");
            }
            self.remaining.next()
        }
    }

    #[rstest]
    fn test_worker_panic_surfaces_as_stream_error() {
        let source = SourceNode::new(|| vec![PanicOnSecond::new(vec![1, 2, 3])]);
        let upstream = source.compile();
        let mut producer = ConcurrentFlattenProducer::new(upstream, 1);
        let saw_worker_error = std::iter::from_fn(|| producer.next())
            .any(|result| matches!(result, Err(StreamError::Worker(_))));
        assert!(saw_worker_error);
    }
}
