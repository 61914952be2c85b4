use std::{collections::VecDeque, sync::mpsc, sync::Arc};

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::errors::{ElementError, StreamError, WorkerPanic};
use crate::producer::Producer;

/// Runs `func` over upstream elements with up to `concurrency` invocations in flight, yielding
/// results in the same order upstream produced them.
///
/// Order is preserved with a plain FIFO of one-shot receivers rather than an index-keyed cache:
/// because each submission's receiver is pushed in upstream order and popped in the same order,
/// draining the front of the queue always yields results in upstream order regardless of which
/// worker finishes first.
pub(crate) struct ConcurrentMapProducer<T, R> {
    upstream: Box<dyn Producer<T>>,
    func: Arc<dyn Fn(T) -> Result<R, ElementError> + Send + Sync>,
    pool: ThreadPool,
    slots: VecDeque<mpsc::Receiver<Result<R, StreamError>>>,
    concurrency: usize,
    upstream_exhausted: bool,
}

impl<T, R> ConcurrentMapProducer<T, R>
where
    T: Send + 'static,
    R: Send + 'static,
{
    pub(crate) fn new(
        upstream: Box<dyn Producer<T>>,
        concurrency: usize,
        func: Arc<dyn Fn(T) -> Result<R, ElementError> + Send + Sync>,
    ) -> Self {
        let pool = ThreadPoolBuilder::new()
            .num_threads(concurrency)
            .thread_name(|i| format!("pullstream-map-{i}"))
            .build()
            .expect("failed to build concurrent map worker pool");
        ConcurrentMapProducer {
            upstream,
            func,
            pool,
            slots: VecDeque::with_capacity(concurrency),
            concurrency,
            upstream_exhausted: false,
        }
    }

    fn submit_next(&mut self) {
        if self.upstream_exhausted {
            return;
        }
        match self.upstream.next() {
            None => self.upstream_exhausted = true,
            Some(item) => {
                let (tx, rx) = mpsc::sync_channel(1);
                let func = self.func.clone();
                self.pool.spawn(move || {
                    let result = match item {
                        Err(e) => Err(e),
                        Ok(val) => {
                            match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                                func(val)
                            })) {
                                Ok(Ok(out)) => Ok(out),
                                Ok(Err(e)) => Err(StreamError::Element(e)),
                                Err(payload) => Err(StreamError::Worker(error_stack::Report::new(
                                    WorkerPanic::from_payload(payload),
                                ))),
                            }
                        }
                    };
                    // Receiver may already be gone if the producer was dropped mid-flight.
                    let _ = tx.send(result);
                });
                self.slots.push_back(rx);
            }
        }
    }

    fn fill(&mut self) {
        while self.slots.len() < self.concurrency && !self.upstream_exhausted {
            self.submit_next();
        }
    }
}

impl<T, R> Producer<R> for ConcurrentMapProducer<T, R>
where
    T: Send + 'static,
    R: Send + 'static,
{
    fn next(&mut self) -> Option<Result<R, StreamError>> {
        self.fill();
        let rx = self.slots.pop_front()?;
        match rx.recv() {
            Ok(result) => Some(result),
            // The worker was dropped without sending, which only happens on pool teardown.
            Err(_) => None,
        }
    }
}
