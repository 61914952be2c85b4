use std::sync::Arc;

use parking_lot::Mutex;

use crate::errors::{ElementError, ErrorClasses, StreamError};
use crate::stream::Stream;

/// Up to this many error messages are logged (and the first is eligible to be raised) per
/// `iterate()` call when `fail_fast` is `false`.
const MAX_ERROR_SAMPLES: usize = 8;

/// Options controlling [`Stream::iterate`].
#[derive(Debug, Clone)]
pub struct IterateOptions {
    /// How many yielded elements to keep in the returned `Vec`. The stream is always drained to
    /// completion regardless of this limit.
    pub collect_limit: usize,
    /// If, after a full run, more than this many element errors were suppressed, the first
    /// sampled one is returned as `Err`. Ignored when `fail_fast` is `true`.
    pub raise_if_more_errors_than: usize,
    /// When `true`, the first error (of any kind) aborts iteration immediately instead of being
    /// sampled and suppressed.
    pub fail_fast: bool,
}

impl Default for IterateOptions {
    fn default() -> Self {
        IterateOptions {
            collect_limit: 0,
            raise_if_more_errors_than: 0,
            fail_fast: false,
        }
    }
}

#[derive(Default)]
struct ErrorAccumulator {
    count: u64,
    // ElementError isn't Clone (it wraps a `Box<dyn Error>`), so samples are captured as their
    // already-rendered display string rather than as live error objects.
    samples: Vec<String>,
}

pub(crate) fn run_iteration<T: Send + 'static>(
    stream: &Stream<T>,
    options: IterateOptions,
) -> Result<Vec<T>, StreamError> {
    let observed = stream.observe("output elements", false);

    let accumulator = if options.fail_fast {
        None
    } else {
        Some(Arc::new(Mutex::new(ErrorAccumulator::default())))
    };

    let wrapped = match &accumulator {
        None => observed,
        Some(acc) => {
            let acc = acc.clone();
            let when: Arc<dyn Fn(&ElementError) -> bool + Send + Sync> =
                Arc::new(move |err: &ElementError| {
                    let mut guard = acc.lock();
                    guard.count += 1;
                    if guard.samples.len() < MAX_ERROR_SAMPLES {
                        guard.samples.push(err.fmt_as_str(false));
                    }
                    true
                });
            observed.catch(ErrorClasses::All, Some(when))
        }
    };

    tracing::info!("\n{}", wrapped.explain(false));

    let mut out = Vec::new();
    for item in &wrapped {
        match item {
            Ok(val) => {
                if out.len() < options.collect_limit {
                    out.push(val);
                }
            }
            // With `fail_fast`, any error (element or worker) aborts here. Without it, every
            // element error was already suppressed by the catch-all above, so only a fatal
            // worker panic can still reach this branch.
            Err(e) => return Err(e),
        }
    }

    if let Some(acc) = accumulator {
        let guard = acc.lock();
        if guard.count > 0 {
            for sample in &guard.samples {
                tracing::error!("{}", sample);
            }
        }
        if guard.count > options.raise_if_more_errors_than as u64 {
            let first = guard.samples.first().cloned().unwrap_or_default();
            return Err(StreamError::Element(ElementError::from_message(first)));
        }
    }

    Ok(out)
}
