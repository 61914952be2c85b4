use error_stack::Report;

use super::{element_error::ElementError, worker_panic::WorkerPanic};

/// The error type flowing through every [`Producer::next`](crate::producer::Producer::next).
#[derive(Debug)]
pub enum StreamError {
    /// An error raised by user code or a source iterator, eligible for `Catch`
    /// to suppress.
    Element(ElementError),
    /// An unhandled panic inside a concurrent operator's worker thread. Never suppressed.
    Worker(Report<WorkerPanic>),
}

impl std::fmt::Display for StreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamError::Element(err) => write!(f, "{}", err),
            StreamError::Worker(report) => write!(f, "{}", report),
        }
    }
}

impl std::error::Error for StreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StreamError::Element(err) => Some(err),
            StreamError::Worker(_) => None,
        }
    }
}

impl From<ElementError> for StreamError {
    fn from(err: ElementError) -> Self {
        StreamError::Element(err)
    }
}

impl From<Report<WorkerPanic>> for StreamError {
    fn from(report: Report<WorkerPanic>) -> Self {
        StreamError::Worker(report)
    }
}
