use std::any::Any;

use error_stack::Context;

/// Context type for a [`Report`](error_stack::Report) built from an unhandled panic inside a
/// concurrent operator's worker thread. Unlike [`ElementError`](super::ElementError), this is
/// never something `Catch` can suppress — a worker panic means the closure
/// itself is broken, not that it rejected one element.
#[derive(Debug)]
pub struct WorkerPanic {
    message: String,
}

impl WorkerPanic {
    /// Build a [`WorkerPanic`] from a `std::panic::catch_unwind` payload.
    pub fn from_payload(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "worker thread panicked with a non-string payload".to_string()
        };
        WorkerPanic { message }
    }
}

impl std::fmt::Display for WorkerPanic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "worker panicked: {}", self.message)
    }
}

impl Context for WorkerPanic {}
