mod element_error;
mod matcher;
mod stream_error;
mod worker_panic;

pub use element_error::ElementError;
pub use matcher::{ErrorClasses, ErrorMatcher};
pub use stream_error::StreamError;
pub use worker_panic::WorkerPanic;
