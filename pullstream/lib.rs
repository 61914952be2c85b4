#![allow(clippy::module_inception)]
#![allow(clippy::type_complexity)]
#![warn(clippy::disallowed_types)]
#![warn(missing_docs)]

//! pullstream - a fluent, lazily-evaluated stream processing pipeline.
//!
//! Build a pipeline with [`Stream::source`] and the fluent combinators on [`Stream`] (`map`,
//! `filter`, `flatten`, `batch`, `slow`, `catch`, `observe`, `chain`), then either iterate it
//! directly or drive it with [`Stream::iterate`] for built-in error sampling.

// When docs auto created for docs.rs, will include features, given docs.rs uses nightly by default:
#![cfg_attr(all(doc, CHANNEL_NIGHTLY), feature(doc_auto_cfg))]

mod driver;
mod explain;
/// Error types: [`ElementError`], [`WorkerPanic`], [`StreamError`], and the [`ErrorClasses`]
/// matcher used by the `catch` operator.
pub mod errors;
/// Completely miscellaneous utilities.
pub mod misc;
mod op;
mod plan;
mod producer;
mod stream;

pub use driver::IterateOptions;
pub use producer::Producer;
pub use stream::Stream;

#[cfg(test)]
mod testing;
