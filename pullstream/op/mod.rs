//! One producer-and-plan-node pair per pipeline combinator.

pub(crate) mod batch;
pub(crate) mod catch;
pub(crate) mod chain;
pub(crate) mod concurrent_flatten;
pub(crate) mod concurrent_map;
pub(crate) mod filter;
pub(crate) mod flatten;
pub(crate) mod map;
pub(crate) mod observe;
pub(crate) mod slow;
pub(crate) mod source;
