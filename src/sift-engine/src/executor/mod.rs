//! Row-count filter executors.
//!
//! - [`FilterExecutor`]: owns a predicate chain and its controller, one
//!   cost observation per batch.
//! - [`SharedFilterExecutor`]: the same behind a lock, for callers that need
//!   one adaptive chain across threads.

mod filter;
mod shared;

pub use filter::FilterExecutor;
pub use shared::SharedFilterExecutor;
