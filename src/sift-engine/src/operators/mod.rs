//! Arrow batch operators.

mod filter;

pub use filter::{AdaptiveFilterExec, BatchPredicate, FnPredicate};
