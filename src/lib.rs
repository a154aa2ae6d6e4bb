//! Sift - adaptive ordering of filter predicates
//!
//! Sift learns, while batches stream through a filter, which order of
//! independent predicates is cheapest to evaluate. It needs no planner
//! statistics: the only input is the cost each batch reports.

#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

// Re-export member crates
pub use common_config as config;
pub use common_error as error;
pub use sift_engine as engine;
pub use sift_optimizer as optimizer;

pub use common_error::{SiftError, SiftResult};
pub use sift_engine::{FilterExecutor, PermutationState, Predicate};

/// Sift version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
