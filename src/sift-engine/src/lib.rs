//! Adaptive filter execution for Sift.
//!
//! This crate decides, at runtime and without a planner's estimates, the
//! order in which a chain of independent filter predicates is applied. It
//! perturbs the order between batches, watches the cost each batch
//! reports, and keeps or undoes each perturbation.

#![allow(
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation
)] // Row counts and draws are converted between integer and float domains
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::return_self_not_must_use)] // Builder patterns don't always need must_use
#![allow(clippy::float_cmp)] // Tests compare exact small-integer costs
//!
//! # Architecture
//!
//! ```text
//!   driver ──▶ FilterExecutor::evaluate(rows)
//!                  │  reads ordering
//!                  ▼
//!           PermutationState ◀── record_cost(cost) ── predicate chain
//! ```
//!
//! # Key Components
//!
//! - [`Predicate`]: what the executor needs from a predicate, two pure
//!   functions of the input row count
//! - [`PermutationState`]: the adaptive controller, a propose/observe
//!   stochastic local search over adjacent swaps
//! - [`FilterExecutor`]: runs a predicate chain in the controller's order
//!   and reports its cost
//! - [`SharedFilterExecutor`]: clonable handles over one `FilterExecutor`; a
//!   pending swap is always observed by the handle that proposed it
//! - [`AdaptiveFilterExec`]: the same loop over Arrow record batches
//! - [`FilterMetrics`]: batches, rows and swap counters
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use sift_engine::{FilterExecutor, LinearPredicate, Predicate};
//!
//! let predicates: Vec<Arc<dyn Predicate>> = vec![
//!     Arc::new(LinearPredicate::new(0.9, 1.0)),
//!     Arc::new(LinearPredicate::new(0.1, 1.0)),
//! ];
//! let mut executor = FilterExecutor::seeded(predicates, 42).unwrap();
//!
//! // The first batch runs in index order and a swap is tried.
//! let first = executor.evaluate(65536.0);
//! // The second batch observes the swap; it is cheaper and kept.
//! let second = executor.evaluate(65536.0);
//! assert!(second < first);
//! assert_eq!(executor.permutation(), &[1, 0]);
//! ```
//!
//! [`Predicate`]: predicate::Predicate
//! [`PermutationState`]: permutation::PermutationState
//! [`FilterExecutor`]: executor::FilterExecutor
//! [`SharedFilterExecutor`]: executor::SharedFilterExecutor
//! [`AdaptiveFilterExec`]: operators::AdaptiveFilterExec
//! [`FilterMetrics`]: metrics::FilterMetrics

pub mod executor;
pub mod metrics;
pub mod operators;
pub mod permutation;
pub mod predicate;

// Re-export commonly used types
pub use executor::{FilterExecutor, SharedFilterExecutor};
pub use metrics::{ExecutionTimer, FilterMetrics};
pub use operators::{AdaptiveFilterExec, BatchPredicate, FnPredicate};
pub use permutation::{
    Feedback, Phase, PermutationState, SwapSampler, MAX_SWAP_WEIGHT, MIN_SWAP_WEIGHT,
};
pub use predicate::{chain_cost, evaluate_chain, ChainOutcome, LinearPredicate, Predicate};
