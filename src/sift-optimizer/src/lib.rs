//! Reference optimizer for Sift predicate orderings.
//!
//! Finds the true minimum-cost ordering of a fixed predicate set by
//! exhaustive search. It exists to benchmark the adaptive controller and is
//! never consulted by it.

mod exhaustive;

pub use exhaustive::{
    min_cost_ordering, OptimalOrdering, ReferenceOptimizer, MAX_EXHAUSTIVE_PREDICATES,
};
