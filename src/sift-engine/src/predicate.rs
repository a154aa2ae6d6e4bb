//! Predicate interface consumed by the reordering controller.
//!
//! The controller never inspects a predicate. It only needs two pure
//! functions of the incoming row count: how many rows survive, and how much
//! it costs to evaluate the predicate over that many rows.

use std::fmt;
use std::sync::Arc;

/// A filter predicate as seen by the executor.
///
/// Both methods must be deterministic functions of `row_count`.
pub trait Predicate: Send + Sync + fmt::Debug {
    /// Number of rows that survive when `row_count` rows are filtered.
    fn apply_and_reduce(&self, row_count: f64) -> f64;

    /// Cost of evaluating the predicate over `row_count` rows.
    fn cost(&self, row_count: f64) -> f64;
}

impl<P: Predicate + ?Sized> Predicate for Arc<P> {
    fn apply_and_reduce(&self, row_count: f64) -> f64 {
        (**self).apply_and_reduce(row_count)
    }

    fn cost(&self, row_count: f64) -> f64 {
        (**self).cost(row_count)
    }
}

impl<P: Predicate + ?Sized> Predicate for Box<P> {
    fn apply_and_reduce(&self, row_count: f64) -> f64 {
        (**self).apply_and_reduce(row_count)
    }

    fn cost(&self, row_count: f64) -> f64 {
        (**self).cost(row_count)
    }
}

/// Predicate with a constant selectivity and a constant per-row cost.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearPredicate {
    selectivity: f64,
    row_cost: f64,
}

impl LinearPredicate {
    /// Create a predicate keeping `selectivity` of its input at `row_cost` per row.
    #[must_use]
    pub const fn new(selectivity: f64, row_cost: f64) -> Self {
        Self {
            selectivity,
            row_cost,
        }
    }

    /// Fraction of rows kept.
    pub fn selectivity(&self) -> f64 {
        self.selectivity
    }

    /// Cost per input row.
    pub fn row_cost(&self) -> f64 {
        self.row_cost
    }
}

impl Predicate for LinearPredicate {
    fn apply_and_reduce(&self, row_count: f64) -> f64 {
        row_count * self.selectivity
    }

    fn cost(&self, row_count: f64) -> f64 {
        row_count * self.row_cost
    }
}

impl fmt::Display for LinearPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Linear(selectivity={:.3}, row_cost={:.3})",
            self.selectivity, self.row_cost
        )
    }
}

/// Result of running a row count through a predicate chain.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChainOutcome {
    /// Total evaluation cost.
    pub cost: f64,
    /// Rows left after the last predicate.
    pub rows_out: f64,
}

/// Run `row_count` rows through `predicates` in `order`.
///
/// Each predicate is charged for the rows that reach it, then narrows the
/// running count for the next one.
pub fn evaluate_chain<P: Predicate>(predicates: &[P], order: &[usize], row_count: f64) -> ChainOutcome {
    let mut rows = row_count;
    let mut cost = 0.0;
    for &idx in order {
        let predicate = &predicates[idx];
        cost += predicate.cost(rows);
        rows = predicate.apply_and_reduce(rows);
    }
    ChainOutcome {
        cost,
        rows_out: rows,
    }
}

/// Total cost of running `row_count` rows through `predicates` in `order`.
pub fn chain_cost<P: Predicate>(predicates: &[P], order: &[usize], row_count: f64) -> f64 {
    evaluate_chain(predicates, order, row_count).cost
}
