//! Adaptive conjunctive filter over Arrow record batches.

use std::fmt;
use std::sync::Arc;

use arrow::array::{Array, BooleanArray};
use arrow::compute::filter_record_batch;
use arrow::record_batch::RecordBatch;
use log::trace;
use rand_chacha::ChaCha20Rng;

use common_config::{CostMeasure, ReorderConfig};
use common_error::{ensure, SiftResult};

use crate::metrics::{ExecutionTimer, FilterMetrics};
use crate::permutation::{PermutationState, SwapSampler};

/// A predicate evaluated against a whole record batch.
pub trait BatchPredicate: Send + Sync + fmt::Debug {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Evaluate to one boolean per row. Nulls are treated as false.
    fn evaluate(&self, batch: &RecordBatch) -> SiftResult<BooleanArray>;

    /// Relative cost of evaluating one row, used by
    /// [`CostMeasure::RowsEvaluated`].
    fn row_cost(&self) -> f64 {
        1.0
    }
}

/// [`BatchPredicate`] backed by a closure.
pub struct FnPredicate<F> {
    name: String,
    row_cost: f64,
    func: F,
}

impl<F> FnPredicate<F>
where
    F: Fn(&RecordBatch) -> SiftResult<BooleanArray> + Send + Sync,
{
    /// Create a predicate with unit row cost.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            row_cost: 1.0,
            func,
        }
    }

    /// Set the relative per-row cost.
    pub fn with_row_cost(mut self, row_cost: f64) -> Self {
        self.row_cost = row_cost;
        self
    }
}

impl<F> fmt::Debug for FnPredicate<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnPredicate")
            .field("name", &self.name)
            .field("row_cost", &self.row_cost)
            .finish_non_exhaustive()
    }
}

impl<F> BatchPredicate for FnPredicate<F>
where
    F: Fn(&RecordBatch) -> SiftResult<BooleanArray> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, batch: &RecordBatch) -> SiftResult<BooleanArray> {
        (self.func)(batch)
    }

    fn row_cost(&self) -> f64 {
        self.row_cost
    }
}

/// Filters batches by the conjunction of its predicates, learning the
/// cheapest order as batches flow through.
///
/// After each predicate the batch is narrowed, so later predicates only see
/// surviving rows; once nothing survives the rest are skipped. The output
/// does not depend on the order, only the cost does.
pub struct AdaptiveFilterExec<S = ChaCha20Rng> {
    predicates: Vec<Arc<dyn BatchPredicate>>,
    state: PermutationState<S>,
    measure: CostMeasure,
    metrics: FilterMetrics,
}

impl AdaptiveFilterExec<ChaCha20Rng> {
    /// Create an operator configured from a [`ReorderConfig`].
    pub fn try_new(
        predicates: Vec<Arc<dyn BatchPredicate>>,
        config: &ReorderConfig,
    ) -> SiftResult<Self> {
        let state = PermutationState::from_config(predicates.len(), config)?;
        Ok(Self::with_state(predicates, state, config.cost_measure))
    }
}

impl<S: SwapSampler> AdaptiveFilterExec<S> {
    /// Create an operator driven by an explicit sampler.
    pub fn with_sampler(
        predicates: Vec<Arc<dyn BatchPredicate>>,
        sampler: S,
        measure: CostMeasure,
    ) -> SiftResult<Self> {
        let state = PermutationState::new(predicates.len(), sampler)?;
        Ok(Self::with_state(predicates, state, measure))
    }

    fn with_state(
        predicates: Vec<Arc<dyn BatchPredicate>>,
        state: PermutationState<S>,
        measure: CostMeasure,
    ) -> Self {
        Self {
            predicates,
            state,
            measure,
            metrics: FilterMetrics::new(),
        }
    }

    /// Filter one batch.
    ///
    /// The cost is reported to the controller only when every predicate
    /// evaluated successfully.
    pub fn filter_batch(&mut self, batch: &RecordBatch) -> SiftResult<RecordBatch> {
        let timer = ExecutionTimer::start();
        let rows_in = batch.num_rows();
        let mut current = batch.clone();
        let mut weighted_rows = 0.0;

        for position in 0..self.predicates.len() {
            if current.num_rows() == 0 {
                break;
            }
            let predicate = Arc::clone(&self.predicates[self.state.get(position)]);
            let mask = predicate.evaluate(&current)?;
            ensure!(
                mask.len() == current.num_rows(),
                ExecutionError: "predicate '{}' returned {} values for {} rows",
                predicate.name(),
                mask.len(),
                current.num_rows()
            );
            weighted_rows += current.num_rows() as f64 * predicate.row_cost();
            current = filter_record_batch(&current, &mask)?;
        }

        let cost = match self.measure {
            CostMeasure::RowsEvaluated => weighted_rows,
            CostMeasure::ElapsedNanos => timer.stop().as_nanos() as f64,
        };
        let feedback = self.state.record_cost(cost);
        trace!(
            "AdaptiveFilterExec: rows {} -> {}, cost {}, {:?}",
            rows_in,
            current.num_rows(),
            cost,
            feedback
        );
        self.metrics
            .record_batch(rows_in as f64, current.num_rows() as f64, cost, feedback);

        Ok(current)
    }
}

impl<S> AdaptiveFilterExec<S> {
    /// Ordering the next batch will use.
    pub fn permutation(&self) -> &[usize] {
        self.state.permutation()
    }

    /// Accumulated metrics.
    pub fn metrics(&self) -> &FilterMetrics {
        &self.metrics
    }

    /// Cost measure in use.
    pub fn cost_measure(&self) -> CostMeasure {
        self.measure
    }

    /// Display string, predicates listed in current order.
    pub fn display(&self) -> String {
        let names: Vec<&str> = self
            .state
            .permutation()
            .iter()
            .map(|&idx| self.predicates[idx].name())
            .collect();
        format!("AdaptiveFilterExec({})", names.join(" AND "))
    }
}

impl<S> fmt::Debug for AdaptiveFilterExec<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdaptiveFilterExec")
            .field("predicates", &self.predicates)
            .field("state", &self.state)
            .field("measure", &self.measure)
            .finish_non_exhaustive()
    }
}
