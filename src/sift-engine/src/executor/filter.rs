//! Adaptive filter over a chain of row-count predicates.

use std::sync::Arc;

use log::trace;
use rand_chacha::ChaCha20Rng;

use common_config::ReorderConfig;
use common_error::SiftResult;

use crate::metrics::FilterMetrics;
use crate::permutation::{PermutationState, SwapSampler};
use crate::predicate::{evaluate_chain, Predicate};

/// Applies predicates in the controller's order and feeds the cost back.
///
/// `evaluate` is the only place the ordering is read and the only place the
/// controller hears about a batch: one cost value, nothing else.
pub struct FilterExecutor<S = ChaCha20Rng> {
    predicates: Vec<Arc<dyn Predicate>>,
    state: PermutationState<S>,
    metrics: FilterMetrics,
}

impl FilterExecutor<ChaCha20Rng> {
    /// Executor whose controller is seeded from OS entropy.
    pub fn new(predicates: Vec<Arc<dyn Predicate>>) -> SiftResult<Self> {
        let state = PermutationState::from_entropy(predicates.len())?;
        Ok(Self::with_state(predicates, state))
    }

    /// Executor whose controller is seeded with `seed`.
    pub fn seeded(predicates: Vec<Arc<dyn Predicate>>, seed: u64) -> SiftResult<Self> {
        let state = PermutationState::seeded(predicates.len(), seed)?;
        Ok(Self::with_state(predicates, state))
    }

    /// Executor configured from a [`ReorderConfig`].
    pub fn from_config(
        predicates: Vec<Arc<dyn Predicate>>,
        config: &ReorderConfig,
    ) -> SiftResult<Self> {
        let state = PermutationState::from_config(predicates.len(), config)?;
        Ok(Self::with_state(predicates, state))
    }
}

impl<S: SwapSampler> FilterExecutor<S> {
    /// Executor driven by an explicit sampler.
    pub fn with_sampler(predicates: Vec<Arc<dyn Predicate>>, sampler: S) -> SiftResult<Self> {
        let state = PermutationState::new(predicates.len(), sampler)?;
        Ok(Self::with_state(predicates, state))
    }

    fn with_state(predicates: Vec<Arc<dyn Predicate>>, state: PermutationState<S>) -> Self {
        Self {
            predicates,
            state,
            metrics: FilterMetrics::new(),
        }
    }

    /// Filter a batch of `initial_row_count` rows and return its cost.
    pub fn evaluate(&mut self, initial_row_count: f64) -> f64 {
        let outcome = evaluate_chain(&self.predicates, self.state.permutation(), initial_row_count);
        let feedback = self.state.record_cost(outcome.cost);
        trace!(
            "Batch {}: rows {} -> {}, cost {}, {:?}",
            self.metrics.batches,
            initial_row_count,
            outcome.rows_out,
            outcome.cost,
            feedback
        );
        self.metrics
            .record_batch(initial_row_count, outcome.rows_out, outcome.cost, feedback);
        outcome.cost
    }
}

impl<S> FilterExecutor<S> {
    /// Ordering the next batch will use.
    pub fn permutation(&self) -> &[usize] {
        self.state.permutation()
    }

    /// The controller, for diagnostics.
    pub fn state(&self) -> &PermutationState<S> {
        &self.state
    }

    /// Accumulated metrics.
    pub fn metrics(&self) -> &FilterMetrics {
        &self.metrics
    }

    /// Predicates in their original index order.
    pub fn predicates(&self) -> &[Arc<dyn Predicate>] {
        &self.predicates
    }
}

impl<S> std::fmt::Debug for FilterExecutor<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterExecutor")
            .field("predicates", &self.predicates)
            .field("state", &self.state)
            .field("metrics", &self.metrics)
            .finish()
    }
}
