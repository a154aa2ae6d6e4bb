//! Configuration management for Sift.
//!
//! Provides runtime configuration for the adaptive reordering controller
//! and for the simulation harness that benchmarks it.

use std::path::Path;

use serde::{Deserialize, Serialize};

use common_error::{ensure, SiftResult};

/// Largest predicate count a simulation may use; every trial solves the
/// ordering exhaustively.
pub const MAX_SIMULATED_PREDICATES: usize = 12;

/// Global Sift configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiftConfig {
    /// Reordering controller configuration.
    pub reorder: ReorderConfig,
    /// Simulation harness configuration.
    pub simulation: SimulationConfig,
}

impl SiftConfig {
    /// Parse a configuration from a JSON document.
    ///
    /// Missing fields fall back to their defaults.
    pub fn from_json_str(json: &str) -> SiftResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.simulation.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> SiftResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }
}

/// How an operator measures the cost it reports back to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CostMeasure {
    /// Sum of the rows each predicate was evaluated on. Deterministic.
    #[default]
    RowsEvaluated,
    /// Wall-clock nanoseconds spent evaluating predicates.
    ElapsedNanos,
}

/// Adaptive reordering configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReorderConfig {
    /// Whether predicates may be reordered at all.
    pub enabled: bool,
    /// Seed for the controller's random source. `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Cost measure used by batch operators.
    pub cost_measure: CostMeasure,
}

impl Default for ReorderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            seed: None,
            cost_measure: CostMeasure::RowsEvaluated,
        }
    }
}

impl ReorderConfig {
    /// Set a fixed seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Enable or disable reordering.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the cost measure.
    pub fn with_cost_measure(mut self, measure: CostMeasure) -> Self {
        self.cost_measure = measure;
        self
    }
}

/// Synthetic workload parameters for the benchmark harness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Lower bound of a predicate's selectivity.
    pub min_selectivity: f64,
    /// Upper bound of a predicate's selectivity.
    pub max_selectivity: f64,
    /// Lower bound of a predicate's per-row cost.
    pub min_row_cost: f64,
    /// Upper bound of a predicate's per-row cost.
    pub max_row_cost: f64,
    /// Smallest predicate count to benchmark.
    pub min_predicates: usize,
    /// Largest predicate count to benchmark.
    pub max_predicates: usize,
    /// Rows per batch.
    pub block_size: usize,
    /// Batches per trial.
    pub num_blocks: usize,
    /// Repetitions of the whole sweep.
    pub runs: usize,
    /// Seed for predicate generation and controllers. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            min_selectivity: 0.1,
            max_selectivity: 1.0,
            min_row_cost: 1.0,
            max_row_cost: 5.0,
            min_predicates: 2,
            max_predicates: 10,
            block_size: 65536,
            num_blocks: 512,
            runs: 100,
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Check that all ranges are well formed.
    pub fn validate(&self) -> SiftResult<()> {
        ensure!(
            self.min_selectivity > 0.0 && self.max_selectivity <= 1.0,
            InvalidParameter: "selectivity range must lie in (0, 1], got [{}, {}]",
            self.min_selectivity, self.max_selectivity
        );
        ensure!(
            self.min_selectivity <= self.max_selectivity,
            InvalidParameter: "min_selectivity {} exceeds max_selectivity {}",
            self.min_selectivity, self.max_selectivity
        );
        ensure!(
            self.min_row_cost >= 0.0
                && self.max_row_cost > 0.0
                && self.min_row_cost <= self.max_row_cost,
            InvalidParameter: "invalid row cost range [{}, {}]",
            self.min_row_cost, self.max_row_cost
        );
        ensure!(
            self.min_predicates >= 2,
            InvalidParameter: "min_predicates must be at least 2, got {}",
            self.min_predicates
        );
        ensure!(
            self.min_predicates <= self.max_predicates,
            InvalidParameter: "min_predicates {} exceeds max_predicates {}",
            self.min_predicates, self.max_predicates
        );
        ensure!(
            self.max_predicates <= MAX_SIMULATED_PREDICATES,
            InvalidParameter: "max_predicates {} exceeds the limit of {}",
            self.max_predicates, MAX_SIMULATED_PREDICATES
        );
        ensure!(
            self.block_size >= 1 && self.num_blocks >= 1 && self.runs >= 1,
            InvalidParameter: "block_size, num_blocks and runs must be positive"
        );
        Ok(())
    }
}
