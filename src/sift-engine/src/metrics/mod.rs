//! Metrics collection for adaptive filtering.

use std::fmt;
use std::time::{Duration, Instant};

use crate::permutation::Feedback;

/// Counters for one adaptive filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterMetrics {
    /// Number of batches evaluated.
    pub batches: u64,
    /// Rows entering the filter.
    pub rows_in: f64,
    /// Rows surviving all predicates.
    pub rows_out: f64,
    /// Sum of the costs reported to the controller.
    pub total_cost: f64,
    /// Swaps tried.
    pub proposals: u64,
    /// Swaps kept after observation.
    pub kept: u64,
    /// Swaps undone after observation.
    pub reverted: u64,
}

impl FilterMetrics {
    /// Create new metrics.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            batches: 0,
            rows_in: 0.0,
            rows_out: 0.0,
            total_cost: 0.0,
            proposals: 0,
            kept: 0,
            reverted: 0,
        }
    }

    /// Record one evaluated batch and what the controller did with its cost.
    pub fn record_batch(&mut self, rows_in: f64, rows_out: f64, cost: f64, feedback: Feedback) {
        self.batches += 1;
        self.rows_in += rows_in;
        self.rows_out += rows_out;
        self.total_cost += cost;
        match feedback {
            Feedback::Proposed { .. } => self.proposals += 1,
            Feedback::Kept { .. } => self.kept += 1,
            Feedback::Reverted { .. } => self.reverted += 1,
            Feedback::Disabled | Feedback::Held | Feedback::Skipped { .. } => {}
        }
    }

    /// Get selectivity (`rows_out` / `rows_in`).
    pub fn selectivity(&self) -> f64 {
        if self.rows_in == 0.0 {
            1.0
        } else {
            self.rows_out / self.rows_in
        }
    }

    /// Mean cost per batch.
    pub fn average_cost(&self) -> f64 {
        if self.batches == 0 {
            0.0
        } else {
            self.total_cost / self.batches as f64
        }
    }
}

impl fmt::Display for FilterMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "batches={}, rows_in={}, rows_out={}, cost={}, proposals={}, kept={}, reverted={}",
            self.batches,
            self.rows_in,
            self.rows_out,
            self.total_cost,
            self.proposals,
            self.kept,
            self.reverted
        )
    }
}

/// Timer for measuring predicate evaluation time.
#[derive(Debug)]
pub struct ExecutionTimer {
    start: Instant,
}

impl ExecutionTimer {
    /// Start a new timer.
    #[must_use]
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Stop and return elapsed time.
    #[must_use]
    pub fn stop(self) -> Duration {
        self.start.elapsed()
    }
}

impl Default for ExecutionTimer {
    fn default() -> Self {
        Self::start()
    }
}
