//! Trial driver and aggregate statistics.

use std::fmt;
use std::sync::Arc;

use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use common_config::SimulationConfig;
use common_error::{ensure, SiftResult};
use sift_engine::{FilterExecutor, FilterMetrics, LinearPredicate, Predicate};
use sift_optimizer::min_cost_ordering;

use crate::workload::SyntheticWorkload;

/// Outcome of running one predicate set through a fresh executor.
#[derive(Debug, Clone)]
pub struct TrialReport {
    /// Number of predicates in the set.
    pub num_predicates: usize,
    /// Cost of the first batch, run in index order.
    pub original_cost: f64,
    /// Cost of the last batch.
    pub adaptive_cost: f64,
    /// Exhaustive minimum.
    pub min_cost: f64,
    /// Optimal ordering found by exhaustive search.
    pub optimal_order: Vec<usize>,
    /// Ordering the executor ended with.
    pub final_order: Vec<usize>,
    /// Executor metrics.
    pub metrics: FilterMetrics,
}

impl TrialReport {
    /// `original_cost / min_cost`.
    pub fn original_ratio(&self) -> f64 {
        self.original_cost / self.min_cost
    }

    /// `adaptive_cost / min_cost`.
    pub fn adaptive_ratio(&self) -> f64 {
        self.adaptive_cost / self.min_cost
    }
}

impl fmt::Display for TrialReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "num_filter_exprs: {}, original cost: {}, adaptive cost: {}, min cost: {}",
            self.num_predicates, self.original_cost, self.adaptive_cost, self.min_cost
        )
    }
}

/// Run `config.num_blocks` batches of `config.block_size` rows through
/// `predicates`, with a controller seeded by `seed`.
pub fn run_trial(
    predicates: &[LinearPredicate],
    config: &SimulationConfig,
    seed: u64,
) -> SiftResult<TrialReport> {
    ensure!(
        config.num_blocks >= 1 && config.block_size >= 1,
        InvalidParameter: "a trial needs at least one non-empty block"
    );

    let rows = config.block_size as f64;
    let chain: Vec<Arc<dyn Predicate>> = predicates
        .iter()
        .map(|&p| Arc::new(p) as Arc<dyn Predicate>)
        .collect();
    let mut executor = FilterExecutor::seeded(chain, seed)?;

    let original_cost = executor.evaluate(rows);
    let mut adaptive_cost = original_cost;
    for _ in 1..config.num_blocks {
        adaptive_cost = executor.evaluate(rows);
    }

    let optimum = min_cost_ordering(predicates, rows)?;
    debug!(
        "Trial n={}: final order {:?}, optimal {:?}, {}",
        predicates.len(),
        executor.permutation(),
        optimum.order,
        executor.metrics()
    );

    Ok(TrialReport {
        num_predicates: predicates.len(),
        original_cost,
        adaptive_cost,
        min_cost: optimum.cost,
        optimal_order: optimum.order,
        final_order: executor.permutation().to_vec(),
        metrics: executor.metrics().clone(),
    })
}

/// Average ratios for one predicate count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryRow {
    /// Number of predicates.
    pub num_predicates: usize,
    /// Mean of `original / min`, rounded to two decimals.
    pub original: f64,
    /// Mean of `adaptive / min`, rounded to two decimals.
    pub adaptive: f64,
}

/// Per-predicate-count averages over all runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BenchmarkSummary {
    /// One row per predicate count, ascending.
    pub rows: Vec<SummaryRow>,
    /// Number of runs averaged.
    pub runs: usize,
}

impl BenchmarkSummary {
    /// Row for `num_predicates`, if it was benchmarked.
    pub fn row(&self, num_predicates: usize) -> Option<&SummaryRow> {
        self.rows.iter().find(|r| r.num_predicates == num_predicates)
    }
}

impl fmt::Display for BenchmarkSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>10} | {:>10} | {:>10}", "predicates", "original", "adaptive")?;
        writeln!(f, "{:-<11}+{:-<12}+{:-<11}", "", "", "")?;
        for row in &self.rows {
            writeln!(
                f,
                "{:>10} | {:>10.2} | {:>10.2}",
                row.num_predicates, row.original, row.adaptive
            )?;
        }
        Ok(())
    }
}

/// Sweep every predicate count in the configured range, `config.runs` times.
///
/// `on_trial` sees each report as it completes, with its 1-based run number.
pub fn run_benchmark<F>(
    config: &SimulationConfig,
    mut on_trial: F,
) -> SiftResult<BenchmarkSummary>
where
    F: FnMut(usize, &TrialReport),
{
    let workload = SyntheticWorkload::from_config(config)?;
    let mut rng = match config.seed {
        Some(seed) => ChaCha20Rng::seed_from_u64(seed),
        None => ChaCha20Rng::from_entropy(),
    };

    let counts: Vec<usize> = (config.min_predicates..=config.max_predicates).collect();
    let mut original = vec![0.0; counts.len()];
    let mut adaptive = vec![0.0; counts.len()];

    for run in 1..=config.runs {
        info!("[{}/{}]", run, config.runs);
        for (slot, &n) in counts.iter().enumerate() {
            let predicates = workload.generate(n, &mut rng);
            let report = run_trial(&predicates, config, rng.gen())?;
            original[slot] += report.original_ratio();
            adaptive[slot] += report.adaptive_ratio();
            on_trial(run, &report);
        }
    }

    let runs = config.runs as f64;
    let rows = counts
        .iter()
        .enumerate()
        .map(|(slot, &n)| SummaryRow {
            num_predicates: n,
            original: round2(original[slot] / runs),
            adaptive: round2(adaptive[slot] / runs),
        })
        .collect();

    Ok(BenchmarkSummary {
        rows,
        runs: config.runs,
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use common_config::MAX_SIMULATED_PREDICATES;
    use common_error::SiftError;
    use sift_optimizer::MAX_EXHAUSTIVE_PREDICATES;

    use super::*;

    fn small_config() -> SimulationConfig {
        SimulationConfig {
            min_predicates: 2,
            max_predicates: 4,
            block_size: 1024,
            num_blocks: 128,
            runs: 3,
            seed: Some(7),
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.234), 1.23);
        assert_eq!(round2(1.236), 1.24);
        assert_eq!(round2(2.0), 2.0);
    }

    #[test]
    fn test_single_block_trial() {
        let predicates = [LinearPredicate::new(0.5, 1.0), LinearPredicate::new(0.2, 2.0)];
        let config = SimulationConfig {
            block_size: 100,
            num_blocks: 1,
            ..SimulationConfig::default()
        };
        let report = run_trial(&predicates, &config, 0).unwrap();

        // Index order: 100*1 + 50*2
        assert_eq!(report.original_cost, 200.0);
        assert_eq!(report.adaptive_cost, 200.0);
        // Reverse order costs 100*2 + 20*1 = 220.
        assert_eq!(report.min_cost, 200.0);
        assert_eq!(report.optimal_order, vec![0, 1]);
        assert_eq!(report.metrics.batches, 1);
    }

    #[test]
    fn test_empty_block_trial_rejected() {
        let predicates = [LinearPredicate::new(0.5, 1.0), LinearPredicate::new(0.2, 2.0)];
        let config = SimulationConfig {
            block_size: 0,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            run_trial(&predicates, &config, 0),
            Err(SiftError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_trial_reports_optimum() {
        let predicates = [
            LinearPredicate::new(1.0, 1.0),
            LinearPredicate::new(0.1, 1.0),
        ];
        let config = SimulationConfig {
            block_size: 100,
            num_blocks: 64,
            ..SimulationConfig::default()
        };
        let report = run_trial(&predicates, &config, 3).unwrap();

        assert_eq!(report.original_cost, 200.0);
        assert_eq!(report.min_cost, 110.0);
        assert_eq!(report.optimal_order, vec![1, 0]);
        // The last batch either ran the optimum or an exploratory swap of it.
        assert!(report.adaptive_cost == 110.0 || report.adaptive_cost == 200.0);
        assert!(report.adaptive_ratio() >= 1.0);
        assert_eq!(report.metrics.batches, 64);
    }

    #[test]
    fn test_benchmark_summary_shape() {
        let mut seen = 0;
        let summary = run_benchmark(&small_config(), |_, _| seen += 1).unwrap();

        assert_eq!(seen, 9);
        assert_eq!(summary.runs, 3);
        assert_eq!(summary.rows.len(), 3);
        for (row, n) in summary.rows.iter().zip(2..=4) {
            assert_eq!(row.num_predicates, n);
            assert!(row.original >= 1.0);
            assert!(row.adaptive >= 1.0);
        }
        assert!(summary.row(3).is_some());
        assert!(summary.row(9).is_none());
    }

    #[test]
    fn test_benchmark_is_reproducible() {
        let a = run_benchmark(&small_config(), |_, _| {}).unwrap();
        let b = run_benchmark(&small_config(), |_, _| {}).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_too_many_predicates_rejected() {
        let config = SimulationConfig {
            min_predicates: 13,
            max_predicates: 13,
            num_blocks: 2,
            runs: 1,
            seed: Some(0),
            ..SimulationConfig::default()
        };
        let mut trials = 0;
        let err = run_benchmark(&config, |_, _| trials += 1).unwrap_err();
        assert!(matches!(err, SiftError::InvalidParameter(_)));
        assert_eq!(trials, 0);
    }

    #[test]
    fn test_predicate_limit_matches_optimizer() {
        assert_eq!(MAX_SIMULATED_PREDICATES, MAX_EXHAUSTIVE_PREDICATES);
    }

    #[test]
    fn test_summary_display() {
        let summary = BenchmarkSummary {
            rows: vec![SummaryRow {
                num_predicates: 2,
                original: 1.5,
                adaptive: 1.0,
            }],
            runs: 1,
        };
        let text = summary.to_string();
        assert!(text.contains("predicates"));
        assert!(text.contains("1.50"));
        assert!(text.contains("1.00"));
    }
}
