//! Synthetic predicate generation.

use rand::Rng;

use common_config::SimulationConfig;
use common_error::SiftResult;
use sift_engine::LinearPredicate;

/// Draws predicates with uniformly random selectivity and per-row cost.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticWorkload {
    min_selectivity: f64,
    max_selectivity: f64,
    min_row_cost: f64,
    max_row_cost: f64,
}

impl SyntheticWorkload {
    /// Workload using the ranges in `config`.
    pub fn from_config(config: &SimulationConfig) -> SiftResult<Self> {
        config.validate()?;
        Ok(Self {
            min_selectivity: config.min_selectivity,
            max_selectivity: config.max_selectivity,
            min_row_cost: config.min_row_cost,
            max_row_cost: config.max_row_cost,
        })
    }

    /// Draw one predicate.
    pub fn predicate<R: Rng>(&self, rng: &mut R) -> LinearPredicate {
        LinearPredicate::new(
            uniform(rng, self.min_selectivity, self.max_selectivity),
            uniform(rng, self.min_row_cost, self.max_row_cost),
        )
    }

    /// Draw `count` predicates.
    pub fn generate<R: Rng>(&self, count: usize, rng: &mut R) -> Vec<LinearPredicate> {
        (0..count).map(|_| self.predicate(rng)).collect()
    }
}

impl Default for SyntheticWorkload {
    fn default() -> Self {
        let config = SimulationConfig::default();
        Self {
            min_selectivity: config.min_selectivity,
            max_selectivity: config.max_selectivity,
            min_row_cost: config.min_row_cost,
            max_row_cost: config.max_row_cost,
        }
    }
}

/// Uniform draw from `[low, high]`; a degenerate range yields `low`.
fn uniform<R: Rng>(rng: &mut R, low: f64, high: f64) -> f64 {
    if low < high {
        rng.gen_range(low..=high)
    } else {
        low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use sift_engine::Predicate;

    #[test]
    fn test_predicates_within_ranges() {
        let workload = SyntheticWorkload::default();
        let mut rng = ChaCha20Rng::seed_from_u64(1);

        for p in workload.generate(500, &mut rng) {
            assert!((0.1..=1.0).contains(&p.selectivity()));
            assert!((1.0..=5.0).contains(&p.row_cost()));
        }
    }

    #[test]
    fn test_degenerate_range() {
        let config = SimulationConfig {
            min_selectivity: 0.5,
            max_selectivity: 0.5,
            min_row_cost: 2.0,
            max_row_cost: 2.0,
            ..SimulationConfig::default()
        };
        let workload = SyntheticWorkload::from_config(&config).unwrap();
        let p = workload.predicate(&mut ChaCha20Rng::seed_from_u64(0));
        assert_eq!(p.apply_and_reduce(10.0), 5.0);
        assert_eq!(p.cost(10.0), 20.0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SimulationConfig {
            min_row_cost: 6.0,
            ..SimulationConfig::default()
        };
        assert!(SyntheticWorkload::from_config(&config).is_err());
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let workload = SyntheticWorkload::default();
        let a = workload.generate(8, &mut ChaCha20Rng::seed_from_u64(3));
        let b = workload.generate(8, &mut ChaCha20Rng::seed_from_u64(3));
        assert_eq!(a, b);
    }
}
