//! Compares the adaptive controller against the exhaustive optimum.

use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use sift_engine::{chain_cost, FilterExecutor, LinearPredicate, Predicate};
use sift_optimizer::min_cost_ordering;

const ROWS: f64 = 65536.0;

fn shared(predicates: &[LinearPredicate]) -> Vec<Arc<dyn Predicate>> {
    predicates
        .iter()
        .map(|&p| Arc::new(p) as Arc<dyn Predicate>)
        .collect()
}

#[test]
fn test_three_predicates_converge_to_optimum() {
    let predicates = [
        LinearPredicate::new(0.5, 1.0),
        LinearPredicate::new(0.9, 3.0),
        LinearPredicate::new(0.1, 1.0),
    ];
    let reference = min_cost_ordering(&predicates, ROWS).unwrap();
    assert_eq!(reference.order, vec![2, 0, 1]);
    assert!(reference.cost < chain_cost(&predicates, &[0, 1, 2], ROWS));

    for seed in 0..20 {
        let mut executor = FilterExecutor::seeded(shared(&predicates), seed).unwrap();
        let costs: Vec<f64> = (0..500).map(|_| executor.evaluate(ROWS)).collect();

        let tail = &costs[250..];
        let long_run = tail.iter().sum::<f64>() / tail.len() as f64;
        assert!(
            long_run <= reference.cost * 1.1,
            "seed {seed}: long-run cost {long_run} vs optimum {}",
            reference.cost
        );

        let baseline = executor.state().average_cost().unwrap();
        assert!(baseline <= reference.cost * 1.1);
    }
}

#[test]
fn test_random_workloads_approach_optimum() {
    let mut rng = ChaCha20Rng::seed_from_u64(2024);
    let mut ratios = Vec::new();

    for trial in 0..10u64 {
        for n in 2..=6 {
            let predicates: Vec<LinearPredicate> = (0..n)
                .map(|_| LinearPredicate::new(rng.gen_range(0.1..1.0), rng.gen_range(1.0..5.0)))
                .collect();
            let reference = min_cost_ordering(&predicates, ROWS).unwrap();
            let original = chain_cost(&predicates, &[0, 1, 2, 3, 4, 5][..n], ROWS);

            let mut executor =
                FilterExecutor::seeded(shared(&predicates), trial * 100 + n as u64).unwrap();
            for _ in 0..512 {
                executor.evaluate(ROWS);
            }

            let adaptive = executor.state().average_cost().unwrap();
            // The accepted ordering can never beat the optimum.
            assert!(adaptive >= reference.cost * (1.0 - 1e-12));
            assert!(original >= reference.cost * (1.0 - 1e-12));
            assert!(adaptive / reference.cost < 2.0, "trial {trial}, n {n}");
            ratios.push(adaptive / reference.cost);
        }
    }

    let mean = ratios.iter().sum::<f64>() / ratios.len() as f64;
    assert!(mean < 1.25, "mean adaptive/optimal ratio {mean}");
}
