//! Exhaustive search over predicate orderings.

use log::debug;

use common_error::{ensure, SiftResult};
use sift_engine::Predicate;

/// Largest predicate set the exhaustive search accepts (12! orderings).
pub const MAX_EXHAUSTIVE_PREDICATES: usize = 12;

/// Cheapest ordering found by the search.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimalOrdering {
    /// Predicate indices in application order.
    pub order: Vec<usize>,
    /// Cost of `order`.
    pub cost: f64,
    /// Number of complete orderings costed.
    pub explored: u64,
}

/// Enumerates all orderings of a predicate set.
///
/// Orderings are generated depth-first in lexicographic order without
/// recursion: `order` holds the prefix being built, `visited` marks indices
/// already placed and `next` remembers, per depth, the next index to try.
/// Prefix costs and row counts are cached per depth so each extension costs
/// one predicate evaluation.
#[derive(Debug)]
pub struct ReferenceOptimizer<'a, P> {
    predicates: &'a [P],
}

impl<'a, P: Predicate> ReferenceOptimizer<'a, P> {
    /// Create an optimizer over `predicates`.
    pub fn new(predicates: &'a [P]) -> SiftResult<Self> {
        ensure!(
            !predicates.is_empty(),
            InvalidParameter: "reference optimizer needs at least one predicate"
        );
        ensure!(
            predicates.len() <= MAX_EXHAUSTIVE_PREDICATES,
            InvalidParameter: "exhaustive search is limited to {} predicates, got {}",
            MAX_EXHAUSTIVE_PREDICATES,
            predicates.len()
        );
        Ok(Self { predicates })
    }

    /// Cheapest ordering for batches of `row_count` rows.
    ///
    /// On ties the lexicographically first ordering wins.
    pub fn optimize(&self, row_count: f64) -> OptimalOrdering {
        let n = self.predicates.len();
        let mut order = vec![0usize; n];
        let mut visited = vec![false; n];
        let mut next = vec![0usize; n];
        let mut prefix_cost = vec![0.0; n + 1];
        let mut prefix_rows = vec![0.0; n + 1];
        prefix_rows[0] = row_count;

        let mut best = OptimalOrdering {
            order: (0..n).collect(),
            cost: f64::INFINITY,
            explored: 0,
        };
        let mut depth = 0;

        loop {
            let mut candidate = next[depth];
            while candidate < n && visited[candidate] {
                candidate += 1;
            }

            if candidate == n {
                if depth == 0 {
                    break;
                }
                depth -= 1;
                visited[order[depth]] = false;
                continue;
            }

            order[depth] = candidate;
            visited[candidate] = true;
            next[depth] = candidate + 1;

            let predicate = &self.predicates[candidate];
            prefix_cost[depth + 1] = prefix_cost[depth] + predicate.cost(prefix_rows[depth]);
            prefix_rows[depth + 1] = predicate.apply_and_reduce(prefix_rows[depth]);

            if depth + 1 == n {
                best.explored += 1;
                if prefix_cost[n] < best.cost {
                    best.cost = prefix_cost[n];
                    best.order.copy_from_slice(&order);
                }
                visited[candidate] = false;
            } else {
                depth += 1;
                next[depth] = 0;
            }
        }

        debug!(
            "Reference optimum over {} orderings: {:?} with cost {}",
            best.explored, best.order, best.cost
        );
        best
    }
}

/// Cheapest ordering of `predicates` for batches of `row_count` rows.
pub fn min_cost_ordering<P: Predicate>(
    predicates: &[P],
    row_count: f64,
) -> SiftResult<OptimalOrdering> {
    Ok(ReferenceOptimizer::new(predicates)?.optimize(row_count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use common_error::SiftError;
    use sift_engine::{chain_cost, LinearPredicate};

    fn factorial(n: u64) -> u64 {
        (1..=n).product()
    }

    #[test]
    fn test_explores_every_ordering() {
        for n in 1..=6 {
            let predicates: Vec<LinearPredicate> = (0..n)
                .map(|i| LinearPredicate::new(0.5, 1.0 + i as f64))
                .collect();
            let best = min_cost_ordering(&predicates, 100.0).unwrap();
            assert_eq!(best.explored, factorial(n as u64));
        }
    }

    #[test]
    fn test_finds_known_optimum() {
        let predicates = [
            LinearPredicate::new(0.5, 1.0),
            LinearPredicate::new(0.9, 3.0),
            LinearPredicate::new(0.1, 1.0),
        ];
        let best = min_cost_ordering(&predicates, 65536.0).unwrap();
        assert_eq!(best.order, vec![2, 0, 1]);
        assert!((best.cost - 81920.0).abs() < 1e-6);
        assert_eq!(best.cost, chain_cost(&predicates, &best.order, 65536.0));
    }

    #[test]
    fn test_matches_brute_force_minimum() {
        let predicates = [
            LinearPredicate::new(0.3, 4.0),
            LinearPredicate::new(0.8, 1.5),
            LinearPredicate::new(0.55, 2.5),
            LinearPredicate::new(0.95, 1.0),
        ];
        let best = min_cost_ordering(&predicates, 1000.0).unwrap();

        // Costs of all 24 orderings via Heap's algorithm.
        let mut order = vec![0, 1, 2, 3];
        let mut c = vec![0usize; 4];
        let mut min = chain_cost(&predicates, &order, 1000.0);
        let mut i = 0;
        while i < 4 {
            if c[i] < i {
                if i % 2 == 0 {
                    order.swap(0, i);
                } else {
                    order.swap(c[i], i);
                }
                min = min.min(chain_cost(&predicates, &order, 1000.0));
                c[i] += 1;
                i = 0;
            } else {
                c[i] = 0;
                i += 1;
            }
        }
        assert!((best.cost - min).abs() < 1e-9);
    }

    #[test]
    fn test_ties_pick_first_ordering() {
        let predicates = [LinearPredicate::new(0.5, 1.0); 3];
        let best = min_cost_ordering(&predicates, 10.0).unwrap();
        assert_eq!(best.order, vec![0, 1, 2]);
    }

    #[test]
    fn test_single_predicate() {
        let predicates = [LinearPredicate::new(0.5, 2.0)];
        let best = min_cost_ordering(&predicates, 10.0).unwrap();
        assert_eq!(best.order, vec![0]);
        assert_eq!(best.cost, 20.0);
        assert_eq!(best.explored, 1);
    }

    #[test]
    fn test_rejects_empty_and_oversized_sets() {
        let empty: [LinearPredicate; 0] = [];
        assert!(matches!(
            ReferenceOptimizer::new(&empty),
            Err(SiftError::InvalidParameter(_))
        ));

        let many = vec![LinearPredicate::new(0.5, 1.0); MAX_EXHAUSTIVE_PREDICATES + 1];
        assert!(matches!(
            min_cost_ordering(&many, 1.0),
            Err(SiftError::InvalidParameter(_))
        ));
    }
}
