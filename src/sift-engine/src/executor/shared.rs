//! Lock-protected executor for use from several threads.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use rand_chacha::ChaCha20Rng;

use common_error::{SiftError, SiftResult};

use crate::executor::FilterExecutor;
use crate::metrics::FilterMetrics;
use crate::permutation::{Phase, SwapSampler};

struct Slot<S> {
    executor: FilterExecutor<S>,
    /// Handle whose proposed swap is still waiting for its observation.
    owner: Option<u64>,
}

struct Inner<S> {
    slot: Mutex<Slot<S>>,
    turn: Condvar,
    next_handle: AtomicU64,
}

/// A [`FilterExecutor`] shared between handles behind a single mutex.
///
/// Every clone is a separate handle. When a handle's batch proposes a swap,
/// that handle owns the executor until its next batch observes the swap;
/// other handles block in `evaluate` until then, so a proposal is always
/// judged by the cost of the same caller's following batch. Dropping the
/// owning handle releases the executor.
///
/// Independent streams should use independent executors instead.
pub struct SharedFilterExecutor<S = ChaCha20Rng> {
    inner: Arc<Inner<S>>,
    handle: u64,
}

impl<S> Clone for SharedFilterExecutor<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            handle: self.inner.next_handle.fetch_add(1, Ordering::Relaxed),
        }
    }
}

impl<S: SwapSampler> SharedFilterExecutor<S> {
    /// Wrap an executor.
    pub fn new(executor: FilterExecutor<S>) -> Self {
        Self {
            inner: Arc::new(Inner {
                slot: Mutex::new(Slot {
                    executor,
                    owner: None,
                }),
                turn: Condvar::new(),
                next_handle: AtomicU64::new(1),
            }),
            handle: 0,
        }
    }

    /// Filter a batch of `initial_row_count` rows and return its cost.
    ///
    /// Blocks while another handle's swap is waiting for its observation.
    pub fn evaluate(&self, initial_row_count: f64) -> SiftResult<f64> {
        let mut slot = self.lock()?;
        while slot.owner.is_some_and(|owner| owner != self.handle) {
            slot = self.inner.turn.wait(slot).map_err(|_| poisoned())?;
        }

        let cost = slot.executor.evaluate(initial_row_count);
        slot.owner = match slot.executor.state().phase() {
            Phase::Observing { .. } => Some(self.handle),
            Phase::Proposing { .. } => None,
        };
        if slot.owner.is_none() {
            self.inner.turn.notify_all();
        }
        Ok(cost)
    }
}

impl<S> SharedFilterExecutor<S> {
    /// Snapshot of the current ordering.
    pub fn permutation(&self) -> SiftResult<Vec<usize>> {
        Ok(self.lock()?.executor.permutation().to_vec())
    }

    /// Snapshot of the controller phase.
    pub fn phase(&self) -> SiftResult<Phase> {
        Ok(self.lock()?.executor.state().phase())
    }

    /// Snapshot of the metrics.
    pub fn metrics(&self) -> SiftResult<FilterMetrics> {
        Ok(self.lock()?.executor.metrics().clone())
    }

    fn lock(&self) -> SiftResult<MutexGuard<'_, Slot<S>>> {
        self.inner.slot.lock().map_err(|_| poisoned())
    }
}

impl<S> Drop for SharedFilterExecutor<S> {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.inner.slot.lock() {
            if slot.owner == Some(self.handle) {
                slot.owner = None;
                self.inner.turn.notify_all();
            }
        }
    }
}

fn poisoned() -> SiftError {
    SiftError::internal("filter executor lock poisoned")
}

impl<S> std::fmt::Debug for SharedFilterExecutor<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedFilterExecutor")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::time::Duration;

    use super::*;
    use crate::predicate::{LinearPredicate, Predicate};

    fn executor(seed: u64) -> FilterExecutor {
        let predicates: Vec<Arc<dyn Predicate>> = vec![
            Arc::new(LinearPredicate::new(0.9, 2.0)),
            Arc::new(LinearPredicate::new(0.3, 1.0)),
            Arc::new(LinearPredicate::new(0.6, 3.0)),
        ];
        FilterExecutor::seeded(predicates, seed).unwrap()
    }

    fn two_predicates(seed: u64) -> FilterExecutor {
        let predicates: Vec<Arc<dyn Predicate>> = vec![
            Arc::new(LinearPredicate::new(1.0, 1.0)),
            Arc::new(LinearPredicate::new(0.1, 1.0)),
        ];
        FilterExecutor::seeded(predicates, seed).unwrap()
    }

    /// Run batches on `handle` until it has a swap waiting to be observed.
    fn run_until_observing(handle: &SharedFilterExecutor) {
        for _ in 0..100 {
            handle.evaluate(100.0).unwrap();
            if matches!(handle.phase().unwrap(), Phase::Observing { .. }) {
                return;
            }
        }
        panic!("no swap proposed: {:?}", handle.metrics().unwrap());
    }

    #[test]
    fn test_concurrent_evaluation() {
        let shared = SharedFilterExecutor::new(executor(17));

        std::thread::scope(|scope| {
            for _ in 0..4 {
                let shared = shared.clone();
                scope.spawn(move || {
                    for _ in 0..250 {
                        shared.evaluate(1000.0).unwrap();
                    }
                });
            }
        });

        let metrics = shared.metrics().unwrap();
        assert_eq!(metrics.batches, 1000);

        let mut order = shared.permutation().unwrap();
        order.sort_unstable();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_pending_swap_blocks_other_handles() {
        let a = SharedFilterExecutor::new(two_predicates(0));
        let b = a.clone();

        run_until_observing(&a);
        let batches = a.metrics().unwrap().batches;
        let proposals = a.metrics().unwrap().proposals;

        std::thread::scope(|scope| {
            let (tx, rx) = mpsc::channel();
            scope.spawn(move || {
                let cost = b.evaluate(100.0).unwrap();
                tx.send(cost).unwrap();
            });

            assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
            let metrics = a.metrics().unwrap();
            assert_eq!(metrics.batches, batches);
            assert_eq!(metrics.kept + metrics.reverted, proposals - 1);

            // The owner's next batch settles its own swap.
            a.evaluate(100.0).unwrap();
            let metrics = a.metrics().unwrap();
            assert_eq!(metrics.kept + metrics.reverted, proposals);

            rx.recv().unwrap();
        });

        assert_eq!(a.metrics().unwrap().batches, batches + 2);
    }

    #[test]
    fn test_dropping_owner_releases_executor() {
        let a = SharedFilterExecutor::new(two_predicates(0));
        let b = a.clone();

        run_until_observing(&a);
        drop(a);

        b.evaluate(100.0).unwrap();
        let metrics = b.metrics().unwrap();
        assert_eq!(metrics.proposals, metrics.kept + metrics.reverted);
    }

    #[test]
    fn test_matches_unshared_executor() {
        let shared = SharedFilterExecutor::new(executor(5));
        let mut plain = executor(5);

        for _ in 0..100 {
            let a = shared.evaluate(500.0).unwrap();
            let b = plain.evaluate(500.0);
            assert_eq!(a, b);
        }
        assert_eq!(shared.permutation().unwrap(), plain.permutation());
    }
}
