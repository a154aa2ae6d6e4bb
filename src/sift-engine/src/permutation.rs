//! Adaptive predicate ordering.
//!
//! [`PermutationState`] keeps the order in which a filter applies its
//! predicates and improves it online, one batch at a time, from nothing but
//! the cost each batch reports.
//!
//! # Algorithm
//!
//! Every call to [`PermutationState::record_cost`] runs one half of a
//! propose/observe cycle:
//!
//! - **Propose.** Draw `r` uniformly from `[0, 100 * (N - 1))`. The boundary
//!   `r / 100` picks two adjacent positions, `r % 100` is a roll against that
//!   boundary's weight. If the weight beats the roll the two predicates are
//!   swapped and the next cost is treated as an observation of the swap. The
//!   cost is added to the running window of the current ordering either way.
//! - **Observe.** Compare the cost against the window's mean. A strictly
//!   cheaper batch keeps the swap, restores the boundary weight to
//!   [`MAX_SWAP_WEIGHT`] and restarts the window from this single sample;
//!   the next proposal is then skipped so the new ordering gets a second
//!   sample. Anything else, ties included, undoes the swap and halves the
//!   weight down to [`MIN_SWAP_WEIGHT`]. The window is left untouched.
//!
//! ```text
//!             record_cost              record_cost
//!   Proposing ───────────▶ Observing ───────────▶ Proposing
//!      ▲   (swap tried)                (kept: hold=true)
//!      └──── (no swap) ───┘            (reverted: hold=false)
//! ```

use std::fmt;

use log::{debug, trace};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use common_config::ReorderConfig;
use common_error::{ensure, SiftResult};

/// Weight of a boundary that has never failed, or just succeeded.
pub const MAX_SWAP_WEIGHT: u32 = 100;

/// Floor for a boundary weight. Every boundary keeps a 1% chance.
pub const MIN_SWAP_WEIGHT: u32 = 1;

/// Source of the random draws behind swap proposals.
///
/// Every [`rand::Rng`] is a sampler.
pub trait SwapSampler {
    /// Draw uniformly from `[0, upper)`. `upper` is always positive.
    fn sample_below(&mut self, upper: u64) -> u64;
}

impl<R: Rng> SwapSampler for R {
    fn sample_below(&mut self, upper: u64) -> u64 {
        self.gen_range(0..upper)
    }
}

/// Where the controller is in its propose/observe cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// The next cost is a sample of the current ordering.
    Proposing {
        /// Skip the next proposal, set right after a swap was kept.
        hold: bool,
    },
    /// A swap at `boundary` is in place and the next cost judges it.
    Observing {
        /// Position `i` of the swapped pair `(i, i + 1)`.
        boundary: usize,
    },
}

/// What a single [`PermutationState::record_cost`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    /// Reordering is switched off.
    Disabled,
    /// Proposal skipped to give a freshly kept ordering another sample.
    Held,
    /// The roll did not beat the boundary weight; nothing moved.
    Skipped {
        /// Boundary that was drawn.
        boundary: usize,
    },
    /// Predicates at `boundary` and `boundary + 1` were swapped.
    Proposed {
        /// Swapped boundary.
        boundary: usize,
    },
    /// The pending swap was cheaper and stays.
    Kept {
        /// Kept boundary.
        boundary: usize,
    },
    /// The pending swap was not cheaper and was undone.
    Reverted {
        /// Reverted boundary.
        boundary: usize,
    },
}

/// Running cost statistics of the currently accepted ordering.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct CostWindow {
    sum: f64,
    count: u64,
}

impl CostWindow {
    fn push(&mut self, cost: f64) {
        self.sum += cost;
        self.count += 1;
    }

    fn restart(&mut self, cost: f64) {
        self.sum = cost;
        self.count = 1;
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Online controller for the order of `N >= 2` predicates.
///
/// Must be fed one cost per batch, strictly in sequence. Share it across
/// threads only behind a lock held for the whole evaluate-and-record step
/// (see [`SharedFilterExecutor`](crate::executor::SharedFilterExecutor)).
#[derive(Clone)]
pub struct PermutationState<S = ChaCha20Rng> {
    enabled: bool,
    permutation: Vec<usize>,
    weights: Vec<u32>,
    phase: Phase,
    window: CostWindow,
    border: u64,
    sampler: S,
}

impl PermutationState<ChaCha20Rng> {
    /// Controller driven by a ChaCha20 generator seeded with `seed`.
    pub fn seeded(num_predicates: usize, seed: u64) -> SiftResult<Self> {
        Self::new(num_predicates, ChaCha20Rng::seed_from_u64(seed))
    }

    /// Controller driven by a ChaCha20 generator seeded from OS entropy.
    pub fn from_entropy(num_predicates: usize) -> SiftResult<Self> {
        Self::new(num_predicates, ChaCha20Rng::from_entropy())
    }

    /// Controller built from a [`ReorderConfig`].
    pub fn from_config(num_predicates: usize, config: &ReorderConfig) -> SiftResult<Self> {
        let state = match config.seed {
            Some(seed) => Self::seeded(num_predicates, seed)?,
            None => Self::from_entropy(num_predicates)?,
        };
        Ok(state.with_reordering(config.enabled))
    }
}

impl<S: SwapSampler> PermutationState<S> {
    /// Create a controller with the identity ordering and full weights.
    ///
    /// Fails with `InvalidParameter` when fewer than two predicates are
    /// given, since there is no boundary to swap.
    pub fn new(num_predicates: usize, sampler: S) -> SiftResult<Self> {
        ensure!(
            num_predicates >= 2,
            InvalidParameter: "adaptive ordering needs at least 2 predicates, got {}",
            num_predicates
        );

        Ok(Self {
            enabled: true,
            permutation: (0..num_predicates).collect(),
            weights: vec![MAX_SWAP_WEIGHT; num_predicates - 1],
            phase: Phase::Proposing { hold: false },
            window: CostWindow::default(),
            border: u64::from(MAX_SWAP_WEIGHT) * (num_predicates as u64 - 1),
            sampler,
        })
    }

    /// Turn reordering on or off.
    ///
    /// Turning it off restores the identity ordering and drops any pending
    /// observation; weights and cost history are kept.
    pub fn with_reordering(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        if !enabled {
            self.permutation.sort_unstable();
            self.phase = Phase::Proposing { hold: false };
        }
        self
    }

    /// Feed back the cost of the batch that just ran with [`Self::permutation`].
    pub fn record_cost(&mut self, cost: f64) -> Feedback {
        if !self.enabled {
            return Feedback::Disabled;
        }

        match self.phase {
            Phase::Observing { boundary } => self.observe(boundary, cost),
            Phase::Proposing { hold } => self.propose(hold, cost),
        }
    }

    fn propose(&mut self, hold: bool, cost: f64) -> Feedback {
        // A draw is consumed even while holding so the random stream does
        // not depend on past outcomes.
        let draw = self.sampler.sample_below(self.border) % self.border;
        let boundary = (draw / u64::from(MAX_SWAP_WEIGHT)) as usize;
        let roll = (draw % u64::from(MAX_SWAP_WEIGHT)) as u32;

        let feedback = if hold {
            Feedback::Held
        } else if self.weights[boundary] > roll {
            self.permutation.swap(boundary, boundary + 1);
            trace!(
                "Trying swap at boundary {} (weight {}, roll {}): {:?}",
                boundary,
                self.weights[boundary],
                roll,
                self.permutation
            );
            Feedback::Proposed { boundary }
        } else {
            Feedback::Skipped { boundary }
        };

        self.phase = match feedback {
            Feedback::Proposed { boundary } => Phase::Observing { boundary },
            _ => Phase::Proposing { hold: false },
        };
        self.window.push(cost);
        feedback
    }

    fn observe(&mut self, boundary: usize, cost: f64) -> Feedback {
        // The proposing half always pushes a sample before entering
        // `Observing`, so the window is never empty here.
        let baseline = self.window.mean().unwrap_or(f64::INFINITY);

        // Ties and NaN count as failures.
        let feedback = if cost < baseline {
            self.weights[boundary] = MAX_SWAP_WEIGHT;
            self.window.restart(cost);
            self.phase = Phase::Proposing { hold: true };
            debug!(
                "Kept swap at boundary {}: cost {} < baseline {}, ordering {:?}",
                boundary, cost, baseline, self.permutation
            );
            Feedback::Kept { boundary }
        } else {
            self.permutation.swap(boundary, boundary + 1);
            self.weights[boundary] = (self.weights[boundary] / 2).max(MIN_SWAP_WEIGHT);
            self.phase = Phase::Proposing { hold: false };
            debug!(
                "Reverted swap at boundary {}: cost {} >= baseline {}, weight now {}",
                boundary, cost, baseline, self.weights[boundary]
            );
            Feedback::Reverted { boundary }
        };

        feedback
    }
}

impl<S> PermutationState<S> {
    /// Current ordering: `permutation()[position]` is a predicate index.
    pub fn permutation(&self) -> &[usize] {
        &self.permutation
    }

    /// Predicate index to apply at `position`.
    ///
    /// # Panics
    ///
    /// Panics if `position >= num_predicates()`.
    pub fn get(&self, position: usize) -> usize {
        self.permutation[position]
    }

    /// Per-boundary swap weights, each in `[MIN_SWAP_WEIGHT, MAX_SWAP_WEIGHT]`.
    pub fn weights(&self) -> &[u32] {
        &self.weights
    }

    /// Mean cost of the current ordering, `None` before the first sample.
    pub fn average_cost(&self) -> Option<f64> {
        self.window.mean()
    }

    /// Number of samples behind [`Self::average_cost`].
    pub fn samples(&self) -> u64 {
        self.window.count
    }

    /// Current cycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Number of predicates being ordered.
    pub fn num_predicates(&self) -> usize {
        self.permutation.len()
    }

    /// Whether reordering is switched on.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl<S> fmt::Debug for PermutationState<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PermutationState")
            .field("enabled", &self.enabled)
            .field("permutation", &self.permutation)
            .field("weights", &self.weights)
            .field("phase", &self.phase)
            .field("average_cost", &self.window.mean())
            .field("samples", &self.window.count)
            .finish_non_exhaustive()
    }
}
