//! Sift Playground - Benchmarks and Experiments
//!
//! This crate runs the adaptive filter controller against synthetic
//! workloads and compares it with the exhaustive optimum.
//!
//! # Available Binaries
//!
//! - **`adaptive-bench`**: sweeps predicate counts and reports how far the
//!   initial and the adapted orderings are from optimal
//!
//! # Usage
//!
//! ```bash
//! cargo run --release --package sift-playground --bin adaptive-bench -- --runs 10
//! ```

pub mod bench;
pub mod utils;
pub mod workload;

pub use bench::{run_benchmark, run_trial, BenchmarkSummary, SummaryRow, TrialReport};
pub use utils::{print_header, print_summary, print_trial};
pub use workload::SyntheticWorkload;
