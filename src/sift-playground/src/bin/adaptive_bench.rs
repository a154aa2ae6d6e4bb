//! Adaptive Bench - predicate ordering benchmark
//!
//! Generates random predicate sets, lets the adaptive controller order them
//! over a stream of batches, and reports the first and last batch costs
//! relative to the exhaustive optimum.
//!
//! # Usage
//!
//! ```bash
//! cargo run --release --package sift-playground --bin adaptive-bench -- --help
//! RUST_LOG=debug cargo run --package sift-playground --bin adaptive-bench -- --runs 2
//! ```

use std::path::PathBuf;

use clap::Parser;

use common_config::{SiftConfig, SimulationConfig};
use common_error::SiftResult;
use sift_playground::{print_header, print_summary, print_trial, run_benchmark};

/// Adaptive Bench CLI.
#[derive(Parser, Debug)]
#[command(name = "adaptive-bench")]
#[command(about = "Benchmark adaptive filter predicate ordering against the optimum")]
#[command(version)]
struct Args {
    /// JSON configuration file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of sweeps over the predicate counts
    #[arg(short, long)]
    runs: Option<usize>,

    /// Batches per trial
    #[arg(short, long)]
    blocks: Option<usize>,

    /// Rows per batch
    #[arg(long)]
    block_size: Option<usize>,

    /// Smallest predicate count
    #[arg(long)]
    min_predicates: Option<usize>,

    /// Largest predicate count
    #[arg(long)]
    max_predicates: Option<usize>,

    /// Seed for reproducible runs
    #[arg(short, long)]
    seed: Option<u64>,

    /// Print every trial
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn simulation_config(&self) -> SiftResult<SimulationConfig> {
        let mut config = match &self.config {
            Some(path) => SiftConfig::from_json_file(path)?.simulation,
            None => SimulationConfig::default(),
        };

        if let Some(runs) = self.runs {
            config.runs = runs;
        }
        if let Some(blocks) = self.blocks {
            config.num_blocks = blocks;
        }
        if let Some(block_size) = self.block_size {
            config.block_size = block_size;
        }
        if let Some(min) = self.min_predicates {
            config.min_predicates = min;
        }
        if let Some(max) = self.max_predicates {
            config.max_predicates = max;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> SiftResult<()> {
    env_logger::init();
    let args = Args::parse();
    let config = args.simulation_config()?;

    print_header(&format!(
        "Adaptive ordering: {}..={} predicates, {} blocks of {} rows",
        config.min_predicates, config.max_predicates, config.num_blocks, config.block_size
    ));

    let verbose = args.verbose;
    let summary = run_benchmark(&config, |run, report| {
        if verbose {
            print_trial(run, report);
        }
    })?;

    print_summary(&summary);
    Ok(())
}
