//! Console output helpers for the playground binaries.

use crate::bench::{BenchmarkSummary, TrialReport};

/// Print a section header.
pub fn print_header(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("{title}");
    println!("{}", "=".repeat(60));
}

/// Print one trial line.
pub fn print_trial(run: usize, report: &TrialReport) {
    println!("[run {run}] {report}");
}

/// Print the aggregate table followed by the raw ratio vectors.
pub fn print_summary(summary: &BenchmarkSummary) {
    print_header(&format!("Cost relative to optimum ({} runs)", summary.runs));
    print!("{summary}");

    let original: Vec<f64> = summary.rows.iter().map(|r| r.original).collect();
    let adaptive: Vec<f64> = summary.rows.iter().map(|r| r.adaptive).collect();
    println!("original: {original:?}");
    println!("adaptive: {adaptive:?}");
}
