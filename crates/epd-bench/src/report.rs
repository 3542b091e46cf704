//! Console and file reporting for finished runs.
//!
//! Three surfaces: a live console summary, a plain-text summary block
//! appended to a persistent file (one block per run, keyed by engine name
//! and configuration), and a JSON report with per-position outcomes for
//! later analysis.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use chrono::Utc;
use serde::Serialize;

use crate::runner::{PositionOutcome, RunTotals, SuiteReport};

/// Prints the run header before any position is analyzed.
pub fn print_header(engine_name: &str, suite_path: &Path, positions: usize, depth: u32, hash_mb: u32, threads: u32) {
    println!("Test file    : {}", suite_path.display());
    println!("Positions    : {}", positions);
    println!("Engine       : {}", engine_name);
    println!("Hash (mb)    : {}", hash_mb);
    println!("Threads      : {}", threads);
    println!("Search depth : {}\n", depth);
}

/// Prints the aggregate results to the console.
pub fn print_summary(report: &SuiteReport) {
    let totals = &report.totals;
    println!("\nTotal Positions        : {}", totals.total);
    println!("Evaluated Positions    : {}", totals.evaluated);
    println!("Max Points             : {}", totals.max_points);
    println!("Points Gained          : {}", totals.points);
    println!("Points Gained Rate (%) : {:.2}", totals.rate());
    println!("Total Time (ms)        : {}", totals.time_ms);
}

/// Appends one summary block to the persistent summary file.
///
/// The file accumulates a block per run, so different engines and
/// configurations measured against the same suite end up side by side.
pub fn append_summary<P: AsRef<Path>>(path: P, report: &SuiteReport) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;

    writeln!(file, "Date                : {}", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"))?;
    writeln!(file, "Test File           : {}", report.suite_path.display())?;
    writeln!(file, "Total Positions     : {}", report.totals.total)?;
    writeln!(file, "Evaluated Positions : {}", report.totals.evaluated)?;
    writeln!(file, "Search Depth        : {}", report.depth)?;
    writeln!(file, "Hash (mb)           : {}", report.hash_mb)?;
    writeln!(file, "Threads             : {}\n", report.threads)?;

    writeln!(
        file,
        "{:<32} {:>6} {:>8} {:>7} {:>9}",
        "Engine", "Pts", "MaxPts", "Pts(%)", "Time(ms)"
    )?;
    writeln!(
        file,
        "{:<32} {:>6} {:>8} {:>7.2} {:>9}\n\n",
        report.engine_name,
        report.totals.points,
        report.totals.max_points,
        report.totals.rate(),
        report.totals.time_ms
    )?;

    Ok(())
}

/// JSON representation of a complete run.
#[derive(Serialize)]
struct RunJson<'a> {
    /// Unique identifier for the run.
    id: &'a str,
    /// The engine's self-reported display name.
    engine: &'a str,
    /// Path of the suite file.
    suite: String,
    /// Fixed search depth.
    depth: u32,
    /// Hash table size in megabytes.
    hash_mb: u32,
    /// Engine worker thread count.
    threads: u32,
    /// Aggregate totals.
    totals: &'a RunTotals,
    /// Percentage rate, duplicated for convenience.
    rate: f64,
    /// Per-position outcomes in suite order.
    positions: &'a [PositionOutcome],
    /// ISO 8601 timestamp when the file was created.
    created_at: String,
}

/// Writes the full run, including per-position outcomes, to a JSON file.
pub fn write_json<P: AsRef<Path>>(path: P, run_id: &str, report: &SuiteReport) -> std::io::Result<()> {
    let run = RunJson {
        id: run_id,
        engine: &report.engine_name,
        suite: report.suite_path.display().to_string(),
        depth: report.depth,
        hash_mb: report.hash_mb,
        threads: report.threads,
        totals: &report.totals,
        rate: report.totals.rate(),
        positions: &report.positions,
        created_at: Utc::now().to_rfc3339(),
    };

    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(file, &run)?;
    Ok(())
}
