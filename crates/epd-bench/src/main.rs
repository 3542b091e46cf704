//! EPD Bench - benchmarks UCI chess engines against labeled EPD suites.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

use epd_bench::config::BenchConfig;
use epd_bench::epd;
use epd_bench::report;
use epd_bench::runner::SuiteRunner;
use epd_bench::storage::Storage;
use uci_client::SearchParams;

#[derive(Parser)]
#[command(name = "epd-bench")]
#[command(about = "Chess engine test-suite benchmark")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an engine through a labeled EPD suite
    Run {
        /// Engine name from bench.toml, or a path to an executable
        engine: String,
        /// EPD suite file with c8/c9 labels
        #[arg(short = 'f', long)]
        epd: PathBuf,
        /// Fixed search depth
        #[arg(short, long)]
        depth: Option<u32>,
        /// Engine hash table size in megabytes
        #[arg(long)]
        hash: Option<u32>,
        /// Engine worker thread count
        #[arg(long)]
        threads: Option<u32>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    let config = BenchConfig::load().unwrap_or_default();

    match cli.command {
        Commands::Run {
            engine,
            epd,
            depth,
            hash,
            threads,
        } => run(&config, &engine, &epd, depth, hash, threads),
    }
}

fn run(
    config: &BenchConfig,
    engine: &str,
    suite_path: &Path,
    depth: Option<u32>,
    hash: Option<u32>,
    threads: Option<u32>,
) -> anyhow::Result<()> {
    // Configured engine name, or the argument itself as a path.
    let engine_cfg = config.get_engine(engine).ok();
    let engine_path = engine_cfg
        .map(|e| e.path.clone())
        .unwrap_or_else(|| PathBuf::from(engine));

    // Both inputs are checked before any engine work begins.
    anyhow::ensure!(
        engine_path.exists(),
        "engine executable not found: {}",
        engine_path.display()
    );
    anyhow::ensure!(
        suite_path.exists(),
        "EPD suite file not found: {}",
        suite_path.display()
    );

    let params = SearchParams {
        depth: depth.unwrap_or(config.defaults.depth).max(1),
        hash_mb: hash
            .or(engine_cfg.and_then(|e| e.hash_mb))
            .unwrap_or(config.defaults.hash_mb),
        threads: threads
            .or(engine_cfg.and_then(|e| e.threads))
            .unwrap_or(config.defaults.threads),
    };

    let lines = epd::read_suite(suite_path).context("failed to read EPD suite")?;

    let runner = SuiteRunner::new(&engine_path, params);
    let engine_name = runner.probe().context("engine identification failed")?;

    report::print_header(
        &engine_name,
        suite_path,
        lines.len(),
        params.depth,
        params.hash_mb,
        params.threads,
    );

    let suite_report = runner.run_suite(&engine_name, suite_path, &lines, |number, total, _outcome| {
        println!("Pos {}/{}", number, total);
    });

    report::print_summary(&suite_report);
    report::append_summary(&config.summary_file, &suite_report)
        .context("failed to append summary")?;

    std::fs::create_dir_all("data").ok();
    let storage = Storage::open("data/bench.db").context("failed to open run database")?;
    let run_id = storage
        .save_run(&suite_report)
        .context("failed to save run")?;

    // JSON report with per-position outcomes, grouped by date.
    let date = chrono::Utc::now().format("%Y-%m-%d").to_string();
    let json_dir = format!("data/runs/{}", date);
    if let Err(e) = std::fs::create_dir_all(&json_dir) {
        eprintln!("Warning: failed to create report directory {}: {}", json_dir, e);
    }
    let json_path = format!("{}/{}.json", json_dir, run_id);
    if let Err(e) = report::write_json(&json_path, &run_id, &suite_report) {
        eprintln!("Warning: failed to write JSON report: {}", e);
    }

    let suite_key = suite_report.suite_path.display().to_string();
    if let (Ok(count), Ok(Some(best))) = (
        storage.run_count(&engine_name, &suite_key),
        storage.best_rate(&engine_name, &suite_key),
    ) {
        println!(
            "\n{} on {}: {} run(s), all-time best rate {:.2}%",
            engine_name, suite_key, count, best
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_run_command_with_defaults() {
        let cli = Cli::try_parse_from(["epd-bench", "run", "stockfish", "-f", "sts.epd"]);
        assert!(cli.is_ok());

        let cli = cli.unwrap();
        match cli.command {
            Commands::Run {
                engine,
                epd,
                depth,
                hash,
                threads,
            } => {
                assert_eq!(engine, "stockfish");
                assert_eq!(epd, PathBuf::from("sts.epd"));
                assert!(depth.is_none());
                assert!(hash.is_none());
                assert!(threads.is_none());
            }
        }
    }

    #[test]
    fn test_cli_parses_run_command_with_overrides() {
        let cli = Cli::try_parse_from([
            "epd-bench",
            "run",
            "./my-engine",
            "--epd",
            "suite.epd",
            "--depth",
            "12",
            "--hash",
            "256",
            "--threads",
            "4",
        ]);
        assert!(cli.is_ok());

        let cli = cli.unwrap();
        match cli.command {
            Commands::Run {
                engine,
                depth,
                hash,
                threads,
                ..
            } => {
                assert_eq!(engine, "./my-engine");
                assert_eq!(depth, Some(12));
                assert_eq!(hash, Some(256));
                assert_eq!(threads, Some(4));
            }
        }
    }

    #[test]
    fn test_cli_requires_epd_file() {
        let cli = Cli::try_parse_from(["epd-bench", "run", "stockfish"]);
        assert!(cli.is_err());
    }

    #[test]
    fn test_depth_is_clamped_to_at_least_one() {
        let config = BenchConfig::default();
        let depth = Some(0u32).unwrap_or(config.defaults.depth).max(1);
        assert_eq!(depth, 1);
    }
}
