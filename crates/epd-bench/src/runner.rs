//! Suite execution: one engine session per position, running totals.
//!
//! The runner drives the whole benchmark strictly sequentially. Every
//! position gets a fresh engine process with the run's fixed search
//! configuration; the session is fully started, driven, and closed before
//! the next position begins. Per-position engine failures are recorded as
//! misses and never abort the suite.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::epd::TestPosition;
use crate::scorer;
use uci_client::{AnalysisResult, ClientError, SearchParams, UciClient};

/// Errors that end a run before any position is analyzed.
#[derive(Error, Debug)]
pub enum RunError {
    /// The engine could not be launched or identified.
    #[error("engine probe failed: {0}")]
    Probe(#[from] ClientError),
}

/// Running sums across the suite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunTotals {
    /// Every suite position, scoreable or not.
    pub total: u32,
    /// Positions with usable labels, included in the point totals.
    pub evaluated: u32,
    /// Sum of the best-move points of every evaluated position.
    pub max_points: i64,
    /// Points actually gained.
    pub points: i64,
    /// Accumulated search time of the solved positions, in milliseconds.
    pub time_ms: u64,
}

impl RunTotals {
    /// Percentage of the achievable points actually gained.
    ///
    /// Defined as 0.0 when nothing was achievable, so an all-unscoreable
    /// suite never divides by zero.
    pub fn rate(&self) -> f64 {
        if self.max_points == 0 {
            0.0
        } else {
            100.0 * self.points as f64 / self.max_points as f64
        }
    }
}

/// Outcome of a single suite position.
#[derive(Debug, Clone, Serialize)]
pub struct PositionOutcome {
    /// 1-based position number in suite order.
    pub index: u32,
    /// The FEN that was (or would have been) handed to the engine.
    pub fen: String,
    /// The engine's answer, if any.
    pub best_move: Option<String>,
    /// Whether the position carried usable labels.
    pub scoreable: bool,
    /// Whether the answer matched a candidate move.
    pub matched: bool,
    /// Points awarded.
    pub points: i64,
    /// Elapsed search time in milliseconds.
    pub time_ms: u64,
}

/// Everything a finished run reports.
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    /// The engine's self-reported display name.
    pub engine_name: String,
    /// Path of the engine executable.
    pub engine_path: PathBuf,
    /// Path of the suite file.
    pub suite_path: PathBuf,
    /// Fixed search depth used for every position.
    pub depth: u32,
    /// Hash table size in megabytes.
    pub hash_mb: u32,
    /// Engine worker thread count.
    pub threads: u32,
    /// Aggregate totals.
    pub totals: RunTotals,
    /// Per-position outcomes in suite order.
    pub positions: Vec<PositionOutcome>,
}

/// Runs a labeled suite against one engine.
pub struct SuiteRunner {
    engine_path: PathBuf,
    params: SearchParams,
}

impl SuiteRunner {
    /// Creates a runner for the given engine and search configuration.
    pub fn new(engine_path: impl Into<PathBuf>, params: SearchParams) -> Self {
        Self {
            engine_path: engine_path.into(),
            params,
        }
    }

    /// Probes the engine for its display name.
    ///
    /// Run once before the suite loop; a failure here is fatal for the
    /// whole run, since an engine that cannot even complete a handshake
    /// will not analyze anything.
    pub fn probe(&self) -> Result<String, RunError> {
        let name = UciClient::identify(&self.engine_path)?;
        tracing::info!("engine identified as {}", name);
        Ok(name)
    }

    /// Runs every suite line in file order and returns the full report.
    ///
    /// `progress` is called once per finished position with the position
    /// number, the suite size, and the outcome.
    pub fn run_suite(
        &self,
        engine_name: &str,
        suite_path: &Path,
        lines: &[String],
        mut progress: impl FnMut(u32, u32, &PositionOutcome),
    ) -> SuiteReport {
        let (totals, positions) =
            Self::run_lines(lines, |fen| self.analyze(fen), &mut progress);

        SuiteReport {
            engine_name: engine_name.to_string(),
            engine_path: self.engine_path.clone(),
            suite_path: suite_path.to_path_buf(),
            depth: self.params.depth,
            hash_mb: self.params.hash_mb,
            threads: self.params.threads,
            totals,
            positions,
        }
    }

    /// One full engine session for one position. Failures are recovered
    /// here: the position is recorded as unanswered and the suite goes on.
    fn analyze(&self, fen: &str) -> AnalysisResult {
        match UciClient::analyze_position(&self.engine_path, fen, &self.params) {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("analysis session failed: {}", e);
                AnalysisResult {
                    best_move: None,
                    time_ms: 0,
                }
            }
        }
    }

    /// The suite loop, with analysis abstracted out so the accounting can
    /// be exercised without engine processes.
    fn run_lines(
        lines: &[String],
        mut analyze: impl FnMut(&str) -> AnalysisResult,
        progress: &mut impl FnMut(u32, u32, &PositionOutcome),
    ) -> (RunTotals, Vec<PositionOutcome>) {
        let mut totals = RunTotals::default();
        let mut positions = Vec::with_capacity(lines.len());
        let suite_size = lines.len() as u32;

        for (idx, line) in lines.iter().enumerate() {
            let number = idx as u32 + 1;
            totals.total += 1;

            let pos = match TestPosition::parse(line) {
                Ok(pos) => pos,
                Err(e) => {
                    tracing::warn!("skipping malformed suite line {}: {}", number, e);
                    let outcome = PositionOutcome {
                        index: number,
                        fen: String::new(),
                        best_move: None,
                        scoreable: false,
                        matched: false,
                        points: 0,
                        time_ms: 0,
                    };
                    progress(number, suite_size, &outcome);
                    positions.push(outcome);
                    continue;
                }
            };

            let fen = pos.search_fen();
            tracing::info!("position {}: {}", number, fen);
            let result = analyze(&fen);

            let outcome = match pos.labels() {
                Some((moves, points)) => {
                    totals.evaluated += 1;
                    totals.max_points += points.first().copied().unwrap_or(0);

                    let scored = scorer::score(&result, moves, points);
                    if scored.matched {
                        totals.points += scored.points;
                        totals.time_ms += scored.time_ms;
                        tracing::info!(
                            "position {} solved with {} for {} points",
                            number,
                            result.best_move.as_deref().unwrap_or(""),
                            scored.points
                        );
                    } else {
                        tracing::info!(
                            "position {} missed, engine played {}",
                            number,
                            result.best_move.as_deref().unwrap_or("(none)")
                        );
                    }

                    PositionOutcome {
                        index: number,
                        fen,
                        best_move: result.best_move,
                        scoreable: true,
                        matched: scored.matched,
                        points: scored.points,
                        time_ms: scored.time_ms,
                    }
                }
                None => {
                    tracing::warn!(
                        "suite line {} has no usable c8/c9 labels, excluded from scoring",
                        number
                    );
                    PositionOutcome {
                        index: number,
                        fen,
                        best_move: result.best_move,
                        scoreable: false,
                        matched: false,
                        points: 0,
                        time_ms: result.time_ms,
                    }
                }
            };

            progress(number, suite_size, &outcome);
            positions.push(outcome);
        }

        (totals, positions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOLVED: &str = "1kr5/3n4/q3p2p/p2n2p1/PppB1P2/5BP1/1P2Q2P/3R2K1 w - - \
                          hmvc 4; c8 \"10 5\"; c9 \"f4f5 d4e5\";";
    const MISSED: &str = "8/8/8/8/8/8/2k5/K7 w - - c8 \"6 2\"; c9 \"a1b1 a1a2\";";
    const UNLABELED: &str = "8/8/8/8/8/8/8/K6k w - - id \"bare.001\";";

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|l| l.to_string()).collect()
    }

    fn answer(best_move: &str, time_ms: u64) -> AnalysisResult {
        AnalysisResult {
            best_move: Some(best_move.to_string()),
            time_ms,
        }
    }

    #[test]
    fn test_solved_and_unlabeled_positions_accumulate() {
        let suite = lines(&[SOLVED, UNLABELED]);
        let mut seen = Vec::new();

        let (totals, positions) = SuiteRunner::run_lines(
            &suite,
            |_fen| answer("f4f5", 37),
            &mut |number, total, _outcome| seen.push((number, total)),
        );

        assert_eq!(totals.total, 2);
        assert_eq!(totals.evaluated, 1);
        assert_eq!(totals.max_points, 10);
        assert_eq!(totals.points, 10);
        assert_eq!(totals.time_ms, 37);
        assert!((totals.rate() - 100.0).abs() < f64::EPSILON);

        assert_eq!(positions.len(), 2);
        assert!(positions[0].scoreable && positions[0].matched);
        assert!(!positions[1].scoreable);
        assert_eq!(seen, vec![(1, 2), (2, 2)]);
    }

    #[test]
    fn test_missed_position_counts_toward_max_but_not_time() {
        let suite = lines(&[SOLVED, MISSED]);

        let (totals, _) = SuiteRunner::run_lines(
            &suite,
            |fen| {
                if fen.starts_with("1kr5") {
                    answer("f4f5", 40)
                } else {
                    answer("h1h2", 55)
                }
            },
            &mut |_, _, _| {},
        );

        assert_eq!(totals.evaluated, 2);
        assert_eq!(totals.max_points, 16);
        assert_eq!(totals.points, 10);
        // Only solved positions contribute their time.
        assert_eq!(totals.time_ms, 40);
        assert!((totals.rate() - 62.5).abs() < 1e-9);
    }

    #[test]
    fn test_second_rank_answer_gains_its_points() {
        let suite = lines(&[SOLVED]);

        let (totals, positions) =
            SuiteRunner::run_lines(&suite, |_fen| answer("d4e5", 12), &mut |_, _, _| {});

        assert_eq!(totals.points, 5);
        assert!(positions[0].matched);
        assert_eq!(positions[0].points, 5);
    }

    #[test]
    fn test_unanswered_position_is_a_miss() {
        let suite = lines(&[SOLVED]);

        let (totals, positions) = SuiteRunner::run_lines(
            &suite,
            |_fen| AnalysisResult {
                best_move: None,
                time_ms: 0,
            },
            &mut |_, _, _| {},
        );

        assert_eq!(totals.evaluated, 1);
        assert_eq!(totals.points, 0);
        assert_eq!(totals.max_points, 10);
        assert!(!positions[0].matched);
    }

    #[test]
    fn test_malformed_line_counts_but_is_never_analyzed() {
        let suite = lines(&["not an epd line", SOLVED]);
        let mut analyzed = 0;

        let (totals, positions) = SuiteRunner::run_lines(
            &suite,
            |_fen| {
                analyzed += 1;
                answer("f4f5", 5)
            },
            &mut |_, _, _| {},
        );

        assert_eq!(totals.total, 2);
        assert_eq!(totals.evaluated, 1);
        assert_eq!(analyzed, 1);
        assert!(!positions[0].scoreable);
        assert!(positions[1].matched);
    }

    #[test]
    fn test_rate_is_zero_when_nothing_is_achievable() {
        let suite = lines(&[UNLABELED]);

        let (totals, _) = SuiteRunner::run_lines(
            &suite,
            |_fen| answer("a1a2", 3),
            &mut |_, _, _| {},
        );

        assert_eq!(totals.max_points, 0);
        assert_eq!(totals.rate(), 0.0);
    }

    #[test]
    fn test_evaluated_never_exceeds_total() {
        let suite = lines(&[SOLVED, MISSED, UNLABELED, "garbage"]);

        let (totals, _) = SuiteRunner::run_lines(
            &suite,
            |_fen| answer("f4f5", 1),
            &mut |_, _, _| {},
        );

        assert_eq!(totals.total, 4);
        assert!(totals.evaluated <= totals.total);
        assert_eq!(totals.evaluated, 2);
    }
}
