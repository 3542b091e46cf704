//! Pure scoring of an engine's answer against ranked candidate moves.

use uci_client::AnalysisResult;

/// Points and match state for one scored position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoredOutcome {
    /// Whether the produced move appears among the candidates.
    pub matched: bool,
    /// Points awarded for the matched rank, 0 on a miss.
    pub points: i64,
    /// Elapsed time carried over from the analysis result.
    pub time_ms: u64,
}

/// Scores a produced move against the candidate list.
///
/// The first index whose move equals the produced move wins and its points
/// are awarded; the lists are ranked best-first, so earlier entries are
/// worth more. Anything else, including no move at all, scores zero.
///
/// This function never fails: a miss is a normal outcome, not an error.
/// Unscoreable positions must be filtered out by the caller before it is
/// reached.
pub fn score(result: &AnalysisResult, moves: &[String], points: &[i64]) -> ScoredOutcome {
    let hit = result
        .best_move
        .as_deref()
        .and_then(|best| moves.iter().position(|m| m == best));

    match hit {
        Some(i) => ScoredOutcome {
            matched: true,
            points: points.get(i).copied().unwrap_or(0),
            time_ms: result.time_ms,
        },
        None => ScoredOutcome {
            matched: false,
            points: 0,
            time_ms: result.time_ms,
        },
    }
}
