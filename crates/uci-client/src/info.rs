//! Tokenized parsing of UCI `info` search lines.

use serde::Serialize;

/// A full search progress report parsed from one engine output line.
///
/// Only lines carrying a depth, a score, and a principal variation qualify.
/// Lines whose score is qualified with `lowerbound` or `upperbound` are
/// partial reports and are rejected outright.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchInfo {
    /// Search depth in plies.
    pub depth: Option<u32>,
    /// Centipawn score, when the engine reported one.
    pub score_cp: Option<i32>,
    /// Mate distance, when the engine reported one.
    pub score_mate: Option<i32>,
    /// Nodes searched.
    pub nodes: Option<u64>,
    /// Time spent on the search so far, in milliseconds.
    pub time_ms: Option<u64>,
    /// Principal variation in UCI notation.
    pub pv: Vec<String>,
}

impl SearchInfo {
    /// Parses a full info line.
    ///
    /// Returns `None` for anything else: result lines, bound-qualified
    /// partial reports, `info string` chatter, and unrelated output.
    pub fn parse(line: &str) -> Option<Self> {
        let tokens: Vec<&str> = line.split_whitespace().collect();

        if !(tokens.contains(&"depth") && tokens.contains(&"score") && tokens.contains(&"pv")) {
            return None;
        }
        if tokens.contains(&"lowerbound") || tokens.contains(&"upperbound") {
            return None;
        }

        let mut info = Self::default();
        let mut i = 0;
        while i < tokens.len() {
            match tokens[i] {
                "depth" => {
                    info.depth = value_after(&tokens, i);
                    i += 1;
                }
                "score" => match tokens.get(i + 1) {
                    Some(&"cp") => {
                        info.score_cp = value_after(&tokens, i + 1);
                        i += 2;
                    }
                    Some(&"mate") => {
                        info.score_mate = value_after(&tokens, i + 1);
                        i += 2;
                    }
                    _ => {}
                },
                "nodes" => {
                    info.nodes = value_after(&tokens, i);
                    i += 1;
                }
                "time" => {
                    info.time_ms = value_after(&tokens, i);
                    i += 1;
                }
                "pv" => {
                    // Everything after the pv marker is the variation.
                    info.pv = tokens[i + 1..].iter().map(|t| t.to_string()).collect();
                    break;
                }
                _ => {}
            }
            i += 1;
        }

        Some(info)
    }
}

/// Parses the token following position `i`, if it is there and numeric.
fn value_after<T: std::str::FromStr>(tokens: &[&str], i: usize) -> Option<T> {
    tokens.get(i + 1).and_then(|t| t.parse().ok())
}
