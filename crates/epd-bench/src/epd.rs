//! EPD test-suite records with ranked-move labels.
//!
//! Each suite line holds a position in EPD form: four leading fields
//! (piece placement, side to move, castling, en passant) followed by
//! semicolon-terminated opcodes. The opcodes used here are `hmvc`
//! (halfmove clock, default 0), `c8` (points per candidate move, best
//! first) and `c9` (candidate moves, best first, positionally aligned
//! with `c8`). Other opcodes such as `id` or `bm` are carried by many
//! published suites and are ignored.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use thiserror::Error;

/// Errors that can occur when parsing an EPD record.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EpdError {
    #[error("invalid EPD: expected at least 4 position fields, got {0}")]
    MissingFields(usize),

    #[error("invalid halfmove clock: {0}")]
    InvalidHalfmoveClock(String),
}

/// One test position parsed from a suite line.
///
/// The candidate sequences are optional: a record missing either one (or
/// carrying sequences of different lengths) is still a valid position to
/// analyze, it just cannot be scored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestPosition {
    /// The four leading EPD fields joined with single spaces.
    pub epd: String,
    /// Halfmove clock from the `hmvc` opcode, 0 when absent.
    pub halfmove_clock: u32,
    /// Points per candidate move (`c8`), best first.
    pub candidate_points: Option<Vec<i64>>,
    /// Candidate moves (`c9`), best first, aligned with `candidate_points`.
    pub candidate_moves: Option<Vec<String>>,
}

impl TestPosition {
    /// Parses one suite line.
    ///
    /// # Errors
    ///
    /// Returns [`EpdError::MissingFields`] when the line carries fewer
    /// than four position fields, or [`EpdError::InvalidHalfmoveClock`]
    /// when an `hmvc` opcode is present but not an integer. Defective
    /// `c8`/`c9` opcodes are not errors; they leave the corresponding
    /// sequence unset.
    pub fn parse(line: &str) -> Result<Self, EpdError> {
        let mut sections = line.split(';');

        let head: Vec<&str> = sections.next().unwrap_or("").split_whitespace().collect();
        if head.len() < 4 {
            return Err(EpdError::MissingFields(head.len()));
        }
        let epd = head[..4].join(" ");

        // Opcodes: the remainder of the first section, then one per
        // semicolon-separated section.
        let mut ops: Vec<Vec<&str>> = Vec::new();
        if head.len() > 4 {
            ops.push(head[4..].to_vec());
        }
        for section in sections {
            let tokens: Vec<&str> = section.split_whitespace().collect();
            if !tokens.is_empty() {
                ops.push(tokens);
            }
        }

        let mut halfmove_clock = 0;
        let mut candidate_points = None;
        let mut candidate_moves = None;

        for op in &ops {
            let Some((name, args)) = op.split_first() else {
                continue;
            };
            match *name {
                "hmvc" => {
                    let value = args.first().copied().unwrap_or("0");
                    halfmove_clock = value
                        .parse()
                        .map_err(|_| EpdError::InvalidHalfmoveClock(value.to_string()))?;
                }
                "c8" => candidate_points = parse_points(args),
                "c9" => candidate_moves = Some(unquote(args)),
                _ => {}
            }
        }

        Ok(Self {
            epd,
            halfmove_clock,
            candidate_points,
            candidate_moves,
        })
    }

    /// The FEN handed to the engine: the four EPD fields plus the
    /// halfmove clock and a constant move number.
    pub fn search_fen(&self) -> String {
        format!("{} {} 1", self.epd, self.halfmove_clock)
    }

    /// Both label sequences, when present and positionally aligned.
    ///
    /// Returns `None` for unscoreable positions: either sequence missing,
    /// or the two differing in length.
    pub fn labels(&self) -> Option<(&[String], &[i64])> {
        match (&self.candidate_moves, &self.candidate_points) {
            (Some(moves), Some(points)) if moves.len() == points.len() => {
                Some((moves.as_slice(), points.as_slice()))
            }
            _ => None,
        }
    }
}

/// Strips the surrounding quotes from an opcode value and splits it into
/// its space-separated parts.
fn unquote(args: &[&str]) -> Vec<String> {
    args.join(" ")
        .trim()
        .trim_matches('"')
        .split_whitespace()
        .map(|part| part.to_string())
        .collect()
}

/// Parses a quoted list of integers. Any non-integer part invalidates the
/// whole list.
fn parse_points(args: &[&str]) -> Option<Vec<i64>> {
    unquote(args)
        .iter()
        .map(|part| part.parse().ok())
        .collect()
}

/// Reads a suite file into its non-empty lines, in file order.
pub fn read_suite<P: AsRef<Path>>(path: P) -> std::io::Result<Vec<String>> {
    let file = File::open(path)?;
    let mut lines = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if !line.trim().is_empty() {
            lines.push(line);
        }
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LABELED: &str = "1kr5/3n4/q3p2p/p2n2p1/PppB1P2/5BP1/1P2Q2P/3R2K1 w - - \
                           hmvc 4; c8 \"10 5 3 1\"; c9 \"f4f5 d4e5 e2e1 g3g4\"; id \"STS.001\";";

    #[test]
    fn test_parse_labeled_record() {
        let pos = TestPosition::parse(LABELED).expect("Should parse");
        assert_eq!(pos.epd, "1kr5/3n4/q3p2p/p2n2p1/PppB1P2/5BP1/1P2Q2P/3R2K1 w - -");
        assert_eq!(pos.halfmove_clock, 4);
        assert_eq!(pos.candidate_points, Some(vec![10, 5, 3, 1]));
        assert_eq!(
            pos.candidate_moves,
            Some(vec![
                "f4f5".to_string(),
                "d4e5".to_string(),
                "e2e1".to_string(),
                "g3g4".to_string()
            ])
        );
    }

    #[test]
    fn test_search_fen_appends_clock_and_move_number() {
        let pos = TestPosition::parse(LABELED).expect("Should parse");
        assert_eq!(
            pos.search_fen(),
            "1kr5/3n4/q3p2p/p2n2p1/PppB1P2/5BP1/1P2Q2P/3R2K1 w - - 4 1"
        );
    }

    #[test]
    fn test_halfmove_clock_defaults_to_zero() {
        let pos = TestPosition::parse("8/8/8/8/8/8/8/K6k w - - c8 \"7\"; c9 \"a1a2\";")
            .expect("Should parse");
        assert_eq!(pos.halfmove_clock, 0);
        assert_eq!(pos.search_fen(), "8/8/8/8/8/8/8/K6k w - - 0 1");
    }

    #[test]
    fn test_labels_present_and_aligned() {
        let pos = TestPosition::parse(LABELED).expect("Should parse");
        let (moves, points) = pos.labels().expect("Should be scoreable");
        assert_eq!(moves.len(), points.len());
        assert_eq!(moves[0], "f4f5");
        assert_eq!(points[0], 10);
    }

    #[test]
    fn test_missing_c8_makes_position_unscoreable() {
        let pos = TestPosition::parse("8/8/8/8/8/8/8/K6k w - - c9 \"a1a2\";")
            .expect("Should parse");
        assert!(pos.candidate_points.is_none());
        assert!(pos.labels().is_none());
    }

    #[test]
    fn test_missing_c9_makes_position_unscoreable() {
        let pos = TestPosition::parse("8/8/8/8/8/8/8/K6k w - - c8 \"10\";")
            .expect("Should parse");
        assert!(pos.candidate_moves.is_none());
        assert!(pos.labels().is_none());
    }

    #[test]
    fn test_mismatched_label_lengths_are_unscoreable() {
        let pos = TestPosition::parse("8/8/8/8/8/8/8/K6k w - - c8 \"10 5\"; c9 \"a1a2\";")
            .expect("Should parse");
        assert!(pos.labels().is_none());
    }

    #[test]
    fn test_non_integer_points_are_dropped() {
        let pos = TestPosition::parse("8/8/8/8/8/8/8/K6k w - - c8 \"10 x\"; c9 \"a1a2 a1b1\";")
            .expect("Should parse");
        assert!(pos.candidate_points.is_none());
        assert!(pos.labels().is_none());
    }

    #[test]
    fn test_unknown_opcodes_are_ignored() {
        let line = "r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - \
                    bm Ng5; id \"trap.001\"; c8 \"8 2\"; c9 \"f3g5 e1g1\";";
        let pos = TestPosition::parse(line).expect("Should parse");
        assert_eq!(pos.candidate_points, Some(vec![8, 2]));
    }

    #[test]
    fn test_too_few_fields_is_an_error() {
        match TestPosition::parse("8/8/8/8/8/8/8/K6k w") {
            Err(EpdError::MissingFields(2)) => {}
            other => panic!("Expected MissingFields, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_halfmove_clock_is_an_error() {
        match TestPosition::parse("8/8/8/8/8/8/8/K6k w - - hmvc abc;") {
            Err(EpdError::InvalidHalfmoveClock(value)) => assert_eq!(value, "abc"),
            other => panic!("Expected InvalidHalfmoveClock, got {:?}", other),
        }
    }

    #[test]
    fn test_read_suite_skips_blank_lines() {
        use std::io::Write;

        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("suite.epd");
        let mut file = File::create(&path).expect("Failed to create suite");
        writeln!(file, "{}", LABELED).unwrap();
        writeln!(file).unwrap();
        writeln!(file, "8/8/8/8/8/8/8/K6k w - - id \"bare\";").unwrap();

        let lines = read_suite(&path).expect("Failed to read suite");
        assert_eq!(lines.len(), 2);
    }
}
