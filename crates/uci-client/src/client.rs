//! UCI protocol sequencing.
//!
//! A [`UciClient`] drives one engine session through the protocol subset
//! needed for single-position, fixed-depth analysis: handshake, option
//! configuration, readiness barrier, position submission, search, and
//! orderly shutdown. Every session runs against a fresh process; nothing
//! is reused between positions, so no stale engine state can leak from one
//! analysis into the next.

use std::path::Path;
use std::time::Instant;

use serde::Serialize;
use thiserror::Error;

use crate::info::SearchInfo;
use crate::session::{EngineSession, SessionError};

/// Errors that can occur while conducting a protocol session.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The underlying transport failed.
    #[error("session error: {0}")]
    Session(#[from] SessionError),
    /// The engine closed its output before a required protocol marker.
    #[error("engine stream ended while waiting for {0}")]
    UnexpectedEof(&'static str),
}

/// Search configuration applied to every session of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchParams {
    /// Hash table size handed to `setoption name Hash`, in megabytes.
    pub hash_mb: u32,
    /// Worker count handed to `setoption name Threads`.
    pub threads: u32,
    /// Fixed depth for `go depth`.
    pub depth: u32,
}

/// Outcome of one fixed-depth analysis session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisResult {
    /// The move the engine chose, or `None` when no reply arrived.
    pub best_move: Option<String>,
    /// Elapsed search time in milliseconds. Taken from the engine's own
    /// `time` report when available, wall clock otherwise.
    pub time_ms: u64,
}

/// A client conducting one UCI session against an engine process.
pub struct UciClient {
    session: EngineSession,
    name: Option<String>,
}

impl UciClient {
    /// Spawns the engine and wraps it in a client.
    ///
    /// No protocol traffic happens yet; the caller drives the session via
    /// [`identify`](Self::identify) or
    /// [`analyze_position`](Self::analyze_position).
    fn connect<P: AsRef<Path>>(path: P) -> Result<Self, ClientError> {
        Ok(Self {
            session: EngineSession::spawn(path)?,
            name: None,
        })
    }

    /// Probes an engine for its self-reported display name.
    ///
    /// Runs a handshake-only session against a fresh process and shuts it
    /// down again. Engines that never declare `id name` are reported as
    /// "Unknown Engine".
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot be launched or ends its
    /// output before acknowledging the handshake.
    pub fn identify<P: AsRef<Path>>(path: P) -> Result<String, ClientError> {
        let mut client = Self::connect(path)?;
        let handshake = client.handshake();
        let _ = client.session.close();
        handshake?;
        Ok(client
            .name
            .take()
            .unwrap_or_else(|| "Unknown Engine".to_string()))
    }

    /// Runs one complete analysis session against a fresh engine process.
    ///
    /// Conducts the full sequence: handshake, Hash/Threads configuration,
    /// readiness barrier, `ucinewgame`, position submission, and a
    /// fixed-depth search. The session is closed before returning,
    /// whatever the outcome.
    ///
    /// An engine that stops talking mid-search is not an error: the result
    /// simply carries no move. Launch and handshake failures are errors
    /// and are left to the caller to recover from.
    pub fn analyze_position<P: AsRef<Path>>(
        path: P,
        fen: &str,
        params: &SearchParams,
    ) -> Result<AnalysisResult, ClientError> {
        let mut client = Self::connect(path)?;
        let outcome = client.run_session(fen, params);
        let _ = client.session.close();
        outcome
    }

    fn run_session(&mut self, fen: &str, params: &SearchParams) -> Result<AnalysisResult, ClientError> {
        self.handshake()?;
        self.configure(params)?;
        self.wait_ready()?;
        self.search(fen, params.depth)
    }

    /// Sends `uci` and reads until the engine acknowledges with `uciok`,
    /// capturing the display name on the way.
    fn handshake(&mut self) -> Result<(), ClientError> {
        self.session.send("uci")?;
        loop {
            let line = self.read_required("uciok")?;
            if let Some(name) = line.strip_prefix("id name ") {
                self.name = Some(name.trim().to_string());
            }
            if line.contains("uciok") {
                return Ok(());
            }
        }
    }

    fn configure(&mut self, params: &SearchParams) -> Result<(), ClientError> {
        self.session
            .send(&format!("setoption name Hash value {}", params.hash_mb))?;
        self.session
            .send(&format!("setoption name Threads value {}", params.threads))?;
        Ok(())
    }

    /// Readiness barrier. `setoption` is not guaranteed to be synchronous,
    /// so the position must not be submitted until the engine says
    /// `readyok`.
    fn wait_ready(&mut self) -> Result<(), ClientError> {
        self.session.send("isready")?;
        loop {
            if self.read_required("readyok")?.contains("readyok") {
                return Ok(());
            }
        }
    }

    fn search(&mut self, fen: &str, depth: u32) -> Result<AnalysisResult, ClientError> {
        self.session.send("ucinewgame")?;
        self.session.send(&format!("position fen {}", fen))?;
        self.session.send(&format!("go depth {}", depth))?;

        // Wall-clock fallback for engines that never report `time`.
        let started = Instant::now();
        let mut reported_ms: Option<u64> = None;

        loop {
            let Some(line) = self.session.read_line()? else {
                tracing::warn!("engine closed its output before bestmove");
                return Ok(AnalysisResult {
                    best_move: None,
                    time_ms: resolve_time(reported_ms, started),
                });
            };

            if let Some(info) = SearchInfo::parse(&line) {
                if let Some(ms) = info.time_ms {
                    reported_ms = Some(ms);
                }
                continue;
            }

            if let Some(best_move) = parse_bestmove(&line) {
                return Ok(AnalysisResult {
                    best_move,
                    time_ms: resolve_time(reported_ms, started),
                });
            }
        }
    }

    fn read_required(&mut self, stage: &'static str) -> Result<String, ClientError> {
        self.session
            .read_line()?
            .ok_or(ClientError::UnexpectedEof(stage))
    }
}

/// Extracts the chosen move from a `bestmove` line.
///
/// Returns `None` when the line is not a result line at all. A result line
/// whose marker has no following token yields `Some(None)`: the engine
/// answered, but with no move. Trailing tokens such as `ponder` are
/// discarded.
fn parse_bestmove(line: &str) -> Option<Option<String>> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let at = tokens.iter().position(|t| *t == "bestmove")?;
    Some(tokens.get(at + 1).map(|m| m.to_string()))
}

/// Picks the engine-reported time when one was captured, wall clock
/// otherwise. A wall-clock reading of exactly zero is kept but flagged,
/// since it usually means the search depth is too shallow to time.
fn resolve_time(reported_ms: Option<u64>, started: Instant) -> u64 {
    match reported_ms {
        Some(ms) => ms,
        None => {
            tracing::warn!("engine sent no time info, using wall-clock elapsed time");
            let wall = started.elapsed().as_millis() as u64;
            if wall == 0 {
                tracing::warn!("elapsed time is zero, consider increasing the search depth");
            }
            wall
        }
    }
}
