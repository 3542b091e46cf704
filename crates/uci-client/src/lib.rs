//! Synchronous client for UCI chess engines.
//!
//! This crate spawns a UCI-compatible chess engine as a child process,
//! drives the protocol over its stdin/stdout pipes, and reports the chosen
//! move together with the elapsed search time. Only the protocol subset
//! needed for single-position, fixed-depth analysis is implemented.
//!
//! # Modules
//!
//! - [`session`] - child process transport with line-oriented send/receive
//! - [`client`] - protocol sequencing for identity probes and searches
//! - [`info`] - tokenized parsing of `info` search lines
//!
//! # Example
//!
//! ```no_run
//! use uci_client::{SearchParams, UciClient};
//!
//! let params = SearchParams { hash_mb: 64, threads: 1, depth: 8 };
//! let name = UciClient::identify("/usr/bin/stockfish")?;
//! let result = UciClient::analyze_position(
//!     "/usr/bin/stockfish",
//!     "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
//!     &params,
//! )?;
//! println!("{} plays {:?} in {} ms", name, result.best_move, result.time_ms);
//! # Ok::<(), uci_client::ClientError>(())
//! ```

pub mod client;
pub mod info;
pub mod session;

pub use client::{AnalysisResult, ClientError, SearchParams, UciClient};
pub use info::SearchInfo;
pub use session::{EngineSession, SessionError};
