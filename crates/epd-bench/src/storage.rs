//! SQLite storage for run history.
//!
//! Every finished run is persisted as one row, so an engine's progress
//! across move-ordering or evaluation changes can be compared over time
//! without re-reading summary files.

use std::path::Path;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Result as SqliteResult};
use uuid::Uuid;

use crate::runner::SuiteReport;

/// SQLite-backed storage for run results.
///
/// # Example
///
/// ```ignore
/// let storage = Storage::open("data/bench.db")?;
/// let run_id = storage.save_run(&report)?;
/// let best = storage.best_rate(&report.engine_name, "suites/sts.epd")?;
/// ```
pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Opens or creates a SQLite database at the given path.
    ///
    /// The schema is initialized on first open.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or if schema
    /// initialization fails.
    pub fn open<P: AsRef<Path>>(path: P) -> SqliteResult<Self> {
        let conn = Connection::open(path)?;
        let storage = Self { conn };
        storage.init_schema()?;
        Ok(storage)
    }

    /// Initializes the database schema if tables do not exist.
    fn init_schema(&self) -> SqliteResult<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS runs (
                id TEXT PRIMARY KEY,
                engine TEXT NOT NULL,
                suite TEXT NOT NULL,
                depth INTEGER NOT NULL,
                hash_mb INTEGER NOT NULL,
                threads INTEGER NOT NULL,
                total_positions INTEGER NOT NULL,
                evaluated_positions INTEGER NOT NULL,
                max_points INTEGER NOT NULL,
                points INTEGER NOT NULL,
                rate REAL NOT NULL,
                time_ms INTEGER NOT NULL,
                created_at TEXT NOT NULL
            );
            ",
        )
    }

    /// Saves a finished run.
    ///
    /// # Returns
    ///
    /// The unique ID assigned to the saved run.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn save_run(&self, report: &SuiteReport) -> SqliteResult<String> {
        let id = Uuid::new_v4().to_string();

        self.conn.execute(
            "INSERT INTO runs (id, engine, suite, depth, hash_mb, threads,
                               total_positions, evaluated_positions, max_points,
                               points, rate, time_ms, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            (
                &id,
                &report.engine_name,
                report.suite_path.display().to_string(),
                report.depth,
                report.hash_mb,
                report.threads,
                report.totals.total,
                report.totals.evaluated,
                report.totals.max_points,
                report.totals.points,
                report.totals.rate(),
                report.totals.time_ms as i64,
                Utc::now().to_rfc3339(),
            ),
        )?;

        Ok(id)
    }

    /// The best rate an engine has ever scored on a suite, if it has run
    /// it before.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn best_rate(&self, engine: &str, suite: &str) -> SqliteResult<Option<f64>> {
        self.conn
            .query_row(
                "SELECT MAX(rate) FROM runs WHERE engine = ?1 AND suite = ?2",
                [engine, suite],
                |row| row.get::<_, Option<f64>>(0),
            )
            .optional()
            .map(|best| best.flatten())
    }

    /// How many runs an engine has recorded against a suite.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn run_count(&self, engine: &str, suite: &str) -> SqliteResult<i64> {
        self.conn.query_row(
            "SELECT COUNT(*) FROM runs WHERE engine = ?1 AND suite = ?2",
            [engine, suite],
            |row| row.get(0),
        )
    }
}
