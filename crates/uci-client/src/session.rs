//! Engine process transport.
//!
//! An [`EngineSession`] owns one child process and its stdin/stdout pipes,
//! and exposes line-oriented send/receive primitives. Sessions are cheap
//! and short-lived: callers spawn a fresh one per task and close it when
//! done.

use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use thiserror::Error;

/// Errors that can occur on the engine transport.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Engine executable was not found at the specified path.
    #[error("engine not found at path: {0}")]
    NotFound(String),
    /// The engine process could not be started.
    #[error("failed to launch engine: {0}")]
    Launch(#[source] std::io::Error),
    /// Reading from or writing to the engine pipes failed.
    #[error("engine i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

/// A running engine process with line-oriented pipes.
///
/// # Lifecycle
///
/// 1. Spawn the engine with [`EngineSession::spawn`]
/// 2. Exchange protocol lines with [`send`](Self::send) and
///    [`read_line`](Self::read_line)
/// 3. Shut down with [`close`](Self::close) (or rely on the [`Drop`]
///    implementation as a backstop)
pub struct EngineSession {
    /// The child process handle.
    process: Child,
    /// Handle to write commands to the engine's stdin.
    ///
    /// Taken on close so the pipe is dropped before waiting on the process.
    stdin: Option<ChildStdin>,
    /// Buffered reader for the engine's stdout.
    stdout: BufReader<ChildStdout>,
    /// Set once [`close`](Self::close) has run.
    closed: bool,
}

impl EngineSession {
    /// Spawns a new engine process with piped stdin/stdout.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotFound`] if the executable does not exist,
    /// or [`SessionError::Launch`] if the process cannot be started.
    pub fn spawn<P: AsRef<Path>>(path: P) -> Result<Self, SessionError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SessionError::NotFound(path.display().to_string()));
        }

        let mut process = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(SessionError::Launch)?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| SessionError::Launch(pipe_error("stdin pipe not captured")))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| SessionError::Launch(pipe_error("stdout pipe not captured")))?;

        Ok(Self {
            process,
            stdin: Some(stdin),
            stdout: BufReader::new(stdout),
            closed: false,
        })
    }

    /// Sends one command line to the engine.
    ///
    /// Writes the command followed by a newline and flushes the pipe.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Io`] if the pipe has been closed or the
    /// write fails.
    pub fn send(&mut self, cmd: &str) -> Result<(), SessionError> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| SessionError::Io(pipe_error("engine stdin is closed")))?;
        tracing::debug!(">> {}", cmd);
        writeln!(stdin, "{}", cmd)?;
        stdin.flush()?;
        Ok(())
    }

    /// Reads one line of engine output, with surrounding whitespace trimmed.
    ///
    /// Blocks until a complete line is available. Returns `Ok(None)` once
    /// the engine closes its output stream.
    pub fn read_line(&mut self) -> Result<Option<String>, SessionError> {
        let mut line = String::new();
        let bytes = self.stdout.read_line(&mut line)?;
        if bytes == 0 {
            return Ok(None);
        }
        let line = line.trim().to_string();
        tracing::debug!("<< {}", line);
        Ok(Some(line))
    }

    /// Shuts the engine down and reclaims the process.
    ///
    /// Sends `quit`, drops the stdin pipe, and waits for the process to
    /// exit. Idempotent: calling it again is a no-op.
    pub fn close(&mut self) -> Result<(), SessionError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        // The pipe may already be gone if the engine exited on its own.
        let _ = self.send("quit");
        self.stdin.take();

        self.process.wait()?;
        Ok(())
    }
}

impl Drop for EngineSession {
    /// Ensures the engine process is reclaimed even when [`close`] was
    /// never reached.
    ///
    /// [`close`]: Self::close
    fn drop(&mut self) {
        if !self.closed {
            let _ = self.send("quit");
            self.stdin.take();
            let _ = self.process.kill();
            let _ = self.process.wait();
        }
    }
}

fn pipe_error(message: &str) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::BrokenPipe, message.to_string())
}
