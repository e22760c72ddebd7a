//! Error types for process supervision

use std::io;
use thiserror::Error;

use crate::session::SessionId;

/// Process supervision errors
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The executable could not be started (missing, not executable, bad cwd)
    #[error("Failed to spawn `{program}`: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: io::Error,
    },

    /// A build is already in flight; builds are never queued
    #[error("A build is already running (session {active})")]
    AlreadyRunning { active: SessionId },

    /// The build ran to completion but reported failure
    #[error("`{target}` failed with exit code {code}")]
    NonZeroExit { target: String, code: i32 },

    /// The build died without an exit code (signal or crash)
    #[error("`{target}` terminated abnormally (signal {signal:?})")]
    Crashed { target: String, signal: Option<i32> },

    /// The build was cancelled by the user
    #[error("`{target}` was cancelled")]
    Cancelled { target: String },

    /// Process timed out
    #[error("Process timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// Failed to kill process
    #[error("Failed to kill process: {0}")]
    KillFailed(String),

    /// Invalid configuration
    #[error("Invalid process configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for process operations
pub type Result<T> = std::result::Result<T, ProcessError>;
