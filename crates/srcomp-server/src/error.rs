//! Error types for the `srcomp-http` binary.

use std::path::PathBuf;

use srcomp_core::{LockError, StateLoadError};

/// Top-level error for the binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Settings could not be assembled.
    #[error("settings error: {source}")]
    Settings {
        /// The underlying settings error.
        #[from]
        source: config::ConfigError,
    },

    /// The API server failed to start or stopped with an error.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: srcomp_http::ServerError,
    },

    /// The compstate update failed.
    #[error("update error: {source}")]
    Update {
        /// The underlying update error.
        #[from]
        source: UpdateError,
    },

    /// A blocking task panicked or was cancelled.
    #[error("task error: {0}")]
    Task(String),
}

/// Errors from `srcomp-http update`.
#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    /// `git` could not be started.
    #[error("failed to run git {args} in {}: {source}", dir.display())]
    Spawn {
        /// The git arguments.
        args: String,
        /// The compstate directory.
        dir: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// `git` exited unsuccessfully.
    #[error("git {args} failed ({status}): {stderr}")]
    Git {
        /// The git arguments.
        args: String,
        /// The exit status as reported by the OS.
        status: String,
        /// What git wrote to stderr.
        stderr: String,
    },

    /// The checked-out compstate does not load.
    #[error("updated compstate is invalid: {source}")]
    Invalid {
        /// The load failure.
        #[from]
        source: StateLoadError,
    },

    /// The update lock or sentinel failed.
    #[error("update lock: {source}")]
    Lock {
        /// The underlying lock error.
        #[from]
        source: LockError,
    },
}
