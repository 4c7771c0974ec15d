//! Error types for compstate loading and the update lock protocol.

use std::path::PathBuf;

/// A compstate could not be turned into a [`CompetitionState`].
///
/// Returned by [`StateManager::get_state`] when a load or reload fails.
/// The manager keeps serving whatever it had cached before the failure.
///
/// [`CompetitionState`]: srcomp_types::CompetitionState
/// [`StateManager::get_state`]: crate::manager::StateManager::get_state
#[derive(Debug, thiserror::Error)]
pub enum StateLoadError {
    /// The shared lock on the compstate could not be taken.
    #[error("failed to lock compstate: {source}")]
    Lock {
        /// The underlying lock error.
        #[from]
        source: LockError,
    },

    /// A backing file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// The file being read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A backing file is not valid YAML or does not match the schema.
    #[error("failed to parse {}: {source}", path.display())]
    Yaml {
        /// The file being parsed.
        path: PathBuf,
        /// The underlying YAML error.
        source: serde_yml::Error,
    },

    /// The files parsed but describe an impossible competition.
    #[error("invalid compstate: {0}")]
    Invalid(String),
}

/// Errors from the advisory lock and update-signal primitives.
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    /// The lock file could not be opened or locked.
    #[error("failed to acquire lock {}: {source}", path.display())]
    Acquire {
        /// The lock file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The update sentinel could not be touched after a clean update.
    #[error("failed to touch update sentinel {}: {source}", path.display())]
    Signal {
        /// The sentinel file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}
