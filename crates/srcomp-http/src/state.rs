//! Shared application state for the API server.

use std::sync::Arc;

use srcomp_core::StateManager;
use srcomp_types::CompetitionState;

use crate::error::ApiError;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Owner of the cached competition state.
    pub manager: Arc<StateManager>,
}

impl AppState {
    /// Create application state around an existing manager.
    pub const fn new(manager: Arc<StateManager>) -> Self {
        Self { manager }
    }

    /// Fetch the current competition state.
    ///
    /// The manager may stat the sentinel or reload from disk, and a reload
    /// can wait on an updater's lock, so the call runs on the blocking
    /// pool rather than the async worker.
    ///
    /// # Errors
    ///
    /// [`ApiError::StateUnavailable`] if a reload was needed and failed,
    /// [`ApiError::Internal`] if the blocking task itself failed.
    pub async fn competition(&self) -> Result<Arc<CompetitionState>, ApiError> {
        let manager = Arc::clone(&self.manager);
        let loaded = tokio::task::spawn_blocking(move || manager.get_state())
            .await
            .map_err(|e| ApiError::Internal(format!("state task failed: {e}")))?;
        Ok(loaded?)
    }
}
