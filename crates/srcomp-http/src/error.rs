//! Error types for the API server.
//!
//! [`ApiError`] unifies all failure modes into a single enum that
//! can be converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use srcomp_core::{RangeError, StateLoadError};
use tracing::{error, warn};

/// Errors that can occur in the API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A `/matches` query used a key that is not a match filter.
    #[error("unknown match filter: {0}")]
    UnknownMatchFilter(String),

    /// A match filter's range expression was rejected.
    #[error("invalid value for {key}: {source}")]
    InvalidRange {
        /// The query key holding the expression.
        key: String,
        /// Why the expression was rejected.
        source: RangeError,
    },

    /// An invalid query parameter was provided.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The competition state could not be loaded.
    #[error("competition state unavailable: {source}")]
    StateUnavailable {
        /// The underlying load failure.
        #[from]
        source: StateLoadError,
    },

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// The HTTP status this error is reported with.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::UnknownMatchFilter(_) | Self::InvalidRange { .. } | Self::InvalidQuery(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::StateUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        match &self {
            Self::StateUnavailable { .. } => warn!(error = %message, "Serving 503"),
            Self::Internal(_) => error!(error = %message, "Serving 500"),
            _ => {}
        }

        let body = serde_json::json!({
            "error": true,
            "msg": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_are_bad_requests() {
        assert_eq!(
            ApiError::UnknownMatchFilter(String::from("colour")).status(),
            StatusCode::BAD_REQUEST
        );
        let range = ApiError::InvalidRange {
            key: String::from("num"),
            source: RangeError::EmptyRange,
        };
        assert_eq!(range.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            range.to_string(),
            "invalid value for num: must specify at least one bound"
        );
    }

    #[test]
    fn load_failure_is_service_unavailable() {
        let err = ApiError::from(StateLoadError::Invalid(String::from("bad")));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
