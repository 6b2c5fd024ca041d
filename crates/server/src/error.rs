//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding. Every error renders as a JSON body `{"error": "..."}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::UploadError;

/// Message returned when an upload arrives without a registration.
pub const REGISTER_FIRST: &str = "Please register before uploading images.";

/// Application-level error type for the photobooth API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Client input is missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// The request body exceeds the configured limit.
    #[error("{0}")]
    PayloadTooLarge(String),

    /// The request is valid but its session is not in the required state.
    #[error("{0}")]
    Precondition(String),

    /// The session could not be written to the store.
    #[error("Failed to save session data")]
    SessionPersistence(#[source] tower_sessions::session::Error),

    /// A stage of the upload pipeline failed.
    #[error("An error occurred while processing the image: {0}")]
    Upload(#[from] UploadError),
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Precondition(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::SessionPersistence(_) | Self::Upload(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = ErrorBody {
            error: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::StorageError;

    #[test]
    fn test_app_error_display() {
        let err = AppError::Validation("All fields are required".to_string());
        assert_eq!(err.to_string(), "All fields are required");

        let err = AppError::Upload(UploadError::Storage(StorageError::Write {
            path: "uploads/Engineering/1.png".into(),
            source: std::io::Error::other("disk full"),
        }));
        assert_eq!(
            err.to_string(),
            "An error occurred while processing the image: failed to write uploads/Engineering/1.png: disk full"
        );
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            let response = err.into_response();
            response.status()
        }

        assert_eq!(
            get_status(AppError::Validation("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Precondition(REGISTER_FIRST.to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::PayloadTooLarge("too big".to_string())),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            get_status(AppError::Upload(UploadError::Storage(StorageError::Write {
                path: "x".into(),
                source: std::io::Error::other("boom"),
            }))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
