//! HTTP error mapping.
//!
//! Every failure crossing the interface boundary becomes the structured
//! envelope `{"success": false, "message": …}` with a human-readable
//! message; stack traces and internal error chains never leave the
//! process.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use examsweep_pipeline::PipelineError;
use examsweep_storage::StorageError;
use serde_json::json;

/// Errors surfaced by route handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Request rejected before any work happened
    #[error("{0}")]
    BadRequest(String),

    /// The referenced resource does not exist
    #[error("{0}")]
    NotFound(String),

    /// Something failed on our side
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "success": false,
            "message": self.to_string(),
        }));
        (self.status(), body).into_response()
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::NotFound(msg) => Self::NotFound(msg),
            PipelineError::InvalidState(msg) => Self::BadRequest(msg),
            PipelineError::Storage(e) => Self::Internal(e.to_string()),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(msg) => Self::NotFound(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}
