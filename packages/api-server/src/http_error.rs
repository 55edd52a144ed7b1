//! HTTP error handling
//!
//! Provides consistent JSON error bodies and maps service errors to status
//! codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use classifieds_core::services::TreeServiceError;
use serde::{Deserialize, Serialize};

/// JSON error body returned by every endpoint
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpError {
    /// User-facing error message
    pub message: String,
    /// Machine-readable error code
    pub code: String,
    /// Optional detailed error information for debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl HttpError {
    /// Create a new HTTP error
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: None,
        }
    }

    /// Create a new HTTP error with details
    pub fn with_details(
        message: impl Into<String>,
        code: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: Some(details.into()),
        }
    }

    /// Convert from anyhow::Error
    pub fn from_anyhow(err: anyhow::Error, code: impl Into<String>) -> Self {
        Self {
            message: err.to_string(),
            code: code.into(),
            details: Some(format!("{:?}", err)),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.code.as_str() {
            "NODE_NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "CONFLICT" => StatusCode::CONFLICT,
            "CYCLE_REJECTED" => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<TreeServiceError> for HttpError {
    fn from(err: TreeServiceError) -> Self {
        match err {
            TreeServiceError::Validation(e) => HttpError::new(e.to_string(), "VALIDATION_ERROR"),
            TreeServiceError::SiblingMismatch(mismatch) => HttpError::with_details(
                "Submitted order does not match the current siblings",
                "VALIDATION_ERROR",
                mismatch.to_string(),
            ),
            TreeServiceError::CycleRejected(rejection) => {
                HttpError::new(rejection.to_string(), "CYCLE_REJECTED")
            }
            err @ TreeServiceError::NotFound { .. } => {
                HttpError::new(err.to_string(), "NODE_NOT_FOUND")
            }
            TreeServiceError::Forbidden(e) => HttpError::new(e.to_string(), "FORBIDDEN"),
            TreeServiceError::Conflict(message) => HttpError::new(message, "CONFLICT"),
            TreeServiceError::HierarchyCorrupted(e) => {
                tracing::error!("Hierarchy corrupted: {}", e);
                HttpError::new(e.to_string(), "HIERARCHY_CORRUPTED")
            }
            TreeServiceError::Storage(e) => {
                tracing::error!("Storage failure: {:?}", e);
                HttpError::from_anyhow(e, "DATABASE_ERROR")
            }
        }
    }
}
