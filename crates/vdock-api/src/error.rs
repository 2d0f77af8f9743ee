//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::services::ingest::IngestError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing, malformed, or failed credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Request-level validation failures outside the ingestion pipeline.
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Storage error: {0}")]
    Storage(#[from] vdock_storage::StorageError),

    #[error("Firestore error: {0}")]
    Firestore(#[from] vdock_firestore::FirestoreError),

    /// Pipeline errors carry their own kind and status mapping.
    #[error("{0}")]
    Ingest(#[from] IngestError),
}

impl ApiError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) | ApiError::Storage(_) | ApiError::Firestore(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Ingest(e) => match e {
                IngestError::NotFound(_) => StatusCode::NOT_FOUND,
                // Ownership failures answer exactly like missing credentials.
                IngestError::Forbidden => StatusCode::UNAUTHORIZED,
                IngestError::Validation(_) => StatusCode::BAD_REQUEST,
                IngestError::Io(_)
                | IngestError::Probe(_)
                | IngestError::Normalize(_)
                | IngestError::Upload(_)
                | IngestError::Persist(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

/// Wire shape of every error body. `code` is only present for pipeline
/// errors, where clients can branch on the machine-readable kind.
#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Don't expose internal error details in production, and never
        // tell a caller whose credentials verified that the record exists
        // but is someone else's.
        let detail = if matches!(self, ApiError::Ingest(IngestError::Forbidden)) {
            "Unauthorized".to_string()
        } else if status == StatusCode::INTERNAL_SERVER_ERROR
            && std::env::var("ENVIRONMENT").unwrap_or_default() == "production"
        {
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };

        let code = match &self {
            ApiError::Ingest(e) => Some(e.kind().to_string()),
            _ => None,
        };

        let body = ErrorResponse { detail, code };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ownership_failure_maps_to_unauthorized() {
        let err = ApiError::from(IngestError::Forbidden);
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_missing_record_maps_to_not_found() {
        let err = ApiError::from(IngestError::NotFound("v1".into()));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_media_type_rejection_maps_to_bad_request() {
        let err = ApiError::from(IngestError::validation("unsupported media type"));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_pipeline_failures_map_to_internal() {
        let err = ApiError::from(IngestError::Io(std::io::Error::other("disk full")));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
