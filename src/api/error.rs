//! API Error Types
//!
//! Defines error types for the API layer and implements conversion
//! to HTTP responses with appropriate status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::analytics::{AnalysisError, ErrorKind};
use crate::store::StoreError;

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Analysis run failed
    #[error("{0}")]
    Analysis(#[from] AnalysisError),

    /// Search store error outside an analysis run
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
    pub request_id: String,
}

/// Error details
#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::Analysis(e) => match e.kind() {
                ErrorKind::InvalidWindow => (StatusCode::BAD_REQUEST, "INVALID_WINDOW"),
                ErrorKind::Fetch | ErrorKind::ComparisonFetch => {
                    (StatusCode::BAD_GATEWAY, "FETCH_ERROR")
                }
                ErrorKind::Superseded => (StatusCode::CONFLICT, "SUPERSEDED"),
                ErrorKind::Configuration => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "CONFIGURATION_ERROR")
                }
                ErrorKind::Export => (StatusCode::INTERNAL_SERVER_ERROR, "EXPORT_ERROR"),
            },
            ApiError::Store(StoreError::Misconfigured(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "CONFIGURATION_ERROR")
            }
            ApiError::Store(_) => (StatusCode::BAD_GATEWAY, "STORE_ERROR"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let request_id = uuid::Uuid::new_v4().to_string();

        // Log the error
        tracing::error!(
            request_id = %request_id,
            error_code = %code,
            error_message = %self,
            "API error occurred"
        );

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: self.to_string(),
            },
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                ApiError::Analysis(AnalysisError::InvalidWindow("0".to_string())),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Analysis(AnalysisError::Store(StoreError::Timeout)),
                StatusCode::BAD_GATEWAY,
            ),
            (
                ApiError::Analysis(AnalysisError::Superseded { generation: 1 }),
                StatusCode::CONFLICT,
            ),
            (
                ApiError::Analysis(AnalysisError::Configuration(ConfigError::MissingApiKey)),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (ApiError::Store(StoreError::Unavailable), StatusCode::BAD_GATEWAY),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}
