//! HTTP error mapping for the pipeline API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use curtain_common::Error;
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// No credential header was sent (401)
    #[error("Missing credential: {0}")]
    MissingCredential(String),

    /// Pipeline error, mapped by kind
    #[error(transparent)]
    Pipeline(#[from] Error),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::MissingCredential(_) => (StatusCode::UNAUTHORIZED, "MISSING_CREDENTIAL"),
            ApiError::Pipeline(err) => match err {
                Error::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                Error::ValidationFailed(_) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_FAILED")
                }
                Error::Denied(_) => (StatusCode::FORBIDDEN, "DENIED"),
                Error::TransientBusy(_) => (StatusCode::SERVICE_UNAVAILABLE, "STORE_BUSY"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(code = error_code, "Request failed: {}", self);
        }

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
