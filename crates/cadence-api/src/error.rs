//! API error types and JSON error response formatting.
//!
//! ApiError provides a consistent JSON error response format across all
//! endpoints, mapping internal errors to appropriate HTTP status codes.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use cadence_core::error::CadenceError;
use cadence_import::ImportError;

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g., "bad_request", "not_found").
    pub error: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional structured details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - malformed body or wrong embedding dimension.
    BadRequest(String),
    /// 404 Not Found - song does not exist.
    NotFound(String),
    /// 422 Unprocessable Entity - import aborted and rolled back.
    UnprocessableEntity {
        message: String,
        details: Option<serde_json::Value>,
    },
    /// 500 Internal Server Error - unexpected server error.
    Internal(String),
    /// 502 Bad Gateway - the track service failed.
    BadGateway(String),
    /// 503 Service Unavailable - component not configured.
    ServiceUnavailable(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::UnprocessableEntity { message, details } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "unprocessable_entity",
                message,
                details,
            ),
            ApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg, None)
            }
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, "bad_gateway", msg, None),
            ApiError::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", msg, None)
            }
        };

        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), message = %message, "Request failed");
        }

        let body = ErrorBody {
            error: error_code.to_string(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<CadenceError> for ApiError {
    fn from(err: CadenceError) -> Self {
        match err {
            CadenceError::DimensionMismatch { .. } => ApiError::BadRequest(err.to_string()),
            CadenceError::Config(msg) => ApiError::BadRequest(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::Fetch(e) => ApiError::BadGateway(e.to_string()),
            ImportError::Insert {
                ref track_id,
                rolled_back,
                ref imported,
                ref failed,
                ..
            } => ApiError::UnprocessableEntity {
                details: Some(serde_json::json!({
                    "track_id": track_id,
                    "rolled_back": rolled_back,
                    "imported": imported,
                    "failed": failed,
                })),
                message: err.to_string(),
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(format!("Invalid JSON: {}", rejection.body_text()))
    }
}
