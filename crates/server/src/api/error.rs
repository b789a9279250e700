//! Mapping of service errors onto HTTP responses.

use axum::{http::StatusCode, Json};
use serde::Serialize;
use tracery_core::{ErrorKind, ServiceError, ValidationError};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Status code for a failed job's kind.
pub fn status_for_failure(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Fetch => StatusCode::BAD_GATEWAY,
        ErrorKind::Tracing => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Optimization
        | ErrorKind::Render
        | ErrorKind::Storage
        | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn service_error(e: ServiceError) -> ApiError {
    let status = status_for_failure(e.kind());
    let (error, field) = match &e {
        ServiceError::Conversion(failure) => (failure.message.clone(), None),
        ServiceError::Validation(v) => (v.to_string(), v.field()),
        other => (other.to_string(), None),
    };
    (
        status,
        Json(ErrorResponse {
            error,
            kind: e.kind(),
            field,
        }),
    )
}

pub fn validation_error(e: ValidationError) -> ApiError {
    service_error(ServiceError::Validation(e))
}

/// Rejection for a malformed request body.
pub fn bad_request(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
            kind: ErrorKind::Validation,
            field: None,
        }),
    )
}

pub fn internal_error(message: impl Into<String>) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: message.into(),
            kind: ErrorKind::Internal,
            field: None,
        }),
    )
}
