//! Common helper functions for API handlers.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::errors::ServiceError;

/// Returns an error response with the given status code and message.
#[must_use]
pub fn err_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Unwraps an extracted JSON body, turning any rejection into a 400.
///
/// # Errors
///
/// Returns `ValidationError` for a missing, malformed or mistyped body.
pub fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ServiceError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        ServiceError::ValidationError(format!("Invalid JSON body: {}", rejection.body_text()))
    })
}

/// Extracts a required string field, reporting it by name when absent.
///
/// # Errors
///
/// Returns the fixed missing-field `ValidationError`.
pub fn require_field(value: Option<String>, field: &str) -> Result<String, ServiceError> {
    value.ok_or_else(|| ServiceError::missing_field(field))
}
