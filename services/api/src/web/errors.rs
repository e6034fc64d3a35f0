//! services/api/src/web/errors.rs
//!
//! Turns pipeline failures into HTTP responses. This is the only place that
//! decides status codes for chat errors.

use std::any::Any;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use lexibot_core::ChatError;
use tracing::error;

use crate::web::protocol::ErrorBody;

/// Wraps `ChatError` so it can implement `IntoResponse` (orphan rule).
#[derive(Debug)]
pub struct ChatFailure(pub ChatError);

impl From<ChatError> for ChatFailure {
    fn from(err: ChatError) -> Self {
        ChatFailure(err)
    }
}

impl IntoResponse for ChatFailure {
    fn into_response(self) -> Response {
        let err = self.0;
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let fixable_reason = err.fixable_reason();

        let body = match err {
            ChatError::Validation { message, field } => ErrorBody {
                field: field.map(str::to_string),
                ..ErrorBody::new("ValidationError", message, fixable_reason)
            },
            ChatError::Api { message, .. } => ErrorBody::new("API Error", message, fixable_reason),
            ChatError::Configuration { message, .. } => {
                ErrorBody::new("Configuration Error", message, fixable_reason)
            }
            ChatError::Internal(detail) => {
                error!(detail = %detail, "unclassified failure while handling chat");
                ErrorBody::new(
                    "Server Error",
                    "An unexpected error occurred while processing your request",
                    Some(
                        "Please try again in a moment or contact support if the issue persists"
                            .to_string(),
                    ),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// The request body was not valid JSON.
pub fn json_parse_error(err: &serde_json::Error) -> Response {
    let body = ErrorBody::new(
        "JSON Parse Error",
        format!("Request body is not valid JSON: {err}"),
        Some("Send a JSON object such as {\"message\": \"...\"}".to_string()),
    );
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

/// The caller exhausted its request window.
pub fn rate_limited(retry_after_secs: u64) -> Response {
    let body = ErrorBody {
        retry_after: Some(retry_after_secs),
        ..ErrorBody::new(
            "Rate Limit Exceeded",
            "Too many requests. Please wait before trying again.",
            Some(format!(
                "Wait {retry_after_secs} seconds before making another request"
            )),
        )
    };
    (
        StatusCode::TOO_MANY_REQUESTS,
        [(header::RETRY_AFTER, retry_after_secs.to_string())],
        Json(body),
    )
        .into_response()
}

/// Rendered when a handler panics.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(detail, "unhandled error in request handler");

    let body = ErrorBody::new(
        "Internal Server Error",
        "An unexpected server error occurred",
        Some("This is likely a server issue. Please try again or contact support".to_string()),
    );
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}
