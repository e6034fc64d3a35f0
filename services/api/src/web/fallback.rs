//! services/api/src/web/fallback.rs
//!
//! Response for requests that match no route or use the wrong method.

use axum::{
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Json, Response},
};

use crate::web::protocol::ErrorBody;

pub const AVAILABLE_ENDPOINTS: &str = "GET /health, POST /chat";

pub async fn not_found(method: Method, uri: Uri) -> Response {
    let body = ErrorBody::new(
        "Not Found",
        format!("Route {} {} not found", method, uri.path()),
        Some(format!(
            "Check the URL and request method. Available endpoints: {AVAILABLE_ENDPOINTS}"
        )),
    );
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}
