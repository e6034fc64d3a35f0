//! services/api/src/web/chat.rs
//!
//! The `POST /chat` handler.

use axum::{
    extract::{Extension, State},
    response::{IntoResponse, Json, Response},
};
use bytes::Bytes;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info_span, Instrument};
use uuid::Uuid;

use crate::web::{
    errors::{json_parse_error, ChatFailure},
    middleware::ClientIdentity,
    protocol::{ChatRequestBody, ChatResponseBody, ErrorBody},
    state::AppState,
};

/// Send a message to Lexi.
///
/// Supplying a `conversationId` keeps the exchange in short-lived server-side
/// history so that follow-up questions have context.
#[utoipa::path(
    post,
    path = "/chat",
    request_body = ChatRequestBody,
    responses(
        (status = 200, description = "Generated reply", body = ChatResponseBody),
        (status = 400, description = "Validation or JSON parse failure", body = ErrorBody),
        (status = 401, description = "Invalid generation credential", body = ErrorBody),
        (status = 403, description = "Credential lacks permission", body = ErrorBody),
        (status = 429, description = "Rate limited, locally or upstream", body = ErrorBody),
        (status = 500, description = "Server or configuration fault", body = ErrorBody),
        (status = 502, description = "Generation service fault", body = ErrorBody),
        (status = 504, description = "Generation service timed out", body = ErrorBody)
    )
)]
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Extension(client): Extension<ClientIdentity>,
    body: Bytes,
) -> Response {
    // An empty body counts as no body at all, which validation reports.
    let parsed = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        match serde_json::from_slice::<Value>(&body) {
            Ok(value) => Some(value),
            Err(e) => return json_parse_error(&e),
        }
    };

    let span = info_span!("chat", request_id = %Uuid::new_v4(), client = %client.0);
    state
        .chat
        .handle_chat(parsed.as_ref(), &client.0)
        .instrument(span)
        .await
        .map(|reply| Json(ChatResponseBody::from(reply)))
        .map_err(ChatFailure::from)
        .into_response()
}
