//! services/api/src/web/middleware.rs
//!
//! Rate-limiting middleware for the chat route.

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use lexibot_core::{rate_limit::UNKNOWN_CLIENT, Admission};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::warn;

use crate::web::{errors::rate_limited, state::AppState};

/// Best-effort caller identity, inserted into request extensions by [`rate_limit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity(pub String);

/// Resolves the caller's network address, falling back to a shared bucket.
pub fn client_identity(req: &Request) -> ClientIdentity {
    let id = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string());
    ClientIdentity(id)
}

/// Middleware that admits or rejects a request against the per-client window.
///
/// If admitted, inserts the `ClientIdentity` into request extensions for handlers to use.
/// Otherwise returns 429 with a `Retry-After` header.
pub async fn rate_limit(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let client = client_identity(&req);

    match state.rate_limiter.admit(&client.0) {
        Admission::Allow => {
            req.extensions_mut().insert(client);
            next.run(req).await
        }
        Admission::Deny { retry_after_secs } => {
            warn!(client = %client.0, retry_after_secs, "rate limit exceeded");
            rate_limited(retry_after_secs)
        }
    }
}
