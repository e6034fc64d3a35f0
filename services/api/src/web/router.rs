//! services/api/src/web/router.rs
//!
//! Axum router configuration with middleware.
//! Middleware: rate limiting on `POST /chat`, CORS, body limit, tracing, panic capture.

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::web::{
    chat::chat_handler, errors::panic_response, fallback::not_found, health::health_handler,
    middleware::rate_limit, rest::ApiDoc, state::AppState,
};

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Build the complete router with all routes and middleware.
pub fn build_router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(app_state.config.cors_origin.clone())
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // Only chat submissions count against the rate limit.
    let chat_routes = Router::new()
        .route("/chat", post(chat_handler).fallback(not_found))
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            rate_limit,
        ));

    let api_router = Router::new()
        .merge(chat_routes)
        .route("/health", get(health_handler).fallback(not_found))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(app_state);

    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(panic_response))
}
