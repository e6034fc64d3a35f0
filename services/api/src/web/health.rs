//! services/api/src/web/health.rs
//!
//! The `GET /health` handler.

use axum::{extract::State, http::StatusCode, response::Json};
use chrono::Utc;
use lexibot_core::{HealthCheckMode, HealthStatus};
use std::sync::Arc;

use crate::web::{
    protocol::{HealthConfigBody, HealthResponseBody},
    state::AppState,
};

/// Report server and generation-model health.
///
/// The model probe result is cached; see `healthConfig.cacheTTL`.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Healthy", body = HealthResponseBody),
        (status = 503, description = "Generation model degraded", body = HealthResponseBody)
    )
)]
pub async fn health_handler(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<HealthResponseBody>) {
    let report = state.health.check(state.generation.as_ref()).await;

    // An unknown model status is not treated as degraded.
    let status = match report.status {
        HealthStatus::Error => "degraded",
        HealthStatus::Operational | HealthStatus::Unknown => "healthy",
    };
    let code = if status == "healthy" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let body = HealthResponseBody {
        status: status.to_string(),
        timestamp: Utc::now(),
        server: "operational".to_string(),
        gemini_ai: report.status.as_str().to_string(),
        gemini_check_type: report.check_kind.as_str().to_string(),
        gemini_error: report.error,
        health_config: HealthConfigBody {
            gemini_full_check: state.health.mode() == HealthCheckMode::Full,
            cache_ttl: format!("{}s", state.health.ttl().as_secs()),
        },
    };

    (code, Json(body))
}
