//! services/api/src/bin/api.rs

use api_lib::{
    adapters::GeminiChatAdapter,
    background::spawn_sweeper,
    config::Config,
    error::ApiError,
    web::{build_router, AppState},
};
use lexibot_core::{
    conversation::{CONVERSATION_TIMEOUT, SWEEP_INTERVAL},
    health::HEALTH_CACHE_TTL,
    rate_limit::{RATE_LIMIT_REQUESTS, RATE_LIMIT_WINDOW},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = match Config::from_env() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            // Logging is not set up yet, so report straight to stderr.
            eprintln!("Failed to load configuration: {e}");
            eprintln!(
                "Add GEMINI_API_KEY=your_api_key_here to your .env file \
                 (keys: https://aistudio.google.com/)"
            );
            return Err(e.into());
        }
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Initialize the Generation Adapter ---
    let generation = Arc::new(GeminiChatAdapter::from_credentials(
        &config.gemini_api_key,
        &config.gemini_api_base,
        config.gemini_model.clone(),
    ));
    info!(model = %config.gemini_model, "generation client initialized");

    // --- 3. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(config.clone(), generation));

    // --- 4. Start the Background Sweeper ---
    let shutdown = CancellationToken::new();
    let sweeper = spawn_sweeper(
        app_state.conversations.clone(),
        app_state.rate_limiter.clone(),
        SWEEP_INTERVAL,
        shutdown.clone(),
    );

    // --- 5. Create the Web Router ---
    let app = build_router(app_state);

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        requests = RATE_LIMIT_REQUESTS,
        window_secs = RATE_LIMIT_WINDOW.as_secs(),
        "rate limiting per client address"
    );
    info!(
        idle_minutes = CONVERSATION_TIMEOUT.as_secs() / 60,
        "idle conversations will be cleaned up"
    );
    info!(
        full_check = config.full_health_check,
        cache_ttl_secs = HEALTH_CACHE_TTL.as_secs(),
        "health check mode (set ENABLE_GEMINI_HEALTH=true for a quota-consuming generation test)"
    );
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
    .await?;

    // --- 7. Tear Down ---
    shutdown.cancel();
    sweeper
        .await
        .map_err(|e| ApiError::Internal(format!("sweeper task failed: {e}")))?;
    info!("Server stopped.");

    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM, and cancels `shutdown` so background work stops too.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received.");
    shutdown.cancel();
}
