//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use lexibot_core::{
    health::HEALTH_CACHE_TTL, ChatService, ConversationStore, GenerationConfig, GenerationService,
    HealthCache, HealthCheckMode, RateLimiter,
};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
///
/// The stores live here rather than in globals so that each server (and each
/// test) owns an isolated set.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub generation: Arc<dyn GenerationService>,
    pub chat: Arc<ChatService>,
    pub conversations: Arc<ConversationStore>,
    pub rate_limiter: Arc<RateLimiter>,
    pub health: Arc<HealthCache>,
}

impl AppState {
    /// Wires the default stores around the given generation port.
    pub fn new(config: Arc<Config>, generation: Arc<dyn GenerationService>) -> Self {
        Self::with_stores(
            config,
            generation,
            Arc::new(ConversationStore::default()),
            Arc::new(RateLimiter::default()),
        )
    }

    pub fn with_stores(
        config: Arc<Config>,
        generation: Arc<dyn GenerationService>,
        conversations: Arc<ConversationStore>,
        rate_limiter: Arc<RateLimiter>,
    ) -> Self {
        let chat = Arc::new(ChatService::new(
            generation.clone(),
            conversations.clone(),
            GenerationConfig::default(),
        ));
        let health = Arc::new(HealthCache::new(
            HealthCheckMode::from_flag(config.full_health_check),
            HEALTH_CACHE_TTL,
        ));

        Self {
            config,
            generation,
            chat,
            conversations,
            rate_limiter,
            health,
        }
    }
}
