//! services/api/src/background.rs
//!
//! Periodic eviction of idle conversations and expired rate-limit entries.

use chrono::Utc;
use lexibot_core::{ConversationStore, RateLimiter};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Spawns the sweep loop. It runs until `shutdown` is cancelled.
pub fn spawn_sweeper(
    conversations: Arc<ConversationStore>,
    rate_limiter: Arc<RateLimiter>,
    period: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // The first tick completes immediately; nothing can be stale yet.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("sweeper stopping");
                    break;
                }
                _ = ticker.tick() => {
                    let conversations_removed = conversations.sweep(Utc::now());
                    let clients_removed = rate_limiter.sweep(Instant::now());
                    if conversations_removed > 0 || clients_removed > 0 {
                        info!(
                            conversations_removed,
                            clients_removed,
                            conversations_remaining = conversations.len(),
                            "swept idle state"
                        );
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn evicts_on_tick_and_stops_on_cancel() {
        let conversations = Arc::new(ConversationStore::new(Duration::from_millis(10), 40));
        let rate_limiter = Arc::new(RateLimiter::new(Duration::from_millis(10), 30));
        conversations.upsert("idle", None);
        rate_limiter.admit("10.0.0.1");

        let shutdown = CancellationToken::new();
        let handle = spawn_sweeper(
            conversations.clone(),
            rate_limiter.clone(),
            Duration::from_millis(25),
            shutdown.clone(),
        );

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(conversations.is_empty());
        assert_eq!(rate_limiter.tracked_clients(), 0);

        shutdown.cancel();
        handle.await.unwrap();
    }
}
