//! Cached health probing of the generation service.

use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::{HealthCheckKind, HealthReport, HealthStatus};
use crate::ports::GenerationService;

pub const HEALTH_CACHE_TTL: Duration = Duration::from_secs(60);

/// Selected once at startup; requests cannot change it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthCheckMode {
    /// Verify the client is constructible. Free.
    Lightweight,
    /// Send a real generation request. Consumes quota.
    Full,
}

impl HealthCheckMode {
    pub fn from_flag(full: bool) -> Self {
        if full {
            HealthCheckMode::Full
        } else {
            HealthCheckMode::Lightweight
        }
    }
}

struct CachedReport {
    checked_at: Instant,
    report: HealthReport,
}

/// Reuses the last probe result for `ttl`.
///
/// The lock is held across the probe, so concurrent callers arriving after
/// expiry wait for one probe instead of issuing their own.
pub struct HealthCache {
    mode: HealthCheckMode,
    ttl: Duration,
    cached: Mutex<Option<CachedReport>>,
}

impl HealthCache {
    pub fn new(mode: HealthCheckMode, ttl: Duration) -> Self {
        Self {
            mode,
            ttl,
            cached: Mutex::new(None),
        }
    }

    pub fn mode(&self) -> HealthCheckMode {
        self.mode
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn check(&self, generation: &dyn GenerationService) -> HealthReport {
        self.check_at(generation, Instant::now()).await
    }

    pub async fn check_at(&self, generation: &dyn GenerationService, now: Instant) -> HealthReport {
        let mut cached = self.cached.lock().await;

        if let Some(entry) = cached.as_ref() {
            if now.saturating_duration_since(entry.checked_at) < self.ttl {
                debug!("using cached generation health status");
                return entry.report.clone();
            }
        }

        let report = self.probe(generation).await;
        *cached = Some(CachedReport {
            checked_at: now,
            report: report.clone(),
        });
        report
    }

    async fn probe(&self, generation: &dyn GenerationService) -> HealthReport {
        let (check_kind, outcome) = match self.mode {
            HealthCheckMode::Lightweight => {
                (HealthCheckKind::ModelInit, generation.verify_client().await)
            }
            HealthCheckMode::Full => (HealthCheckKind::FullGeneration, generation.ping().await),
        };

        match outcome {
            Ok(()) => HealthReport {
                status: HealthStatus::Operational,
                error: None,
                check_kind,
            },
            Err(err) => {
                warn!(check = check_kind.as_str(), error = %err, "generation health check failed");
                HealthReport {
                    status: HealthStatus::Error,
                    error: Some(err.to_string()),
                    check_kind,
                }
            }
        }
    }
}
