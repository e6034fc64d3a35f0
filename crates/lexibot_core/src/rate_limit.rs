//! Fixed-window request admission, keyed by client identity.

use dashmap::DashMap;
use std::time::{Duration, Instant};

pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);
pub const RATE_LIMIT_REQUESTS: u32 = 30;

/// Bucket used when the caller's identity cannot be determined.
pub const UNKNOWN_CLIENT: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allow,
    Deny { retry_after_secs: u64 },
}

#[derive(Debug, Clone, Copy)]
struct RateLimitEntry {
    count: u32,
    window_start: Instant,
}

/// Counts requests per client inside a fixed window.
///
/// Each admission is a read-modify-write under the client's entry guard, so
/// concurrent requests from the same client never lose an increment.
pub struct RateLimiter {
    window: Duration,
    capacity: u32,
    entries: DashMap<String, RateLimitEntry>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RATE_LIMIT_WINDOW, RATE_LIMIT_REQUESTS)
    }
}

impl RateLimiter {
    pub fn new(window: Duration, capacity: u32) -> Self {
        Self {
            window,
            capacity,
            entries: DashMap::new(),
        }
    }

    pub fn admit(&self, client_id: &str) -> Admission {
        self.admit_at(client_id, Instant::now())
    }

    pub fn admit_at(&self, client_id: &str, now: Instant) -> Admission {
        let mut entry = self
            .entries
            .entry(client_id.to_string())
            .or_insert(RateLimitEntry {
                count: 0,
                window_start: now,
            });

        // Windows expire lazily, on the first request after they end.
        if now.saturating_duration_since(entry.window_start) > self.window {
            entry.count = 0;
            entry.window_start = now;
        }

        if entry.count >= self.capacity {
            let reset_at = entry.window_start + self.window;
            let remaining = reset_at.saturating_duration_since(now);
            let retry_after_secs = remaining.as_secs_f64().ceil() as u64;
            return Admission::Deny {
                retry_after_secs: retry_after_secs.clamp(1, self.window.as_secs().max(1)),
            };
        }

        entry.count += 1;
        Admission::Allow
    }

    /// Drops entries whose window ended before `now`. Returns how many were removed.
    pub fn sweep(&self, now: Instant) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let live = now.saturating_duration_since(entry.window_start) <= self.window;
            if !live {
                removed += 1;
            }
            live
        });
        removed
    }

    pub fn tracked_clients(&self) -> usize {
        self.entries.len()
    }
}
