//! Process-local fixed-window rate limiter keyed by client identifier.
//!
//! Records live only in memory: they are lost on restart and are not shared
//! between server instances. Good enough for a low-traffic site; not a
//! substitute for a limiter at the edge.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Longest window (and sweep period) the limiter honors. Larger values are
/// clamped so deadlines stay representable as an `Instant`.
pub const MAX_WINDOW: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Per-identifier request counter for the current window.
#[derive(Debug, Clone)]
pub struct RateLimitRecord {
    pub count: u32,
    pub window_reset_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub remaining: u32,
    /// Time until the current window closes.
    pub retry_after: Duration,
}

#[derive(Clone, Default)]
pub struct RateLimiter {
    records: Arc<DashMap<String, RateLimitRecord>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check_and_consume(&self, identifier: &str, limit: u32, window: Duration) -> RateDecision {
        self.check_and_consume_at(identifier, limit, window, Instant::now())
    }

    pub fn check_and_consume_at(
        &self,
        identifier: &str,
        limit: u32,
        window: Duration,
        now: Instant,
    ) -> RateDecision {
        let window = window.min(MAX_WINDOW);
        if limit == 0 {
            return RateDecision {
                allowed: false,
                remaining: 0,
                retry_after: window,
            };
        }

        // The entry guard holds the shard lock for the whole read-modify-write.
        let mut entry = self
            .records
            .entry(identifier.to_string())
            .or_insert_with(|| RateLimitRecord {
                count: 0,
                window_reset_at: now,
            });
        let record = entry.value_mut();

        if record.count == 0 || now > record.window_reset_at {
            record.count = 1;
            record.window_reset_at = now + window;
            return RateDecision {
                allowed: true,
                remaining: limit - 1,
                retry_after: window,
            };
        }

        let retry_after = record.window_reset_at.saturating_duration_since(now);
        if record.count >= limit {
            return RateDecision {
                allowed: false,
                remaining: 0,
                retry_after,
            };
        }

        record.count += 1;
        RateDecision {
            allowed: true,
            remaining: limit - record.count,
            retry_after,
        }
    }

    pub fn sweep_expired(&self) -> usize {
        self.sweep_expired_at(Instant::now())
    }

    /// Drops every record whose window closed before `now`.
    pub fn sweep_expired_at(&self, now: Instant) -> usize {
        let before = self.records.len();
        self.records.retain(|_, record| now <= record.window_reset_at);
        before.saturating_sub(self.records.len())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Starts the periodic sweep. The task runs until the handle is stopped or dropped.
    pub fn spawn_sweeper(&self, period: Duration) -> SweeperHandle {
        let limiter = self.clone();
        let period = period.min(MAX_WINDOW);
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                let removed = limiter.sweep_expired();
                if removed > 0 {
                    tracing::debug!("swept {removed} expired rate limit record(s)");
                }
            }
        });
        SweeperHandle { task }
    }
}

pub struct SweeperHandle {
    task: JoinHandle<()>,
}

impl SweeperHandle {
    pub fn stop(self) {
        self.task.abort();
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
