//! Fixed-window request counter.
//!
//! Per key: Empty -> Active(count, reset_at) -> Expired -> Active again with
//! a fresh window on the next request. A fixed window admits up to
//! `2 * max_requests` across a boundary in exchange for O(1) state per key
//! and no per-key timers.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::clock::{Clock, SystemClock};
use super::policy::RateLimitPolicy;
use super::store::{InMemoryStore, RateLimitEntry, RateLimitStore};
use crate::telemetry::{self, SecurityEvent};

/// Outcome of a single `check`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub window_reset_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

/// Fixed-window limiter over an injectable store and clock.
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn RateLimitStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// In-process store with the system clock.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryStore::new()), Arc::new(SystemClock))
    }

    /// Count one request for `identifier` and decide whether to admit it.
    pub fn check(&self, identifier: &str, policy: &RateLimitPolicy) -> RateLimitDecision {
        let key = policy.key_for(identifier);
        let now = self.clock.now();
        let max = policy.max_requests();
        let window = policy.window();

        let mut decision = None;
        self.store.update(&key, &mut |current| match current {
            Some(entry) if !entry.is_expired(now) => {
                if entry.count >= max {
                    decision = Some(RateLimitDecision {
                        allowed: false,
                        remaining: 0,
                        window_reset_at: entry.window_reset_at,
                        retry_after_secs: Some(retry_after_secs(entry.window_reset_at, now)),
                    });
                    None
                } else {
                    let count = entry.count + 1;
                    decision = Some(RateLimitDecision {
                        allowed: true,
                        remaining: max - count,
                        window_reset_at: entry.window_reset_at,
                        retry_after_secs: None,
                    });
                    Some(RateLimitEntry {
                        count,
                        window_reset_at: entry.window_reset_at,
                    })
                }
            }
            // No entry yet, or the window elapsed: replace, never merge.
            _ => {
                let window_reset_at = now + window;
                decision = Some(RateLimitDecision {
                    allowed: true,
                    remaining: max - 1,
                    window_reset_at,
                    retry_after_secs: None,
                });
                Some(RateLimitEntry {
                    count: 1,
                    window_reset_at,
                })
            }
        });

        // `update` always runs the closure exactly once.
        let decision = decision.unwrap_or_else(|| RateLimitDecision {
            allowed: false,
            remaining: 0,
            window_reset_at: now + window,
            retry_after_secs: Some(policy.window_secs()),
        });

        if !decision.allowed {
            tracing::debug!(
                endpoint = policy.endpoint_label(),
                retry_after_secs = decision.retry_after_secs,
                "rate limit window exhausted"
            );
        }
        decision
    }

    /// Current status for `identifier` without counting a request.
    pub fn peek(&self, identifier: &str, policy: &RateLimitPolicy) -> RateLimitDecision {
        let now = self.clock.now();
        let max = policy.max_requests();
        match self.store.get(&policy.key_for(identifier)) {
            Some(entry) if !entry.is_expired(now) => {
                let exhausted = entry.count >= max;
                RateLimitDecision {
                    allowed: !exhausted,
                    remaining: max.saturating_sub(entry.count),
                    window_reset_at: entry.window_reset_at,
                    retry_after_secs: exhausted
                        .then(|| retry_after_secs(entry.window_reset_at, now)),
                }
            }
            _ => RateLimitDecision {
                allowed: true,
                remaining: max,
                window_reset_at: now + policy.window(),
                retry_after_secs: None,
            },
        }
    }

    /// Forget the window for `identifier`. Returns true if one existed.
    pub fn reset(&self, identifier: &str, policy: &RateLimitPolicy) -> bool {
        self.store.delete(&policy.key_for(identifier))
    }

    /// Remove entries whose window has passed. Returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let removed = self.store.remove_expired(self.clock.now());
        let remaining = self.store.len();
        telemetry::record_sweep(removed, remaining);
        if removed > 0 {
            crate::security_log!(
                SecurityEvent::RateLimitSweep,
                "swept expired rate-limit entries",
                "removed" => removed.to_string().as_str(),
                "remaining" => remaining.to_string().as_str()
            );
        }
        removed
    }

    /// Number of keys currently held by the store.
    pub fn tracked_keys(&self) -> usize {
        self.store.len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::in_memory()
    }
}

/// Whole seconds until `reset_at`, rounded up and never below one.
fn retry_after_secs(reset_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let millis = (reset_at - now).num_milliseconds().max(0) as u64;
    millis.div_ceil(1000).max(1)
}
