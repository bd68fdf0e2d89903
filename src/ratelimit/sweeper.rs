// Copyright 2024-2026 SafePlate Contributors
// SPDX-License-Identifier: Apache-2.0

//! Periodic removal of expired rate-limit entries.
//!
//! The sweeper is an owned handle: it starts with `start`, stops with
//! `stop`, and cancels its task when dropped. No task outlives the handle.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::limiter::RateLimiter;

/// Background task calling `RateLimiter::sweep_expired` on an interval.
pub struct RateLimitSweeper {
    shutdown: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl RateLimitSweeper {
    /// Spawn the sweep loop on the current tokio runtime.
    pub fn start(limiter: Arc<RateLimiter>, interval: Duration) -> Self {
        let shutdown = CancellationToken::new();
        let token = shutdown.clone();
        let period = interval.max(Duration::from_millis(1));
        let handle = tokio::spawn(async move {
            sweep_loop(&limiter, period, token).await;
        });
        Self {
            shutdown,
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Cancel the loop and wait for it to exit.
    pub async fn stop(mut self) {
        self.shutdown.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "rate-limit sweeper task ended abnormally");
            }
        }
    }
}

impl Drop for RateLimitSweeper {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn sweep_loop(limiter: &RateLimiter, period: Duration, shutdown: CancellationToken) {
    let mut ticker = tokio::time::interval(period);
    // The first tick completes immediately; skip it so a fresh store is not swept.
    ticker.tick().await;
    loop {
        tokio::select! {
            biased;
            () = shutdown.cancelled() => {
                tracing::debug!("rate-limit sweeper: shutdown signal received");
                break;
            }
            _ = ticker.tick() => {
                limiter.sweep_expired();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratelimit::clock::MockClock;
    use crate::ratelimit::policy::RateLimitPolicy;
    use crate::ratelimit::store::InMemoryStore;

    #[tokio::test]
    async fn test_sweeper_removes_expired_entries() {
        let clock = MockClock::starting_now();
        let limiter = Arc::new(RateLimiter::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(clock.clone()),
        ));
        let policy = RateLimitPolicy::new(5, 10).unwrap();
        limiter.check("a", &policy);
        limiter.check("b", &policy);
        assert_eq!(limiter.tracked_keys(), 2);

        clock.advance(Duration::from_secs(11));
        let sweeper = RateLimitSweeper::start(limiter.clone(), Duration::from_millis(10));

        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while limiter.tracked_keys() > 0 && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(limiter.tracked_keys(), 0);
        sweeper.stop().await;
    }

    #[tokio::test]
    async fn test_stop_ends_task() {
        let limiter = Arc::new(RateLimiter::in_memory());
        let sweeper = RateLimitSweeper::start(limiter, Duration::from_secs(60));
        assert!(sweeper.is_running());
        sweeper.stop().await;
    }

    #[tokio::test]
    async fn test_live_entries_survive_sweep() {
        let clock = MockClock::starting_now();
        let limiter = Arc::new(RateLimiter::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(clock.clone()),
        ));
        limiter.check("a", &RateLimitPolicy::new(5, 60).unwrap());

        let sweeper = RateLimitSweeper::start(limiter.clone(), Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(limiter.tracked_keys(), 1);
        sweeper.stop().await;
    }
}
