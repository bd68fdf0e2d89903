//! TDD-Light tests for the fixed-window rate limiter.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use safeplate::ratelimit::{
    EndpointPolicies, InMemoryStore, MockClock, PolicyError, RateLimitEntry, RateLimitPolicy,
    RateLimitStore, RateLimitSweeper, RateLimiter, MAX_WINDOW_SECS,
};

fn mock_limiter() -> (Arc<RateLimiter>, MockClock) {
    let clock = MockClock::starting_now();
    let limiter = RateLimiter::new(Arc::new(InMemoryStore::new()), Arc::new(clock.clone()));
    (Arc::new(limiter), clock)
}

// ===== Window semantics =====

#[test]
fn three_per_minute_rejects_the_fourth() {
    let (limiter, _clock) = mock_limiter();
    let policy = RateLimitPolicy::new(3, 60).unwrap();

    let allowed: Vec<bool> = (0..4)
        .map(|_| limiter.check("1.2.3.4", &policy).allowed)
        .collect();
    assert_eq!(allowed, vec![true, true, true, false]);

    let denied = limiter.check("1.2.3.4", &policy);
    let retry = denied.retry_after_secs.unwrap();
    assert!(retry > 0 && retry <= 60);
}

#[test]
fn elapsed_window_starts_fresh() {
    let (limiter, clock) = mock_limiter();
    let policy = RateLimitPolicy::new(3, 60).unwrap();
    for _ in 0..3 {
        limiter.check("u", &policy);
    }
    assert!(!limiter.check("u", &policy).allowed);

    clock.advance(Duration::from_secs(61));
    let fresh = limiter.check("u", &policy);
    assert!(fresh.allowed);
    assert_eq!(fresh.remaining, policy.max_requests() - 1);
}

#[test]
fn retry_hint_shrinks_as_time_passes() {
    let (limiter, clock) = mock_limiter();
    let policy = RateLimitPolicy::new(1, 60).unwrap();
    limiter.check("u", &policy);

    let early = limiter.check("u", &policy).retry_after_secs.unwrap();
    clock.advance(Duration::from_secs(30));
    let later = limiter.check("u", &policy).retry_after_secs.unwrap();
    assert_eq!(early, 60);
    assert_eq!(later, 30);
}

#[test]
fn identifiers_do_not_share_windows() {
    let (limiter, _clock) = mock_limiter();
    let policy = RateLimitPolicy::new(1, 60).unwrap();
    assert!(limiter.check("alice", &policy).allowed);
    assert!(limiter.check("bob", &policy).allowed);
    assert!(!limiter.check("alice", &policy).allowed);
}

// ===== Window bounds =====

#[test]
fn oversized_windows_are_rejected_up_front() {
    for window in [MAX_WINDOW_SECS + 1, 10_000_000_000_000, u64::MAX] {
        assert_eq!(
            RateLimitPolicy::new(1, window),
            Err(PolicyError::WindowTooLarge(window))
        );
    }
}

#[test]
fn longest_window_still_limits() {
    let (limiter, clock) = mock_limiter();
    let policy = RateLimitPolicy::new(1, MAX_WINDOW_SECS).unwrap();

    let allowed: Vec<bool> = (0..3).map(|_| limiter.check("u", &policy).allowed).collect();
    assert_eq!(allowed, vec![true, false, false]);
    let retry = limiter.check("u", &policy).retry_after_secs.unwrap();
    assert_eq!(retry, MAX_WINDOW_SECS);

    clock.advance(Duration::from_secs(MAX_WINDOW_SECS));
    assert!(limiter.check("u", &policy).allowed);
}

#[test]
fn capped_preset_windows_do_not_overflow() {
    let (limiter, _clock) = mock_limiter();
    let policies = EndpointPolicies::from_limits((1, u64::MAX), (1, 1), (1, 1), (1, 1));

    let allowed: Vec<bool> = (0..3)
        .map(|_| limiter.check("u", &policies.ai_generation).allowed)
        .collect();
    assert_eq!(allowed, vec![true, false, false]);
    assert_eq!(limiter.peek("u", &policies.ai_generation).remaining, 0);
}

// ===== Concurrency =====

#[test]
fn concurrent_checks_admit_exactly_max() {
    const MAX: u32 = 20;
    const THREADS: usize = 64;

    let limiter = Arc::new(RateLimiter::in_memory());
    let policy = RateLimitPolicy::new(MAX, 60).unwrap();
    let admitted = AtomicUsize::new(0);
    let barrier = Barrier::new(THREADS);

    thread::scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| {
                barrier.wait();
                if limiter.check("shared-caller", &policy).allowed {
                    admitted.fetch_add(1, Ordering::SeqCst);
                }
            });
        }
    });

    assert_eq!(admitted.load(Ordering::SeqCst), MAX as usize);
    assert_eq!(limiter.peek("shared-caller", &policy).remaining, 0);
}

#[test]
fn concurrent_distinct_callers_each_get_their_quota() {
    let limiter = Arc::new(RateLimiter::in_memory());
    let policy = RateLimitPolicy::new(5, 60).unwrap();
    let admitted = AtomicUsize::new(0);

    thread::scope(|s| {
        for caller in 0..8 {
            let limiter = &limiter;
            let policy = &policy;
            let admitted = &admitted;
            s.spawn(move || {
                let id = format!("caller-{}", caller);
                for _ in 0..10 {
                    if limiter.check(&id, policy).allowed {
                        admitted.fetch_add(1, Ordering::SeqCst);
                    }
                }
            });
        }
    });

    assert_eq!(admitted.load(Ordering::SeqCst), 8 * 5);
    assert_eq!(limiter.tracked_keys(), 8);
}

// ===== Injectable store =====

/// Store that counts update calls, backed by a plain map.
#[derive(Default)]
struct CountingStore {
    entries: Mutex<HashMap<String, RateLimitEntry>>,
    updates: AtomicUsize,
}

impl RateLimitStore for CountingStore {
    fn get(&self, key: &str) -> Option<RateLimitEntry> {
        self.entries.lock().get(key).copied()
    }

    fn set(&self, key: &str, entry: RateLimitEntry) {
        self.entries.lock().insert(key.to_string(), entry);
    }

    fn delete(&self, key: &str) -> bool {
        self.entries.lock().remove(key).is_some()
    }

    fn update(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<&RateLimitEntry>) -> Option<RateLimitEntry>,
    ) {
        self.updates.fetch_add(1, Ordering::SeqCst);
        let mut entries = self.entries.lock();
        if let Some(next) = apply(entries.get(key)) {
            entries.insert(key.to_string(), next);
        }
    }

    fn remove_expired(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, e| !e.is_expired(now));
        before - entries.len()
    }

    fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

#[test]
fn limiter_works_over_a_custom_store() {
    let store = Arc::new(CountingStore::default());
    let clock = MockClock::starting_now();
    let limiter = RateLimiter::new(store.clone(), Arc::new(clock.clone()));
    let policy = RateLimitPolicy::new(2, 10).unwrap().with_label("feedback");

    assert!(limiter.check("u", &policy).allowed);
    assert!(limiter.check("u", &policy).allowed);
    assert!(!limiter.check("u", &policy).allowed);
    assert_eq!(store.updates.load(Ordering::SeqCst), 3);
    assert_eq!(store.get("u:feedback").unwrap().count, 2);

    clock.advance(Duration::from_secs(10));
    assert_eq!(limiter.sweep_expired(), 1);
    assert!(store.is_empty());
}

// ===== Sweeper =====

#[tokio::test]
async fn sweeper_reaps_expired_keys_until_stopped() {
    let (limiter, clock) = mock_limiter();
    let policy = RateLimitPolicy::new(3, 5).unwrap();
    for i in 0..10 {
        limiter.check(&format!("10.0.0.{}", i), &policy);
    }
    assert_eq!(limiter.tracked_keys(), 10);

    let sweeper = RateLimitSweeper::start(limiter.clone(), Duration::from_millis(10));
    clock.advance(Duration::from_secs(5));

    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while limiter.tracked_keys() > 0 && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(limiter.tracked_keys(), 0);

    sweeper.stop().await;
    limiter.check("late", &policy);
    clock.advance(Duration::from_secs(60));
    tokio::time::sleep(Duration::from_millis(40)).await;
    assert_eq!(limiter.tracked_keys(), 1, "stopped sweeper must not run");
}
