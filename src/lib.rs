//! SafePlate Trust & Safety Pipeline
//!
//! Request-time filters every mutating write passes through before it is
//! persisted or handed to a downstream model:
//!
//! - **Rate limiting**: fixed-window counters per caller and endpoint
//! - **Sanitization**: all markup stripped from free-text fields
//! - **Suspicious-pattern scanning**: injection markers logged as security events
//! - **Allergen matching**: ingredient text flagged against a controlled vocabulary
//!
//! Routes, persistence and rendering live outside this crate. They call
//! [`Pipeline::guard`] with a raw payload and a caller identity and get back
//! either a rejection with a retry hint or a sanitized, annotated payload.

pub mod allergens;
pub mod cli;
pub mod config;
pub mod guard;
pub mod ratelimit;
pub mod security;
pub mod telemetry;

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use config::EnvConfig;
use guard::{CallerIdentity, GuardOutcome, RequestGuard};
use ratelimit::{EndpointClass, EndpointPolicies, RateLimitSweeper, RateLimiter};

/// Process-level wiring: one store, one limiter, one guard.
///
/// Construct once at startup and share behind an `Arc`.
pub struct Pipeline {
    limiter: Arc<RateLimiter>,
    guard: RequestGuard,
    policies: EndpointPolicies,
    sweep_interval: Duration,
}

impl Pipeline {
    pub fn new(config: EnvConfig) -> Self {
        Self::with_limiter(config, Arc::new(RateLimiter::in_memory()))
    }

    /// Use a caller-supplied limiter, e.g. one over a shared store or a mock clock.
    pub fn with_limiter(config: EnvConfig, limiter: Arc<RateLimiter>) -> Self {
        Self {
            guard: RequestGuard::new(limiter.clone()),
            limiter,
            policies: config.policies,
            sweep_interval: config.sweep_interval,
        }
    }

    /// Build from `SAFEPLATE_*` environment variables.
    pub fn from_env() -> Self {
        Self::new(config::load())
    }

    /// Guard a request for an endpoint class using its configured policy.
    pub fn guard(
        &self,
        payload: &Value,
        caller: &CallerIdentity,
        class: EndpointClass,
    ) -> GuardOutcome {
        self.guard.guard(payload, caller, self.policies.for_class(class))
    }

    /// Spawn the expired-entry sweeper. Requires a tokio runtime.
    pub fn start_sweeper(&self) -> RateLimitSweeper {
        RateLimitSweeper::start(self.limiter.clone(), self.sweep_interval)
    }

    pub fn request_guard(&self) -> &RequestGuard {
        &self.guard
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn policies(&self) -> &EndpointPolicies {
        &self.policies
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(EnvConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pipeline_uses_class_policy() {
        let config = EnvConfig {
            policies: EndpointPolicies::from_limits((1, 60), (2, 60), (2, 60), (2, 60)),
            ..EnvConfig::default()
        };
        let pipeline = Pipeline::new(config);
        let caller = CallerIdentity::new("u1");
        let payload = json!({"name": "Stew"});

        assert!(pipeline.guard(&payload, &caller, EndpointClass::AiGeneration).is_accepted());
        assert!(!pipeline.guard(&payload, &caller, EndpointClass::AiGeneration).is_accepted());
        assert!(pipeline.guard(&payload, &caller, EndpointClass::RecipeWrite).is_accepted());
        assert_eq!(pipeline.limiter().tracked_keys(), 2);
    }

    #[tokio::test]
    async fn test_sweeper_lifecycle() {
        let pipeline = Pipeline::default();
        let sweeper = pipeline.start_sweeper();
        assert!(sweeper.is_running());
        sweeper.stop().await;
    }
}
