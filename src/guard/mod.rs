//! Request Guard
//!
//! Single entry point a mutating route calls before it persists anything or
//! calls a downstream model. Steps run in a fixed order:
//!
//! 1. rate limit (before any parsing, so over-quota callers cost nothing)
//! 2. payload shape validation
//! 3. suspicious-pattern scan of raw string fields (logged, never blocks)
//! 4. sanitization of every string field
//! 5. allergen matching, for ingredient-bearing payloads only
//!
//! A rejected request never reaches step 4, so a payload is either fully
//! sanitized or not returned at all.

pub mod identity;
pub mod outcome;
pub mod payload;

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;

use crate::allergens::{AllergenMatch, AllergenMatcher};
use crate::ratelimit::{RateLimitPolicy, RateLimiter};
use crate::security::{MarkupSanitizer, SuspiciousPatternScanner};
use crate::security_log;
use crate::telemetry::{self, GuardSpan, SecurityEvent, SpanExt};

pub use identity::CallerIdentity;
pub use outcome::{GuardOutcome, RejectReason, Rejection};
pub use payload::FieldError;

/// Orchestrates limiter, scanner, sanitizer and matcher for one request.
pub struct RequestGuard {
    limiter: Arc<RateLimiter>,
    sanitizer: MarkupSanitizer,
    scanner: SuspiciousPatternScanner,
    matcher: AllergenMatcher,
}

impl RequestGuard {
    pub fn new(limiter: Arc<RateLimiter>) -> Self {
        Self {
            limiter,
            sanitizer: MarkupSanitizer::new(),
            scanner: SuspiciousPatternScanner::new(),
            matcher: AllergenMatcher::default(),
        }
    }

    /// Replace the allergen matcher, e.g. one over an extended taxonomy.
    pub fn with_matcher(mut self, matcher: AllergenMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn sanitizer(&self) -> &MarkupSanitizer {
        &self.sanitizer
    }

    pub fn matcher(&self) -> &AllergenMatcher {
        &self.matcher
    }

    /// Run `payload` from `caller` through the pipeline under `policy`.
    pub fn guard(
        &self,
        payload: &Value,
        caller: &CallerIdentity,
        policy: &RateLimitPolicy,
    ) -> GuardOutcome {
        let endpoint = policy.endpoint_label();
        let caller_tag = telemetry::redact_identifier(&caller.identifier);
        let span = GuardSpan::new(&GuardSpan::request_id(), endpoint, &caller_tag);
        let _entered = span.enter();
        let started = Instant::now();

        let outcome = self.run(payload, caller, policy, &caller_tag);

        let reason = outcome.rejection().map(|r| r.reason.as_str());
        let status = outcome.status_code();
        let latency_us = started.elapsed().as_micros() as u64;
        let verdict = if outcome.is_accepted() { "accepted" } else { "rejected" };
        span.record_outcome(verdict, status, reason);
        span.record("latency_us", latency_us);
        tracing::debug!(outcome = outcome.label(), status, latency_us, "guard request finished");
        telemetry::record_guard_outcome(endpoint, outcome.label());
        outcome
    }

    fn run(
        &self,
        payload: &Value,
        caller: &CallerIdentity,
        policy: &RateLimitPolicy,
        caller_tag: &str,
    ) -> GuardOutcome {
        let endpoint = policy.endpoint_label();

        let decision = self.limiter.check(&caller.identifier, policy);
        if !decision.allowed {
            let retry_after = decision.retry_after_secs.unwrap_or(policy.window_secs());
            let retry_str = retry_after.to_string();
            security_log!(
                SecurityEvent::RateLimited,
                "request rejected by rate limiter",
                "caller" => caller_tag,
                "endpoint" => endpoint,
                "retry_after_secs" => retry_str.as_str()
            );
            telemetry::record_rate_limited(endpoint);
            return GuardOutcome::Rejected(Rejection::rate_limited(retry_after));
        }

        let errors = payload::validate(payload);
        if !errors.is_empty() {
            let fields = errors
                .iter()
                .map(|e| e.field.as_str())
                .collect::<Vec<_>>()
                .join(",");
            security_log!(
                SecurityEvent::InputValidationFailure,
                "payload failed shape validation",
                "caller" => caller_tag,
                "endpoint" => endpoint,
                "fields" => fields.as_str()
            );
            return GuardOutcome::Rejected(Rejection::validation_failed(errors));
        }

        let suspicious_fields = self.scan_raw(payload, caller_tag, endpoint);
        let sanitized_payload = self.sanitizer.sanitize_value(payload);
        let allergen_matches = self.match_allergens(&sanitized_payload, caller, caller_tag);

        GuardOutcome::Accepted {
            sanitized_payload,
            allergen_matches,
            suspicious_fields,
        }
    }

    /// Dotted paths of raw string fields that look like injection attempts.
    fn scan_raw(&self, payload: &Value, caller_tag: &str, endpoint: &str) -> Vec<String> {
        let mut flagged = Vec::new();
        for (path, text) in payload::string_leaves(payload) {
            let patterns = self.scanner.scan(text);
            if patterns.is_empty() {
                continue;
            }
            for pattern in &patterns {
                telemetry::record_suspicious_input(*pattern);
            }
            let kinds = patterns
                .iter()
                .map(|p| p.as_str())
                .collect::<Vec<_>>()
                .join(",");
            security_log!(
                SecurityEvent::SuspiciousInput,
                "suspicious pattern in raw input",
                "caller" => caller_tag,
                "endpoint" => endpoint,
                "field" => path.as_str(),
                "patterns" => kinds.as_str()
            );
            flagged.push(path);
        }
        flagged
    }

    fn match_allergens(
        &self,
        sanitized: &Value,
        caller: &CallerIdentity,
        caller_tag: &str,
    ) -> Option<Vec<AllergenMatch>> {
        if caller.allergen_profile.is_empty() {
            return None;
        }
        let ingredients = payload::extract_ingredients(sanitized)?;
        let matches = self.matcher.detect_all(&ingredients, &caller.allergen_profile);
        for m in &matches {
            telemetry::record_allergen_match(&m.allergen_id);
            security_log!(
                SecurityEvent::AllergenFlagged,
                "ingredient matches declared allergen",
                "caller" => caller_tag,
                "allergen" => m.allergen_id.as_str(),
                "keyword" => m.matched_keyword.as_str()
            );
        }
        Some(matches)
    }
}
