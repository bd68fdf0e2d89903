//! Fuzz target for the request guard.
//!
//! Any byte string that parses as JSON must produce an outcome without
//! panicking, and accepted payloads must keep their shape.

#![no_main]

use std::sync::Arc;

use libfuzzer_sys::fuzz_target;
use safeplate::allergens::AllergenProfile;
use safeplate::guard::{CallerIdentity, GuardOutcome, RequestGuard};
use safeplate::ratelimit::{RateLimitPolicy, RateLimiter};
use serde_json::Value;

fuzz_target!(|data: &[u8]| {
    let Ok(payload) = serde_json::from_slice::<Value>(data) else {
        return;
    };
    let guard = RequestGuard::new(Arc::new(RateLimiter::in_memory()));
    let Ok(policy) = RateLimitPolicy::new(10, 60) else {
        return;
    };
    let caller = CallerIdentity::new("fuzz")
        .with_allergens(AllergenProfile::from_ids(&["milk", "peanuts"]));

    if let GuardOutcome::Accepted { sanitized_payload, .. } = guard.guard(&payload, &caller, &policy) {
        if let (Value::Object(raw), Value::Object(clean)) = (&payload, &sanitized_payload) {
            assert_eq!(raw.len(), clean.len(), "sanitization changed key set");
        }
    }
});
