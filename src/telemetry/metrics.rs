// Copyright 2024-2026 SafePlate Contributors
// SPDX-License-Identifier: Apache-2.0

//! Pipeline counters and gauges.
//!
//! Recording goes through the `metrics` facade. Without an installed
//! recorder every call is a no-op.

use metrics::{counter, describe_counter, describe_gauge, gauge};

use crate::security::SuspiciousPattern;

/// Register metric descriptions with the installed recorder.
pub fn init_metrics() {
    describe_counter!(
        "safeplate_guard_requests_total",
        "Guarded requests by endpoint and outcome"
    );
    describe_counter!(
        "safeplate_rate_limited_total",
        "Requests rejected by the rate limiter"
    );
    describe_counter!(
        "safeplate_suspicious_inputs_total",
        "Raw string fields matching a suspicious pattern"
    );
    describe_counter!(
        "safeplate_allergen_matches_total",
        "Ingredient matches against declared allergens"
    );
    describe_counter!(
        "safeplate_rate_limit_swept_total",
        "Expired rate-limit entries removed by the sweeper"
    );
    describe_gauge!(
        "safeplate_rate_limit_keys",
        "Rate-limit keys currently tracked"
    );
}

pub fn record_guard_outcome(endpoint: &str, outcome: &'static str) {
    counter!(
        "safeplate_guard_requests_total",
        "endpoint" => endpoint.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_rate_limited(endpoint: &str) {
    counter!("safeplate_rate_limited_total", "endpoint" => endpoint.to_string()).increment(1);
}

pub fn record_suspicious_input(pattern: SuspiciousPattern) {
    counter!("safeplate_suspicious_inputs_total", "pattern" => pattern.as_str()).increment(1);
}

pub fn record_allergen_match(allergen_id: &str) {
    counter!("safeplate_allergen_matches_total", "allergen" => allergen_id.to_string())
        .increment(1);
}

pub fn record_sweep(removed: usize, remaining: usize) {
    counter!("safeplate_rate_limit_swept_total").increment(removed as u64);
    gauge!("safeplate_rate_limit_keys").set(remaining as f64);
}
