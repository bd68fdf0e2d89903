//! Span helpers for guarded requests.

use tracing::{info_span, Span};
use uuid::Uuid;

/// Extension trait for filling in span fields after the fact.
pub trait SpanExt {
    /// Record the guard outcome, its HTTP-style status and the rejection
    /// reason, if any.
    fn record_outcome(&self, outcome: &str, status: u16, reason: Option<&str>);
}

impl SpanExt for Span {
    fn record_outcome(&self, outcome: &str, status: u16, reason: Option<&str>) {
        self.record("outcome", outcome);
        self.record("status", status);
        if let Some(reason) = reason {
            self.record("reason", reason);
        }
    }
}

/// Factory for per-request guard spans.
pub struct GuardSpan;

impl GuardSpan {
    /// Fresh random request id.
    pub fn request_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Span for one guarded request.
    ///
    /// `caller` must already be redacted. `outcome`, `reason`, `status` and
    /// `latency_us` start empty.
    pub fn new(request_id: &str, endpoint: &str, caller: &str) -> Span {
        info_span!(
            "guard_request",
            request_id = %request_id,
            endpoint = %endpoint,
            caller = %caller,
            outcome = tracing::field::Empty,
            reason = tracing::field::Empty,
            status = tracing::field::Empty,
            latency_us = tracing::field::Empty,
        )
    }
}
