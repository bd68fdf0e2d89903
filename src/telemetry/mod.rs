//! Structured logging, security events, spans and metrics for the pipeline.

mod logging;
mod metrics;
pub mod security_log;
mod spans;

pub use logging::{build_filter, init_logging, LogConfig, LogError, LogFormat};
pub use metrics::{
    init_metrics, record_allergen_match, record_guard_outcome, record_rate_limited,
    record_suspicious_input, record_sweep,
};
pub use security_log::{log_security_event, redact_identifier, SecurityEvent, SecuritySeverity};
pub use spans::{GuardSpan, SpanExt};
