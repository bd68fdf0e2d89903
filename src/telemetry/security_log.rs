//! Security event logging for the trust & safety pipeline.
//!
//! Every event goes out as one tracing record under the `safeplate::security`
//! target with `event`, `severity` and flattened `key=value` details. Caller
//! identifiers are hashed with [`redact_identifier`] before they reach a log.

use sha2::{Digest, Sha256};

/// Security-relevant pipeline events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityEvent {
    /// A caller exceeded its window for an endpoint.
    RateLimited,
    /// Raw input matched a suspicious pattern.
    SuspiciousInput,
    /// Payload failed schema validation.
    InputValidationFailure,
    /// An ingredient matched one of the caller's declared allergens.
    AllergenFlagged,
    /// A profile named an allergen id the taxonomy does not know.
    UnknownAllergen,
    /// The sweeper removed expired rate-limit entries.
    RateLimitSweep,
}

impl SecurityEvent {
    pub fn severity(&self) -> SecuritySeverity {
        match self {
            Self::RateLimited => SecuritySeverity::Warning,
            Self::SuspiciousInput => SecuritySeverity::Warning,
            Self::InputValidationFailure => SecuritySeverity::Info,
            Self::AllergenFlagged => SecuritySeverity::Info,
            Self::UnknownAllergen => SecuritySeverity::Debug,
            Self::RateLimitSweep => SecuritySeverity::Debug,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RateLimited => "rate_limited",
            Self::SuspiciousInput => "suspicious_input",
            Self::InputValidationFailure => "input_validation_failure",
            Self::AllergenFlagged => "allergen_flagged",
            Self::UnknownAllergen => "unknown_allergen",
            Self::RateLimitSweep => "rate_limit_sweep",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SecuritySeverity {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl SecuritySeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }
}

/// Stable, non-reversible tag for a caller identifier.
///
/// `"id_"` followed by the first 12 hex chars of its SHA-256.
pub fn redact_identifier(identifier: &str) -> String {
    let digest = Sha256::digest(identifier.as_bytes());
    let hex = hex::encode(digest);
    format!("id_{}", &hex[..12])
}

/// Log a security event with structured details.
///
/// ```
/// use safeplate::telemetry::{log_security_event, SecurityEvent};
///
/// log_security_event(
///     SecurityEvent::RateLimited,
///     "window exhausted",
///     &[("endpoint", "ai-generation"), ("retry_after_secs", "42")],
/// );
/// ```
pub fn log_security_event(event: SecurityEvent, message: &str, details: &[(&str, &str)]) {
    let details = details
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(" ");
    let event_type = event.as_str();
    let severity = event.severity().as_str();

    match event.severity() {
        SecuritySeverity::Debug => {
            tracing::debug!(target: "safeplate::security", event = event_type, severity, details = %details, "{}", message)
        }
        SecuritySeverity::Info => {
            tracing::info!(target: "safeplate::security", event = event_type, severity, details = %details, "{}", message)
        }
        SecuritySeverity::Warning => {
            tracing::warn!(target: "safeplate::security", event = event_type, severity, details = %details, "{}", message)
        }
        SecuritySeverity::Error | SecuritySeverity::Critical => {
            tracing::error!(target: "safeplate::security", event = event_type, severity, details = %details, "{}", message)
        }
    }
}

/// Shorthand for [`log_security_event`].
#[macro_export]
macro_rules! security_log {
    ($event:expr, $message:expr) => {
        $crate::telemetry::security_log::log_security_event($event, $message, &[])
    };
    ($event:expr, $message:expr, $($key:expr => $value:expr),+) => {
        $crate::telemetry::security_log::log_security_event(
            $event,
            $message,
            &[$(($key, $value)),+]
        )
    };
}
