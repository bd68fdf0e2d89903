//! Guard results.

use std::fmt;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use super::payload::FieldError;
use crate::allergens::AllergenMatch;

/// Why a request was turned away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "errors", rename_all = "snake_case")]
pub enum RejectReason {
    RateLimited,
    ValidationFailed(Vec<FieldError>),
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RateLimited => "rate_limited",
            Self::ValidationFailed(_) => "validation_failed",
        }
    }

    /// HTTP status a route should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::RateLimited => 429,
            Self::ValidationFailed(_) => 422,
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimited => write!(f, "rate limited"),
            Self::ValidationFailed(errors) => {
                write!(f, "validation failed")?;
                for (i, e) in errors.iter().enumerate() {
                    let sep = if i == 0 { ": " } else { "; " };
                    write!(f, "{}{} {}", sep, e.field, e.message)?;
                }
                Ok(())
            }
        }
    }
}

/// A rejected request. Propagates with `?` like any other error.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("request rejected: {reason}")]
pub struct Rejection {
    pub reason: RejectReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

impl Rejection {
    pub fn rate_limited(retry_after_secs: u64) -> Self {
        Self {
            reason: RejectReason::RateLimited,
            retry_after_secs: Some(retry_after_secs),
        }
    }

    pub fn validation_failed(errors: Vec<FieldError>) -> Self {
        Self {
            reason: RejectReason::ValidationFailed(errors),
            retry_after_secs: None,
        }
    }

    /// Value for an HTTP `Retry-After` header, when the caller may retry.
    pub fn retry_after_header(&self) -> Option<String> {
        self.retry_after_secs.map(|secs| secs.to_string())
    }
}

/// Result of running one request through the guard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum GuardOutcome {
    Accepted {
        sanitized_payload: Value,
        #[serde(skip_serializing_if = "Option::is_none")]
        allergen_matches: Option<Vec<AllergenMatch>>,
        /// Dotted paths of raw fields that matched a suspicious pattern.
        suspicious_fields: Vec<String>,
    },
    Rejected(Rejection),
}

impl GuardOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Rejected(r) => Some(r),
            Self::Accepted { .. } => None,
        }
    }

    /// `accepted`, `rate_limited` or `validation_failed`.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Accepted { .. } => "accepted",
            Self::Rejected(r) => r.reason.as_str(),
        }
    }

    /// 200 when accepted, otherwise the rejection's status.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Accepted { .. } => 200,
            Self::Rejected(r) => r.reason.status_code(),
        }
    }

    /// Convert to a `Result` so routes can bail with `?`.
    pub fn into_result(self) -> Result<Value, Rejection> {
        match self {
            Self::Accepted {
                sanitized_payload, ..
            } => Ok(sanitized_payload),
            Self::Rejected(r) => Err(r),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_retry_after_header() {
        assert_eq!(Rejection::rate_limited(42).retry_after_header().as_deref(), Some("42"));
        assert!(Rejection::validation_failed(vec![]).retry_after_header().is_none());
    }

    #[test]
    fn test_display_lists_fields() {
        let rejection = Rejection::validation_failed(vec![
            FieldError {
                field: "name".into(),
                message: "must not be blank".into(),
            },
            FieldError {
                field: "tags[0]".into(),
                message: "must be a string".into(),
            },
        ]);
        assert_eq!(
            rejection.to_string(),
            "request rejected: validation failed: name must not be blank; tags[0] must be a string"
        );
        assert_eq!(Rejection::rate_limited(1).to_string(), "request rejected: rate limited");
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = GuardOutcome::Rejected(Rejection::rate_limited(5));
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "rejected");
        assert_eq!(json["reason"]["kind"], "rate_limited");
        assert_eq!(json["retry_after_secs"], 5);

        let accepted = GuardOutcome::Accepted {
            sanitized_payload: json!({"name": "x"}),
            allergen_matches: None,
            suspicious_fields: vec![],
        };
        let json = serde_json::to_value(&accepted).unwrap();
        assert_eq!(json["outcome"], "accepted");
        assert!(json.get("allergen_matches").is_none());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(GuardOutcome::Rejected(Rejection::rate_limited(3)).status_code(), 429);
        assert_eq!(
            GuardOutcome::Rejected(Rejection::validation_failed(vec![])).status_code(),
            422
        );
        let accepted = GuardOutcome::Accepted {
            sanitized_payload: json!({}),
            allergen_matches: None,
            suspicious_fields: vec![],
        };
        assert_eq!(accepted.status_code(), 200);
    }

    #[test]
    fn test_into_result() {
        let rejected = GuardOutcome::Rejected(Rejection::rate_limited(3));
        assert_eq!(rejected.label(), "rate_limited");
        assert!(rejected.into_result().is_err());
    }
}
