//! Pipeline configuration loading from environment variables.
//!
//! All values come from `SAFEPLATE_*` environment variables with safe
//! defaults. Invalid values fall back to defaults without crashing; request
//! counts and windows are floored at 1 and windows capped at one week.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `SAFEPLATE_AI_MAX_REQUESTS` | 10 | AI-generation requests per window |
//! | `SAFEPLATE_AI_WINDOW_SECS` | 60 | AI-generation window (secs) |
//! | `SAFEPLATE_WRITE_MAX_REQUESTS` | 30 | Recipe writes per window |
//! | `SAFEPLATE_WRITE_WINDOW_SECS` | 60 | Recipe-write window (secs) |
//! | `SAFEPLATE_FEEDBACK_MAX_REQUESTS` | 20 | Feedback submissions per window |
//! | `SAFEPLATE_FEEDBACK_WINDOW_SECS` | 60 | Feedback window (secs) |
//! | `SAFEPLATE_DEFAULT_MAX_REQUESTS` | 100 | Other requests per window |
//! | `SAFEPLATE_DEFAULT_WINDOW_SECS` | 60 | Default window (secs) |
//! | `SAFEPLATE_SWEEP_INTERVAL_SECS` | 60 | Expired-entry sweep interval (secs) |
//! | `SAFEPLATE_LOG_LEVEL` | info | `EnvFilter` directive |
//! | `SAFEPLATE_LOG_FORMAT` | json | `json` or `pretty` |

use std::time::Duration;

use crate::ratelimit::{EndpointClass, EndpointPolicies, MAX_WINDOW_SECS};
use crate::telemetry::{LogConfig, LogFormat};

pub const DEFAULT_AI_LIMIT: (u32, u64) = (10, 60);
pub const DEFAULT_WRITE_LIMIT: (u32, u64) = (30, 60);
pub const DEFAULT_FEEDBACK_LIMIT: (u32, u64) = (20, 60);
pub const DEFAULT_STANDARD_LIMIT: (u32, u64) = (100, 60);
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Printable summary of every effective value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveConfig {
    pub ai_max_requests: u32,
    pub ai_window_secs: u64,
    pub write_max_requests: u32,
    pub write_window_secs: u64,
    pub feedback_max_requests: u32,
    pub feedback_window_secs: u64,
    pub default_max_requests: u32,
    pub default_window_secs: u64,
    pub sweep_interval_secs: u64,
    pub log_level: String,
    pub log_format: &'static str,
}

impl EffectiveConfig {
    /// `(variable, value)` pairs in documentation order.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("SAFEPLATE_AI_MAX_REQUESTS", self.ai_max_requests.to_string()),
            ("SAFEPLATE_AI_WINDOW_SECS", self.ai_window_secs.to_string()),
            ("SAFEPLATE_WRITE_MAX_REQUESTS", self.write_max_requests.to_string()),
            ("SAFEPLATE_WRITE_WINDOW_SECS", self.write_window_secs.to_string()),
            ("SAFEPLATE_FEEDBACK_MAX_REQUESTS", self.feedback_max_requests.to_string()),
            ("SAFEPLATE_FEEDBACK_WINDOW_SECS", self.feedback_window_secs.to_string()),
            ("SAFEPLATE_DEFAULT_MAX_REQUESTS", self.default_max_requests.to_string()),
            ("SAFEPLATE_DEFAULT_WINDOW_SECS", self.default_window_secs.to_string()),
            ("SAFEPLATE_SWEEP_INTERVAL_SECS", self.sweep_interval_secs.to_string()),
            ("SAFEPLATE_LOG_LEVEL", self.log_level.clone()),
            ("SAFEPLATE_LOG_FORMAT", self.log_format.to_string()),
        ]
    }
}

/// All pipeline configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub policies: EndpointPolicies,
    pub sweep_interval: Duration,
    pub logging: LogConfig,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            policies: EndpointPolicies::default(),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            logging: LogConfig::default(),
        }
    }
}

/// Parse a `u32` env var, returning `default` on missing or invalid.
fn parse_u32(key: &str, default: u32) -> u32 {
    match std::env::var(key) {
        Ok(val) => val.trim().parse::<u32>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Parse a `u64` env var, returning `default` on missing or invalid.
fn parse_u64(key: &str, default: u64) -> u64 {
    match std::env::var(key) {
        Ok(val) => val.trim().parse::<u64>().unwrap_or(default),
        Err(_) => default,
    }
}

fn load_limit(prefix: &str, default: (u32, u64)) -> (u32, u64) {
    let max = parse_u32(&format!("SAFEPLATE_{}_MAX_REQUESTS", prefix), default.0);
    let window = parse_u64(&format!("SAFEPLATE_{}_WINDOW_SECS", prefix), default.1);
    (max.max(1), window.clamp(1, MAX_WINDOW_SECS))
}

fn load_policies() -> EndpointPolicies {
    EndpointPolicies::from_limits(
        load_limit("AI", DEFAULT_AI_LIMIT),
        load_limit("WRITE", DEFAULT_WRITE_LIMIT),
        load_limit("FEEDBACK", DEFAULT_FEEDBACK_LIMIT),
        load_limit("DEFAULT", DEFAULT_STANDARD_LIMIT),
    )
}

fn load_logging() -> LogConfig {
    let level = std::env::var("SAFEPLATE_LOG_LEVEL")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
    let format = std::env::var("SAFEPLATE_LOG_FORMAT")
        .ok()
        .and_then(|v| LogFormat::parse(&v))
        .unwrap_or_default();
    LogConfig {
        format,
        level,
        output_path: None,
    }
}

/// Load all configuration from environment variables.
///
/// Missing or invalid values fall back to safe defaults without panicking.
pub fn load() -> EnvConfig {
    let sweep_secs = parse_u64("SAFEPLATE_SWEEP_INTERVAL_SECS", DEFAULT_SWEEP_INTERVAL_SECS);
    EnvConfig {
        policies: load_policies(),
        sweep_interval: Duration::from_secs(sweep_secs.clamp(1, MAX_WINDOW_SECS)),
        logging: load_logging(),
    }
}

impl EnvConfig {
    pub fn effective_config(&self) -> EffectiveConfig {
        let p = &self.policies;
        let limit = |class: EndpointClass| {
            let policy = p.for_class(class);
            (policy.max_requests(), policy.window_secs())
        };
        let (ai_max_requests, ai_window_secs) = limit(EndpointClass::AiGeneration);
        let (write_max_requests, write_window_secs) = limit(EndpointClass::RecipeWrite);
        let (feedback_max_requests, feedback_window_secs) = limit(EndpointClass::Feedback);
        let (default_max_requests, default_window_secs) = limit(EndpointClass::Standard);

        EffectiveConfig {
            ai_max_requests,
            ai_window_secs,
            write_max_requests,
            write_window_secs,
            feedback_max_requests,
            feedback_window_secs,
            default_max_requests,
            default_window_secs,
            sweep_interval_secs: self.sweep_interval.as_secs(),
            log_level: self.logging.level.clone(),
            log_format: self.logging.format.as_str(),
        }
    }
}
