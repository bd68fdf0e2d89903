//! Per-endpoint rate-limit policies.

use chrono::Duration;
use serde::Serialize;
use thiserror::Error;

/// Endpoint label used when a policy does not name one.
pub const DEFAULT_ENDPOINT_LABEL: &str = "default";

/// Longest accepted window: one week.
pub const MAX_WINDOW_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("max_requests must be greater than zero")]
    ZeroMaxRequests,

    #[error("window_secs must be greater than zero")]
    ZeroWindow,

    #[error("window_secs {0} exceeds the maximum of {max}", max = MAX_WINDOW_SECS)]
    WindowTooLarge(u64),
}

/// `{max_requests, window_secs, endpoint_label}` chosen by the calling route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateLimitPolicy {
    max_requests: u32,
    window_secs: u64,
    endpoint_label: Option<String>,
}

impl RateLimitPolicy {
    pub fn new(max_requests: u32, window_secs: u64) -> Result<Self, PolicyError> {
        if max_requests == 0 {
            return Err(PolicyError::ZeroMaxRequests);
        }
        if window_secs == 0 {
            return Err(PolicyError::ZeroWindow);
        }
        if window_secs > MAX_WINDOW_SECS {
            return Err(PolicyError::WindowTooLarge(window_secs));
        }
        Ok(Self {
            max_requests,
            window_secs,
            endpoint_label: None,
        })
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.endpoint_label = Some(label.into());
        self
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn window_secs(&self) -> u64 {
        self.window_secs
    }

    /// Window length. Bounded by `MAX_WINDOW_SECS`, so adding it to a
    /// timestamp cannot overflow.
    pub fn window(&self) -> Duration {
        Duration::seconds(self.window_secs.min(MAX_WINDOW_SECS) as i64)
    }

    /// Explicit label, or `"default"`.
    pub fn endpoint_label(&self) -> &str {
        self.endpoint_label
            .as_deref()
            .unwrap_or(DEFAULT_ENDPOINT_LABEL)
    }

    /// Store key for `identifier` under this policy.
    pub fn key_for(&self, identifier: &str) -> String {
        format!("{}:{}", identifier, self.endpoint_label())
    }

    // Presets skip `new`; callers clamp the values first.
    fn preset(max_requests: u32, window_secs: u64, label: &str) -> Self {
        Self {
            max_requests,
            window_secs,
            endpoint_label: Some(label.to_string()),
        }
    }
}

/// Endpoint classes a route picks its policy from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointClass {
    /// Downstream model calls (recipe generation, substitutions).
    AiGeneration,
    /// Recipe create and update.
    RecipeWrite,
    /// Ratings, comments and reports.
    Feedback,
    /// Everything else.
    Standard,
}

impl EndpointClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AiGeneration => "ai-generation",
            Self::RecipeWrite => "recipe-write",
            Self::Feedback => "feedback",
            Self::Standard => "standard",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ai" | "ai-generation" => Some(Self::AiGeneration),
            "write" | "recipe-write" => Some(Self::RecipeWrite),
            "feedback" => Some(Self::Feedback),
            "standard" | "default" => Some(Self::Standard),
            _ => None,
        }
    }
}

/// One policy per endpoint class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointPolicies {
    pub ai_generation: RateLimitPolicy,
    pub recipe_write: RateLimitPolicy,
    pub feedback: RateLimitPolicy,
    pub standard: RateLimitPolicy,
}

impl EndpointPolicies {
    pub fn for_class(&self, class: EndpointClass) -> &RateLimitPolicy {
        match class {
            EndpointClass::AiGeneration => &self.ai_generation,
            EndpointClass::RecipeWrite => &self.recipe_write,
            EndpointClass::Feedback => &self.feedback,
            EndpointClass::Standard => &self.standard,
        }
    }

    /// Build from `(max_requests, window_secs)` pairs. Zeros are floored to 1
    /// and windows capped at `MAX_WINDOW_SECS`.
    pub fn from_limits(
        ai_generation: (u32, u64),
        recipe_write: (u32, u64),
        feedback: (u32, u64),
        standard: (u32, u64),
    ) -> Self {
        let build = |(max, window): (u32, u64), class: EndpointClass| {
            RateLimitPolicy::preset(
                max.max(1),
                window.clamp(1, MAX_WINDOW_SECS),
                class.as_str(),
            )
        };
        Self {
            ai_generation: build(ai_generation, EndpointClass::AiGeneration),
            recipe_write: build(recipe_write, EndpointClass::RecipeWrite),
            feedback: build(feedback, EndpointClass::Feedback),
            standard: build(standard, EndpointClass::Standard),
        }
    }
}

impl Default for EndpointPolicies {
    fn default() -> Self {
        Self::from_limits((10, 60), (30, 60), (20, 60), (100, 60))
    }
}
