//! Suspicious Pattern Scanner
//!
//! Secondary heuristic scan for high-risk substrings in raw user input.
//! This is a detection signal for logging and alerting only; it never
//! redacts. Neutralization is the sanitizer's job.

use aho_corasick::{AhoCorasick, AhoCorasickBuilder};
use regex::Regex;
use serde::Serialize;

/// High-signal markers, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuspiciousPattern {
    ScriptTag,
    JavascriptScheme,
    EventHandler,
    Iframe,
    Object,
    Embed,
    Eval,
    CssExpression,
}

impl SuspiciousPattern {
    /// All patterns in evaluation order.
    pub const ALL: [SuspiciousPattern; 8] = [
        Self::ScriptTag,
        Self::JavascriptScheme,
        Self::EventHandler,
        Self::Iframe,
        Self::Object,
        Self::Embed,
        Self::Eval,
        Self::CssExpression,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ScriptTag => "script_tag",
            Self::JavascriptScheme => "javascript_scheme",
            Self::EventHandler => "event_handler",
            Self::Iframe => "iframe",
            Self::Object => "object",
            Self::Embed => "embed",
            Self::Eval => "eval",
            Self::CssExpression => "css_expression",
        }
    }

    /// Literal needle for the substring patterns. Event handlers need a regex.
    fn literal(&self) -> Option<&'static str> {
        match self {
            Self::ScriptTag => Some("<script"),
            Self::JavascriptScheme => Some("javascript:"),
            Self::EventHandler => None,
            Self::Iframe => Some("<iframe"),
            Self::Object => Some("<object"),
            Self::Embed => Some("<embed"),
            Self::Eval => Some("eval("),
            Self::CssExpression => Some("expression("),
        }
    }
}

/// Case-insensitive scanner over a fixed pattern set.
pub struct SuspiciousPatternScanner {
    literals: AhoCorasick,
    /// Pattern for each literal, indexed by aho-corasick pattern id.
    literal_kinds: Vec<SuspiciousPattern>,
    event_handler: Regex,
}

impl SuspiciousPatternScanner {
    pub fn new() -> Self {
        let literal_kinds: Vec<SuspiciousPattern> = SuspiciousPattern::ALL
            .iter()
            .copied()
            .filter(|p| p.literal().is_some())
            .collect();
        let needles: Vec<&str> = literal_kinds.iter().filter_map(|p| p.literal()).collect();

        // Both builds only fail on oversized or invalid patterns; these are fixed.
        let literals = AhoCorasickBuilder::new()
            .ascii_case_insensitive(true)
            .build(&needles)
            .expect("fixed suspicious-pattern set must compile");
        // `on<name>=` only counts inside a tag or right after a quote break-out.
        let event_handler = Regex::new(r#"(?i)(?:<[^>]*|["'])[\s/"']on[a-z]+\s*="#)
            .expect("fixed event-handler regex must compile");

        Self {
            literals,
            literal_kinds,
            event_handler,
        }
    }

    /// True if any pattern occurs in `input`.
    pub fn is_suspicious(&self, input: &str) -> bool {
        self.literals.is_match(input) || self.event_handler.is_match(input)
    }

    /// The first pattern, in evaluation order, that occurs in `input`.
    pub fn first_match(&self, input: &str) -> Option<SuspiciousPattern> {
        self.scan(input).into_iter().next()
    }

    /// Every distinct pattern present in `input`, in evaluation order.
    pub fn scan(&self, input: &str) -> Vec<SuspiciousPattern> {
        if input.is_empty() {
            return Vec::new();
        }
        let mut found: Vec<SuspiciousPattern> = self
            .literals
            .find_overlapping_iter(input)
            .map(|m| self.literal_kinds[m.pattern().as_usize()])
            .collect();
        if self.event_handler.is_match(input) {
            found.push(SuspiciousPattern::EventHandler);
        }
        found.sort();
        found.dedup();
        found
    }
}

impl Default for SuspiciousPatternScanner {
    fn default() -> Self {
        Self::new()
    }
}
