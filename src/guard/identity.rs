// Copyright 2024-2026 SafePlate Contributors
// SPDX-License-Identifier: Apache-2.0

//! Caller identity for rate limiting and allergen preferences.

use crate::allergens::AllergenProfile;

/// Identifier used when neither a user id nor a client address is known.
pub const UNKNOWN_CALLER: &str = "unknown";

/// Header set by the fronting proxy with the real client address.
pub const REAL_IP_HEADER: &str = "x-real-ip";

/// Generic proxy chain header; the first entry is the client.
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Who is calling, and which allergens they want flagged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub identifier: String,
    pub allergen_profile: AllergenProfile,
}

impl CallerIdentity {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            allergen_profile: AllergenProfile::default(),
        }
    }

    pub fn with_allergens(mut self, profile: AllergenProfile) -> Self {
        self.allergen_profile = profile;
        self
    }

    /// Derive the identifier from request data.
    ///
    /// Preference: authenticated user id, then `x-real-ip`, then the first
    /// `x-forwarded-for` entry, then `"unknown"`. Header names match
    /// case-insensitively and blank values are skipped.
    pub fn resolve(user_id: Option<&str>, headers: &[(&str, &str)]) -> Self {
        Self::new(resolve_identifier(user_id, headers))
    }
}

fn resolve_identifier(user_id: Option<&str>, headers: &[(&str, &str)]) -> String {
    if let Some(id) = non_blank(user_id) {
        return id.to_string();
    }
    if let Some(ip) = non_blank(header(headers, REAL_IP_HEADER)) {
        return ip.to_string();
    }
    let forwarded = header(headers, FORWARDED_FOR_HEADER)
        .and_then(|chain| chain.split(',').next());
    if let Some(ip) = non_blank(forwarded) {
        return ip.to_string();
    }
    UNKNOWN_CALLER.to_string()
}

fn header<'a>(headers: &[(&str, &'a str)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, v)| k.trim().eq_ignore_ascii_case(name) && !v.trim().is_empty())
        .map(|(_, v)| *v)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
