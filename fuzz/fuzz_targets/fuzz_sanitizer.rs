//! Fuzz target for markup sanitization.
//!
//! Sanitizing must never panic and must be a projection: a second pass
//! leaves the output unchanged.

#![no_main]

use libfuzzer_sys::fuzz_target;
use safeplate::security::MarkupSanitizer;

fuzz_target!(|data: &str| {
    let sanitizer = MarkupSanitizer::new();
    let once = sanitizer.sanitize(data);
    let twice = sanitizer.sanitize(&once);
    assert_eq!(once, twice, "sanitize is not idempotent");
    assert!(!once.contains('<'), "raw '<' survived sanitization");
});
