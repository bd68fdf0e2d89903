//! Fuzz target for the suspicious-pattern scanner.
//!
//! `is_suspicious`, `scan` and `first_match` must agree on every input.

#![no_main]

use libfuzzer_sys::fuzz_target;
use safeplate::security::SuspiciousPatternScanner;

fuzz_target!(|data: &str| {
    let scanner = SuspiciousPatternScanner::new();
    let found = scanner.scan(data);
    assert_eq!(scanner.is_suspicious(data), !found.is_empty());
    assert_eq!(scanner.first_match(data), found.first().copied());
    assert!(found.windows(2).all(|w| w[0] < w[1]), "scan output not ordered");
});
