//! `scan`, `sanitize` and `taxonomy` subcommands.

use super::{EXIT_OK, EXIT_REJECTED, EXIT_USAGE};
use crate::allergens::{KeywordTaxonomy, TAXONOMY_VERSION};
use crate::security::{MarkupSanitizer, SuspiciousPatternScanner};

/// Print the suspicious patterns found in `text`, one per line.
///
/// Returns 1 if anything matched, 0 otherwise.
pub fn run_scan(text: &str) -> i32 {
    let found = SuspiciousPatternScanner::new().scan(text);
    if found.is_empty() {
        println!("clean");
        return EXIT_OK;
    }
    for pattern in found {
        println!("{}", pattern.as_str());
    }
    EXIT_REJECTED
}

/// Print the sanitized form of `text`.
pub fn run_sanitize(text: &str) -> i32 {
    println!("{}", MarkupSanitizer::new().sanitize(text));
    EXIT_OK
}

/// Print the built-in taxonomy's public view.
pub fn run_taxonomy(json: bool) -> i32 {
    let taxonomy = KeywordTaxonomy::builtin();
    let view = taxonomy.public_view();
    if json {
        return match serde_json::to_string_pretty(&view) {
            Ok(out) => {
                println!("{}", out);
                EXIT_OK
            }
            Err(e) => {
                eprintln!("taxonomy: {}", e);
                EXIT_USAGE
            }
        };
    }

    println!("taxonomy {} ({} allergens)", TAXONOMY_VERSION, view.len());
    for info in &view {
        println!("{:<12} {:<12} {}", info.id, info.label, info.description);
    }
    EXIT_OK
}
