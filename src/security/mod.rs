//! Input hygiene for user-supplied text.
//!
//! - `sanitizer`: strips markup before anything is stored or echoed
//! - `scanner`: flags high-risk substrings in raw input for the security log

pub mod sanitizer;
pub mod scanner;

pub use sanitizer::{AllergenTag, Ingredient, Instruction, MarkupSanitizer, RecipeRecord};
pub use scanner::{SuspiciousPattern, SuspiciousPatternScanner};
