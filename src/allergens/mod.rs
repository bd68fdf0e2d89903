//! Allergen labeling for ingredient-bearing payloads.
//!
//! - `taxonomy`: the controlled, versioned allergen vocabulary
//! - `matcher`: keyword detection, batch deduplication and label grouping

pub mod matcher;
pub mod taxonomy;

pub use matcher::{
    contains_summary, group_by_allergen_label, AllergenGroup, AllergenMatch, AllergenMatcher,
    AllergenProfile, IngredientText,
};
pub use taxonomy::{
    AllergenDefinition, AllergenInfo, KeywordTaxonomy, TaxonomyError, TAXONOMY_VERSION,
};
