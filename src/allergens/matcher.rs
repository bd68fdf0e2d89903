//! Allergen keyword matching over ingredient text.
//!
//! Matching is plain case-insensitive substring containment with no word
//! boundaries. Under-flagging an allergen is the worse failure, so recall
//! wins over precision: "egg" matches inside "eggplant".
//!
//! Every keyword of the taxonomy goes into one Aho-Corasick automaton, so a
//! line is scanned once regardless of how many allergens are selected.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use super::taxonomy::{KeywordTaxonomy, TaxonomyError};
use crate::telemetry::SecurityEvent;

/// Set of allergen ids a caller wants flagged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllergenProfile(BTreeSet<String>);

impl AllergenProfile {
    pub fn from_ids(ids: &[&str]) -> Self {
        ids.iter().map(|s| s.to_string()).collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl FromIterator<String> for AllergenProfile {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        )
    }
}

/// "This keyword, from this allergen's list, occurs in this ingredient text."
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllergenMatch {
    pub allergen_id: String,
    pub allergen_label: String,
    pub ingredient_text: String,
    pub matched_keyword: String,
}

/// One ingredient line as handed to [`AllergenMatcher::detect_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IngredientText {
    pub text: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl IngredientText {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Ingredients flagged for one allergen label, in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllergenGroup {
    pub label: String,
    pub ingredients: Vec<String>,
}

/// Matches ingredient text against a keyword taxonomy.
#[derive(Debug, Clone)]
pub struct AllergenMatcher {
    taxonomy: Arc<KeywordTaxonomy>,
    keywords: AhoCorasick,
    /// `(definition index, keyword index)` for each automaton pattern id.
    /// Pattern ids follow taxonomy order.
    keyword_owners: Vec<(usize, usize)>,
}

impl AllergenMatcher {
    pub fn new(taxonomy: Arc<KeywordTaxonomy>) -> Result<Self, TaxonomyError> {
        let mut keyword_owners = Vec::new();
        let mut needles: Vec<&str> = Vec::new();
        for (def_idx, def) in taxonomy.definitions().iter().enumerate() {
            for (kw_idx, keyword) in def.keywords.iter().enumerate() {
                keyword_owners.push((def_idx, kw_idx));
                needles.push(keyword.as_str());
            }
        }
        let keywords = AhoCorasickBuilder::new()
            .match_kind(MatchKind::Standard)
            .ascii_case_insensitive(true)
            .build(&needles)
            .map_err(|e| TaxonomyError::Automaton(e.to_string()))?;
        Ok(Self {
            taxonomy,
            keywords,
            keyword_owners,
        })
    }

    pub fn taxonomy(&self) -> &KeywordTaxonomy {
        &self.taxonomy
    }

    /// Every (allergen, keyword) pair whose keyword occurs in `text`.
    ///
    /// Only selected allergens are considered. Selected ids the taxonomy
    /// does not know are skipped.
    pub fn detect(&self, text: &str, selected: &AllergenProfile) -> Vec<AllergenMatch> {
        if selected.is_empty() || text.trim().is_empty() {
            return Vec::new();
        }
        self.log_unknown_ids(selected);
        self.scan(text, text, selected)
    }

    /// Batch detection, reporting each ingredient at most once per allergen.
    ///
    /// `text` and `notes` are scanned together; the reported
    /// `ingredient_text` is the ingredient's `text` alone.
    pub fn detect_all(
        &self,
        ingredients: &[IngredientText],
        selected: &AllergenProfile,
    ) -> Vec<AllergenMatch> {
        if selected.is_empty() || ingredients.is_empty() {
            return Vec::new();
        }
        self.log_unknown_ids(selected);

        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut matches = Vec::new();
        for ingredient in ingredients {
            let haystack = match ingredient.notes.as_deref() {
                Some(notes) if !notes.trim().is_empty() => {
                    format!("{} {}", ingredient.text, notes)
                }
                _ => ingredient.text.clone(),
            };
            for m in self.scan(&haystack, &ingredient.text, selected) {
                if seen.insert((m.allergen_id.clone(), m.ingredient_text.clone())) {
                    matches.push(m);
                }
            }
        }
        matches
    }

    fn scan(&self, haystack: &str, reported: &str, selected: &AllergenProfile) -> Vec<AllergenMatch> {
        let normalized: String = haystack.nfc().collect::<String>().to_lowercase();
        let definitions = self.taxonomy.definitions();

        let mut hits: Vec<(usize, usize)> = self
            .keywords
            .find_overlapping_iter(&normalized)
            .map(|m| self.keyword_owners[m.pattern().as_usize()])
            .filter(|&(def_idx, _)| selected.contains(&definitions[def_idx].id))
            .collect();
        // Report in taxonomy order, once per keyword.
        hits.sort_unstable();
        hits.dedup();

        hits.into_iter()
            .map(|(def_idx, kw_idx)| {
                let def = &definitions[def_idx];
                AllergenMatch {
                    allergen_id: def.id.clone(),
                    allergen_label: def.label.clone(),
                    ingredient_text: reported.to_string(),
                    matched_keyword: def.keywords[kw_idx].clone(),
                }
            })
            .collect()
    }

    fn log_unknown_ids(&self, selected: &AllergenProfile) {
        for id in selected.iter() {
            if self.taxonomy.get(id).is_none() {
                crate::security_log!(
                    SecurityEvent::UnknownAllergen,
                    "skipping allergen id unknown to taxonomy",
                    "allergen" => id
                );
            }
        }
    }
}

impl Default for AllergenMatcher {
    fn default() -> Self {
        // The built-in vocabulary is fixed and small.
        Self::new(KeywordTaxonomy::builtin()).expect("built-in taxonomy must compile")
    }
}

/// Group matches by allergen label for label and UI rendering.
pub fn group_by_allergen_label(matches: &[AllergenMatch]) -> Vec<AllergenGroup> {
    let mut groups: Vec<AllergenGroup> = Vec::new();
    for m in matches {
        let idx = match groups.iter().position(|g| g.label == m.allergen_label) {
            Some(idx) => idx,
            None => {
                groups.push(AllergenGroup {
                    label: m.allergen_label.clone(),
                    ingredients: Vec::new(),
                });
                groups.len() - 1
            }
        };
        let group = &mut groups[idx];
        if !group.ingredients.contains(&m.ingredient_text) {
            group.ingredients.push(m.ingredient_text.clone());
        }
    }
    groups
}

/// Render a "contains: Milk, Gluten" line. Empty when nothing matched.
pub fn contains_summary(groups: &[AllergenGroup]) -> String {
    if groups.is_empty() {
        return String::new();
    }
    let labels: Vec<&str> = groups.iter().map(|g| g.label.as_str()).collect();
    format!("contains: {}", labels.join(", "))
}
