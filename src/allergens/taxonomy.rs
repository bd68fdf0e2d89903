//! Controlled allergen vocabulary.
//!
//! The built-in taxonomy covers the 14 major allergens that UK food law
//! requires to be declared. Callers persist allergen ids, so entries are
//! append-only: an id is never renumbered or removed, only deprecated in
//! place.

use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

use serde::Serialize;
use thiserror::Error;

/// Version tag of the built-in vocabulary.
pub const TAXONOMY_VERSION: &str = "uk-fsa-14/1";

/// One allergen category and the substrings that trigger it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllergenDefinition {
    pub id: String,
    pub label: String,
    pub description: String,
    /// Lowercase trigger substrings. Order matters: the first keyword that
    /// hits an ingredient is the one reported after deduplication.
    pub keywords: Vec<String>,
    /// Deprecated entries stay resolvable and are still matched.
    pub deprecated: bool,
}

impl AllergenDefinition {
    pub fn new(id: &str, label: &str, description: &str, keywords: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            description: description.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            deprecated: false,
        }
    }

    /// Public view without the internal keyword list.
    pub fn info(&self) -> AllergenInfo {
        AllergenInfo {
            id: self.id.clone(),
            label: self.label.clone(),
            description: self.description.clone(),
        }
    }
}

/// What UI selection steps and onboarding forms see of an allergen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllergenInfo {
    pub id: String,
    pub label: String,
    pub description: String,
}

/// Errors raised when a taxonomy breaks its structural invariants.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaxonomyError {
    #[error("Duplicate allergen id: {0}")]
    DuplicateId(String),

    #[error("Allergen {0} has no keywords")]
    NoKeywords(String),

    #[error("Allergen {id} keyword {keyword:?} is empty or not lowercase")]
    InvalidKeyword { id: String, keyword: String },

    #[error("Allergen {id} lists keyword {keyword:?} more than once")]
    DuplicateKeyword { id: String, keyword: String },

    #[error("Unknown allergen id: {0}")]
    UnknownId(String),

    #[error("Keyword automaton failed to build: {0}")]
    Automaton(String),
}

/// Ordered, append-only sequence of allergen definitions.
#[derive(Debug, Clone)]
pub struct KeywordTaxonomy {
    definitions: Vec<AllergenDefinition>,
}

impl KeywordTaxonomy {
    /// Build a taxonomy, rejecting any definition that breaks an invariant.
    pub fn new(definitions: Vec<AllergenDefinition>) -> Result<Self, TaxonomyError> {
        let taxonomy = Self { definitions };
        taxonomy.validate()?;
        Ok(taxonomy)
    }

    /// Shared handle to the built-in UK major-allergen vocabulary.
    pub fn builtin() -> Arc<KeywordTaxonomy> {
        static BUILTIN: OnceLock<Arc<KeywordTaxonomy>> = OnceLock::new();
        BUILTIN
            .get_or_init(|| {
                Arc::new(KeywordTaxonomy {
                    definitions: uk_major_allergens(),
                })
            })
            .clone()
    }

    /// Check id uniqueness and keyword hygiene.
    pub fn validate(&self) -> Result<(), TaxonomyError> {
        let mut ids = HashSet::new();
        for def in &self.definitions {
            if !ids.insert(def.id.as_str()) {
                return Err(TaxonomyError::DuplicateId(def.id.clone()));
            }
            validate_keywords(def)?;
        }
        Ok(())
    }

    /// Append a new definition. Existing ids cannot be redefined.
    pub fn extend(&mut self, definition: AllergenDefinition) -> Result<(), TaxonomyError> {
        if self.get(&definition.id).is_some() {
            return Err(TaxonomyError::DuplicateId(definition.id));
        }
        validate_keywords(&definition)?;
        self.definitions.push(definition);
        Ok(())
    }

    /// Mark an entry deprecated without removing it.
    pub fn deprecate(&mut self, id: &str) -> Result<(), TaxonomyError> {
        let def = self
            .definitions
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| TaxonomyError::UnknownId(id.to_string()))?;
        def.deprecated = true;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&AllergenDefinition> {
        self.definitions.iter().find(|d| d.id == id)
    }

    pub fn definitions(&self) -> &[AllergenDefinition] {
        &self.definitions
    }

    /// Public `{id, label, description}` listing in taxonomy order.
    pub fn public_view(&self) -> Vec<AllergenInfo> {
        self.definitions.iter().map(AllergenDefinition::info).collect()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

fn validate_keywords(def: &AllergenDefinition) -> Result<(), TaxonomyError> {
    if def.keywords.is_empty() {
        return Err(TaxonomyError::NoKeywords(def.id.clone()));
    }
    let mut seen = HashSet::new();
    for keyword in &def.keywords {
        if keyword.trim().is_empty() || *keyword != keyword.to_lowercase() {
            return Err(TaxonomyError::InvalidKeyword {
                id: def.id.clone(),
                keyword: keyword.clone(),
            });
        }
        if !seen.insert(keyword.as_str()) {
            return Err(TaxonomyError::DuplicateKeyword {
                id: def.id.clone(),
                keyword: keyword.clone(),
            });
        }
    }
    Ok(())
}

// Keywords are deliberately broad; "butter" flags milk inside "peanut
// butter" and "egg" flags eggs inside "eggplant".
fn uk_major_allergens() -> Vec<AllergenDefinition> {
    vec![
        AllergenDefinition::new(
            "celery",
            "Celery",
            "Celery stalks, leaves, seeds and celeriac",
            &["celery", "celeriac"],
        ),
        AllergenDefinition::new(
            "gluten",
            "Gluten",
            "Cereals containing gluten: wheat, rye, barley, oats",
            &[
                "wheat", "flour", "barley", "rye", "oats", "oatmeal", "spelt", "bread", "pasta",
                "couscous", "semolina", "bulgur", "noodle", "seitan", "malt", "soy sauce",
            ],
        ),
        AllergenDefinition::new(
            "crustaceans",
            "Crustaceans",
            "Crabs, lobster, prawns, scampi and shrimp",
            &["crab", "lobster", "prawn", "shrimp", "crayfish", "langoustine", "scampi"],
        ),
        AllergenDefinition::new(
            "eggs",
            "Eggs",
            "Eggs and egg-based products such as mayonnaise",
            &["egg", "mayonnaise", "meringue", "albumen"],
        ),
        AllergenDefinition::new(
            "fish",
            "Fish",
            "All fish species and fish-based sauces",
            &[
                "fish", "salmon", "tuna", "cod", "haddock", "anchov", "sardine", "mackerel",
                "trout", "tilapia",
            ],
        ),
        AllergenDefinition::new(
            "lupin",
            "Lupin",
            "Lupin seeds and flour",
            &["lupin"],
        ),
        AllergenDefinition::new(
            "milk",
            "Milk",
            "Milk and dairy products",
            &[
                "milk", "butter", "cream", "cheese", "yogurt", "yoghurt", "ghee", "whey",
                "casein", "lactose",
            ],
        ),
        AllergenDefinition::new(
            "molluscs",
            "Molluscs",
            "Mussels, oysters, squid, snails and other molluscs",
            &[
                "mussel", "oyster", "clam", "scallop", "squid", "octopus", "snail", "calamari",
                "cuttlefish",
            ],
        ),
        AllergenDefinition::new(
            "mustard",
            "Mustard",
            "Mustard seeds, powder and prepared mustard",
            &["mustard"],
        ),
        AllergenDefinition::new(
            "peanuts",
            "Peanuts",
            "Peanuts and groundnuts, including peanut oil and butter",
            &["peanut", "groundnut", "arachis"],
        ),
        AllergenDefinition::new(
            "sesame",
            "Sesame",
            "Sesame seeds, oil and tahini",
            &["sesame", "tahini"],
        ),
        AllergenDefinition::new(
            "soya",
            "Soya",
            "Soya beans and soya products such as tofu and miso",
            &["soy", "tofu", "edamame", "miso", "tempeh"],
        ),
        AllergenDefinition::new(
            "sulphites",
            "Sulphites",
            "Sulphur dioxide and sulphites above 10mg/kg",
            &["sulphite", "sulfite", "sulphur dioxide", "sulfur dioxide", "wine"],
        ),
        AllergenDefinition::new(
            "tree-nuts",
            "Tree nuts",
            "Almonds, hazelnuts, walnuts, cashews, pecans, Brazil nuts, pistachios, macadamias",
            &[
                "almond", "hazelnut", "walnut", "cashew", "pecan", "brazil nut", "pistachio",
                "macadamia",
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_taxonomy_is_valid() {
        let taxonomy = KeywordTaxonomy::builtin();
        assert!(taxonomy.validate().is_ok());
        assert_eq!(taxonomy.len(), 14);
    }

    #[test]
    fn test_builtin_ids_are_stable() {
        let ids: Vec<String> = KeywordTaxonomy::builtin()
            .definitions()
            .iter()
            .map(|d| d.id.clone())
            .collect();
        assert_eq!(
            ids,
            vec![
                "celery", "gluten", "crustaceans", "eggs", "fish", "lupin", "milk", "molluscs",
                "mustard", "peanuts", "sesame", "soya", "sulphites", "tree-nuts",
            ]
        );
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let defs = vec![
            AllergenDefinition::new("milk", "Milk", "", &["milk"]),
            AllergenDefinition::new("milk", "Dairy", "", &["cream"]),
        ];
        assert_eq!(
            KeywordTaxonomy::new(defs).unwrap_err(),
            TaxonomyError::DuplicateId("milk".to_string())
        );
    }

    #[test]
    fn test_uppercase_keyword_rejected() {
        let defs = vec![AllergenDefinition::new("milk", "Milk", "", &["Milk"])];
        assert!(matches!(
            KeywordTaxonomy::new(defs),
            Err(TaxonomyError::InvalidKeyword { .. })
        ));
    }

    #[test]
    fn test_duplicate_keyword_rejected() {
        let defs = vec![AllergenDefinition::new("milk", "Milk", "", &["milk", "milk"])];
        assert!(matches!(
            KeywordTaxonomy::new(defs),
            Err(TaxonomyError::DuplicateKeyword { .. })
        ));
    }

    #[test]
    fn test_empty_keywords_rejected() {
        let defs = vec![AllergenDefinition::new("milk", "Milk", "", &[])];
        assert_eq!(
            KeywordTaxonomy::new(defs).unwrap_err(),
            TaxonomyError::NoKeywords("milk".to_string())
        );
    }

    #[test]
    fn test_extend_appends_and_rejects_existing_id() {
        let mut taxonomy = (*KeywordTaxonomy::builtin()).clone();
        taxonomy
            .extend(AllergenDefinition::new("kiwi", "Kiwi", "Kiwi fruit", &["kiwi"]))
            .unwrap();
        assert_eq!(taxonomy.definitions().last().unwrap().id, "kiwi");

        let err = taxonomy
            .extend(AllergenDefinition::new("milk", "Milk", "", &["milk"]))
            .unwrap_err();
        assert_eq!(err, TaxonomyError::DuplicateId("milk".to_string()));
    }

    #[test]
    fn test_deprecate_keeps_entry() {
        let mut taxonomy = (*KeywordTaxonomy::builtin()).clone();
        taxonomy.deprecate("lupin").unwrap();
        let lupin = taxonomy.get("lupin").unwrap();
        assert!(lupin.deprecated);
        assert_eq!(taxonomy.len(), 14);
        assert!(taxonomy.deprecate("nope").is_err());
    }

    #[test]
    fn test_public_view_hides_keywords() {
        let view = KeywordTaxonomy::builtin().public_view();
        let json = serde_json::to_value(&view[0]).unwrap();
        assert_eq!(json["id"], "celery");
        assert!(json.get("keywords").is_none());
    }
}
