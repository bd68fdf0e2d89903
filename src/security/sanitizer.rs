//! Markup Sanitizer
//!
//! Strips every HTML tag and attribute from user-supplied text, keeping only
//! text content. `<script>` and `<style>` bodies are dropped entirely; the
//! bodies of every other tag survive as plain text.
//!
//! `<template>`, `<svg>` and `<math>` are unwrapped before cleaning. The
//! HTML parser moves their children out of the text tree, so left in place
//! their text would vanish with them.
//!
//! Output is the escaped text serialization (`&` becomes `&amp;`), so
//! re-sanitizing a sanitized string is a no-op.

use std::collections::HashSet;

use ammonia::Builder;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tags whose content is removed together with the tag.
const DROP_CONTENT_TAGS: [&str; 2] = ["script", "style"];

/// Ingredient line of a recipe-shaped record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub item: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Numbered instruction step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub step: u32,
    pub text: String,
}

/// Allergen annotation carried on a stored recipe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllergenTag {
    pub id: String,
    pub label: String,
}

/// Recipe-shaped record as submitted by recipe creation and AI generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipeRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub instructions: Vec<Instruction>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub allergens: Vec<AllergenTag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servings: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prep_time_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cook_time_minutes: Option<u32>,
    #[serde(default)]
    pub is_public: bool,
}

/// Strips markup from strings and structured records.
pub struct MarkupSanitizer {
    cleaner: Builder<'static>,
    containers: Regex,
}

impl MarkupSanitizer {
    pub fn new() -> Self {
        let mut cleaner = Builder::default();
        cleaner
            .tags(HashSet::new())
            .clean_content_tags(DROP_CONTENT_TAGS.into_iter().collect())
            .strip_comments(true);
        let containers = Regex::new(r"(?i)</?(?:template|svg|math)\b[^>]*>")
            .expect("fixed container regex must compile");
        Self {
            cleaner,
            containers,
        }
    }

    /// Sanitize one string. Absent input yields an empty string.
    pub fn sanitize_string(&self, input: Option<&str>) -> String {
        match input {
            Some(text) if !text.is_empty() => {
                self.cleaner
                    .clean(&self.unwrap_containers(text))
                    .to_string()
                    .trim()
                    .to_string()
            }
            _ => String::new(),
        }
    }

    // Repeat until stable: removing one tag can splice a new one together.
    fn unwrap_containers(&self, text: &str) -> String {
        let mut current = text.to_string();
        while self.containers.is_match(&current) {
            current = self.containers.replace_all(&current, "").into_owned();
        }
        current
    }

    /// Shorthand for `sanitize_string(Some(input))`.
    pub fn sanitize(&self, input: &str) -> String {
        self.sanitize_string(Some(input))
    }

    fn sanitize_opt(&self, input: &Option<String>) -> Option<String> {
        input.as_deref().map(|s| self.sanitize(s))
    }

    /// Sanitize every declared string field of a recipe record.
    ///
    /// Numbers and flags pass through untouched; array order and length are
    /// preserved; absent optionals stay absent.
    pub fn sanitize_record(&self, record: &RecipeRecord) -> RecipeRecord {
        RecipeRecord {
            name: self.sanitize(&record.name),
            description: self.sanitize_opt(&record.description),
            cuisine: self.sanitize_opt(&record.cuisine),
            ingredients: record
                .ingredients
                .iter()
                .map(|ing| Ingredient {
                    item: self.sanitize(&ing.item),
                    quantity: self.sanitize_opt(&ing.quantity),
                    unit: self.sanitize_opt(&ing.unit),
                    notes: self.sanitize_opt(&ing.notes),
                })
                .collect(),
            instructions: record
                .instructions
                .iter()
                .map(|ins| Instruction {
                    step: ins.step,
                    text: self.sanitize(&ins.text),
                })
                .collect(),
            tags: record.tags.iter().map(|t| self.sanitize(t)).collect(),
            allergens: record
                .allergens
                .iter()
                .map(|a| AllergenTag {
                    id: a.id.clone(),
                    label: self.sanitize(&a.label),
                })
                .collect(),
            servings: record.servings,
            prep_time_minutes: record.prep_time_minutes,
            cook_time_minutes: record.cook_time_minutes,
            is_public: record.is_public,
        }
    }

    /// Sanitize every string leaf of an untyped JSON payload.
    ///
    /// Object keys, array lengths and non-string leaves are left as they are.
    pub fn sanitize_value(&self, value: &Value) -> Value {
        match value {
            Value::String(s) => Value::String(self.sanitize(s)),
            Value::Array(items) => Value::Array(items.iter().map(|v| self.sanitize_value(v)).collect()),
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.sanitize_value(v)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}

impl Default for MarkupSanitizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_script_body_dropped_trailing_text_kept() {
        let s = MarkupSanitizer::new();
        assert_eq!(s.sanitize("<script>alert(1)</script>Hello"), "Hello");
    }

    #[test]
    fn test_style_body_dropped() {
        let s = MarkupSanitizer::new();
        assert_eq!(s.sanitize("<style>body{display:none}</style>Soup"), "Soup");
    }

    #[test]
    fn test_ordinary_tag_content_kept() {
        let s = MarkupSanitizer::new();
        assert_eq!(s.sanitize("<p>Hello <b>World</b></p>"), "Hello World");
        assert_eq!(s.sanitize("<div><span>Fold</span> gently</div>"), "Fold gently");
    }

    #[test]
    fn test_foreign_and_template_text_kept() {
        let s = MarkupSanitizer::new();
        assert_eq!(s.sanitize("<template>Stir</template>"), "Stir");
        assert_eq!(s.sanitize("<math><mi>Stir</mi></math>"), "Stir");
        assert_eq!(s.sanitize("<svg><text>Stir</text></svg>"), "Stir");
        assert_eq!(s.sanitize("<sv<svg>g>Stir</svg>"), "Stir");
        assert_eq!(s.sanitize("<svg><script>x()</script>Stir</svg>"), "Stir");
    }

    #[test]
    fn test_attributes_removed() {
        let s = MarkupSanitizer::new();
        assert_eq!(s.sanitize(r#"<a href="javascript:alert(1)" onclick="x()">Click</a>"#), "Click");
        assert_eq!(s.sanitize(r#"<img src=x onerror="alert(1)">Pie"#), "Pie");
    }

    #[test]
    fn test_absent_and_empty_input() {
        let s = MarkupSanitizer::new();
        assert_eq!(s.sanitize_string(None), "");
        assert_eq!(s.sanitize_string(Some("")), "");
    }

    #[test]
    fn test_trims_whitespace() {
        let s = MarkupSanitizer::new();
        assert_eq!(s.sanitize("   <em> Tomato soup </em>  "), "Tomato soup");
    }

    #[test]
    fn test_idempotent_on_malformed_markup() {
        let s = MarkupSanitizer::new();
        for input in [
            "<scr<script>ipt>alert(1)</script>",
            "salt & pepper",
            "1 < 2 > 0",
            "<<b>>bold<</b>>",
            "&lt;script&gt;alert(1)&lt;/script&gt;",
            "<!-- hidden -->visible",
        ] {
            let once = s.sanitize(input);
            assert_eq!(s.sanitize(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_sanitize_record_preserves_shape() {
        let s = MarkupSanitizer::new();
        let record = RecipeRecord {
            name: "<b>Pancakes</b>".into(),
            description: None,
            cuisine: Some("<i>French</i>".into()),
            ingredients: vec![
                Ingredient {
                    item: "flour<script>x</script>".into(),
                    quantity: Some("200".into()),
                    unit: Some("g".into()),
                    notes: None,
                },
                Ingredient {
                    item: "milk".into(),
                    ..Default::default()
                },
            ],
            instructions: vec![Instruction {
                step: 1,
                text: "<p>Whisk</p>".into(),
            }],
            tags: vec!["<u>breakfast</u>".into(), "sweet".into()],
            allergens: vec![AllergenTag {
                id: "milk".into(),
                label: "<b>Milk</b>".into(),
            }],
            servings: Some(4),
            prep_time_minutes: Some(10),
            cook_time_minutes: None,
            is_public: true,
        };

        let clean = s.sanitize_record(&record);
        assert_eq!(clean.name, "Pancakes");
        assert_eq!(clean.description, None);
        assert_eq!(clean.cuisine.as_deref(), Some("French"));
        assert_eq!(clean.ingredients.len(), 2);
        assert_eq!(clean.ingredients[0].item, "flour");
        assert_eq!(clean.ingredients[1].notes, None);
        assert_eq!(clean.instructions[0].step, 1);
        assert_eq!(clean.instructions[0].text, "Whisk");
        assert_eq!(clean.tags, vec!["breakfast", "sweet"]);
        assert_eq!(clean.allergens[0].label, "Milk");
        assert_eq!(clean.servings, Some(4));
        assert_eq!(clean.cook_time_minutes, None);
        assert!(clean.is_public);
    }

    #[test]
    fn test_sanitize_value_keeps_keys_and_non_strings() {
        let s = MarkupSanitizer::new();
        let value = json!({
            "name": "<b>Stew</b>",
            "servings": 4,
            "vegan": false,
            "photo": null,
            "tags": ["<i>hearty</i>", "winter"],
        });
        let clean = s.sanitize_value(&value);
        assert_eq!(
            clean,
            json!({
                "name": "Stew",
                "servings": 4,
                "vegan": false,
                "photo": null,
                "tags": ["hearty", "winter"],
            })
        );
    }
}
