//! Payload shape checks and field walking.
//!
//! Payloads arrive untyped. Validation only checks the shape of the fields
//! the pipeline itself reads or that a recipe-shaped record declares; other
//! keys pass through to sanitization untouched.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::allergens::IngredientText;

/// Path used for a string payload that is not inside any object.
pub const ROOT_PATH: &str = "$";

/// Upper bound on ingredient lines in one payload.
pub const MAX_INGREDIENTS: usize = 500;

/// One field-level validation problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Dotted path, e.g. `ingredients[2].item`.
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Check the payload shape. An empty vector means the payload is valid.
pub fn validate(payload: &Value) -> Vec<FieldError> {
    let mut errors = Vec::new();
    let Some(obj) = payload.as_object() else {
        errors.push(FieldError::new(ROOT_PATH, "payload must be a JSON object"));
        return errors;
    };

    for key in ["name", "description", "cuisine"] {
        expect_optional_string(obj, key, key, &mut errors);
    }
    if let Some(name) = obj.get("name").and_then(Value::as_str) {
        if name.trim().is_empty() {
            errors.push(FieldError::new("name", "must not be blank"));
        }
    }
    for key in ["servings", "prep_time_minutes", "cook_time_minutes"] {
        if let Some(v) = obj.get(key) {
            if !v.is_null() && v.as_u64().is_none() {
                errors.push(FieldError::new(key, "must be a non-negative integer"));
            }
        }
    }
    if let Some(v) = obj.get("is_public") {
        if !v.is_boolean() {
            errors.push(FieldError::new("is_public", "must be a boolean"));
        }
    }

    validate_ingredients(obj, &mut errors);
    validate_instructions(obj, &mut errors);
    validate_tags(obj, &mut errors);
    validate_allergens(obj, &mut errors);
    errors
}

fn expect_optional_string(
    obj: &Map<String, Value>,
    key: &str,
    path: &str,
    errors: &mut Vec<FieldError>,
) {
    match obj.get(key) {
        None | Some(Value::Null) | Some(Value::String(_)) => {}
        Some(_) => errors.push(FieldError::new(path, "must be a string")),
    }
}

fn validate_ingredients(obj: &Map<String, Value>, errors: &mut Vec<FieldError>) {
    let Some(value) = obj.get("ingredients") else {
        return;
    };
    let Some(items) = value.as_array() else {
        errors.push(FieldError::new("ingredients", "must be an array"));
        return;
    };
    if items.len() > MAX_INGREDIENTS {
        errors.push(FieldError::new(
            "ingredients",
            format!("must contain at most {} entries", MAX_INGREDIENTS),
        ));
    }

    for (i, item) in items.iter().enumerate() {
        let path = format!("ingredients[{}]", i);
        match item {
            Value::String(s) if s.trim().is_empty() => {
                errors.push(FieldError::new(path, "must not be blank"));
            }
            Value::String(_) => {}
            Value::Object(fields) => match fields.get("item") {
                Some(Value::String(s)) if !s.trim().is_empty() => {
                    for key in ["quantity", "unit", "notes"] {
                        expect_optional_string(fields, key, &format!("{}.{}", path, key), errors);
                    }
                }
                Some(Value::String(_)) => {
                    errors.push(FieldError::new(format!("{}.item", path), "must not be blank"));
                }
                Some(_) => {
                    errors.push(FieldError::new(format!("{}.item", path), "must be a string"));
                }
                None => {
                    errors.push(FieldError::new(format!("{}.item", path), "is required"));
                }
            },
            _ => errors.push(FieldError::new(path, "must be a string or an object")),
        }
    }
}

fn validate_instructions(obj: &Map<String, Value>, errors: &mut Vec<FieldError>) {
    let Some(value) = obj.get("instructions") else {
        return;
    };
    let Some(steps) = value.as_array() else {
        errors.push(FieldError::new("instructions", "must be an array"));
        return;
    };
    for (i, step) in steps.iter().enumerate() {
        let path = format!("instructions[{}]", i);
        let Some(fields) = step.as_object() else {
            errors.push(FieldError::new(path, "must be an object"));
            continue;
        };
        if !matches!(fields.get("text"), Some(Value::String(_))) {
            errors.push(FieldError::new(format!("{}.text", path), "must be a string"));
        }
        if let Some(n) = fields.get("step") {
            if n.as_u64().is_none() {
                errors.push(FieldError::new(
                    format!("{}.step", path),
                    "must be a non-negative integer",
                ));
            }
        }
    }
}

fn validate_tags(obj: &Map<String, Value>, errors: &mut Vec<FieldError>) {
    let Some(value) = obj.get("tags") else {
        return;
    };
    let Some(tags) = value.as_array() else {
        errors.push(FieldError::new("tags", "must be an array"));
        return;
    };
    for (i, tag) in tags.iter().enumerate() {
        if !tag.is_string() {
            errors.push(FieldError::new(format!("tags[{}]", i), "must be a string"));
        }
    }
}

fn validate_allergens(obj: &Map<String, Value>, errors: &mut Vec<FieldError>) {
    let Some(value) = obj.get("allergens") else {
        return;
    };
    let Some(tags) = value.as_array() else {
        errors.push(FieldError::new("allergens", "must be an array"));
        return;
    };
    for (i, tag) in tags.iter().enumerate() {
        let path = format!("allergens[{}]", i);
        match tag.as_object() {
            Some(fields) => {
                if !matches!(fields.get("id"), Some(Value::String(_))) {
                    errors.push(FieldError::new(format!("{}.id", path), "must be a string"));
                }
                expect_optional_string(fields, "label", &format!("{}.label", path), errors);
            }
            None => errors.push(FieldError::new(path, "must be an object")),
        }
    }
}

/// Ingredient lines of an ingredient-bearing payload.
///
/// `None` when the payload has no `ingredients` array. Plain-string entries
/// become the ingredient text; object entries use `item` and `notes`.
pub fn extract_ingredients(payload: &Value) -> Option<Vec<IngredientText>> {
    let items = payload.get("ingredients")?.as_array()?;
    let lines = items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(IngredientText::new(s.as_str())),
            Value::Object(fields) => {
                let text = fields.get("item")?.as_str()?;
                let line = IngredientText::new(text);
                Some(match fields.get("notes").and_then(Value::as_str) {
                    Some(notes) => line.with_notes(notes),
                    None => line,
                })
            }
            _ => None,
        })
        .collect();
    Some(lines)
}

/// Every string leaf with its dotted path, in document order.
pub fn string_leaves(payload: &Value) -> Vec<(String, &str)> {
    let mut leaves = Vec::new();
    collect_leaves(payload, String::new(), &mut leaves);
    leaves
}

fn collect_leaves<'a>(value: &'a Value, path: String, out: &mut Vec<(String, &'a str)>) {
    match value {
        Value::String(s) => {
            let path = if path.is_empty() {
                ROOT_PATH.to_string()
            } else {
                path
            };
            out.push((path, s.as_str()));
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                collect_leaves(item, format!("{}[{}]", path, i), out);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                let child = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", path, key)
                };
                collect_leaves(item, child, out);
            }
        }
        _ => {}
    }
}
