// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Form validator.
//!
//! Evaluates submitted values against a [`ValidationRuleSet`]. Each field
//! named by the rule set is sanitized and then checked in a fixed order:
//! - required
//! - minimum length
//! - maximum length
//! - pattern
//! - custom check
//!
//! The first failing check produces the field's only error. Fields that
//! the rule set does not mention are ignored.

use crate::rules::{ValidationRule, ValidationRuleSet};
use crate::sanitizer::sanitize_value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Metadata of an uploaded attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileUpload {
    pub name: String,
    pub size: u64,
    #[serde(rename = "contentType")]
    pub content_type: String,
}

/// A raw value as entered by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
    File(FileUpload),
    Null,
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Text content; non-text values read as the empty string.
    pub fn as_text(&self) -> &str {
        match self {
            Self::Text(text) => text,
            _ => "",
        }
    }

    /// Empty string, null, or an unchecked box.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::Flag(checked) => !checked,
            Self::File(_) => false,
            Self::Null => true,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

/// Field name to raw value.
pub type FormValues = BTreeMap<String, FieldValue>;

/// Outcome of validating one form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    is_valid: bool,
    errors: BTreeMap<String, String>,
}

impl ValidationResult {
    pub fn from_errors(errors: BTreeMap<String, String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }

    pub fn error(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn into_errors(self) -> BTreeMap<String, String> {
        self.errors
    }
}

/// Validate `values` against `rules`.
pub fn validate(values: &FormValues, rules: &ValidationRuleSet) -> ValidationResult {
    let mut errors = BTreeMap::new();

    for (field, rule) in rules.iter() {
        let value = values
            .get(field)
            .map(sanitize_value)
            .unwrap_or(FieldValue::Null);

        if let Some(message) = check_field(field, &value, rule) {
            debug!(field = %field, error = %message, "Field failed validation");
            errors.insert(field.to_string(), message);
        }
    }

    ValidationResult::from_errors(errors)
}

/// Run one rule against an already sanitized value.
pub fn check_field(field: &str, value: &FieldValue, rule: &ValidationRule) -> Option<String> {
    if value.is_empty() {
        return rule.required.then(|| format!("{field} is required"));
    }

    if let FieldValue::Text(text) = value {
        let length = text.chars().count();

        if let Some(min) = rule.min_length {
            if length < min {
                return Some(format!("{field} must be at least {min} characters"));
            }
        }

        if let Some(max) = rule.max_length {
            if length > max {
                return Some(format!("{field} cannot exceed {max} characters"));
            }
        }

        if let Some(pattern) = &rule.pattern {
            if !pattern.is_match(text) {
                return Some(format!("{field} format is invalid"));
            }
        }
    }

    rule.custom.as_ref().and_then(|custom| custom(value))
}
