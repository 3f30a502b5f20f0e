// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Declarative field rules and the shared rule presets.

use crate::validator::FieldValue;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Extra check run after the built-in constraints. Returns an error
/// message when the value is rejected.
pub type CustomValidator = Arc<dyn Fn(&FieldValue) -> Option<String> + Send + Sync>;

/// Constraints for a single field.
#[derive(Clone, Default)]
pub struct ValidationRule {
    pub required: bool,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<Regex>,
    pub custom: Option<CustomValidator>,
}

impl ValidationRule {
    /// A rule that rejects empty values.
    pub fn required() -> Self {
        Self {
            required: true,
            ..Default::default()
        }
    }

    /// A rule that accepts empty values.
    pub fn optional() -> Self {
        Self::default()
    }

    pub fn min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    pub fn pattern(mut self, pattern: Regex) -> Self {
        self.pattern = Some(pattern);
        self
    }

    pub fn custom<F>(mut self, check: F) -> Self
    where
        F: Fn(&FieldValue) -> Option<String> + Send + Sync + 'static,
    {
        self.custom = Some(Arc::new(check));
        self
    }

    /// Same constraints, but the field may be left empty.
    pub fn made_optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Same constraints, but the field must be filled in.
    pub fn made_required(mut self) -> Self {
        self.required = true;
        self
    }
}

impl fmt::Debug for ValidationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationRule")
            .field("required", &self.required)
            .field("min_length", &self.min_length)
            .field("max_length", &self.max_length)
            .field("pattern", &self.pattern.as_ref().map(Regex::as_str))
            .field("custom", &self.custom.is_some())
            .finish()
    }
}

/// Rules for every validated field of one form.
#[derive(Debug, Clone, Default)]
pub struct ValidationRuleSet {
    rules: BTreeMap<String, ValidationRule>,
}

impl ValidationRuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the rule for `name`.
    pub fn field(mut self, name: impl Into<String>, rule: ValidationRule) -> Self {
        self.rules.insert(name.into(), rule);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ValidationRule> {
        self.rules.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ValidationRule)> {
        self.rules.iter().map(|(name, rule)| (name.as_str(), rule))
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, ValidationRule)> for ValidationRuleSet {
    fn from_iter<I: IntoIterator<Item = (S, ValidationRule)>>(iter: I) -> Self {
        Self {
            rules: iter
                .into_iter()
                .map(|(name, rule)| (name.into(), rule))
                .collect(),
        }
    }
}

/// Named rules reused across forms.
pub mod presets {
    use super::ValidationRule;
    use once_cell::sync::Lazy;
    use regex::Regex;

    /// Cached patterns
    static EMAIL_PATTERN: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));
    static PHONE_PATTERN: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^\+?[0-9]+$").expect("valid phone regex"));
    static NAME_PATTERN: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^[\p{L}\s'.-]+$").expect("valid name regex"));
    static ORGANIZATION_PATTERN: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^[\p{L}\p{N}\s&,.'()/-]+$").expect("valid organization regex")
    });

    pub static EMAIL: Lazy<ValidationRule> = Lazy::new(|| {
        ValidationRule::required()
            .max_length(254)
            .pattern(EMAIL_PATTERN.clone())
    });

    pub static PHONE: Lazy<ValidationRule> = Lazy::new(|| {
        ValidationRule::optional()
            .max_length(20)
            .pattern(PHONE_PATTERN.clone())
    });

    pub static NAME: Lazy<ValidationRule> = Lazy::new(|| {
        ValidationRule::required()
            .min_length(2)
            .max_length(50)
            .pattern(NAME_PATTERN.clone())
    });

    pub static ORGANIZATION: Lazy<ValidationRule> = Lazy::new(|| {
        ValidationRule::optional()
            .max_length(100)
            .pattern(ORGANIZATION_PATTERN.clone())
    });

    pub static SUBJECT: Lazy<ValidationRule> =
        Lazy::new(|| ValidationRule::required().min_length(5).max_length(200));

    pub static MESSAGE: Lazy<ValidationRule> =
        Lazy::new(|| ValidationRule::required().min_length(10).max_length(2000));
}
