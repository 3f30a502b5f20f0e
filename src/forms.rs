// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! The website's forms and their rule sets.

use crate::config::{RateLimitConfig, RateLimitPolicy};
use crate::error::GuardError;
use crate::rules::{presets, ValidationRule, ValidationRuleSet};
use crate::validator::FieldValue;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Largest accepted attachment (10 MiB).
pub const MAX_ATTACHMENT_BYTES: u64 = 10 * 1024 * 1024;

const ATTACHMENT_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

const ORGANIZATION_TYPES: &[&str] = &[
    "university",
    "research-institute",
    "industry",
    "non-profit",
    "government",
    "other",
];

/// A logical form on the website.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormKind {
    Contact,
    InstitutionalMembership,
    IndividualMembership,
    EventRegistration,
}

impl FormKind {
    pub const ALL: [FormKind; 4] = [
        Self::Contact,
        Self::InstitutionalMembership,
        Self::IndividualMembership,
        Self::EventRegistration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contact => "contact",
            Self::InstitutionalMembership => "institutional-membership",
            Self::IndividualMembership => "individual-membership",
            Self::EventRegistration => "event-registration",
        }
    }

    /// The rule set validating this form.
    pub fn rules(&self) -> &'static ValidationRuleSet {
        match self {
            Self::Contact => &CONTACT_RULES,
            Self::InstitutionalMembership => &INSTITUTIONAL_MEMBERSHIP_RULES,
            Self::IndividualMembership => &INDIVIDUAL_MEMBERSHIP_RULES,
            Self::EventRegistration => &EVENT_REGISTRATION_RULES,
        }
    }

    /// The submission throttle configured for this form.
    pub fn policy(&self, config: &RateLimitConfig) -> RateLimitPolicy {
        match self {
            Self::Contact => config.contact,
            Self::InstitutionalMembership => config.institutional_membership,
            Self::IndividualMembership => config.individual_membership,
            Self::EventRegistration => config.event_registration,
        }
    }

    /// Rate limiter key, optionally scoped to one client.
    pub fn rate_limit_key(&self, client_id: Option<&str>) -> String {
        match client_id {
            Some(client) => format!("{}:{}", self.as_str(), client),
            None => self.as_str().to_string(),
        }
    }
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormKind {
    type Err = GuardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| GuardError::UnknownForm(s.to_string()))
    }
}

static EVENT_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid event id regex"));

pub static CONTACT_RULES: Lazy<ValidationRuleSet> = Lazy::new(|| {
    ValidationRuleSet::new()
        .field("firstName", presets::NAME.clone())
        .field("lastName", presets::NAME.clone())
        .field("email", presets::EMAIL.clone())
        .field("phone", presets::PHONE.clone())
        .field("organization", presets::ORGANIZATION.clone())
        .field("subject", presets::SUBJECT.clone())
        .field("message", presets::MESSAGE.clone())
});

pub static INSTITUTIONAL_MEMBERSHIP_RULES: Lazy<ValidationRuleSet> = Lazy::new(|| {
    ValidationRuleSet::new()
        .field(
            "organizationName",
            presets::ORGANIZATION.clone().made_required().min_length(2),
        )
        .field(
            "organizationType",
            ValidationRule::required().custom(|value| {
                one_of(value, ORGANIZATION_TYPES, "organizationType must be a listed type")
            }),
        )
        .field(
            "website",
            ValidationRule::optional().max_length(200).custom(website_url),
        )
        .field("contactFirstName", presets::NAME.clone())
        .field("contactLastName", presets::NAME.clone())
        .field("email", presets::EMAIL.clone())
        .field("phone", presets::PHONE.clone().made_required())
        .field("description", presets::MESSAGE.clone())
        .field("attachment", ValidationRule::optional().custom(attachment))
});

pub static INDIVIDUAL_MEMBERSHIP_RULES: Lazy<ValidationRuleSet> = Lazy::new(|| {
    ValidationRuleSet::new()
        .field("firstName", presets::NAME.clone())
        .field("lastName", presets::NAME.clone())
        .field("email", presets::EMAIL.clone())
        .field("phone", presets::PHONE.clone())
        .field("organization", presets::ORGANIZATION.clone())
        .field("jobTitle", ValidationRule::optional().max_length(100))
        .field("motivation", presets::MESSAGE.clone().made_optional())
        .field(
            "agreeToTerms",
            ValidationRule::required().custom(|value| {
                (!is_checked(value)).then(|| "agreeToTerms must be accepted".to_string())
            }),
        )
});

pub static EVENT_REGISTRATION_RULES: Lazy<ValidationRuleSet> = Lazy::new(|| {
    ValidationRuleSet::new()
        .field(
            "eventId",
            ValidationRule::required()
                .max_length(100)
                .pattern(EVENT_ID_PATTERN.clone()),
        )
        .field("firstName", presets::NAME.clone())
        .field("lastName", presets::NAME.clone())
        .field("email", presets::EMAIL.clone())
        .field("organization", presets::ORGANIZATION.clone())
        .field("dietaryRequirements", ValidationRule::optional().max_length(500))
});

fn one_of(value: &FieldValue, allowed: &[&str], message: &str) -> Option<String> {
    (!allowed.contains(&value.as_text())).then(|| message.to_string())
}

fn is_checked(value: &FieldValue) -> bool {
    match value {
        FieldValue::Flag(checked) => *checked,
        FieldValue::Text(text) => matches!(text.as_str(), "true" | "on" | "yes"),
        _ => false,
    }
}

/// Only absolute http(s) URLs with a host.
fn website_url(value: &FieldValue) -> Option<String> {
    let valid = Url::parse(value.as_text())
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
        .unwrap_or(false);

    (!valid).then(|| "website must be an http or https address".to_string())
}

fn attachment(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::File(file) if file.size > MAX_ATTACHMENT_BYTES => {
            Some("attachment cannot exceed 10 MB".to_string())
        }
        FieldValue::File(file) if !ATTACHMENT_TYPES.contains(&file.content_type.as_str()) => {
            Some("attachment must be a PDF or Word document".to_string())
        }
        FieldValue::File(_) => None,
        _ => Some("attachment must be a file upload".to_string()),
    }
}
