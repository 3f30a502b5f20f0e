// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Input sanitizer for free-text form fields.
//!
//! Every text value is reduced to plain text before it is validated,
//! displayed or forwarded:
//! - surrounding whitespace is trimmed
//! - markup is stripped, `script`/`style` elements lose their content
//! - stray angle brackets are removed
//! - `javascript:`/`vbscript:` schemes and inline event handlers are removed
//!
//! The passes repeat until the text stops changing, so sanitizing an
//! already sanitized value is a no-op however deeply the input nests.
//!
//! Handler removal only targets DOM event attribute names (`onclick=`,
//! `onerror=` ...), so prose such as "online = yes" is left alone.
//! Entities are decoded on every pass: a user who types `&amp;lt;` ends
//! up with an empty string, not the literal text.

use crate::validator::{FieldValue, FormValues};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static SCRIPT_SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:java|vb)script\s*:").expect("valid scheme regex"));

static EVENT_HANDLER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)\bon(?:abort|afterprint|animation(?:end|iteration|start)|auxclick|",
        r"beforeinput|beforeprint|beforeunload|blur|cancel|canplay(?:through)?|change|",
        r"click|close|contextmenu|copy|cuechange|cut|dblclick|",
        r"drag(?:end|enter|leave|over|start)?|drop|durationchange|emptied|ended|error|",
        r"focus(?:in|out)?|formdata|hashchange|input|invalid|key(?:down|press|up)|",
        r"load(?:eddata|edmetadata|start)?|message|",
        r"mouse(?:down|enter|leave|move|out|over|up|wheel)|offline|online|pagehide|",
        r"pageshow|paste|pause|play(?:ing)?|",
        r"pointer(?:cancel|down|enter|leave|move|out|over|up)|popstate|progress|",
        r"ratechange|reset|resize|scroll(?:end)?|search|seek(?:ed|ing)|",
        r"select(?:start|ionchange)?|show|stalled|storage|submit|suspend|timeupdate|",
        r"toggle|touch(?:cancel|end|move|start)|transition(?:cancel|end|run|start)|",
        r"unload|volumechange|waiting|wheel)\s*=",
    ))
    .expect("valid event handler regex")
});

static MARKUP_CLEANER: Lazy<ammonia::Builder<'static>> = Lazy::new(|| {
    let mut builder = ammonia::Builder::empty();
    builder.clean_content_tags(HashSet::from(["script", "style", "iframe", "object", "embed"]));
    builder
});

/// Sanitize a single text value.
pub fn sanitize(input: &str) -> String {
    let mut current = input.trim().to_string();

    // A pass that changes the text shortens it, so this bound is never
    // reached before the fixed point.
    for _ in 0..=current.len() {
        let next = sanitize_pass(&current);
        if next == current {
            break;
        }
        current = next;
    }

    current
}

/// Sanitize a field value. Files and nulls pass through untouched.
pub fn sanitize_value(value: &FieldValue) -> FieldValue {
    match value {
        FieldValue::Text(text) => FieldValue::Text(sanitize(text)),
        other => other.clone(),
    }
}

/// Sanitize every value of a form.
pub fn sanitize_values(values: &FormValues) -> FormValues {
    values
        .iter()
        .map(|(field, value)| (field.clone(), sanitize_value(value)))
        .collect()
}

fn sanitize_pass(input: &str) -> String {
    let without_nul = input.replace('\0', "");
    let cleaned = MARKUP_CLEANER.clean(&without_nul).to_string();

    let mut text = cleaned;
    loop {
        let next = strip_text(&text);
        if next == text {
            return text.trim().to_string();
        }
        text = next;
    }
}

/// Decode entities, then drop brackets, script schemes and handlers.
/// Every change shortens the text.
fn strip_text(text: &str) -> String {
    let text = unescape_text(text);
    let text: String = text.chars().filter(|c| !matches!(c, '<' | '>')).collect();
    let text = SCRIPT_SCHEME.replace_all(&text, "");
    EVENT_HANDLER.replace_all(&text, "").into_owned()
}

/// Undo one layer of the entity escaping ammonia applies to text nodes.
/// `&amp;` goes last so `&amp;lt;` decodes to `&lt;` here and to `<` on
/// the next call.
fn unescape_text(serialized: &str) -> String {
    serialized
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&nbsp;", "\u{a0}")
        .replace("&amp;", "&")
}
