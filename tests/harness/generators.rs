// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test data generators for abuse simulation.

use form_guard::{FieldValue, FormKind, FormValues};
use std::net::{IpAddr, Ipv4Addr};

/// Generate a pool of client identifiers for testing.
pub fn generate_clients(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            // Use 10.x.x.x private range
            let a = ((i >> 16) & 0xFF) as u8;
            let b = ((i >> 8) & 0xFF) as u8;
            let c = (i & 0xFF) as u8;
            IpAddr::V4(Ipv4Addr::new(10, a, b, c)).to_string()
        })
        .collect()
}

/// Script and markup payloads seen in form spam.
pub fn injection_payloads() -> Vec<&'static str> {
    vec![
        "<script>alert('xss')</script>",
        "<img src=x onerror=alert(1)>",
        "<svg onload=alert(1)>",
        "<a href=\"javascript:alert(1)\">click</a>",
        "javascript:alert(document.cookie)",
        "<iframe src=\"https://evil.example\"></iframe>",
        "&lt;script&gt;alert(1)&lt;/script&gt;",
        "<<script>script>alert(1)<</script>/script>",
        "<body onload=steal()>",
        "<style>*{display:none}</style>",
        "VBScript:MsgBox(1)",
        "<scr<script>ipt>alert(1)</scr</script>ipt>",
    ]
}

/// Fragments that must never survive sanitization.
pub fn is_dangerous(text: &str) -> bool {
    let lower = text.to_lowercase();
    text.contains('<')
        || text.contains('>')
        || lower.contains("javascript:")
        || lower.contains("vbscript:")
        || lower.contains("onerror=")
        || lower.contains("onload=")
}

fn values(pairs: &[(&str, String)]) -> FormValues {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), FieldValue::Text(v.clone())))
        .collect()
}

/// A valid submission for `form`, varied by `i`.
pub fn valid_values(form: FormKind, i: usize) -> FormValues {
    match form {
        FormKind::Contact => values(&[
            ("firstName", "Jane".to_string()),
            ("lastName", "Doe".to_string()),
            ("email", format!("jane{i}@example.com")),
            ("subject", format!("Question number {i}")),
            ("message", "This is a sufficiently long message.".to_string()),
        ]),
        FormKind::InstitutionalMembership => values(&[
            ("organizationName", format!("Institute {i}")),
            ("organizationType", "university".to_string()),
            ("contactFirstName", "Ada".to_string()),
            ("contactLastName", "Lovelace".to_string()),
            ("email", format!("ada{i}@example.org")),
            ("phone", "+441234567890".to_string()),
            ("description", "We would like to join the alliance.".to_string()),
        ]),
        FormKind::IndividualMembership => {
            let mut fields = values(&[
                ("firstName", "Grace".to_string()),
                ("lastName", "Hopper".to_string()),
                ("email", format!("grace{i}@example.com")),
            ]);
            fields.insert("agreeToTerms".to_string(), FieldValue::Flag(true));
            fields
        }
        FormKind::EventRegistration => values(&[
            ("eventId", "annual-summit".to_string()),
            ("firstName", "Alan".to_string()),
            ("lastName", "Turing".to_string()),
            ("email", format!("alan{i}@example.com")),
        ]),
    }
}

/// A contact submission with an injection payload in its free-text fields.
pub fn injected_values(i: usize) -> FormValues {
    let payloads = injection_payloads();
    let payload = payloads[i % payloads.len()];
    let mut fields = valid_values(FormKind::Contact, i);
    fields.insert(
        "subject".to_string(),
        FieldValue::Text(format!("Hello there {payload}")),
    );
    fields.insert(
        "message".to_string(),
        FieldValue::Text(format!("{payload} This is a sufficiently long message.")),
    );
    fields
}

/// A submission that fails validation.
pub fn garbage_values(i: usize) -> FormValues {
    values(&[
        ("firstName", "x".to_string()),
        ("email", format!("not-an-email-{i}")),
        ("message", "<b></b>".to_string()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_clients() {
        let clients = generate_clients(256);
        assert_eq!(clients.len(), 256);
        // All should be unique
        let unique: std::collections::HashSet<_> = clients.iter().collect();
        assert_eq!(unique.len(), 256);
    }

    #[test]
    fn test_is_dangerous() {
        assert!(is_dangerous("<b>"));
        assert!(is_dangerous("JavaScript:void(0)"));
        assert!(!is_dangerous("Hello there"));
    }
}
