// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus metrics for form submissions.

use crate::forms::FormKind;
use crate::guard::{SubmissionOutcome, SubmissionStatus};
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Submission counters exposed on the metrics endpoint.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    submissions: IntCounterVec,
    suspicious: IntCounter,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new_custom(Some("form_guard".to_string()), None)?;

        let submissions = IntCounterVec::new(
            Opts::new("submissions_total", "Form submissions by form and outcome"),
            &["form", "outcome"],
        )?;
        let suspicious = IntCounter::with_opts(Opts::new(
            "suspicious_activity_total",
            "Submissions made while suspicious activity was flagged",
        ))?;

        registry.register(Box::new(submissions.clone()))?;
        registry.register(Box::new(suspicious.clone()))?;

        Ok(Self {
            registry,
            submissions,
            suspicious,
        })
    }

    pub fn observe(&self, form: FormKind, outcome: &SubmissionOutcome) {
        let label = match outcome.status {
            SubmissionStatus::Accepted { .. } => "accepted",
            SubmissionStatus::Invalid(_) => "invalid",
            SubmissionStatus::RateLimited { .. } => "rate_limited",
        };
        self.submissions
            .with_label_values(&[form.as_str(), label])
            .inc();
        if outcome.suspicious {
            self.suspicious.inc();
        }
    }

    pub fn submissions(&self, form: FormKind, outcome: &str) -> u64 {
        self.submissions
            .with_label_values(&[form.as_str(), outcome])
            .get()
    }

    /// Render all metrics in the Prometheus text format.
    pub fn render(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
