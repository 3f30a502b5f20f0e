// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Submission pipeline tying the limiter, validator and monitor together.
//!
//! A `FormGuard` is constructed by the application and handed to whatever
//! serves the forms; nothing in this crate keeps global state.

use crate::config::Config;
use crate::forms::FormKind;
use crate::limiter::{RateLimitResult, RateLimiter};
use crate::monitor::{SecurityEventType, SecurityMonitor};
use crate::sanitizer::sanitize_values;
use crate::validator::{validate, FormValues, ValidationResult};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Who is submitting.
#[derive(Debug, Clone, Default)]
pub struct SubmissionContext {
    /// Scopes the rate limit key; one shared window per form when absent
    pub client_id: Option<String>,
    pub user_agent: Option<String>,
}

impl SubmissionContext {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: Some(client_id.into()),
            user_agent: None,
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

/// What happened to a submission.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionStatus {
    /// Passed every check; carries the sanitized values to forward
    Accepted { values: FormValues },
    /// Failed validation
    Invalid(ValidationResult),
    /// Too many attempts in the form's window
    RateLimited { retry_after: Duration },
}

/// A submission status plus the advisory suspicious-activity flag.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionOutcome {
    pub status: SubmissionStatus,
    pub suspicious: bool,
}

impl SubmissionOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self.status, SubmissionStatus::Accepted { .. })
    }
}

/// Owns the per-process limiter and monitor for all forms.
#[derive(Debug)]
pub struct FormGuard {
    config: Config,
    limiter: RateLimiter,
    monitor: Arc<SecurityMonitor>,
}

impl Default for FormGuard {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl FormGuard {
    pub fn new(config: Config) -> Self {
        let monitor = Arc::new(SecurityMonitor::new(config.monitor.clone()));
        Self::with_monitor(config, monitor)
    }

    /// Share an existing monitor, e.g. one already wired to the panic hook.
    pub fn with_monitor(config: Config, monitor: Arc<SecurityMonitor>) -> Self {
        Self {
            config,
            limiter: RateLimiter::new(),
            monitor,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn monitor(&self) -> &Arc<SecurityMonitor> {
        &self.monitor
    }

    /// Validate without consuming a rate limit attempt.
    pub fn validate(&self, form: FormKind, values: &FormValues) -> ValidationResult {
        validate(values, form.rules())
    }

    /// Throttle, validate and log one submission.
    pub fn submit(
        &self,
        form: FormKind,
        values: &FormValues,
        context: &SubmissionContext,
    ) -> SubmissionOutcome {
        let key = form.rate_limit_key(context.client_id.as_deref());
        let policy = form.policy(&self.config.rate_limit);
        let user_agent = context.user_agent.as_deref();

        let status = match self.limiter.check(&key, policy) {
            RateLimitResult::Limited { retry_after } => {
                self.monitor.log_event_with_agent(
                    SecurityEventType::RateLimitExceeded,
                    json!({
                        "form": form.as_str(),
                        "key": key,
                        "retry_after_ms": retry_after.as_millis() as u64,
                    }),
                    user_agent,
                );
                SubmissionStatus::RateLimited { retry_after }
            }
            RateLimitResult::Allowed { remaining, .. } => {
                debug!(form = %form, key = %key, remaining, "Submission attempt allowed");
                let result = validate(values, form.rules());

                if result.is_valid() {
                    self.monitor.log_event_with_agent(
                        SecurityEventType::FormSubmission,
                        json!({ "form": form.as_str(), "success": true }),
                        user_agent,
                    );
                    SubmissionStatus::Accepted {
                        values: sanitize_values(values),
                    }
                } else {
                    self.monitor.log_event_with_agent(
                        SecurityEventType::ValidationFailure,
                        json!({
                            "form": form.as_str(),
                            "fields": result.errors().keys().collect::<Vec<_>>(),
                        }),
                        user_agent,
                    );
                    SubmissionStatus::Invalid(result)
                }
            }
        };

        let suspicious = self.monitor.detect_suspicious_activity();
        if suspicious {
            info!(form = %form, key = %key, "Suspicious form activity detected");
            self.monitor.log_event_with_agent(
                SecurityEventType::SuspiciousActivity,
                json!({ "form": form.as_str(), "key": key }),
                user_agent,
            );
        }

        SubmissionOutcome { status, suspicious }
    }

    /// Record a failure reported after an accepted submission was forwarded.
    pub fn report_submission_error(&self, form: FormKind, error: &str, context: &SubmissionContext) {
        self.monitor.log_event_with_agent(
            SecurityEventType::SubmissionError,
            json!({ "form": form.as_str(), "success": false, "error": error }),
            context.user_agent.as_deref(),
        );
    }

    /// Drop rate limit keys idle for longer than any form's window.
    pub fn prune_idle(&self) -> usize {
        self.limiter
            .prune_idle(self.config.rate_limit.longest_window())
    }
}
