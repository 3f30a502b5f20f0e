// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Security event monitor.
//!
//! Keeps a bounded log of notable form events and flags bursts of
//! suspicious activity. The flag is advisory: callers decide whether to add
//! friction, the monitor never blocks anything itself.

use crate::config::MonitorConfig;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::fmt;
use std::panic;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{info, warn};

/// Kind of security event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityEventType {
    ValidationFailure,
    RateLimitExceeded,
    FormSubmission,
    SubmissionError,
    ScriptError,
    SuspiciousActivity,
}

impl SecurityEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationFailure => "validation_failure",
            Self::RateLimitExceeded => "rate_limit_exceeded",
            Self::FormSubmission => "form_submission",
            Self::SubmissionError => "submission_error",
            Self::ScriptError => "script_error",
            Self::SuspiciousActivity => "suspicious_activity",
        }
    }

    fn is_submission(&self) -> bool {
        matches!(self, Self::FormSubmission | Self::SubmissionError)
    }
}

impl fmt::Display for SecurityEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recorded event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityEvent {
    #[serde(rename = "type")]
    pub event_type: SecurityEventType,
    pub timestamp: DateTime<Utc>,
    pub details: Value,
    pub user_agent: Option<String>,
}

/// Bounded in-memory event log.
#[derive(Debug)]
pub struct SecurityMonitor {
    config: MonitorConfig,
    events: Mutex<VecDeque<SecurityEvent>>,
}

impl Default for SecurityMonitor {
    fn default() -> Self {
        Self::new(MonitorConfig::default())
    }
}

impl SecurityMonitor {
    pub fn new(config: MonitorConfig) -> Self {
        let capacity = config.max_events;
        Self {
            config,
            events: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Record an event without a user agent.
    pub fn log_event(&self, event_type: SecurityEventType, details: Value) {
        self.log_event_with_agent(event_type, details, None);
    }

    /// Record an event on behalf of a client.
    pub fn log_event_with_agent(
        &self,
        event_type: SecurityEventType,
        details: Value,
        user_agent: Option<&str>,
    ) {
        self.record(SecurityEvent {
            event_type,
            timestamp: Utc::now(),
            details,
            user_agent: user_agent.map(str::to_string),
        });
    }

    /// Append an event, evicting the oldest once the log is full.
    pub fn record(&self, event: SecurityEvent) {
        match event.event_type {
            SecurityEventType::FormSubmission => {
                info!(event_type = %event.event_type, details = %event.details, "Security event")
            }
            _ => warn!(
                event_type = %event.event_type,
                details = %event.details,
                user_agent = ?event.user_agent,
                "Security event"
            ),
        }

        if self.config.max_events == 0 {
            return;
        }

        let mut events = self.lock();
        while events.len() >= self.config.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }

    /// Whether the trailing window holds a burst of failures or submissions.
    pub fn detect_suspicious_activity(&self) -> bool {
        self.detect_suspicious_activity_at(Utc::now())
    }

    /// [`Self::detect_suspicious_activity`] against an explicit clock reading.
    pub fn detect_suspicious_activity_at(&self, now: DateTime<Utc>) -> bool {
        let since = now - to_chrono(self.config.suspicious_window());
        let events = self.lock();

        let (failures, submissions) = events
            .iter()
            .filter(|event| event.timestamp > since)
            .fold((0usize, 0usize), |(failures, submissions), event| {
                (
                    failures + usize::from(event.event_type == SecurityEventType::ValidationFailure),
                    submissions + usize::from(event.event_type.is_submission()),
                )
            });

        failures > self.config.validation_failure_threshold
            || submissions > self.config.submission_threshold
    }

    /// Snapshot of all retained events, oldest first.
    pub fn events(&self) -> Vec<SecurityEvent> {
        self.lock().iter().cloned().collect()
    }

    /// Events newer than `window`.
    pub fn recent(&self, window: Duration) -> Vec<SecurityEvent> {
        let since = Utc::now() - to_chrono(window);
        self.lock()
            .iter()
            .filter(|event| event.timestamp > since)
            .cloned()
            .collect()
    }

    /// Retained events of one type.
    pub fn count(&self, event_type: SecurityEventType) -> usize {
        self.lock()
            .iter()
            .filter(|event| event.event_type == event_type)
            .count()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<SecurityEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn to_chrono(window: Duration) -> ChronoDuration {
    ChronoDuration::from_std(window).unwrap_or_else(|_| ChronoDuration::weeks(52 * 100))
}

/// Record panics as `ScriptError` events before handing them to the
/// previously installed hook.
pub fn install_panic_hook(monitor: Arc<SecurityMonitor>) {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let payload = info.payload();
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());

        monitor.log_event(
            SecurityEventType::ScriptError,
            json!({
                "message": message,
                "location": info.location().map(|loc| format!("{}:{}", loc.file(), loc.line())),
                "thread": std::thread::current().name().map(str::to_string),
            }),
        );
        previous(info);
    }));
}
