// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for form-guard.
//!
//! Default thresholds follow the submission policies of the alliance
//! website forms: the contact form allows 3 attempts per 5 minutes and the
//! institutional membership application 2 attempts per 10 minutes.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration for the form-guard service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Origins whose pages may post forms (default: https://localhost)
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    /// Take the client address from `X-Forwarded-For` / `X-Real-IP`.
    /// Only enable behind a proxy that overwrites them (default: false)
    #[serde(default)]
    pub trust_forwarded_headers: bool,

    /// Per-form submission throttling
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Security event monitor configuration
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Sliding-window limit for one logical form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitPolicy {
    /// Attempts allowed inside the window
    pub max_attempts: u32,

    /// Trailing window length in milliseconds
    pub window_ms: u64,
}

impl RateLimitPolicy {
    pub const fn new(max_attempts: u32, window_ms: u64) -> Self {
        Self {
            max_attempts,
            window_ms,
        }
    }

    /// Get the window duration
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

/// Submission throttling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Contact form (default: 3 attempts / 5 minutes)
    #[serde(default = "default_contact_policy")]
    pub contact: RateLimitPolicy,

    /// Institutional membership application (default: 2 attempts / 10 minutes)
    #[serde(default = "default_institutional_policy")]
    pub institutional_membership: RateLimitPolicy,

    /// Individual membership application (default: 3 attempts / 10 minutes)
    #[serde(default = "default_individual_policy")]
    pub individual_membership: RateLimitPolicy,

    /// Event registration (default: 5 attempts / 10 minutes)
    #[serde(default = "default_event_policy")]
    pub event_registration: RateLimitPolicy,

    /// Interval between idle-key sweeps in seconds, 0 disables (default: 600)
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
}

/// Security event monitor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Ring buffer capacity (default: 100)
    #[serde(default = "default_max_events")]
    pub max_events: usize,

    /// Trailing window inspected for bursts in milliseconds (default: 300000)
    #[serde(default = "default_suspicious_window_ms")]
    pub suspicious_window_ms: u64,

    /// Validation failures tolerated inside the window (default: 5)
    #[serde(default = "default_validation_failure_threshold")]
    pub validation_failure_threshold: usize,

    /// Submissions tolerated inside the window (default: 3)
    #[serde(default = "default_submission_threshold")]
    pub submission_threshold: usize,

    /// Record panics as monitor events (default: true)
    #[serde(default = "default_true")]
    pub capture_panics: bool,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_allowed_origins() -> Vec<String> {
    vec!["https://localhost".to_string()]
}

fn default_contact_policy() -> RateLimitPolicy {
    RateLimitPolicy::new(3, 5 * 60 * 1000)
}

fn default_institutional_policy() -> RateLimitPolicy {
    RateLimitPolicy::new(2, 10 * 60 * 1000)
}

fn default_individual_policy() -> RateLimitPolicy {
    RateLimitPolicy::new(3, 10 * 60 * 1000)
}

fn default_event_policy() -> RateLimitPolicy {
    RateLimitPolicy::new(5, 10 * 60 * 1000)
}

fn default_cleanup_interval_secs() -> u64 {
    600
}

fn default_max_events() -> usize {
    100
}

fn default_suspicious_window_ms() -> u64 {
    5 * 60 * 1000
}

fn default_validation_failure_threshold() -> usize {
    5
}

fn default_submission_threshold() -> usize {
    3
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            allowed_origins: default_allowed_origins(),
            trust_forwarded_headers: false,
            rate_limit: RateLimitConfig::default(),
            monitor: MonitorConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            contact: default_contact_policy(),
            institutional_membership: default_institutional_policy(),
            individual_membership: default_individual_policy(),
            event_registration: default_event_policy(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            max_events: default_max_events(),
            suspicious_window_ms: default_suspicious_window_ms(),
            validation_failure_threshold: default_validation_failure_threshold(),
            submission_threshold: default_submission_threshold(),
            capture_panics: default_true(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file. Missing keys take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Parse configuration from a JSON document.
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

impl RateLimitConfig {
    /// Longest window of any form; idle keys older than this hold no state.
    pub fn longest_window(&self) -> Duration {
        [
            self.contact,
            self.institutional_membership,
            self.individual_membership,
            self.event_registration,
        ]
        .iter()
        .map(RateLimitPolicy::window)
        .max()
        .unwrap_or_default()
    }

    /// Get the idle-key sweep interval
    pub fn cleanup_interval(&self) -> Option<Duration> {
        (self.cleanup_interval_secs > 0).then(|| Duration::from_secs(self.cleanup_interval_secs))
    }
}

impl MonitorConfig {
    /// Get the suspicious-activity window
    pub fn suspicious_window(&self) -> Duration {
        Duration::from_millis(self.suspicious_window_ms)
    }
}
