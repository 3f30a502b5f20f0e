// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Form Guard
//!
//! Protects the alliance website's contact, membership and event
//! registration forms:
//!
//! - Input sanitization (markup and script neutralization)
//! - Declarative per-field validation with shared rule presets
//! - Sliding-window submission throttling per form and client
//! - Bounded security event log with burst detection

pub mod config;
pub mod error;
pub mod forms;
pub mod guard;
pub mod handlers;
pub mod limiter;
pub mod metrics;
pub mod monitor;
pub mod rules;
pub mod sanitizer;
pub mod validator;

pub use config::{Config, RateLimitPolicy};
pub use error::{GuardError, Result};
pub use forms::FormKind;
pub use guard::{FormGuard, SubmissionContext, SubmissionOutcome, SubmissionStatus};
pub use limiter::{RateLimitResult, RateLimiter};
pub use monitor::{SecurityEvent, SecurityEventType, SecurityMonitor};
pub use rules::{presets, ValidationRule, ValidationRuleSet};
pub use sanitizer::sanitize;
pub use validator::{validate, FieldValue, FileUpload, FormValues, ValidationResult};
