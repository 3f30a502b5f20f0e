// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Error types for form-guard infrastructure.
//!
//! Field-level validation problems and rate-limit rejections are ordinary
//! results, not errors; this enum only covers lookups and configuration.

use thiserror::Error;

/// Application error types
#[derive(Debug, Error)]
pub enum GuardError {
    #[error("Unknown form: {0}")]
    UnknownForm(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Configuration file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, GuardError>;
