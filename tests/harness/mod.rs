// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test harness for form abuse simulation.
//!
//! This module provides utilities for replaying scripted submission
//! patterns against a `FormGuard` to validate its controls.

pub mod attacks;
pub mod generators;
pub mod metrics;
