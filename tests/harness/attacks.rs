// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Abuse patterns for security testing.

use form_guard::FormKind;

/// What each simulated submission carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    /// Well-formed values
    Valid,
    /// Well-formed values with markup and script injected into free text
    Injected,
    /// Values that fail validation
    Garbage,
}

/// Attack pattern configuration.
#[derive(Debug, Clone)]
pub struct AttackConfig {
    /// Form under attack
    pub form: FormKind,
    /// Total number of submissions
    pub total_submissions: usize,
    /// Number of distinct clients (round-robin)
    pub unique_clients: usize,
    /// Submission contents
    pub payload: Payload,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            form: FormKind::Contact,
            total_submissions: 100,
            unique_clients: 1,
            payload: Payload::Valid,
        }
    }
}

/// Predefined attack patterns.
impl AttackConfig {
    /// One client resubmitting the contact form as fast as it can.
    pub fn single_client_flood() -> Self {
        Self {
            total_submissions: 100,
            ..Default::default()
        }
    }

    /// Many clients, a few submissions each.
    pub fn distributed_flood() -> Self {
        Self {
            total_submissions: 200,
            unique_clients: 50,
            ..Default::default()
        }
    }

    /// Script and markup smuggled through free-text fields.
    pub fn injection_attempts() -> Self {
        Self {
            total_submissions: 60,
            unique_clients: 60,
            payload: Payload::Injected,
            ..Default::default()
        }
    }

    /// Junk values from many clients.
    pub fn garbage_spray() -> Self {
        Self {
            total_submissions: 40,
            unique_clients: 10,
            payload: Payload::Garbage,
            ..Default::default()
        }
    }

    /// Repeated institutional membership applications.
    pub fn membership_flood() -> Self {
        Self {
            form: FormKind::InstitutionalMembership,
            total_submissions: 30,
            unique_clients: 3,
            ..Default::default()
        }
    }

    /// Submissions each client is expected to get through.
    pub fn per_client_budget(&self, max_attempts: u32) -> usize {
        let per_client = self.total_submissions.div_ceil(self.unique_clients.max(1));
        per_client.min(max_attempts as usize)
    }
}
