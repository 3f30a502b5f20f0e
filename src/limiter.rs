// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Sliding-window rate limiter for form submissions.
//!
//! Each logical form key owns the timestamps of its allowed attempts inside
//! the trailing window. Rejected attempts are never recorded, so hammering a
//! blocked form does not extend the block.
//!
//! Keys are not expired by the checks themselves; `prune_idle` drops keys
//! whose windows have emptied and is meant to be called periodically.

use crate::config::RateLimitPolicy;
use chrono::Utc;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::debug;

/// Result of a rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitResult {
    /// Attempt is allowed and has been recorded
    Allowed {
        /// Attempts left in the current window
        remaining: u32,
        /// Time until the oldest recorded attempt leaves the window
        reset_in: Duration,
    },
    /// Attempt is rejected and was not recorded
    Limited {
        /// Time until another attempt will be accepted
        retry_after: Duration,
    },
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

/// Attempt timestamps for one key, oldest first, in ms since the epoch.
type RateWindow = VecDeque<i64>;

/// Thread-safe sliding-window rate limiter.
#[derive(Debug, Default)]
pub struct RateLimiter {
    windows: Mutex<HashMap<String, RateWindow>>,
}

impl RateLimiter {
    /// Create an empty rate limiter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an attempt for `key` unless `max_attempts` have already been
    /// allowed within `window`.
    pub fn is_allowed(&self, key: &str, max_attempts: u32, window: Duration) -> bool {
        self.is_allowed_at(key, max_attempts, window, now_millis())
    }

    /// [`Self::is_allowed`] against an explicit clock reading.
    pub fn is_allowed_at(&self, key: &str, max_attempts: u32, window: Duration, now: i64) -> bool {
        self.check_at(key, RateLimitPolicy::new(max_attempts, window_millis(window) as u64), now)
            .is_allowed()
    }

    /// Time until the oldest recorded attempt for `key` leaves `window`.
    /// Zero when nothing is recorded.
    pub fn remaining_time(&self, key: &str, window: Duration) -> Duration {
        self.remaining_time_at(key, window, now_millis())
    }

    /// [`Self::remaining_time`] against an explicit clock reading.
    pub fn remaining_time_at(&self, key: &str, window: Duration, now: i64) -> Duration {
        let window_ms = window_millis(window);
        let mut windows = self.lock();

        match windows.get_mut(key) {
            Some(attempts) => {
                prune(attempts, now, window_ms);
                time_until_oldest_expires(attempts, now, window_ms)
            }
            None => Duration::ZERO,
        }
    }

    /// Check and record an attempt under `policy`.
    pub fn check(&self, key: &str, policy: RateLimitPolicy) -> RateLimitResult {
        self.check_at(key, policy, now_millis())
    }

    /// [`Self::check`] against an explicit clock reading.
    pub fn check_at(&self, key: &str, policy: RateLimitPolicy, now: i64) -> RateLimitResult {
        let window_ms = window_millis(policy.window());
        let mut windows = self.lock();
        let attempts = windows.entry(key.to_string()).or_default();

        prune(attempts, now, window_ms);

        if attempts.len() >= policy.max_attempts as usize {
            let retry_after = time_until_oldest_expires(attempts, now, window_ms);
            debug!(key = %key, ?retry_after, max_attempts = policy.max_attempts, "Rate limit exceeded");
            return RateLimitResult::Limited { retry_after };
        }

        attempts.push_back(now);
        let remaining = policy.max_attempts.saturating_sub(attempts.len() as u32);
        RateLimitResult::Allowed {
            remaining,
            reset_in: time_until_oldest_expires(attempts, now, window_ms),
        }
    }

    /// Number of attempts currently recorded for `key` (without pruning).
    pub fn attempts(&self, key: &str) -> usize {
        self.lock().get(key).map_or(0, VecDeque::len)
    }

    /// Number of keys holding state.
    pub fn tracked_keys(&self) -> usize {
        self.lock().len()
    }

    /// Forget all attempts for `key`.
    pub fn reset(&self, key: &str) {
        self.lock().remove(key);
    }

    /// Drop keys with no attempt inside `window`. Returns how many were dropped.
    pub fn prune_idle(&self, window: Duration) -> usize {
        self.prune_idle_at(window, now_millis())
    }

    /// [`Self::prune_idle`] against an explicit clock reading.
    pub fn prune_idle_at(&self, window: Duration, now: i64) -> usize {
        let window_ms = window_millis(window);
        let mut windows = self.lock();
        let before = windows.len();

        windows.retain(|_, attempts| {
            prune(attempts, now, window_ms);
            !attempts.is_empty()
        });

        let dropped = before - windows.len();
        if dropped > 0 {
            debug!(dropped, remaining = windows.len(), "Pruned idle rate limit keys");
        }
        dropped
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, RateWindow>> {
        self.windows.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Current time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn window_millis(window: Duration) -> i64 {
    i64::try_from(window.as_millis()).unwrap_or(i64::MAX)
}

/// Keep only attempts with `now - ts < window_ms`.
fn prune(attempts: &mut RateWindow, now: i64, window_ms: i64) {
    while let Some(&oldest) = attempts.front() {
        if now.saturating_sub(oldest) < window_ms {
            break;
        }
        attempts.pop_front();
    }
}

fn time_until_oldest_expires(attempts: &RateWindow, now: i64, window_ms: i64) -> Duration {
    attempts
        .front()
        .map(|&oldest| window_ms.saturating_sub(now.saturating_sub(oldest)).max(0))
        .map_or(Duration::ZERO, |ms| Duration::from_millis(ms as u64))
}
