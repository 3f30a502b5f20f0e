// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Metrics collection for abuse simulation results.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Collects metrics during an abuse simulation.
#[derive(Debug, Default)]
pub struct AttackMetrics {
    /// Start time of the attack
    start_time: Option<Instant>,
    /// End time of the attack
    end_time: Option<Instant>,
    /// Count of submissions by outcome
    outcomes: HashMap<Outcome, usize>,
    /// Accepted submissions by client
    accepted_per_client: HashMap<String, usize>,
    /// Accepted values still carrying markup or script
    leaked: usize,
    /// Submissions made while suspicious activity was flagged
    flagged: usize,
    /// Latency samples (microseconds)
    latencies: Vec<u64>,
}

/// Possible outcomes for a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Accepted,
    Invalid,
    RateLimited,
}

impl AttackMetrics {
    /// Create a new metrics collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the start of an attack.
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Mark the end of an attack.
    pub fn finish(&mut self) {
        self.end_time = Some(Instant::now());
    }

    /// Record a submission outcome.
    pub fn record(&mut self, outcome: Outcome, client: &str, suspicious: bool, latency: Duration) {
        *self.outcomes.entry(outcome).or_insert(0) += 1;
        if outcome == Outcome::Accepted {
            *self.accepted_per_client.entry(client.to_string()).or_insert(0) += 1;
        }
        if suspicious {
            self.flagged += 1;
        }
        self.latencies.push(latency.as_micros() as u64);
    }

    /// Record an accepted value that still looked dangerous.
    pub fn record_leak(&mut self) {
        self.leaked += 1;
    }

    /// Get total submission count.
    pub fn total(&self) -> usize {
        self.outcomes.values().sum()
    }

    /// Get count for a specific outcome.
    pub fn count(&self, outcome: Outcome) -> usize {
        self.outcomes.get(&outcome).copied().unwrap_or(0)
    }

    /// Most submissions any single client got accepted.
    pub fn max_accepted_per_client(&self) -> usize {
        self.accepted_per_client.values().copied().max().unwrap_or(0)
    }

    /// Get duration of the attack.
    pub fn duration(&self) -> Duration {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => end.duration_since(start),
            (Some(start), None) => start.elapsed(),
            _ => Duration::ZERO,
        }
    }

    /// Get block rate (ratio of rejected to total).
    pub fn block_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (total - self.count(Outcome::Accepted)) as f64 / total as f64
    }

    /// Get median latency in microseconds.
    pub fn median_latency_us(&self) -> u64 {
        if self.latencies.is_empty() {
            return 0;
        }
        let mut sorted = self.latencies.clone();
        sorted.sort_unstable();
        sorted[sorted.len() / 2]
    }

    /// Generate a summary report.
    pub fn report(&self) -> MetricsReport {
        MetricsReport {
            total: self.total(),
            accepted: self.count(Outcome::Accepted),
            invalid: self.count(Outcome::Invalid),
            rate_limited: self.count(Outcome::RateLimited),
            leaked: self.leaked,
            flagged: self.flagged,
            unique_accepted_clients: self.accepted_per_client.len(),
            max_accepted_per_client: self.max_accepted_per_client(),
            block_rate: self.block_rate(),
            duration_ms: self.duration().as_millis() as u64,
            median_latency_us: self.median_latency_us(),
        }
    }
}

/// Summary report of attack metrics.
#[derive(Debug, Clone)]
pub struct MetricsReport {
    pub total: usize,
    pub accepted: usize,
    pub invalid: usize,
    pub rate_limited: usize,
    pub leaked: usize,
    pub flagged: usize,
    pub unique_accepted_clients: usize,
    pub max_accepted_per_client: usize,
    pub block_rate: f64,
    pub duration_ms: u64,
    pub median_latency_us: u64,
}

impl std::fmt::Display for MetricsReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Abuse Simulation Report ===")?;
        writeln!(f, "Duration:          {} ms", self.duration_ms)?;
        writeln!(f, "Submissions:       {}", self.total)?;
        writeln!(f)?;
        writeln!(f, "--- Outcomes ---")?;
        writeln!(f, "Accepted:          {}", self.accepted)?;
        writeln!(f, "Invalid:           {}", self.invalid)?;
        writeln!(f, "Rate Limited:      {}", self.rate_limited)?;
        writeln!(f, "Block Rate:        {:.1}%", self.block_rate * 100.0)?;
        writeln!(f, "Leaked Markup:     {}", self.leaked)?;
        writeln!(f, "Flagged:           {}", self.flagged)?;
        writeln!(f)?;
        writeln!(f, "--- Distribution ---")?;
        writeln!(f, "Accepted Clients:  {}", self.unique_accepted_clients)?;
        writeln!(f, "Max per Client:    {}", self.max_accepted_per_client)?;
        writeln!(f, "Median Latency:    {} us", self.median_latency_us)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collection() {
        let mut metrics = AttackMetrics::new();
        metrics.start();

        metrics.record(Outcome::Accepted, "10.0.0.1", false, Duration::from_micros(100));
        metrics.record(Outcome::Accepted, "10.0.0.2", false, Duration::from_micros(150));
        metrics.record(Outcome::RateLimited, "10.0.0.1", true, Duration::from_micros(50));

        metrics.finish();

        let report = metrics.report();
        assert_eq!(report.total, 3);
        assert_eq!(report.accepted, 2);
        assert_eq!(report.rate_limited, 1);
        assert_eq!(report.flagged, 1);
        assert_eq!(report.unique_accepted_clients, 2);
    }

    #[test]
    fn test_block_rate() {
        let mut metrics = AttackMetrics::new();
        for _ in 0..3 {
            metrics.record(Outcome::Accepted, "10.0.0.1", false, Duration::ZERO);
        }
        for _ in 0..7 {
            metrics.record(Outcome::RateLimited, "10.0.0.1", false, Duration::ZERO);
        }

        assert!((metrics.block_rate() - 0.7).abs() < 0.01);
    }
}
