// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Form Guard Service
//!
//! Sanitizes, validates and throttles form submissions for the alliance
//! website before they are forwarded to the CMS or mailer.
//!
//! ## Configuration
//!
//! Configuration is read from the JSON file named by `FORM_GUARD_CONFIG`
//! (optional), then overridden by environment variables:
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `TRUST_FORWARDED_HEADERS`: key clients on `X-Forwarded-For` / `X-Real-IP` (default: false)
//! - `ALLOWED_ORIGINS`: comma-separated origins allowed to post forms (default: https://localhost)
//! - `CONTACT_MAX_ATTEMPTS` / `CONTACT_WINDOW_MS`: contact form throttle (default: 3 / 300000)
//! - `INSTITUTIONAL_MAX_ATTEMPTS` / `INSTITUTIONAL_WINDOW_MS`: (default: 2 / 600000)
//! - `INDIVIDUAL_MAX_ATTEMPTS` / `INDIVIDUAL_WINDOW_MS`: (default: 3 / 600000)
//! - `EVENT_MAX_ATTEMPTS` / `EVENT_WINDOW_MS`: (default: 5 / 600000)
//! - `MONITOR_MAX_EVENTS`: security event log capacity (default: 100)
//! - `METRICS_ENABLED`: expose Prometheus metrics (default: true)

use anyhow::Context;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use form_guard::{
    config::{Config, RateLimitPolicy},
    guard::FormGuard,
    handlers::{router, AppState},
    metrics::Metrics,
    monitor::{install_panic_hook, SecurityMonitor},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let config = load_config()?;
    info!(
        bind_addr = %config.bind_addr,
        contact = ?config.rate_limit.contact,
        institutional_membership = ?config.rate_limit.institutional_membership,
        max_events = config.monitor.max_events,
        "Starting form guard"
    );

    let monitor = Arc::new(SecurityMonitor::new(config.monitor.clone()));
    if config.monitor.capture_panics {
        install_panic_hook(Arc::clone(&monitor));
    }

    let state = Arc::new(AppState {
        guard: FormGuard::with_monitor(config.clone(), monitor),
        metrics: Metrics::new().context("registering metrics")?,
    });

    // Spawn idle-key cleanup task
    if let Some(period) = config.rate_limit.cleanup_interval() {
        let cleanup_state = state.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                cleanup_state.guard.prune_idle();
            }
        });
    }

    let app = router(state);

    let addr: SocketAddr = config
        .bind_addr
        .parse()
        .with_context(|| format!("invalid bind address {}", config.bind_addr))?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}

/// Load configuration from the optional file, then the environment.
fn load_config() -> anyhow::Result<Config> {
    let mut config = match std::env::var("FORM_GUARD_CONFIG") {
        Ok(path) => Config::from_file(&path)
            .with_context(|| format!("loading configuration from {path}"))?,
        Err(_) => Config::default(),
    };

    if let Ok(bind_addr) = std::env::var("BIND_ADDR") {
        config.bind_addr = bind_addr;
    }
    if let Ok(origins) = std::env::var("ALLOWED_ORIGINS") {
        config.allowed_origins = origins.split(',').map(|o| o.trim().to_string()).collect();
    }

    if let Some(trust) = env_parse("TRUST_FORWARDED_HEADERS") {
        config.trust_forwarded_headers = trust;
    }

    let limits = &mut config.rate_limit;
    override_policy(&mut limits.contact, "CONTACT");
    override_policy(&mut limits.institutional_membership, "INSTITUTIONAL");
    override_policy(&mut limits.individual_membership, "INDIVIDUAL");
    override_policy(&mut limits.event_registration, "EVENT");

    if let Some(max_events) = env_parse("MONITOR_MAX_EVENTS") {
        config.monitor.max_events = max_events;
    }
    if let Some(enabled) = env_parse("METRICS_ENABLED") {
        config.metrics.enabled = enabled;
    }

    Ok(config)
}

fn override_policy(policy: &mut RateLimitPolicy, prefix: &str) {
    if let Some(max_attempts) = env_parse(&format!("{prefix}_MAX_ATTEMPTS")) {
        policy.max_attempts = max_attempts;
    }
    if let Some(window_ms) = env_parse(&format!("{prefix}_WINDOW_MS")) {
        policy.window_ms = window_ms;
    }
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}
