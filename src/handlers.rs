// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the form-guard service.
//!
//! Page-level form components post their values here before forwarding
//! them; the service answers whether the submission may proceed.

use crate::forms::FormKind;
use crate::guard::{FormGuard, SubmissionContext, SubmissionStatus};
use crate::metrics::Metrics;
use crate::monitor::SecurityEventType;
use crate::validator::{FormValues, ValidationResult};
use axum::{
    extract::{ConnectInfo, Path, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

/// Shared application state.
pub struct AppState {
    pub guard: FormGuard,
    pub metrics: Metrics,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_ms: Option<u64>,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Submission response.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub accepted: bool,
    pub suspicious: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<FormValues>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_ms: Option<u64>,
}

/// Monitor summary.
#[derive(Debug, Serialize)]
pub struct SecurityStatusResponse {
    pub suspicious: bool,
    pub events: usize,
    pub validation_failures: usize,
    pub rate_limit_rejections: usize,
    pub submissions: usize,
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    let metrics_path = state.guard.config().metrics.path.clone();
    let mut router = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/forms/:form/validate", post(validate_form))
        .route("/forms/:form/submit", post(submit_form))
        .route("/security/status", get(security_status));

    if state.guard.config().metrics.enabled {
        router = router.route(&metrics_path, get(metrics));
    }

    let cors = cors_layer(&state.guard.config().allowed_origins);
    router
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Restrict cross-origin posts to the configured site origins.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "form-guard",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Validate values without counting a submission attempt.
pub async fn validate_form(
    State(state): State<Arc<AppState>>,
    Path(form): Path<String>,
    Json(values): Json<FormValues>,
) -> Result<Json<ValidationResult>, Response> {
    let form = parse_form(&form)?;
    Ok(Json(state.guard.validate(form, &values)))
}

/// Throttle, validate and log a submission.
pub async fn submit_form(
    State(state): State<Arc<AppState>>,
    Path(form): Path<String>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(values): Json<FormValues>,
) -> Response {
    let form = match parse_form(&form) {
        Ok(form) => form,
        Err(response) => return response,
    };

    let context = SubmissionContext {
        client_id: Some(client_id(
            connect_info.map(|ConnectInfo(addr)| addr),
            &headers,
            state.guard.config().trust_forwarded_headers,
        )),
        user_agent: headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };

    debug!(form = %form, client = ?context.client_id, "Processing submission");

    let outcome = state.guard.submit(form, &values, &context);
    state.metrics.observe(form, &outcome);
    let suspicious = outcome.suspicious;

    match outcome.status {
        SubmissionStatus::Accepted { values } => {
            info!(form = %form, client = ?context.client_id, "Submission accepted");
            (
                StatusCode::OK,
                Json(SubmitResponse {
                    accepted: true,
                    suspicious,
                    values: Some(values),
                    errors: BTreeMap::new(),
                    retry_after_ms: None,
                }),
            )
                .into_response()
        }
        SubmissionStatus::Invalid(result) => {
            info!(form = %form, fields = result.errors().len(), "Submission failed validation");
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(SubmitResponse {
                    accepted: false,
                    suspicious,
                    values: None,
                    errors: result.into_errors(),
                    retry_after_ms: None,
                }),
            )
                .into_response()
        }
        SubmissionStatus::RateLimited { retry_after } => {
            warn!(
                form = %form,
                client = ?context.client_id,
                retry_after_ms = retry_after.as_millis() as u64,
                "Submission rate limited"
            );
            (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, retry_after_secs(retry_after).to_string())],
                Json(SubmitResponse {
                    accepted: false,
                    suspicious,
                    values: None,
                    errors: BTreeMap::new(),
                    retry_after_ms: Some(retry_after.as_millis() as u64),
                }),
            )
                .into_response()
        }
    }
}

/// Summary of the security monitor.
pub async fn security_status(State(state): State<Arc<AppState>>) -> Json<SecurityStatusResponse> {
    let monitor = state.guard.monitor();
    Json(SecurityStatusResponse {
        suspicious: monitor.detect_suspicious_activity(),
        events: monitor.len(),
        validation_failures: monitor.count(SecurityEventType::ValidationFailure),
        rate_limit_rejections: monitor.count(SecurityEventType::RateLimitExceeded),
        submissions: monitor.count(SecurityEventType::FormSubmission),
    })
}

/// Prometheus text exposition.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics.render() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to render metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[allow(clippy::result_large_err)]
fn parse_form(name: &str) -> Result<FormKind, Response> {
    name.parse().map_err(|err: crate::GuardError| {
        debug!(form = %name, "Unknown form requested");
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: err.to_string(),
                code: "UNKNOWN_FORM",
                retry_after_ms: None,
            }),
        )
            .into_response()
    })
}

/// Round a wait up to whole seconds for the `Retry-After` header.
fn retry_after_secs(retry_after: Duration) -> u64 {
    let secs = retry_after.as_secs();
    if retry_after.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

/// Identify the client by its peer address. With `trust_forwarded` the
/// first `X-Forwarded-For` hop, then `X-Real-IP`, take precedence.
pub fn client_id(addr: Option<SocketAddr>, headers: &HeaderMap, trust_forwarded: bool) -> String {
    if trust_forwarded {
        if let Some(ip) = forwarded_client(headers) {
            return ip;
        }
    }

    addr.map(|a| a.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn forwarded_client(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());
    if let Some(ip) = forwarded {
        return Some(ip.to_string());
    }

    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
}
