//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the tracery server:
//! - HTTP request metrics (latency, counts)
//! - Conversion load and artifact counts (collected dynamically)
//! - Core conversion metrics re-registered from `tracery_core::metrics`

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use regex_lite::Regex;
use tracing::warn;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "tracery_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tracery_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "tracery_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Service Metrics (collected dynamically)
// =============================================================================

/// Conversion jobs currently running.
pub static ACTIVE_JOBS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "tracery_active_jobs",
        "Number of conversion jobs currently running",
    )
    .unwrap()
});

/// Artifacts held by the store, including expired ones not yet swept.
pub static ARTIFACTS_HELD: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("tracery_artifacts_held", "Number of artifacts in the store").unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Service
    registry.register(Box::new(ACTIVE_JOBS.clone())).unwrap();
    registry.register(Box::new(ARTIFACTS_HELD.clone())).unwrap();

    // Core metrics (jobs, fetches, artifacts)
    for metric in tracery_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so the gauges reflect the service right now.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    ACTIVE_JOBS.set(state.service().active_jobs() as i64);
    ARTIFACTS_HELD.set(state.store().len().await as i64);
}

static HANDLE_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9a-f]{32}\.[a-z0-9]+").unwrap());

/// Normalize a path for metric labels (replace artifact handles with a placeholder).
pub fn normalize_path(path: &str) -> String {
    HANDLE_SEGMENT.replace_all(path, "{handle}").to_string()
}
