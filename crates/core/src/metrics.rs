//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Conversion jobs (outcomes, durations, optimizer fallbacks)
//! - Remote fetches
//! - Artifact storage (stored, swept)

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Jobs
// =============================================================================

/// Conversion jobs by terminal status and requested format.
pub static CONVERSIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tracery_conversions_total", "Total conversion jobs"),
        &["status", "format"], // "succeeded" | "failed", "svg" | "png"
    )
    .unwrap()
});

/// Conversion job duration in seconds.
pub static CONVERSION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "tracery_conversion_duration_seconds",
            "Duration of a conversion job from fetch to finalize",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &["status"],
    )
    .unwrap()
});

/// Jobs that fell back to the unoptimized document.
pub static OPTIMIZER_FALLBACKS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "tracery_optimizer_fallbacks_total",
        "Jobs that kept the unoptimized document after an optimizer failure",
    )
    .unwrap()
});

/// Items per batch.
pub static BATCH_SIZE: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new("tracery_batch_size", "Number of items per conversion batch")
            .buckets(vec![1.0, 2.0, 5.0, 10.0, 25.0, 50.0]),
    )
    .unwrap()
});

// =============================================================================
// Fetching
// =============================================================================

/// Remote fetch failures by reason.
pub static FETCH_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tracery_fetch_failures_total", "Remote image fetch failures"),
        &["reason"], // "timeout", "oversized", "not_an_image", "status", "request"
    )
    .unwrap()
});

// =============================================================================
// Artifacts
// =============================================================================

/// Artifacts stored by kind.
pub static ARTIFACTS_STORED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tracery_artifacts_stored_total", "Artifacts written to the store"),
        &["kind"],
    )
    .unwrap()
});

/// Artifacts removed by expiry sweeps.
pub static ARTIFACTS_SWEPT: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "tracery_artifacts_swept_total",
        "Artifacts removed after their retention window",
    )
    .unwrap()
});

/// Returns all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(CONVERSIONS_TOTAL.clone()),
        Box::new(CONVERSION_DURATION.clone()),
        Box::new(OPTIMIZER_FALLBACKS.clone()),
        Box::new(BATCH_SIZE.clone()),
        Box::new(FETCH_FAILURES.clone()),
        Box::new(ARTIFACTS_STORED.clone()),
        Box::new(ARTIFACTS_SWEPT.clone()),
    ]
}
