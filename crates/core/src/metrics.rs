//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Check outcomes
//! - Engine run duration
//! - Upload sizes
//! - Template cache effectiveness and artifact persistence

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Checks
// =============================================================================

/// Check requests by outcome.
pub static CHECKS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("omr_checks_total", "Total sheet checks"),
        &["outcome"], // "success", "bad_request", "payload_too_large", "not_found", "internal"
    )
    .unwrap()
});

/// Engine run duration in seconds.
pub static ENGINE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "omr_engine_duration_seconds",
            "Duration of OMR engine runs",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["result"], // "ok", "error"
    )
    .unwrap()
});

/// Size of accepted uploads in bytes.
pub static UPLOAD_BYTES: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new("omr_upload_bytes", "Size of ingested sheet images").buckets(vec![
            64.0 * 1024.0,
            256.0 * 1024.0,
            1024.0 * 1024.0,
            4.0 * 1024.0 * 1024.0,
            10.0 * 1024.0 * 1024.0,
            20.0 * 1024.0 * 1024.0,
        ]),
    )
    .unwrap()
});

// =============================================================================
// Templates and artifacts
// =============================================================================

pub static TEMPLATE_CACHE_HITS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("omr_template_cache_hits_total", "Template asset cache hits").unwrap()
});

pub static TEMPLATE_CACHE_MISSES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("omr_template_cache_misses_total", "Template asset cache misses").unwrap()
});

pub static ARTIFACTS_PERSISTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "omr_artifacts_persisted_total",
        "Checked sheets copied to persistent storage",
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(CHECKS_TOTAL.clone()),
        Box::new(ENGINE_DURATION.clone()),
        Box::new(UPLOAD_BYTES.clone()),
        Box::new(TEMPLATE_CACHE_HITS.clone()),
        Box::new(TEMPLATE_CACHE_MISSES.clone()),
        Box::new(ARTIFACTS_PERSISTED.clone()),
    ]
}
