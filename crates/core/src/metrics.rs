//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Search pipeline (requests, debounce cancellations)
//! - Offline cache (fallbacks, swallowed write failures)
//! - Remote catalog (request durations)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Search Pipeline Metrics
// =============================================================================

/// Search executions by kind and outcome.
pub static SEARCH_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "moviebrowser_search_requests_total",
            "Total search executions reaching the catalog",
        ),
        &["kind", "result"], // kind: "first_page", "next_page"; result: "online", "offline", "error", "discarded"
    )
    .unwrap()
});

/// Scheduled searches superseded before they ran or applied.
pub static DEBOUNCE_CANCELLATIONS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "moviebrowser_debounce_cancellations_total",
        "Searches cancelled by a newer query edit or refresh",
    )
    .unwrap()
});

// =============================================================================
// Cache Metrics
// =============================================================================

/// Offline fallbacks by result.
pub static CACHE_FALLBACKS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "moviebrowser_cache_fallbacks_total",
            "Cache reads after a connectivity failure",
        ),
        &["result"], // "hit", "miss"
    )
    .unwrap()
});

/// Cache writes that failed and were swallowed.
pub static CACHE_WRITE_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "moviebrowser_cache_write_failures_total",
        "Failed cache writes after a successful search",
    )
    .unwrap()
});

// =============================================================================
// Remote Catalog Metrics
// =============================================================================

/// Remote catalog request duration in seconds.
pub static REMOTE_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "moviebrowser_remote_request_duration_seconds",
            "Duration of remote catalog requests",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["operation"], // "search", "details"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(SEARCH_REQUESTS.clone()),
        Box::new(DEBOUNCE_CANCELLATIONS.clone()),
        Box::new(CACHE_FALLBACKS.clone()),
        Box::new(CACHE_WRITE_FAILURES.clone()),
        Box::new(REMOTE_REQUEST_DURATION.clone()),
    ]
}
