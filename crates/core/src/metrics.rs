//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Catalogue enumeration (pages, fallback fetches)
//! - Result cache lookups
//! - Playback resolution (strategies, relay probes)
//! - Pipeline runs

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Catalogue Metrics
// =============================================================================

/// Catalogue page fetches by outcome.
pub static CATALOGUE_PAGES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "bilicast_catalogue_pages_total",
            "Total catalogue page fetches",
        ),
        &["outcome"], // "ok", "empty", "throttled", "transport_error", "error"
    )
    .unwrap()
});

/// Fallback fetches by client identity and result.
pub static FALLBACK_FETCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "bilicast_fallback_fetches_total",
            "Total fallback catalogue fetches",
        ),
        &["client", "result"], // result: "success", "empty", "error"
    )
    .unwrap()
});

// =============================================================================
// Cache Metrics
// =============================================================================

/// Result cache lookups by result.
pub static CACHE_LOOKUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("bilicast_cache_lookups_total", "Total result cache lookups"),
        &["result"], // "hit", "miss", "expired"
    )
    .unwrap()
});

// =============================================================================
// Resolver Metrics
// =============================================================================

/// Playback resolutions by winning strategy ("none" when all failed).
pub static RESOLUTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "bilicast_resolutions_total",
            "Total playback resolutions by selected strategy",
        ),
        &["strategy"],
    )
    .unwrap()
});

/// Relay probes by result.
pub static RELAY_PROBES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("bilicast_relay_probes_total", "Total relay probes"),
        &["result"], // "reachable", "unreachable", "error"
    )
    .unwrap()
});

// =============================================================================
// Pipeline Metrics
// =============================================================================

/// Pipeline run duration in seconds.
pub static PIPELINE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "bilicast_pipeline_duration_seconds",
            "Duration of pipeline runs",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["source"], // "cache", "fresh"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Catalogue
        Box::new(CATALOGUE_PAGES.clone()),
        Box::new(FALLBACK_FETCHES.clone()),
        // Cache
        Box::new(CACHE_LOOKUPS.clone()),
        // Resolver
        Box::new(RESOLUTIONS.clone()),
        Box::new(RELAY_PROBES.clone()),
        // Pipeline
        Box::new(PIPELINE_DURATION.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_metrics_register() {
        let registry = prometheus::Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }
        CACHE_LOOKUPS.with_label_values(&["hit"]).inc();
        assert!(registry
            .gather()
            .iter()
            .any(|f| f.get_name() == "bilicast_cache_lookups_total"));
    }
}
