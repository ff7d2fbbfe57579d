//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Engine (conversions, plan lengths, failing steps)
//! - Registry (converters skipped during discovery)
//!
//! The collectors are process-wide. Hosts register them with their own
//! `prometheus::Registry` via [`all_metrics`].

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Engine Metrics
// =============================================================================

/// Conversions total by result.
pub static CONVERSIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("fileconv_conversions_total", "Total conversion requests"),
        &["result"], // "success", "validation", "unsupported_format", "no_conversion_path", "execution", "workspace"
    )
    .unwrap()
});

/// Conversion duration in seconds.
pub static CONVERSION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "fileconv_conversion_duration_seconds",
            "Duration of conversion requests",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 300.0]),
        &["result"],
    )
    .unwrap()
});

/// Steps per executed plan.
pub static CONVERSION_STEPS: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "fileconv_conversion_steps",
            "Number of converter steps per executed plan",
        )
        .buckets(vec![1.0, 2.0, 3.0, 4.0, 5.0, 8.0]),
    )
    .unwrap()
});

/// Failed steps by converter.
pub static STEP_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "fileconv_step_failures_total",
            "Total failed conversion steps",
        ),
        &["converter"],
    )
    .unwrap()
});

// =============================================================================
// Registry Metrics
// =============================================================================

/// Converter sources skipped during discovery.
pub static REGISTRY_SKIPPED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "fileconv_registry_skipped_total",
        "Converter sources skipped during discovery",
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Engine
        Box::new(CONVERSIONS_TOTAL.clone()),
        Box::new(CONVERSION_DURATION.clone()),
        Box::new(CONVERSION_STEPS.clone()),
        Box::new(STEP_FAILURES.clone()),
        // Registry
        Box::new(REGISTRY_SKIPPED.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_metrics_register_once() {
        let registry = prometheus::Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }

        CONVERSIONS_TOTAL.with_label_values(&["success"]).inc();
        let names: Vec<String> = registry
            .gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert!(names.contains(&"fileconv_conversions_total".to_string()));
    }
}
