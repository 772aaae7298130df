//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Conversions (per target format, success or failure kind)
//! - Archive assembly (entries appended or skipped, archives finished)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Conversion Metrics
// =============================================================================

/// Conversions total by target format and result.
pub static CONVERSIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("pixconv_conversions_total", "Total image conversions"),
        &["format", "result"], // result: "success" or a ConverterError kind
    )
    .unwrap()
});

/// Conversion duration in seconds.
pub static CONVERSION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "pixconv_conversion_duration_seconds",
            "Duration of decode plus encode for one image",
        )
        .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["format"],
    )
    .unwrap()
});

// =============================================================================
// Archive Metrics
// =============================================================================

/// Batch entries by outcome.
pub static ARCHIVE_ENTRIES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "pixconv_archive_entries_total",
            "Batch items appended to or skipped from archives",
        ),
        &["result"], // "appended", "skipped"
    )
    .unwrap()
});

/// Archives by final outcome.
pub static ARCHIVES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("pixconv_archives_total", "ZIP archives streamed"),
        &["result"], // "finished", "aborted"
    )
    .unwrap()
});

/// Returns all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Conversions
        Box::new(CONVERSIONS_TOTAL.clone()),
        Box::new(CONVERSION_DURATION.clone()),
        // Archives
        Box::new(ARCHIVE_ENTRIES_TOTAL.clone()),
        Box::new(ARCHIVES_TOTAL.clone()),
    ]
}
