//! Prometheus metrics for governor aggregation
//!
//! # Exported metrics
//! - `governor_extraction_skipped_total` (counter): malformed report entries labeled by reason.
//! - `governor_quorum_unreached_total` (counter): chain/metric pairs without quorum labeled by metric.
//! - `governor_aggregation_duration_seconds` (histogram): aggregation time labeled by operation.
//! - `governor_source_fetch_errors_total` (counter): failed report fetches labeled by source.

use std::sync::atomic::AtomicU64;

use once_cell::sync::Lazy;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::histogram::{exponential_buckets, Histogram};
use prometheus_client::registry::Registry;

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct SkipLabels {
    pub reason: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct MetricLabels {
    pub metric: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct OperationLabels {
    pub operation: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct SourceLabels {
    pub source: String,
}

pub static EXTRACTION_SKIPPED_TOTAL: Lazy<Family<SkipLabels, Counter<u64, AtomicU64>>> =
    Lazy::new(Family::default);

pub static QUORUM_UNREACHED_TOTAL: Lazy<Family<MetricLabels, Counter<u64, AtomicU64>>> =
    Lazy::new(Family::default);

pub static AGGREGATION_DURATION_SECONDS: Lazy<Family<OperationLabels, Histogram>> =
    Lazy::new(|| {
        fn aggregation_histogram() -> Histogram {
            // 10µs .. ~0.33s across 16 buckets
            Histogram::new(exponential_buckets(0.00001, 2.0, 16))
        }
        Family::new_with_constructor(aggregation_histogram)
    });

pub static SOURCE_FETCH_ERRORS_TOTAL: Lazy<Family<SourceLabels, Counter<u64, AtomicU64>>> =
    Lazy::new(Family::default);

/// Registry holding every governor metric
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let mut registry = Registry::default();
    registry.register(
        "governor_extraction_skipped",
        "Malformed guardian report entries skipped during extraction",
        EXTRACTION_SKIPPED_TOTAL.clone(),
    );
    registry.register(
        "governor_quorum_unreached",
        "Chain and metric pairs reported by fewer guardians than the quorum",
        QUORUM_UNREACHED_TOTAL.clone(),
    );
    registry.register(
        "governor_aggregation_duration_seconds",
        "Time spent aggregating a report snapshot",
        AGGREGATION_DURATION_SECONDS.clone(),
    );
    registry.register(
        "governor_source_fetch_errors",
        "Report source fetches that failed",
        SOURCE_FETCH_ERRORS_TOTAL.clone(),
    );
    registry
});

pub fn record_extraction_skip(reason: &str) {
    EXTRACTION_SKIPPED_TOTAL
        .get_or_create(&SkipLabels {
            reason: reason.to_string(),
        })
        .inc();
}

pub fn record_quorum_unreached(metric: &str) {
    QUORUM_UNREACHED_TOTAL
        .get_or_create(&MetricLabels {
            metric: metric.to_string(),
        })
        .inc();
}

pub fn observe_aggregation(operation: &str, seconds: f64) {
    AGGREGATION_DURATION_SECONDS
        .get_or_create(&OperationLabels {
            operation: operation.to_string(),
        })
        .observe(seconds);
}

pub fn record_source_fetch_error(source: &str) {
    SOURCE_FETCH_ERRORS_TOTAL
        .get_or_create(&SourceLabels {
            source: source.to_string(),
        })
        .inc();
}

/// Text exposition of [`REGISTRY`]
pub fn encode() -> String {
    let mut buffer = String::new();
    if let Err(e) = prometheus_client::encoding::text::encode(&mut buffer, &REGISTRY) {
        tracing::error!("Failed to encode metrics: {}", e);
    }
    buffer
}
