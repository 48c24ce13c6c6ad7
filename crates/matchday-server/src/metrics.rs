//! Prometheus metrics.
//!
//! - HTTP request count and latency
//! - Prediction cache hits, misses and errors
//! - Ingest outcomes and persisted record count

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Duration;

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metric names as constants for consistency.
pub mod names {
    pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";

    pub const CACHE_HITS_TOTAL: &str = "cache_hits_total";
    pub const CACHE_MISSES_TOTAL: &str = "cache_misses_total";
    pub const CACHE_ERRORS_TOTAL: &str = "cache_errors_total";

    pub const INGEST_BATCHES_TOTAL: &str = "ingest_batches_total";
    pub const INGEST_RECORDS_PERSISTED_TOTAL: &str = "ingest_records_persisted_total";
}

/// Request latency buckets, in seconds.
const LATENCY_BUCKETS: [f64; 10] = [0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 1.0, 2.5, 10.0];

/// Install the Prometheus recorder. Returns `false` if already installed or
/// if installation failed; the server keeps running without metrics.
pub fn init_metrics() -> bool {
    if PROMETHEUS_HANDLE.get().is_some() {
        return false;
    }

    let builder = match PrometheusBuilder::new().set_buckets_for_metric(
        Matcher::Full(names::HTTP_REQUEST_DURATION_SECONDS.to_string()),
        &LATENCY_BUCKETS,
    ) {
        Ok(builder) => builder,
        Err(e) => {
            tracing::error!(error = %e, "invalid Prometheus bucket configuration");
            return false;
        }
    };

    match builder.install_recorder() {
        Ok(handle) => match PROMETHEUS_HANDLE.set(handle) {
            Ok(()) => {
                tracing::info!("Prometheus metrics initialized");
                true
            }
            Err(_) => false,
        },
        Err(e) => {
            tracing::error!(error = %e, "Failed to install Prometheus recorder");
            false
        }
    }
}

/// Render all metrics in Prometheus text format, or `None` before `init_metrics`.
pub fn render_metrics() -> Option<String> {
    PROMETHEUS_HANDLE.get().map(|handle| handle.render())
}

pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    let status_class = match status {
        100..=199 => "1xx",
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    };

    counter!(
        names::HTTP_REQUESTS_TOTAL,
        "method" => method.to_string(),
        "path" => normalize_path(path),
        "status_class" => status_class
    )
    .increment(1);

    histogram!(
        names::HTTP_REQUEST_DURATION_SECONDS,
        "method" => method.to_string(),
        "path" => normalize_path(path)
    )
    .record(duration.as_secs_f64());
}

/// Collapse unknown paths into one label value to bound cardinality.
fn normalize_path(path: &str) -> String {
    match path {
        "/api/v1/predictions" | "/healthz" | "/readyz" | "/metrics" => path.to_string(),
        _ => "other".to_string(),
    }
}

pub fn record_cache_hit(mode: &'static str) {
    counter!(names::CACHE_HITS_TOTAL, "mode" => mode).increment(1);
}

pub fn record_cache_miss(mode: &'static str) {
    counter!(names::CACHE_MISSES_TOTAL, "mode" => mode).increment(1);
}

pub fn record_cache_error(mode: &'static str, op: &'static str) {
    counter!(names::CACHE_ERRORS_TOTAL, "mode" => mode, "op" => op).increment(1);
}

/// `outcome` is one of `ok`, `parse_error`, `validation_error`,
/// `persistence_error`, `cache_error`.
pub fn record_ingest(outcome: &'static str) {
    counter!(names::INGEST_BATCHES_TOTAL, "outcome" => outcome).increment(1);
}

pub fn record_records_persisted(count: usize) {
    counter!(names::INGEST_RECORDS_PERSISTED_TOTAL).increment(count as u64);
}
