//! Metrics and observability utilities
//!
//! Prometheus metric descriptions and helpers with standardized naming.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all Notarium metrics
pub const METRICS_PREFIX: &str = "notarium";

/// Histogram buckets for repository operation latency (in seconds)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001,  // 1ms
    0.005,  // 5ms
    0.010,  // 10ms
    0.025,  // 25ms
    0.050,  // 50ms
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    5.000,  // 5s
];

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_counter!(
        format!("{}_receipts_inserted_total", METRICS_PREFIX),
        Unit::Count,
        "Total receipts written"
    );

    describe_counter!(
        format!("{}_receipts_deleted_total", METRICS_PREFIX),
        Unit::Count,
        "Total receipts soft-deleted"
    );

    describe_counter!(
        format!("{}_db_connect_attempts_total", METRICS_PREFIX),
        Unit::Count,
        "Database connection attempts made during bootstrap"
    );

    describe_histogram!(
        format!("{}_db_query_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Receipt repository operation latency in seconds"
    );

    tracing::info!("Metrics registered");
}

/// Times one repository operation
pub struct QueryTimer {
    start: Instant,
    operation: &'static str,
}

impl QueryTimer {
    pub fn start(operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            operation,
        }
    }

    /// Record the elapsed time under the operation label
    pub fn finish(self, success: bool) {
        let status = if success { "success" } else { "error" };

        histogram!(
            format!("{}_db_query_duration_seconds", METRICS_PREFIX),
            "operation" => self.operation,
            "status" => status
        )
        .record(self.start.elapsed().as_secs_f64());
    }
}

/// Helper to record request metrics
pub fn record_request(method: &str, endpoint: &str, status: u16) {
    counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        "method" => method.to_string(),
        "endpoint" => endpoint.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_insert() {
    counter!(format!("{}_receipts_inserted_total", METRICS_PREFIX)).increment(1);
}

pub fn record_delete(rows: u64) {
    counter!(format!("{}_receipts_deleted_total", METRICS_PREFIX)).increment(rows);
}
