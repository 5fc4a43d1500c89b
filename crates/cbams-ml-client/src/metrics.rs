//! ML client metrics.

use metrics::{counter, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Total ML requests by operation and outcome.
    pub const REQUESTS_TOTAL: &str = "cbams_ml_requests_total";

    /// Total retry attempts by operation.
    pub const RETRIES_TOTAL: &str = "cbams_ml_retries_total";

    /// Request latency in seconds by operation, retries included.
    pub const LATENCY_SECONDS: &str = "cbams_ml_latency_seconds";
}

/// Record a completed ML request.
pub fn record_request(operation: &str, outcome: &str, latency_secs: f64) {
    counter!(
        names::REQUESTS_TOTAL,
        "operation" => operation.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);

    histogram!(
        names::LATENCY_SECONDS,
        "operation" => operation.to_string()
    )
    .record(latency_secs);
}

/// Record a retry attempt.
pub fn record_retry(operation: &str) {
    counter!(
        names::RETRIES_TOTAL,
        "operation" => operation.to_string()
    )
    .increment(1);
}
