//! Request metrics for the Firestore client.

use metrics::{counter, histogram};

/// Metric names emitted by this crate.
pub mod names {
    pub const REQUESTS_TOTAL: &str = "firestore_requests_total";
    pub const LATENCY_SECONDS: &str = "firestore_latency_seconds";
}

/// Record one completed request with its outcome and latency.
pub fn record_request(operation: &str, status: u16, latency_ms: f64) {
    let operation = operation.to_string();
    let status = status.to_string();

    counter!(
        names::REQUESTS_TOTAL,
        "operation" => operation.clone(),
        "status" => status.clone(),
    )
    .increment(1);

    histogram!(
        names::LATENCY_SECONDS,
        "operation" => operation,
        "status" => status,
    )
    .record(latency_ms / 1000.0);
}
