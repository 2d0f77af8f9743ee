//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "vdock_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "vdock_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "vdock_http_requests_in_flight";

    // Ingestion metrics
    pub const INGEST_TOTAL: &str = "vdock_ingest_total";
    pub const INGEST_STAGE_DURATION_SECONDS: &str = "vdock_ingest_stage_duration_seconds";
    pub const UPLOAD_BYTES_TOTAL: &str = "vdock_upload_bytes_total";
}

/// Pipeline stages span milliseconds (probe) to minutes (spool,
/// normalize, upload), so the default buckets would lose the long tail.
const STAGE_BUCKETS: &[f64] = &[0.05, 0.25, 1.0, 5.0, 15.0, 60.0, 300.0];

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(names::INGEST_STAGE_DURATION_SECONDS.to_string()),
            STAGE_BUCKETS,
        )
        .expect("static bucket list is non-empty")
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
}

/// Record a finished ingestion attempt by outcome.
pub fn record_ingest_outcome(outcome: &str) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::INGEST_TOTAL, &labels).increment(1);
}

/// Record the duration of one pipeline stage.
pub fn record_ingest_stage(stage: &str, duration_secs: f64) {
    let labels = [("stage", stage.to_string())];
    histogram!(names::INGEST_STAGE_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record bytes spooled from an upload.
pub fn record_upload_bytes(bytes: u64) {
    counter!(names::UPLOAD_BYTES_TOTAL).increment(bytes);
}

/// Collapse dynamic path segments so metric labels stay low-cardinality.
fn sanitize_path(path: &str) -> String {
    let path = regex_lite::Regex::new(r"/videos/[A-Za-z0-9_-]+")
        .unwrap()
        .replace_all(path, "/videos/:video_id");
    let path = regex_lite::Regex::new(r"/assets/.+")
        .unwrap()
        .replace_all(&path, "/assets/:asset");
    path.to_string()
}

/// Request counter and latency middleware.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let route = sanitize_path(request.uri().path());
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);
    let response = next.run(request).await;
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let labels = [
        ("method", method),
        ("path", route),
        ("status", response.status().as_u16().to_string()),
    ];
    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels)
        .record(start.elapsed().as_secs_f64());

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path() {
        assert_eq!(
            sanitize_path("/api/videos/550e8400-e29b-41d4-a716-446655440000"),
            "/api/videos/:video_id"
        );
        assert_eq!(
            sanitize_path("/api/videos/abc123/upload"),
            "/api/videos/:video_id/upload"
        );
        assert_eq!(sanitize_path("/assets/vid-1_thumb.png"), "/assets/:asset");
        assert_eq!(sanitize_path("/health"), "/health");
    }
}
