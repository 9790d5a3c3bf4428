//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Install the Prometheus recorder.
/// Returns a handle that renders the scrape output.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "reelgen_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "reelgen_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "reelgen_http_requests_in_flight";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "reelgen_rate_limit_hits_total";

    // Generation requests by admission outcome
    pub const GENERATE_REQUESTS_TOTAL: &str = "reelgen_generate_requests_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a rate limit hit. `limiter` is `burst` or `window`.
pub fn record_rate_limit_hit(limiter: &str, endpoint: &str) {
    let labels = [
        ("limiter", limiter.to_string()),
        ("endpoint", sanitize_path(endpoint)),
    ];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Record a generation request by outcome (`rejected`, `invalid`, `success`, `error`).
pub fn record_generate_request(outcome: &str) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::GENERATE_REQUESTS_TOTAL, &labels).increment(1);
}

/// Collapse file names under `/api/video/` so labels stay bounded.
fn sanitize_path(path: &str) -> String {
    match path.strip_prefix("/api/video/") {
        Some(rest) if !rest.is_empty() => "/api/video/:id".to_string(),
        _ => path.to_string(),
    }
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}
