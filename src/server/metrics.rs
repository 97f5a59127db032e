use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Encoder, Gauge, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::time::Duration;

/// Metric name prefix for all MoodTune metrics
const PREFIX: &str = "moodtune";

lazy_static! {
    // Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Request Metrics
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "path", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
        &["method", "path"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // Upstream Metrics
    pub static ref UPSTREAM_CALLS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_upstream_calls_total"), "Calls to upstream services"),
        &["target", "operation", "outcome"]
    ).expect("Failed to create upstream_calls_total metric");

    pub static ref CATALOG_TOKEN_REFRESHES_TOTAL: Counter = Counter::new(
        format!("{PREFIX}_catalog_token_refreshes_total"),
        "Catalog access token exchanges"
    ).expect("Failed to create catalog_token_refreshes_total metric");

    // Mood Metrics
    pub static ref MOOD_EVENTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_mood_events_total"), "Mood events logged"),
        &["mood"]
    ).expect("Failed to create mood_events_total metric");

    pub static ref FEATURE_RESOLUTIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_feature_resolutions_total"), "Feature profiles resolved"),
        &["mood"]
    ).expect("Failed to create feature_resolutions_total metric");

    // Process Metrics
    pub static ref PROCESS_MEMORY_BYTES: Gauge = Gauge::new(
        format!("{PREFIX}_process_memory_bytes"),
        "Process memory usage in bytes"
    ).expect("Failed to create process_memory_bytes metric");
}

/// Initialize all metrics and register them with the Prometheus registry
pub fn init_metrics() {
    // Register all metrics - ignore errors if already registered (for tests)
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(UPSTREAM_CALLS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(CATALOG_TOKEN_REFRESHES_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(MOOD_EVENTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(FEATURE_RESOLUTIONS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(PROCESS_MEMORY_BYTES.clone()));

    tracing::info!("Metrics system initialized successfully");
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration.as_secs_f64());
}

/// Record the outcome of a call to an upstream service
pub fn record_upstream_call(target: &str, operation: &str, ok: bool) {
    let outcome = if ok { "success" } else { "failure" };
    UPSTREAM_CALLS_TOTAL
        .with_label_values(&[target, operation, outcome])
        .inc();
}

pub fn record_token_refresh() {
    CATALOG_TOKEN_REFRESHES_TOTAL.inc();
}

pub fn record_mood_event(mood: &str) {
    MOOD_EVENTS_TOTAL.with_label_values(&[mood]).inc();
}

pub fn record_feature_resolution(mood: &str) {
    FEATURE_RESOLUTIONS_TOTAL.with_label_values(&[mood]).inc();
}

/// Collapse request paths into a bounded label set.
///
/// Query strings are dropped and unknown paths share one label, so scanners
/// cannot blow up the cardinality of the HTTP metrics.
pub fn normalize_path(path: &str) -> &'static str {
    match path {
        "/" => "/",
        "/v1/health" => "/v1/health",
        "/v1/moods" => "/v1/moods",
        "/v1/moods/log" => "/v1/moods/log",
        "/v1/moods/recent" => "/v1/moods/recent",
        "/v1/features" => "/v1/features",
        "/v1/catalog/token" => "/v1/catalog/token",
        "/v1/catalog/search" => "/v1/catalog/search",
        "/v1/catalog/recommendations" => "/v1/catalog/recommendations",
        _ => "other",
    }
}

/// Update process memory usage
pub fn update_memory_usage() {
    #[cfg(target_os = "linux")]
    {
        if let Ok(status) = std::fs::read_to_string("/proc/self/status") {
            for line in status.lines() {
                if line.starts_with("VmRSS:") {
                    // VmRSS is reported in kB
                    if let Some(kb) = line
                        .split_whitespace()
                        .nth(1)
                        .and_then(|s| s.parse::<f64>().ok())
                    {
                        PROCESS_MEMORY_BYTES.set(kb * 1024.0);
                        return;
                    }
                }
            }
        }
    }
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler() -> impl IntoResponse {
    update_memory_usage();

    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = vec![];
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            let response = String::from_utf8(buffer).unwrap_or_default();
            (StatusCode::OK, response)
        }
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}
