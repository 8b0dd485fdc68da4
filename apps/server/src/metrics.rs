//! Metrics collection for the gateway
//!
//! This module defines and manages Prometheus metrics for monitoring the gateway.

use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge, register_int_gauge_vec,
    HistogramVec, IntCounterVec, IntGauge, IntGaugeVec,
};

lazy_static! {
    // HTTP Request Metrics

    /// Total HTTP requests by method, path, and status
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "zenodeo_http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .expect("Failed to register HTTP_REQUESTS_TOTAL");

    /// HTTP request duration in seconds
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "zenodeo_http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .expect("Failed to register HTTP_REQUEST_DURATION_SECONDS");

    /// In-flight HTTP requests
    pub static ref HTTP_REQUESTS_IN_FLIGHT: IntGaugeVec = register_int_gauge_vec!(
        "zenodeo_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
        &["method", "path"]
    )
    .expect("Failed to register HTTP_REQUESTS_IN_FLIGHT");

    /// HTTP response size in bytes
    pub static ref HTTP_RESPONSE_SIZE_BYTES: HistogramVec = register_histogram_vec!(
        "zenodeo_http_response_size_bytes",
        "HTTP response size in bytes",
        &["method", "path", "status"],
        vec![100.0, 1_000.0, 10_000.0, 100_000.0, 1_000_000.0, 10_000_000.0]
    )
    .expect("Failed to register HTTP_RESPONSE_SIZE_BYTES");

    // Query Metrics

    /// Resource queries by resource and outcome
    pub static ref QUERIES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "zenodeo_queries_total",
        "Total number of resource queries",
        &["resource", "status"]
    )
    .expect("Failed to register QUERIES_TOTAL");

    /// Records matched per query
    pub static ref QUERY_RESULTS: HistogramVec = register_histogram_vec!(
        "zenodeo_query_results",
        "Number of records matched by a query",
        &["resource"],
        vec![0.0, 1.0, 10.0, 50.0, 100.0, 500.0, 1000.0, 5000.0, 10000.0, 100000.0]
    )
    .expect("Failed to register QUERY_RESULTS");

    // Database Metrics

    /// Statement duration by statement kind
    pub static ref STATEMENT_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "zenodeo_statement_duration_seconds",
        "SQL statement duration in seconds",
        &["resource", "kind"],
        vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0]
    )
    .expect("Failed to register STATEMENT_DURATION_SECONDS");

    /// Failed statements by statement kind and error type
    pub static ref STATEMENT_FAILURES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "zenodeo_statement_failures_total",
        "Total number of failed SQL statements",
        &["resource", "kind", "error_type"]
    )
    .expect("Failed to register STATEMENT_FAILURES_TOTAL");

    /// Open pool connections
    pub static ref DB_CONNECTIONS_ACTIVE: IntGauge = register_int_gauge!(
        "zenodeo_db_connections_active",
        "Number of open database connections"
    )
    .expect("Failed to register DB_CONNECTIONS_ACTIVE");

    /// Idle pool connections
    pub static ref DB_CONNECTIONS_IDLE: IntGauge = register_int_gauge!(
        "zenodeo_db_connections_idle",
        "Number of idle database connections"
    )
    .expect("Failed to register DB_CONNECTIONS_IDLE");

    // Cache Metrics

    /// Cache lookups by segment and result (hit, miss, error)
    pub static ref CACHE_LOOKUPS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "zenodeo_cache_lookups_total",
        "Total number of response cache lookups",
        &["segment", "result"]
    )
    .expect("Failed to register CACHE_LOOKUPS_TOTAL");

    /// Cached entries per segment
    pub static ref CACHE_ENTRIES: IntGaugeVec = register_int_gauge_vec!(
        "zenodeo_cache_entries",
        "Number of cached responses per segment",
        &["segment"]
    )
    .expect("Failed to register CACHE_ENTRIES");
}

/// Helper to sanitize path for metrics labels (remove IDs, limit cardinality)
pub fn sanitize_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match segments.as_slice() {
        [] => "/".to_string(),
        [api, resource, _id, ..] if *api == "v2" => format!("/{api}/{resource}/{{id}}"),
        [first, second, ..] => format!("/{first}/{second}"),
        [only] => format!("/{only}"),
    }
}

/// Extract the queried resource from a `/v2/{resource}` path
pub fn extract_resource(path: &str) -> Option<String> {
    let path = path.strip_prefix("/v2/")?;
    path.split('/')
        .find(|s| !s.is_empty())
        .map(|s| s.to_ascii_lowercase())
}
