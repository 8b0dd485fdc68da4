//! Metrics middleware - tracks HTTP request metrics

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = req.uri().path().to_string();

    // Sanitize path for metrics (remove IDs to reduce cardinality)
    let sanitized_path = crate::metrics::sanitize_path(&path);

    crate::metrics::HTTP_REQUESTS_IN_FLIGHT
        .with_label_values(&[&method, &sanitized_path])
        .inc();

    let response = next.run(req).await;

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    crate::metrics::HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &sanitized_path, &status])
        .inc();

    crate::metrics::HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[&method, &sanitized_path])
        .observe(duration);

    if let Some(content_length) = response
        .headers()
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<f64>().ok())
    {
        crate::metrics::HTTP_RESPONSE_SIZE_BYTES
            .with_label_values(&[&method, &sanitized_path, &status])
            .observe(content_length);
    }

    if let Some(resource) = crate::metrics::extract_resource(&path) {
        let outcome = if response.status().is_success() {
            "success"
        } else if response.status().is_client_error() {
            "client_error"
        } else {
            "server_error"
        };

        crate::metrics::QUERIES_TOTAL
            .with_label_values(&[&resource, outcome])
            .inc();
    }

    crate::metrics::HTTP_REQUESTS_IN_FLIGHT
        .with_label_values(&[&method, &sanitized_path])
        .dec();

    response
}
