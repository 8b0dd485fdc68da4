use axum::http::{HeaderMap, StatusCode};
use serde_json::Value;

/// Assert a status with context for the failure message
pub fn assert_status(actual: StatusCode, expected: StatusCode, context: &str) {
    assert_eq!(actual, expected, "unexpected status for {context}");
}

/// Assert the `x-cache` response header
pub fn assert_cache(headers: &HeaderMap, expected: &str) {
    assert_eq!(
        headers.get("x-cache").and_then(|v| v.to_str().ok()),
        Some(expected),
        "x-cache header"
    );
}

/// Values of `id_column` across `records`, in order
pub fn record_ids<'a>(envelope: &'a Value, id_column: &str) -> Vec<&'a str> {
    envelope["records"]
        .as_array()
        .map(|records| {
            records
                .iter()
                .filter_map(|r| r.get(id_column).and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default()
}

/// `_links.self.href` of an envelope or a record
pub fn self_href(value: &Value) -> Option<&str> {
    value["_links"]["self"]["href"].as_str()
}

/// `_links.{rel}.href` of an envelope
pub fn link_href<'a>(value: &'a Value, rel: &str) -> Option<&'a str> {
    value["_links"][rel]["href"].as_str()
}

/// Error kind of a `{"error": {...}}` body
pub fn error_kind(body: &Value) -> Option<&str> {
    body["error"]["kind"].as_str()
}
