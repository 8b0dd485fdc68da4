//! URL helpers for building absolute API base URLs.

use crate::config::ServerConfig;
use axum::http::HeaderMap;

/// Absolute API root (`{scheme}://{host}{api_prefix}`) under which envelope links are built.
///
/// `server.public_base_url` wins when configured; otherwise forwarding headers are
/// honored so links stay correct behind reverse proxies.
pub fn api_base_url(config: &ServerConfig, headers: &HeaderMap) -> String {
    let origin = match &config.public_base_url {
        Some(base) => base.trim_end_matches('/').to_string(),
        None => origin_from_headers(headers),
    };
    format!("{}{}", origin, config.api_prefix)
}

fn origin_from_headers(headers: &HeaderMap) -> String {
    let scheme = headers
        .get("x-forwarded-proto")
        .or_else(|| headers.get("x-forwarded-scheme"))
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");

    let host = headers
        .get("x-forwarded-host")
        .or_else(|| headers.get("host"))
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");

    format!("{}://{}", scheme, host)
}
