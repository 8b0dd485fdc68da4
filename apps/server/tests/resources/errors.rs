use crate::support::*;
use axum::http::StatusCode;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn unknown_resource_is_not_found() -> anyhow::Result<()> {
    let app = TestApp::new().await?;

    let (status, headers, body) = app.get("/v2/dragons").await?;
    assert_status(status, StatusCode::NOT_FOUND, "unknown resource");
    assert_eq!(error_kind(&body), Some("NotFound"));
    assert_eq!(
        headers.get("content-type").and_then(|v| v.to_str().ok()),
        Some("application/json; charset=utf-8")
    );
    Ok(())
}

#[tokio::test]
async fn out_of_range_value_is_rejected_before_execution() -> anyhow::Result<()> {
    let app = TestApp::new().await?;

    let (status, _, body) = app.get("/v2/treatments?journalYear=1492").await?;
    assert_status(status, StatusCode::BAD_REQUEST, "journalYear out of range");
    assert_eq!(error_kind(&body), Some("ValidationError"));
    assert!(body["error"]["message"]
        .as_str()
        .is_some_and(|m| m.contains("journalYear")));
    Ok(())
}

#[tokio::test]
async fn malformed_flags_are_rejected() -> anyhow::Result<()> {
    let app = TestApp::new().await?;

    for query in ["facets=perhaps", "stats=2", "refreshCache=soon", "journalYear=nineteen"] {
        let (status, _, body) = app.get(&format!("/v2/treatments?{query}")).await?;
        assert_status(status, StatusCode::BAD_REQUEST, query);
        assert_eq!(error_kind(&body), Some("ValidationError"), "{query}");
    }
    Ok(())
}

#[tokio::test]
async fn responses_carry_a_request_id() -> anyhow::Result<()> {
    let app = TestApp::new().await?;

    let (_, headers, _) = app.get("/v2/dragons").await?;
    assert!(headers.contains_key("x-request-id"));
    Ok(())
}
