use crate::support::*;
use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

#[tokio::test]
async fn api_root_lists_every_resource() -> anyhow::Result<()> {
    let app = TestApp::new().await?;

    let (status, _, body) = app.get("/v2").await?;
    assert_status(status, StatusCode::OK, "resource listing");
    assert_eq!(body["num-of-records"], json!(6));

    let names: Vec<&str> = body["records"]
        .as_array()
        .map(|r| r.iter().filter_map(|d| d["name"].as_str()).collect())
        .unwrap_or_default();
    assert!(names.contains(&"treatments"));
    assert!(names.contains(&"figureCitations"));

    let treatments = body["records"]
        .as_array()
        .and_then(|r| r.iter().find(|d| d["name"] == "treatments"))
        .cloned()
        .unwrap_or_default();
    assert_eq!(
        self_href(&treatments),
        Some(format!("{BASE}/treatments").as_str())
    );
    Ok(())
}

#[tokio::test]
async fn health_reports_database_status() -> anyhow::Result<()> {
    let app = TestApp::new().await?;

    let (status, _, body) = app.get("/health").await?;
    assert_status(status, StatusCode::OK, "health");
    assert_eq!(body["status"], json!("ok"));
    assert_eq!(body["database"], json!("ok"));
    Ok(())
}

#[tokio::test]
async fn metrics_expose_query_counters() -> anyhow::Result<()> {
    let app = TestApp::new().await?;

    app.get("/v2/treatments?journalYear=1999").await?;
    let (status, _, body) = app.get_raw("/metrics").await?;
    assert_status(status, StatusCode::OK, "metrics");

    let text = String::from_utf8(body.to_vec())?;
    assert!(text.contains("zenodeo_queries_total"));
    assert!(text.contains("zenodeo_statement_duration_seconds"));
    Ok(())
}
