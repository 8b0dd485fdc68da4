use crate::support::*;
use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

#[tokio::test]
async fn journal_year_filter_returns_live_matches() -> anyhow::Result<()> {
    let app = TestApp::new().await?;

    let (status, headers, body) = app.get("/v2/treatments?journalYear=1999").await?;
    assert_status(status, StatusCode::OK, "journalYear search");
    assert_cache(&headers, "MISS");

    assert_eq!(body["search-criteria"], json!({ "journalYear": "1999" }));
    assert_eq!(body["num-of-records"], json!(2));
    assert_eq!(record_ids(&body, "treatmentId"), ["T001", "T002"]);
    assert_eq!(
        self_href(&body),
        Some(format!("{BASE}/treatments?journalYear=1999").as_str())
    );
    assert_eq!(
        self_href(&body["records"][0]),
        Some(format!("{BASE}/treatments?treatmentId=T001").as_str())
    );

    assert_eq!(body["from"], json!(1));
    assert_eq!(body["to"], json!(2));
    assert_eq!(body["prevpage"], json!(0));
    assert_eq!(body["nextpage"], json!(""));
    assert!(body.get("facets").is_none());
    assert!(body.get("stats").is_none());
    assert!(body.get("related-records").is_none());
    Ok(())
}

#[tokio::test]
async fn records_keep_select_order_and_types() -> anyhow::Result<()> {
    let app = TestApp::new().await?;

    let (_, _, body) = app.get("/v2/treatments?treatmentTitle=Apis").await?;
    let record = &body["records"][0];

    assert_eq!(record["journalYear"], json!(2005));
    assert_eq!(record["doi"], json!(null));
    let keys: Vec<&str> = record
        .as_object()
        .map(|o| o.keys().map(String::as_str).collect())
        .unwrap_or_default();
    assert_eq!(&keys[..3], ["treatmentId", "treatmentTitle", "doi"]);
    assert_eq!(keys.last(), Some(&"_links"));
    Ok(())
}

#[tokio::test]
async fn sort_by_column_and_direction() -> anyhow::Result<()> {
    let app = TestApp::new().await?;

    let (status, _, body) = app.get("/v2/treatments?sortBy=journalYear:DESC").await?;
    assert_status(status, StatusCode::OK, "sorted search");

    let years: Vec<i64> = body["records"]
        .as_array()
        .map(|records| records.iter().filter_map(|r| r["journalYear"].as_i64()).collect())
        .unwrap_or_default();
    assert_eq!(years, [2010, 2010, 2005, 1999, 1999]);
    Ok(())
}

#[tokio::test]
async fn invalid_sort_falls_back_to_default() -> anyhow::Result<()> {
    let app = TestApp::new().await?;

    let (status, _, body) = app.get("/v2/treatments?sortBy=kingdom:sideways").await?;
    assert_status(status, StatusCode::OK, "fallback sort");
    assert_eq!(
        record_ids(&body, "treatmentId"),
        ["T003", "T004", "T001", "T002", "T005"]
    );
    Ok(())
}

#[tokio::test]
async fn like_columns_match_prefixes() -> anyhow::Result<()> {
    let app = TestApp::new().await?;

    let (_, _, body) = app.get("/v2/treatments?treatmentTitle=Carabus").await?;
    assert_eq!(body["num-of-records"], json!(2));
    assert_eq!(record_ids(&body, "treatmentId"), ["T001", "T002"]);
    Ok(())
}

#[tokio::test]
async fn fulltext_query_joins_the_index() -> anyhow::Result<()> {
    let app = TestApp::new().await?;

    let (status, _, body) = app.get("/v2/treatments?q=bee").await?;
    assert_status(status, StatusCode::OK, "fulltext search");
    assert_eq!(body["num-of-records"], json!(2));
    assert_eq!(record_ids(&body, "treatmentId"), ["T003", "T004"]);
    Ok(())
}

#[tokio::test]
async fn repeated_parameter_matches_any_value() -> anyhow::Result<()> {
    let app = TestApp::new().await?;

    let (_, _, body) = app
        .get("/v2/treatments?family=Carabidae&family=Fagaceae")
        .await?;
    assert_eq!(body["num-of-records"], json!(3));
    assert_eq!(
        body["search-criteria"],
        json!({ "family": ["Carabidae", "Fagaceae"] })
    );
    Ok(())
}

#[tokio::test]
async fn unrecognized_parameters_are_echoed_but_ignored() -> anyhow::Result<()> {
    let app = TestApp::new().await?;

    let (status, _, body) = app
        .get("/v2/treatments?journalYear=1999&colour=blue")
        .await?;
    assert_status(status, StatusCode::OK, "unknown parameter");
    assert_eq!(body["num-of-records"], json!(2));
    assert_eq!(body["search-criteria"]["colour"], json!("blue"));
    Ok(())
}

#[tokio::test]
async fn zero_matches_is_a_normal_empty_envelope() -> anyhow::Result<()> {
    let app = TestApp::new().await?;

    let (status, _, body) = app
        .get("/v2/treatments?journalYear=1850&facets=true&stats=true")
        .await?;
    assert_status(status, StatusCode::OK, "zero-match search");
    assert_eq!(body["num-of-records"], json!(0));
    assert_eq!(body["records"], json!([]));
    assert!(body.get("facets").is_none());
    assert!(body.get("stats").is_none());
    Ok(())
}

#[tokio::test]
async fn resource_names_are_case_insensitive() -> anyhow::Result<()> {
    let app = TestApp::new().await?;

    let (status, _, body) = app.get("/v2/treatmentauthors?treatmentAuthor=Jones").await?;
    assert_status(status, StatusCode::OK, "lower-case resource");
    assert_eq!(body["num-of-records"], json!(1));
    assert_eq!(
        self_href(&body["records"][0]),
        Some(format!("{BASE}/treatmentauthors?treatmentAuthorId=TA2").as_str())
    );
    Ok(())
}
