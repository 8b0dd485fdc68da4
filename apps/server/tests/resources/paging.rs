use crate::support::*;
use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

fn path_of(href: &str) -> &str {
    href.strip_prefix("http://example.org").unwrap_or(href)
}

#[tokio::test]
async fn first_page_links_forward_only() -> anyhow::Result<()> {
    let app = TestApp::new().await?;

    let (status, _, body) = app.get("/v2/treatments?size=2").await?;
    assert_status(status, StatusCode::OK, "first page");

    assert_eq!(body["num-of-records"], json!(5));
    assert_eq!(record_ids(&body, "treatmentId"), ["T003", "T004"]);
    assert_eq!(body["from"], json!(1));
    assert_eq!(body["to"], json!(2));
    assert_eq!(body["prevpage"], json!(0));
    assert_eq!(body["nextpage"], json!(2));
    assert_eq!(self_href(&body), Some(format!("{BASE}/treatments").as_str()));
    assert_eq!(
        link_href(&body, "next"),
        Some(format!("{BASE}/treatments?page=2&size=2").as_str())
    );
    assert!(link_href(&body, "prev").is_none());
    Ok(())
}

#[tokio::test]
async fn following_next_links_walks_every_record_once() -> anyhow::Result<()> {
    let app = TestApp::new().await?;

    let mut seen = Vec::new();
    let mut next = Some("/v2/treatments?size=2".to_string());
    while let Some(path) = next.take() {
        let (status, _, body) = app.get(&path).await?;
        assert_status(status, StatusCode::OK, &path);
        seen.extend(record_ids(&body, "treatmentId").into_iter().map(String::from));
        next = link_href(&body, "next").map(|href| path_of(href).to_string());
        assert!(seen.len() <= 5, "paging did not terminate");
    }

    assert_eq!(seen, ["T003", "T004", "T001", "T002", "T005"]);
    Ok(())
}

#[tokio::test]
async fn last_page_links_backward_only() -> anyhow::Result<()> {
    let app = TestApp::new().await?;

    let (status, _, body) = app.get("/v2/treatments?size=2&page=3").await?;
    assert_status(status, StatusCode::OK, "last page");

    assert_eq!(record_ids(&body, "treatmentId"), ["T005"]);
    assert_eq!(body["from"], json!(5));
    assert_eq!(body["to"], json!(5));
    assert_eq!(body["prevpage"], json!(2));
    assert_eq!(body["nextpage"], json!(""));
    assert_eq!(
        link_href(&body, "prev"),
        Some(format!("{BASE}/treatments?page=2&size=2").as_str())
    );
    assert!(link_href(&body, "next").is_none());
    Ok(())
}

#[tokio::test]
async fn page_links_carry_search_criteria() -> anyhow::Result<()> {
    let app = TestApp::new().await?;

    let (_, _, body) = app.get("/v2/treatments?size=1&kingdom=Animalia").await?;
    assert_eq!(body["num-of-records"], json!(4));
    assert_eq!(
        link_href(&body, "next"),
        Some(format!("{BASE}/treatments?kingdom=Animalia&page=2&size=1").as_str())
    );
    Ok(())
}

#[tokio::test]
async fn page_size_is_bounded() -> anyhow::Result<()> {
    let app = TestApp::new().await?;

    for query in ["size=0", "size=101", "size=many", "page=first"] {
        let (status, _, body) = app.get(&format!("/v2/treatments?{query}")).await?;
        assert_status(status, StatusCode::BAD_REQUEST, query);
        assert_eq!(error_kind(&body), Some("ValidationError"), "{query}");
    }
    Ok(())
}

#[tokio::test]
async fn configured_default_page_size_applies() -> anyhow::Result<()> {
    let app = TestApp::new_with_config(|config| {
        config.query.default_page_size = 3;
    })
    .await?;

    let (_, _, body) = app.get("/v2/treatments").await?;
    assert_eq!(record_ids(&body, "treatmentId").len(), 3);
    assert_eq!(body["nextpage"], json!(2));
    Ok(())
}
