use crate::support::*;
use axum::http::StatusCode;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn repeated_request_is_served_from_cache() -> anyhow::Result<()> {
    let app = TestApp::new().await?;

    let (_, headers, first) = app.get("/v2/treatments?journalYear=1999").await?;
    assert_cache(&headers, "MISS");

    let (status, headers, second) = app.get("/v2/treatments?journalYear=1999").await?;
    assert_status(status, StatusCode::OK, "cached request");
    assert_cache(&headers, "HIT");
    assert_eq!(first, second);
    Ok(())
}

#[tokio::test]
async fn equivalent_queries_share_a_cache_entry() -> anyhow::Result<()> {
    let app = TestApp::new().await?;

    let (_, headers, _) = app.get("/v2/treatments?journalYear=1999&kingdom=Animalia").await?;
    assert_cache(&headers, "MISS");

    for path in [
        "/v2/treatments?kingdom=Animalia&journalYear=1999",
        "/v2/treatments?journalYear=1999&kingdom=Animalia&page=1&size=30",
        "/v2/TREATMENTS?journalYear=1999&kingdom=Animalia&facets=false",
    ] {
        let (_, headers, _) = app.get(path).await?;
        assert_cache(&headers, "HIT");
    }

    let (_, headers, _) = app.get("/v2/treatments?journalYear=1999&kingdom=Animalia&size=10").await?;
    assert_cache(&headers, "MISS");
    Ok(())
}

#[tokio::test]
async fn refresh_cache_recomputes_and_restores_the_entry() -> anyhow::Result<()> {
    let app = TestApp::new().await?;

    app.get("/v2/treatments?journalYear=2010").await?;

    sqlx::query("UPDATE treatments SET deleted = 1 WHERE treatmentId = 'T005'")
        .execute(&app.state.pool)
        .await?;

    let (_, headers, stale) = app.get("/v2/treatments?journalYear=2010").await?;
    assert_cache(&headers, "HIT");
    assert_eq!(stale["num-of-records"], 2);

    let (_, headers, fresh) = app
        .get("/v2/treatments?journalYear=2010&refreshCache=true")
        .await?;
    assert_cache(&headers, "MISS");
    assert_eq!(fresh["num-of-records"], 1);

    let (_, headers, cached) = app.get("/v2/treatments?journalYear=2010").await?;
    assert_cache(&headers, "HIT");
    assert_eq!(cached["num-of-records"], 1);
    Ok(())
}

#[tokio::test]
async fn disabled_cache_always_misses() -> anyhow::Result<()> {
    let app = TestApp::new_with_config(|config| config.cache.enabled = false).await?;

    for _ in 0..2 {
        let (_, headers, _) = app.get("/v2/treatments?journalYear=1999").await?;
        assert_cache(&headers, "MISS");
    }
    Ok(())
}
