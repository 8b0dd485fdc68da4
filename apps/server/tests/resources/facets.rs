use crate::support::*;
use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

#[tokio::test]
async fn facets_and_stats_cover_all_matches() -> anyhow::Result<()> {
    let app = TestApp::new().await?;

    let (status, _, body) = app.get("/v2/treatments?facets=true&stats=true&size=1").await?;
    assert_status(status, StatusCode::OK, "facets and stats");
    assert_eq!(body["records"].as_array().map(Vec::len), Some(1));

    let facets = &body["facets"];
    assert_eq!(
        facets["kingdom"],
        json!([{ "kingdom": "Animalia", "c": 4 }, { "kingdom": "Plantae", "c": 1 }])
    );
    assert_eq!(facets["journalTitle"][0], json!({ "journalTitle": "Zootaxa", "c": 2 }));
    assert_eq!(
        facets["journalYear"],
        json!([
            { "journalYear": 2010, "c": 2 },
            { "journalYear": 2005, "c": 1 },
            { "journalYear": 1999, "c": 2 }
        ])
    );
    assert_eq!(facets["typeStatus"][0], json!({ "typeStatus": "holotype", "c": 2 }));

    let stats = &body["stats"];
    assert_eq!(
        stats["specimens"],
        json!([{
            "treatments": 5,
            "materialsCitations": 3,
            "specimens": 6,
            "specimensMale": 2,
            "specimensFemale": 4
        }])
    );
    assert_eq!(stats["treatmentAuthors"], json!([{ "treatmentAuthors": 2 }]));
    assert_eq!(stats["figureCitations"], json!([{ "figureCitations": 1 }]));
    Ok(())
}

#[tokio::test]
async fn facets_inherit_the_search_filter() -> anyhow::Result<()> {
    let app = TestApp::new().await?;

    let (_, _, body) = app.get("/v2/treatments?journalYear=1999&facets=true").await?;
    assert_eq!(
        body["facets"]["journalTitle"],
        json!([{ "journalTitle": "Zootaxa", "c": 2 }])
    );
    assert_eq!(
        body["facets"]["kingdom"],
        json!([{ "kingdom": "Animalia", "c": 2 }])
    );
    assert!(body.get("stats").is_none());
    Ok(())
}

#[tokio::test]
async fn facets_follow_fulltext_joins() -> anyhow::Result<()> {
    let app = TestApp::new().await?;

    let (status, _, body) = app.get("/v2/treatments?q=bee&facets=true").await?;
    assert_status(status, StatusCode::OK, "fulltext facets");
    assert_eq!(body["facets"]["family"], json!([{ "family": "Apidae", "c": 2 }]));
    Ok(())
}

#[tokio::test]
async fn failed_facet_is_omitted_and_the_rest_served() -> anyhow::Result<()> {
    let app = TestApp::with_descriptors(FAULTY_DESCRIPTORS).await?;

    let (status, headers, body) = app.get("/v2/treatments?facets=true").await?;
    assert_status(status, StatusCode::OK, "partial facets");
    assert_cache(&headers, "MISS");

    assert_eq!(body["num-of-records"], json!(5));
    assert_eq!(record_ids(&body, "treatmentId").len(), 5);
    assert_eq!(body["facets"]["kingdom"][0], json!({ "kingdom": "Animalia", "c": 4 }));
    assert!(body["facets"].get("missing").is_none());

    // Partial envelopes are not cached.
    let (_, headers, _) = app.get("/v2/treatments?facets=true").await?;
    assert_cache(&headers, "MISS");
    Ok(())
}

#[tokio::test]
async fn zero_matches_skip_the_data_statement() -> anyhow::Result<()> {
    let app = TestApp::with_descriptors(FAULTY_DESCRIPTORS).await?;

    let (status, _, body) = app.get("/v2/ghosts?journalYear=1850").await?;
    assert_status(status, StatusCode::OK, "zero matches");
    assert_eq!(body["num-of-records"], json!(0));
    assert_eq!(body["records"], json!([]));

    let (status, _, body) = app.get("/v2/ghosts?journalYear=1999").await?;
    assert_status(status, StatusCode::INTERNAL_SERVER_ERROR, "broken data statement");
    assert_eq!(error_kind(&body), Some("ExecutionError"));
    Ok(())
}
