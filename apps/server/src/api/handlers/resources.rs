//! Resource query handlers
//!
//! - GET {api}                       list of queryable resources
//! - GET {api}/{resource}?params     search
//! - GET {api}/{resource}/{id}       single record with related records

use crate::{api::url as api_url, services::QueryOutcome, state::AppState, Result};
use axum::{
    extract::{Path, RawQuery, State},
    http::{HeaderMap, HeaderValue},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

const X_CACHE: &str = "x-cache";

pub async fn list_resources(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<serde_json::Value> {
    let base_url = api_url::api_base_url(&state.config.server, &headers);

    let resources: Vec<_> = state
        .catalog
        .iter()
        .map(|descriptor| {
            json!({
                "name": descriptor.name,
                "summary": descriptor.summary,
                "_links": {
                    "self": { "href": format!("{}/{}", base_url, descriptor.path()) }
                }
            })
        })
        .collect();

    Json(json!({
        "num-of-records": resources.len(),
        "_links": { "self": { "href": base_url } },
        "records": resources
    }))
}

pub async fn search_resource(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Result<Response> {
    run_query(&state, &resource, None, &headers, query.as_deref()).await
}

pub async fn read_resource(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Result<Response> {
    run_query(&state, &resource, Some(&id), &headers, query.as_deref()).await
}

async fn run_query(
    state: &AppState,
    resource: &str,
    resource_id: Option<&str>,
    headers: &HeaderMap,
    raw_query: Option<&str>,
) -> Result<Response> {
    let base_url = api_url::api_base_url(&state.config.server, headers);
    let items = query_items(raw_query);

    let outcome = state
        .query_service
        .query(resource, resource_id, &items, &base_url)
        .await?;

    Ok(envelope_response(outcome))
}

/// Decoded query-string pairs in request order.
fn query_items(raw_query: Option<&str>) -> Vec<(String, String)> {
    raw_query
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

fn envelope_response(outcome: QueryOutcome) -> Response {
    let mut response = Json(outcome.body.as_ref()).into_response();
    let cache_status = if outcome.cache_hit { "HIT" } else { "MISS" };
    response
        .headers_mut()
        .insert(X_CACHE, HeaderValue::from_static(cache_status));
    response
}
