//! Resource API Routes
//!
//! Resource names match case-insensitively (`/treatmentAuthors` and
//! `/treatmentauthors` are the same resource); record ids are taken verbatim.

use crate::api::handlers::resources;
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn resource_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(resources::list_resources))
        .route("/:resource", get(resources::search_resource))
        .route("/:resource/:id", get(resources::read_resource))
}
