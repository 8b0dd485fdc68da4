//! Shared application state

use crate::{
    cache::{self, ResponseCache},
    config::Config,
    db::{self, QueryExecutor},
    services::QueryService,
    Result,
};
use sqlx::sqlite::SqlitePool;
use std::sync::Arc;
use zenodeo_query::ResourceCatalog;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub catalog: Arc<ResourceCatalog>,
    pub pool: SqlitePool,
    pub cache: Arc<dyn ResponseCache>,
    pub query_service: Arc<QueryService>,
}

impl AppState {
    /// Connect to the database, apply migrations and load the resource catalog.
    pub async fn new(config: Config) -> Result<Self> {
        let pool = db::connect(&config.database).await?;
        if config.database.run_migrations {
            db::run_migrations(&pool).await?;
        }

        let catalog = match &config.query.descriptors_path {
            Some(path) => {
                tracing::info!(path = %path.display(), "Loading resource descriptors");
                Arc::new(ResourceCatalog::from_path(path)?)
            }
            None => ResourceCatalog::builtin()?,
        };
        tracing::info!(resources = catalog.len(), "Resource catalog loaded");

        let cache = cache::from_config(&config.cache);
        Ok(Self::from_parts(config, catalog, pool, cache))
    }

    /// Assemble state from already-built parts.
    pub fn from_parts(
        config: Config,
        catalog: Arc<ResourceCatalog>,
        pool: SqlitePool,
        cache: Arc<dyn ResponseCache>,
    ) -> Self {
        let executor = QueryExecutor::new(pool.clone(), config.database.statement_timeout());
        let query_service = Arc::new(QueryService::new(
            Arc::clone(&catalog),
            executor,
            Arc::clone(&cache),
            config.query.paging(),
        ));

        Self {
            config: Arc::new(config),
            catalog,
            pool,
            cache,
            query_service,
        }
    }
}
