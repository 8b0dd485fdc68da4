//! Query service - resource queries from request to envelope
//!
//! Orchestrates one request:
//! - Parsing and validating parameters against the resource descriptor
//! - Serving from the response cache when possible
//! - Compiling and executing the query set
//! - Assembling the envelope and caching complete results

use crate::{
    cache::{CachedResponse, ResponseCache},
    db::QueryExecutor,
    metrics::{CACHE_LOOKUPS_TOTAL, QUERY_RESULTS},
    Error, Result,
};
use std::sync::Arc;
use zenodeo_query::{
    assemble, compile, CacheKey, Paging, QueryRequest, ResourceCatalog, ResourceDescriptor,
};

/// Envelope served for a request and where it came from.
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub body: CachedResponse,
    pub cache_hit: bool,
    /// Some auxiliary statement failed; the envelope omits its section.
    pub partial: bool,
}

pub struct QueryService {
    catalog: Arc<ResourceCatalog>,
    executor: QueryExecutor,
    cache: Arc<dyn ResponseCache>,
    paging: Paging,
}

impl QueryService {
    pub fn new(
        catalog: Arc<ResourceCatalog>,
        executor: QueryExecutor,
        cache: Arc<dyn ResponseCache>,
        paging: Paging,
    ) -> Self {
        Self {
            catalog,
            executor,
            cache,
            paging,
        }
    }

    pub fn catalog(&self) -> &Arc<ResourceCatalog> {
        &self.catalog
    }

    /// Query a resource.
    ///
    /// GET {api}/{resource}?params and GET {api}/{resource}/{id}?params
    pub async fn query(
        &self,
        resource: &str,
        resource_id: Option<&str>,
        items: &[(String, String)],
        base_url: &str,
    ) -> Result<QueryOutcome> {
        let descriptor = self.catalog.require(resource)?;
        let request = self.parse_request(&descriptor, resource_id, items)?;
        let key = CacheKey::for_request(&request);

        if request.refresh_cache {
            self.evict(&key).await;
        } else if let Some(body) = self.lookup(&key).await {
            return Ok(QueryOutcome {
                body,
                cache_hit: true,
                partial: false,
            });
        }

        let compiled = compile(&descriptor, &request)?;
        let results = self.executor.execute(&compiled).await?;

        let partial = results.is_partial();
        if partial {
            for failure in &results.failures {
                tracing::warn!(
                    resource = %descriptor.name,
                    kind = %failure.kind,
                    name = %failure.name,
                    error = %failure.message,
                    "Section omitted from response"
                );
            }
        }

        QUERY_RESULTS
            .with_label_values(&[descriptor.name.as_str()])
            .observe(results.num_of_records as f64);

        let envelope = assemble(results, &request, &descriptor, base_url);
        let body: CachedResponse = Arc::new(
            envelope
                .to_value()
                .map_err(|e| Error::Internal(format!("Failed to serialize envelope: {e}")))?,
        );

        // A partial envelope would hide the failed section until the entry expires.
        if !partial {
            if let Err(e) = self.cache.put(&key, Arc::clone(&body)).await {
                tracing::warn!(key = %key, error = %e, "Failed to store response in cache");
            }
        }

        Ok(QueryOutcome {
            body,
            cache_hit: false,
            partial,
        })
    }

    fn parse_request(
        &self,
        descriptor: &ResourceDescriptor,
        resource_id: Option<&str>,
        items: &[(String, String)],
    ) -> Result<QueryRequest> {
        let pairs = items.iter().map(|(k, v)| (k.as_str(), v.as_str()));
        let request = QueryRequest::parse(descriptor, pairs, &self.paging)?;

        Ok(match resource_id {
            Some(id) if !id.is_empty() => request.with_resource_id(descriptor, id),
            _ => request,
        })
    }

    async fn lookup(&self, key: &CacheKey) -> Option<CachedResponse> {
        let (result, hit) = match self.cache.get(key).await {
            Ok(Some(body)) => ("hit", Some(body)),
            Ok(None) => ("miss", None),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache lookup failed");
                ("error", None)
            }
        };

        CACHE_LOOKUPS_TOTAL
            .with_label_values(&[key.segment.as_str(), result])
            .inc();
        tracing::debug!(key = %key, result, "Cache lookup");
        hit
    }

    async fn evict(&self, key: &CacheKey) {
        match self.cache.evict(key).await {
            Ok(removed) => tracing::debug!(key = %key, removed, "Cache entry refreshed"),
            Err(e) => tracing::warn!(key = %key, error = %e, "Failed to evict cache entry"),
        }
    }
}
