//! Response cache façade
//!
//! Assembled envelopes are cached under their canonical [`CacheKey`], one
//! namespace (segment) per resource. Cache failures never fail a request; the
//! query service logs them and falls through to execution.

use async_trait::async_trait;
use lru::LruCache;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;
use zenodeo_query::CacheKey;

use crate::config::CacheConfig;

pub type CachedResponse = Arc<JsonValue>;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache lock poisoned")]
    Poisoned,

    #[error("cache backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait ResponseCache: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Result<Option<CachedResponse>, CacheError>;

    async fn put(&self, key: &CacheKey, value: CachedResponse) -> Result<(), CacheError>;

    /// Removes one entry. Returns whether it was present.
    async fn evict(&self, key: &CacheKey) -> Result<bool, CacheError>;
}

/// Builds the cache selected by configuration.
pub fn from_config(config: &CacheConfig) -> Arc<dyn ResponseCache> {
    if config.enabled {
        Arc::new(MemoryCache::new(config.capacity, config.ttl()))
    } else {
        Arc::new(NoopCache)
    }
}

struct Entry {
    value: CachedResponse,
    stored_at: Instant,
}

/// In-process cache: one bounded LRU per segment, entries expire after `ttl`.
pub struct MemoryCache {
    segments: Mutex<HashMap<String, LruCache<String, Entry>>>,
    capacity: NonZeroUsize,
    ttl: Duration,
}

impl MemoryCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            segments: Mutex::new(HashMap::new()),
            capacity: NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            ttl,
        }
    }

    fn record_size(segment: &str, len: usize) {
        crate::metrics::CACHE_ENTRIES
            .with_label_values(&[segment])
            .set(len as i64);
    }
}

#[async_trait]
impl ResponseCache for MemoryCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<CachedResponse>, CacheError> {
        let mut segments = self.segments.lock().map_err(|_| CacheError::Poisoned)?;
        let Some(lru) = segments.get_mut(&key.segment) else {
            return Ok(None);
        };

        let expired = match lru.get(&key.query) {
            None => return Ok(None),
            Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                return Ok(Some(Arc::clone(&entry.value)))
            }
            Some(_) => true,
        };

        if expired {
            lru.pop(&key.query);
            Self::record_size(&key.segment, lru.len());
        }
        Ok(None)
    }

    async fn put(&self, key: &CacheKey, value: CachedResponse) -> Result<(), CacheError> {
        let mut segments = self.segments.lock().map_err(|_| CacheError::Poisoned)?;
        let lru = segments
            .entry(key.segment.clone())
            .or_insert_with(|| LruCache::new(self.capacity));
        lru.put(
            key.query.clone(),
            Entry {
                value,
                stored_at: Instant::now(),
            },
        );
        Self::record_size(&key.segment, lru.len());
        Ok(())
    }

    async fn evict(&self, key: &CacheKey) -> Result<bool, CacheError> {
        let mut segments = self.segments.lock().map_err(|_| CacheError::Poisoned)?;
        let Some(lru) = segments.get_mut(&key.segment) else {
            return Ok(false);
        };
        let removed = lru.pop(&key.query).is_some();
        Self::record_size(&key.segment, lru.len());
        Ok(removed)
    }
}

/// Used when caching is disabled.
pub struct NoopCache;

#[async_trait]
impl ResponseCache for NoopCache {
    async fn get(&self, _key: &CacheKey) -> Result<Option<CachedResponse>, CacheError> {
        Ok(None)
    }

    async fn put(&self, _key: &CacheKey, _value: CachedResponse) -> Result<(), CacheError> {
        Ok(())
    }

    async fn evict(&self, _key: &CacheKey) -> Result<bool, CacheError> {
        Ok(false)
    }
}
