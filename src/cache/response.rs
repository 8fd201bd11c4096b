//! Write-through cache of generation results.
//!
//! [`ResponseCache`] sits in the [`Generator`](crate::Generator) between key
//! derivation and the rate limiter. A hit bypasses the limiter and the
//! backend entirely; a successful miss is written back with a flat TTL.
//!
//! Store failures never fail a request: a failed read is treated as a miss
//! and a failed write is skipped. Both are logged and counted under
//! [`telemetry::STORE_ERRORS_TOTAL`].

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::store::{CacheStore, DEFAULT_MEMORY_STORE_MAX};
use crate::telemetry;
use crate::types::{CachedGeneration, ContentType, GenerationResult};

/// Configuration for the response cache.
///
/// ```rust
/// # use scriptorium::cache::CacheConfig;
/// # use std::time::Duration;
/// let config = CacheConfig::new()
///     .max_entries(50_000)
///     .ttl(Duration::from_secs(600));
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Capacity of the default in-memory store. Default: 10,000.
    pub max_entries: u64,
    /// Time-to-live for cached generations. Default: 1 hour.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MEMORY_STORE_MAX,
            ttl: Duration::from_secs(3600),
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the capacity of the in-memory store.
    pub fn max_entries(mut self, n: u64) -> Self {
        self.max_entries = n;
        self
    }

    /// Set the time-to-live for cached generations.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// Generation cache over a shared [`CacheStore`].
pub struct ResponseCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Flat TTL applied to every write.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a cached generation and replay it with a fresh generation id.
    pub async fn get(&self, key: &str, content_type: ContentType) -> Option<GenerationResult> {
        let bytes = match self.store.get(key).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(store = self.store.name(), error = %e, "cache read failed, treating as miss");
                metrics::counter!(telemetry::STORE_ERRORS_TOTAL, "operation" => "read")
                    .increment(1);
                None
            }
        };

        let cached = bytes.and_then(|b| match serde_json::from_slice::<CachedGeneration>(&b) {
            Ok(c) => Some(c),
            Err(e) => {
                warn!(key, error = %e, "discarding undecodable cache entry");
                None
            }
        });

        match cached {
            Some(c) => {
                debug!(key, "cache hit");
                metrics::counter!(telemetry::CACHE_HITS_TOTAL, "content_type" => content_type.as_str())
                    .increment(1);
                Some(c.replay())
            }
            None => {
                debug!(key, "cache miss");
                metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "content_type" => content_type.as_str())
                    .increment(1);
                None
            }
        }
    }

    /// Write a fresh generation through to the store.
    pub async fn insert(&self, key: &str, result: &GenerationResult) {
        let bytes = match serde_json::to_vec(&CachedGeneration::from_result(result)) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(key, error = %e, "failed to encode generation for cache");
                return;
            }
        };
        if let Err(e) = self.store.set_with_expiry(key, self.ttl, bytes).await {
            warn!(store = self.store.name(), error = %e, "cache write failed, result not cached");
            metrics::counter!(telemetry::STORE_ERRORS_TOTAL, "operation" => "write").increment(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use crate::types::GenerationMetadata;
    use chrono::Utc;
    use std::collections::BTreeMap;
    use uuid::Uuid;

    fn result(content: &str) -> GenerationResult {
        GenerationResult {
            content: content.into(),
            model: "gpt-4".into(),
            metadata: GenerationMetadata {
                generation_id: Uuid::new_v4(),
                generation_time: 1.5,
                tokens_used: 1,
                timestamp: Utc::now(),
                content_type: "text".into(),
                max_tokens: 500,
                temperature: 0.7,
                language: "en".into(),
                style: "professional".into(),
                params: BTreeMap::new(),
                cached: false,
            },
        }
    }

    #[test]
    fn cache_config_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.max_entries, 10_000);
        assert_eq!(config.ttl, Duration::from_secs(3600));
    }

    #[tokio::test]
    async fn insert_then_get_replays() {
        let cache = ResponseCache::new(Arc::new(MemoryStore::new()), Duration::from_secs(60));
        assert!(cache.get("k", ContentType::Text).await.is_none());

        let original = result("hello");
        cache.insert("k", &original).await;

        let hit = cache.get("k", ContentType::Text).await.unwrap();
        assert_eq!(hit.content, "hello");
        assert!(hit.metadata.cached);
        assert_eq!(hit.metadata.generation_time, 1.5);
        assert_ne!(hit.metadata.generation_id, original.metadata.generation_id);
    }

    #[tokio::test]
    async fn undecodable_entry_is_a_miss() {
        let store = Arc::new(MemoryStore::new());
        store
            .set_with_expiry("k", Duration::from_secs(60), b"not json".to_vec())
            .await
            .unwrap();
        let cache = ResponseCache::new(store, Duration::from_secs(60));
        assert!(cache.get("k", ContentType::Text).await.is_none());
    }
}
