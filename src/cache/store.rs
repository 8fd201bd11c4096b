//! Key-value store abstraction used for cached generations and rate-limit
//! windows.
//!
//! The generator only needs three operations from its store, captured by
//! [`CacheStore`]. A redis-backed deployment implements the trait with
//! `GET` / `SETEX` / `INCR`; [`MemoryStore`] is the in-process default.
//!
//! Get-then-set sequences across these calls are not atomic. Callers accept
//! that two concurrent writers may both observe a miss.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;

use crate::{Result, ScriptoriumError};

/// Store used for cached generations and rate-limit counters.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Store name for logging/debugging.
    fn name(&self) -> &str;

    /// Fetch a value. `None` on miss or after expiry.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Insert or overwrite a value that expires after `ttl`.
    async fn set_with_expiry(&self, key: &str, ttl: Duration, value: Vec<u8>) -> Result<()>;

    /// Increment a decimal counter in place, keeping its remaining expiry.
    ///
    /// Returns the new value, or `None` if the key does not exist.
    async fn increment(&self, key: &str) -> Result<Option<u64>>;
}

/// Default maximum number of entries held by a [`MemoryStore`].
pub const DEFAULT_MEMORY_STORE_MAX: u64 = 10_000;

#[derive(Clone)]
struct StoredValue {
    bytes: Vec<u8>,
    expires_at: Instant,
}

/// Per-entry expiry: each value carries its own deadline, so an overwrite
/// through [`CacheStore::increment`] keeps the window it was created with.
struct DeadlineExpiry;

impl Expiry<String, StoredValue> for DeadlineExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &StoredValue,
        created_at: Instant,
    ) -> Option<Duration> {
        Some(value.expires_at.saturating_duration_since(created_at))
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &StoredValue,
        updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.expires_at.saturating_duration_since(updated_at))
    }
}

/// In-memory [`CacheStore`] on moka's async cache.
///
/// Bounded in size (LRU-ish eviction once full) with a deadline per entry.
pub struct MemoryStore {
    entries: Cache<String, StoredValue>,
}

impl MemoryStore {
    /// Create a store with the default capacity.
    pub fn new() -> Self {
        Self::with_max_entries(DEFAULT_MEMORY_STORE_MAX)
    }

    /// Create a store holding at most `max` entries.
    pub fn with_max_entries(max: u64) -> Self {
        let entries = Cache::builder()
            .max_capacity(max)
            .expire_after(DeadlineExpiry)
            .build();
        Self { entries }
    }

    /// Live entry lookup that also honours the deadline between moka's
    /// housekeeping passes.
    async fn live(&self, key: &str) -> Option<StoredValue> {
        self.entries
            .get(key)
            .await
            .filter(|v| v.expires_at > Instant::now())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.live(key).await.map(|v| v.bytes))
    }

    async fn set_with_expiry(&self, key: &str, ttl: Duration, value: Vec<u8>) -> Result<()> {
        let stored = StoredValue {
            bytes: value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.insert(key.to_string(), stored).await;
        Ok(())
    }

    async fn increment(&self, key: &str) -> Result<Option<u64>> {
        let Some(current) = self.live(key).await else {
            return Ok(None);
        };
        let count: u64 = std::str::from_utf8(&current.bytes)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| {
                ScriptoriumError::Store(format!("value at '{key}' is not an integer"))
            })?;
        let next = count + 1;
        self.entries
            .insert(
                key.to_string(),
                StoredValue {
                    bytes: next.to_string().into_bytes(),
                    expires_at: current.expires_at,
                },
            )
            .await;
        Ok(Some(next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_miss_then_hit() {
        let store = MemoryStore::new();
        assert!(store.get("k").await.unwrap().is_none());
        store
            .set_with_expiry("k", Duration::from_secs(60), b"v".to_vec())
            .await
            .unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(b"v".to_vec()));
    }

    #[tokio::test]
    async fn entries_expire() {
        let store = MemoryStore::new();
        store
            .set_with_expiry("k", Duration::from_millis(50), b"v".to_vec())
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(store.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn increment_missing_key_is_none() {
        let store = MemoryStore::new();
        assert_eq!(store.increment("counter").await.unwrap(), None);
    }

    #[tokio::test]
    async fn increment_keeps_original_deadline() {
        let store = MemoryStore::new();
        store
            .set_with_expiry("counter", Duration::from_millis(80), b"1".to_vec())
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(store.increment("counter").await.unwrap(), Some(2));
        tokio::time::sleep(Duration::from_millis(60)).await;
        // a fresh TTL on increment would still hold the key here
        assert!(store.get("counter").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn increment_non_integer_is_store_error() {
        let store = MemoryStore::new();
        store
            .set_with_expiry("k", Duration::from_secs(60), b"abc".to_vec())
            .await
            .unwrap();
        assert!(matches!(
            store.increment("k").await,
            Err(ScriptoriumError::Store(_))
        ));
    }
}
