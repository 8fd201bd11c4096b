//! Fixed-window rate limiter.
//!
//! One counter per window key, stored in the shared [`CacheStore`] with the
//! window length as its expiry:
//!
//! ```text
//!   no record            ──► set count = 1, expire in `window`   (UNDER_LIMIT)
//!   count <  max_requests ──► increment, keep expiry              (UNDER_LIMIT)
//!   count >= max_requests ──► RateLimitExceeded                   (AT_LIMIT)
//!   record expires        ──► back to "no record"
//! ```
//!
//! By default the window is process-global (key `rate_limit`), shared by all
//! callers. [`RateLimitScope::PerCaller`] keys the window by
//! [`GenerationRequest::caller`](crate::GenerationRequest::caller) instead.
//!
//! The limiter fails open: if the store errors, the request is admitted and
//! the failure is logged.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache::CacheStore;
use crate::telemetry;
use crate::{Result, ScriptoriumError};

/// Key of the process-global window.
pub const GLOBAL_WINDOW_KEY: &str = "rate_limit";

/// Which requests share a window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitScope {
    /// One window for every request.
    #[default]
    Global,
    /// One window per caller identity; requests without one share the
    /// global window.
    PerCaller,
}

/// Limiter configuration.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Requests admitted per window. Default: 100.
    pub max_requests: u64,
    /// Window length. Default: 60 seconds.
    pub window: Duration,
    pub scope: RateLimitScope,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(60),
            scope: RateLimitScope::Global,
        }
    }
}

impl RateLimitConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of requests admitted per window.
    pub fn max_requests(mut self, n: u64) -> Self {
        self.max_requests = n;
        self
    }

    /// Set the window length.
    pub fn window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Set the window granularity.
    pub fn scope(mut self, scope: RateLimitScope) -> Self {
        self.scope = scope;
        self
    }
}

/// Fixed-window limiter over a [`CacheStore`].
pub struct RateLimiter {
    store: Arc<dyn CacheStore>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CacheStore>, config: RateLimitConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Store key of the window that `caller` counts against.
    pub fn window_key(&self, caller: Option<&str>) -> String {
        match (self.config.scope, caller) {
            (RateLimitScope::PerCaller, Some(caller)) => format!("{GLOBAL_WINDOW_KEY}:{caller}"),
            _ => GLOBAL_WINDOW_KEY.to_string(),
        }
    }

    /// Count one request against the window, or reject it.
    pub async fn check(&self, caller: Option<&str>) -> Result<()> {
        let key = self.window_key(caller);

        let current = match self.store.get(&key).await {
            Ok(bytes) => bytes.and_then(|b| parse_count(&b)),
            Err(e) => {
                self.fail_open(&key, &e);
                return Ok(());
            }
        };

        match current {
            Some(count) if count >= self.config.max_requests => {
                debug!(key = %key, count, "rate limit reached");
                metrics::counter!(telemetry::RATE_LIMITED_TOTAL).increment(1);
                Err(ScriptoriumError::RateLimitExceeded {
                    limit: self.config.max_requests,
                    window: self.config.window,
                })
            }
            Some(_) => match self.store.increment(&key).await {
                Ok(Some(_)) => Ok(()),
                // window expired between the read and the increment
                Ok(None) => self.open_window(&key).await,
                Err(e) => {
                    self.fail_open(&key, &e);
                    Ok(())
                }
            },
            None => self.open_window(&key).await,
        }
    }

    async fn open_window(&self, key: &str) -> Result<()> {
        if let Err(e) = self
            .store
            .set_with_expiry(key, self.config.window, b"1".to_vec())
            .await
        {
            self.fail_open(key, &e);
        }
        Ok(())
    }

    fn fail_open(&self, key: &str, error: &ScriptoriumError) {
        warn!(store = self.store.name(), key, error = %error, "rate limit store failed, admitting request");
        metrics::counter!(telemetry::STORE_ERRORS_TOTAL, "operation" => "rate_limit").increment(1);
    }
}

fn parse_count(bytes: &[u8]) -> Option<u64> {
    std::str::from_utf8(bytes).ok()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;

    fn limiter(max: u64, window: Duration, scope: RateLimitScope) -> RateLimiter {
        RateLimiter::new(
            Arc::new(MemoryStore::new()),
            RateLimitConfig::new()
                .max_requests(max)
                .window(window)
                .scope(scope),
        )
    }

    #[test]
    fn defaults_match_fixed_window() {
        let config = RateLimitConfig::default();
        assert_eq!(config.max_requests, 100);
        assert_eq!(config.window, Duration::from_secs(60));
        assert_eq!(config.scope, RateLimitScope::Global);
    }

    #[tokio::test]
    async fn hundred_pass_then_reject() {
        let limiter = limiter(100, Duration::from_secs(60), RateLimitScope::Global);
        for i in 0..100 {
            limiter
                .check(None)
                .await
                .unwrap_or_else(|e| panic!("call {} rejected: {e}", i + 1));
        }
        assert!(matches!(
            limiter.check(None).await,
            Err(ScriptoriumError::RateLimitExceeded { limit: 100, .. })
        ));
    }

    #[tokio::test]
    async fn window_resets_after_expiry() {
        let limiter = limiter(2, Duration::from_millis(50), RateLimitScope::Global);
        limiter.check(None).await.unwrap();
        limiter.check(None).await.unwrap();
        assert!(limiter.check(None).await.is_err());

        tokio::time::sleep(Duration::from_millis(100)).await;
        limiter.check(None).await.unwrap();
    }

    #[tokio::test]
    async fn global_scope_ignores_caller() {
        let limiter = limiter(1, Duration::from_secs(60), RateLimitScope::Global);
        limiter.check(Some("alice")).await.unwrap();
        assert!(limiter.check(Some("bob")).await.is_err());
    }

    #[tokio::test]
    async fn per_caller_scope_separates_windows() {
        let limiter = limiter(1, Duration::from_secs(60), RateLimitScope::PerCaller);
        limiter.check(Some("alice")).await.unwrap();
        limiter.check(Some("bob")).await.unwrap();
        assert!(limiter.check(Some("alice")).await.is_err());
        // anonymous requests share the global window
        limiter.check(None).await.unwrap();
        assert!(limiter.check(None).await.is_err());
    }

    #[test]
    fn window_keys() {
        let global = limiter(1, Duration::from_secs(1), RateLimitScope::Global);
        assert_eq!(global.window_key(Some("x")), "rate_limit");
        let per = limiter(1, Duration::from_secs(1), RateLimitScope::PerCaller);
        assert_eq!(per.window_key(Some("x")), "rate_limit:x");
        assert_eq!(per.window_key(None), "rate_limit");
    }
}
