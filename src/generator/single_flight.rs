//! Per-fingerprint guard for concurrent identical cache misses.
//!
//! The first caller for a key computes; later callers for the same key wait
//! on the guard and then re-read the cache instead of calling the backend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Default)]
pub(crate) struct SingleFlight {
    inflight: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl SingleFlight {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Take the guard for `key`, waiting while another caller holds it.
    pub(crate) async fn acquire(&self, key: &str) -> FlightGuard<'_> {
        let lock = {
            let mut map = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
            map.entry(key.to_string()).or_default().clone()
        };

        let (guard, waited) = match lock.clone().try_lock_owned() {
            Ok(guard) => (guard, false),
            Err(_) => (lock.clone().lock_owned().await, true),
        };

        FlightGuard {
            owner: self,
            key: key.to_string(),
            lock,
            guard: Some(guard),
            waited,
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inflight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Held for the duration of one computation.
pub(crate) struct FlightGuard<'a> {
    owner: &'a SingleFlight,
    key: String,
    lock: Arc<AsyncMutex<()>>,
    guard: Option<OwnedMutexGuard<()>>,
    waited: bool,
}

impl FlightGuard<'_> {
    /// Whether another caller held the guard first; if so, its result may
    /// already be cached.
    pub(crate) fn waited(&self) -> bool {
        self.waited
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        // Release before checking the count, the owned guard holds a clone.
        self.guard.take();
        let mut map = self
            .owner
            .inflight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // Only the map and this guard still reference the lock.
        if Arc::strong_count(&self.lock) == 2 {
            map.remove(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn uncontended_acquire_does_not_wait() {
        let sf = SingleFlight::new();
        let guard = sf.acquire("k").await;
        assert!(!guard.waited());
        drop(guard);
        assert_eq!(sf.len(), 0);
    }

    #[tokio::test]
    async fn second_caller_waits_for_first() {
        let sf = Arc::new(SingleFlight::new());
        let first = sf.acquire("k").await;

        let sf2 = sf.clone();
        let waiter = tokio::spawn(async move {
            let guard = sf2.acquire("k").await;
            guard.waited()
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());
        drop(first);

        assert!(waiter.await.unwrap());
        assert_eq!(sf.len(), 0);
    }

    #[tokio::test]
    async fn distinct_keys_do_not_block() {
        let sf = SingleFlight::new();
        let a = sf.acquire("a").await;
        let b = sf.acquire("b").await;
        assert!(!a.waited());
        assert!(!b.waited());
    }
}
