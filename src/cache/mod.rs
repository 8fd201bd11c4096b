//! Caching subsystem.
//!
//! - [`key`] — deterministic request fingerprints.
//! - [`store`] — the [`CacheStore`] trait shared by the response cache and
//!   the rate limiter, plus the in-memory [`MemoryStore`].
//! - [`response`] — [`ResponseCache`], the write-through generation cache.

pub mod key;
pub mod response;
pub mod store;

pub use key::derive_key;
pub use response::{CacheConfig, ResponseCache};
pub use store::{CacheStore, MemoryStore};
