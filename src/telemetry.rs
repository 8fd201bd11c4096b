//! Telemetry metric name constants.
//!
//! Consumers install their own `metrics` recorder (e.g. prometheus, statsd);
//! without a recorder installed, all metric calls are no-ops.
//!
//! All metrics are prefixed with `scriptorium_`. Counters end in `_total`,
//! histograms carry their unit (`_seconds`).
//!
//! # Common labels
//!
//! - `content_type` — content type tag (e.g. "summary", "email")
//! - `backend` — path that served the request ("remote", "local" or "unavailable")
//! - `status` — outcome: "ok" or "error"

/// Total generation requests that reached a backend.
///
/// Labels: `content_type`, `backend`, `status` ("ok" | "error").
pub const REQUESTS_TOTAL: &str = "scriptorium_requests_total";

/// Backend generation duration in seconds.
///
/// Labels: `content_type`, `backend`.
pub const GENERATION_DURATION_SECONDS: &str = "scriptorium_generation_duration_seconds";

/// Total cache hits.
///
/// Labels: `content_type`.
pub const CACHE_HITS_TOTAL: &str = "scriptorium_cache_hits_total";

/// Total cache misses.
///
/// Labels: `content_type`.
pub const CACHE_MISSES_TOTAL: &str = "scriptorium_cache_misses_total";

/// Total requests rejected by the fixed-window limiter.
pub const RATE_LIMITED_TOTAL: &str = "scriptorium_rate_limited_total";

/// Total store operations that failed and were skipped (fail-open).
///
/// Labels: `operation` ("read" | "write" | "rate_limit").
pub const STORE_ERRORS_TOTAL: &str = "scriptorium_store_errors_total";

/// Total requests answered with the local-model sentinel.
///
/// Labels: `task` ("text" | "code" | "summary").
pub const LOCAL_UNAVAILABLE_TOTAL: &str = "scriptorium_local_unavailable_total";
