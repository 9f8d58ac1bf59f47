//! Cache Entry Module
//!
//! Defines a stored response with its write time and expiry.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;

// == Cache Entry ==
/// A cached upstream payload with TTL metadata.
///
/// The expiry is computed once at write time and stored alongside the
/// payload, so reads only compare against the current clock.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// Derived cache key
    pub cache_key: String,
    /// Opaque JSON payload, returned unchanged on a hit
    pub payload: Value,
    /// Write timestamp (Unix milliseconds)
    pub stored_at: i64,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: i64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry written at `now` that lives for `ttl`.
    pub fn new(cache_key: impl Into<String>, payload: Value, ttl: Duration, now: DateTime<Utc>) -> Self {
        let stored_at = now.timestamp_millis();
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);

        Self {
            cache_key: cache_key.into(),
            payload,
            stored_at,
            expires_at: stored_at.saturating_add(ttl_ms),
        }
    }

    // == Is Expired ==
    /// Checks whether the entry has expired at `now`.
    ///
    /// Boundary condition: an entry is expired once `now >= expires_at`, so
    /// an entry is never served after its full TTL has elapsed.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        is_expired(self.expires_at, now)
    }

    // == Time To Live ==
    /// Remaining lifetime at `now`, zero once expired.
    pub fn ttl_remaining_at(&self, now: DateTime<Utc>) -> Duration {
        let remaining = self.expires_at - now.timestamp_millis();
        Duration::from_millis(u64::try_from(remaining).unwrap_or(0))
    }
}

/// Expiry test on a raw stored timestamp.
pub(crate) fn is_expired(expires_at: i64, now: DateTime<Utc>) -> bool {
    now.timestamp_millis() >= expires_at
}
