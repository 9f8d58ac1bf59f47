//! Cache Store Module
//!
//! Durable response cache backed by the `response_cache` table. Every
//! operation degrades instead of failing: a broken read is a miss and a
//! broken write is dropped, both with a warning.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::entry::is_expired;
use crate::cache::{CacheEntry, CacheStats};
use crate::db::Database;
use crate::error::Result;

/// Outcome of a raw lookup before statistics are recorded.
enum Lookup {
    Hit(CacheEntry),
    Expired,
    Missing,
}

// == Response Cache ==
/// A namespace of cached upstream responses with a default TTL.
///
/// Cloning is cheap; clones share the connection and the statistics.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    db: Database,
    namespace: Arc<str>,
    default_ttl: Duration,
    stats: Arc<Mutex<CacheStats>>,
}

impl ResponseCache {
    // == Constructor ==
    /// Creates a cache over `db` for one namespace.
    ///
    /// # Arguments
    /// * `db` - Shared database handle
    /// * `namespace` - Partition of the cache table (`news`, `sports`)
    /// * `default_ttl` - Lifetime used by [`ResponseCache::put`]
    pub fn new(db: Database, namespace: &str, default_ttl: Duration) -> Self {
        Self {
            db,
            namespace: Arc::from(namespace),
            default_ttl,
            stats: Arc::new(Mutex::new(CacheStats::new())),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    // == Get ==
    /// Returns the stored payload if present and not expired.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.get_at(key, Utc::now())
    }

    /// Same as [`ResponseCache::get`] with an explicit clock.
    ///
    /// Expired entries are deleted on the way out.
    pub fn get_at(&self, key: &str, now: DateTime<Utc>) -> Option<Value> {
        match self.lookup(key, now) {
            Ok(Lookup::Hit(entry)) => {
                debug!(namespace = %self.namespace, key, "Cache hit");
                self.record(CacheStats::record_hit);
                Some(entry.payload)
            }
            Ok(Lookup::Expired) => {
                debug!(namespace = %self.namespace, key, "Cache entry expired");
                self.record(CacheStats::record_expired);
                self.evict(key);
                None
            }
            Ok(Lookup::Missing) => {
                self.record(CacheStats::record_miss);
                None
            }
            Err(e) => {
                warn!(namespace = %self.namespace, key, "Cache retrieval error: {}", e);
                self.record(CacheStats::record_read_failure);
                None
            }
        }
    }

    fn lookup(&self, key: &str, now: DateTime<Utc>) -> Result<Lookup> {
        let row: Option<(String, i64, i64)> = self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT payload, stored_at, expires_at FROM response_cache
                 WHERE namespace = ?1 AND cache_key = ?2",
                params![&*self.namespace, key],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()
        })?;

        let Some((payload, stored_at, expires_at)) = row else {
            return Ok(Lookup::Missing);
        };
        if is_expired(expires_at, now) {
            return Ok(Lookup::Expired);
        }

        Ok(Lookup::Hit(CacheEntry {
            cache_key: key.to_string(),
            payload: serde_json::from_str(&payload)?,
            stored_at,
            expires_at,
        }))
    }

    fn evict(&self, key: &str) {
        let result = self.db.with_conn(|conn| {
            conn.execute(
                "DELETE FROM response_cache WHERE namespace = ?1 AND cache_key = ?2",
                params![&*self.namespace, key],
            )
        });
        if let Err(e) = result {
            warn!(namespace = %self.namespace, key, "Failed to delete expired entry: {}", e);
        }
    }

    // == Set ==
    /// Stores `payload` under `key` with the namespace TTL.
    pub fn put(&self, key: &str, payload: &Value) {
        self.set(key, payload, self.default_ttl);
    }

    /// Stores `payload` under `key`, replacing any previous entry.
    pub fn set(&self, key: &str, payload: &Value, ttl: Duration) {
        self.set_at(key, payload, ttl, Utc::now());
    }

    /// Same as [`ResponseCache::set`] with an explicit clock.
    pub fn set_at(&self, key: &str, payload: &Value, ttl: Duration, now: DateTime<Utc>) {
        let entry = CacheEntry::new(key, payload.clone(), ttl, now);
        match self.write(&entry) {
            Ok(()) => self.record(CacheStats::record_write),
            Err(e) => {
                warn!(namespace = %self.namespace, key, "Cache storage error: {}", e);
                self.record(CacheStats::record_write_failure);
            }
        }
    }

    fn write(&self, entry: &CacheEntry) -> Result<()> {
        let payload = serde_json::to_string(&entry.payload)?;
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO response_cache (namespace, cache_key, payload, stored_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(namespace, cache_key) DO UPDATE SET
                     payload = excluded.payload,
                     stored_at = excluded.stored_at,
                     expires_at = excluded.expires_at",
                params![
                    &*self.namespace,
                    entry.cache_key,
                    payload,
                    entry.stored_at,
                    entry.expires_at,
                ],
            )
        })?;
        Ok(())
    }

    // == Sweep ==
    /// Deletes every expired entry in this namespace.
    ///
    /// Returns the number of rows removed, or 0 if the sweep failed.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Utc::now())
    }

    /// Same as [`ResponseCache::sweep`] with an explicit clock.
    pub fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let result = self.db.with_conn(|conn| {
            conn.execute(
                "DELETE FROM response_cache WHERE namespace = ?1 AND expires_at <= ?2",
                params![&*self.namespace, now.timestamp_millis()],
            )
        });

        match result {
            Ok(removed) => {
                self.record(|stats| stats.record_swept(removed));
                removed
            }
            Err(e) => {
                warn!(namespace = %self.namespace, "Cache sweep failed: {}", e);
                0
            }
        }
    }

    // == Introspection ==
    /// Number of stored rows in the namespace.
    ///
    /// Expired rows count until a read or a sweep removes them.
    pub fn len(&self) -> Result<usize> {
        let count: i64 = self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM response_cache WHERE namespace = ?1",
                params![&*self.namespace],
                |row| row.get(0),
            )
        })?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Snapshot of the counters with the current row count.
    pub fn stats(&self) -> CacheStats {
        let mut snapshot = self
            .stats
            .lock()
            .map(|stats| stats.clone())
            .unwrap_or_default();
        match self.len() {
            Ok(count) => snapshot.set_total_entries(count),
            Err(e) => warn!(namespace = %self.namespace, "Failed to count cache entries: {}", e),
        }
        snapshot
    }

    fn record(&self, update: impl FnOnce(&mut CacheStats)) {
        if let Ok(mut stats) = self.stats.lock() {
            update(&mut stats);
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    const NEWS_TTL: Duration = Duration::from_secs(15 * 60);

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn news_cache() -> ResponseCache {
        ResponseCache::new(Database::open_in_memory().unwrap(), "news", NEWS_TTL)
    }

    #[test]
    fn test_set_and_get() {
        let cache = news_cache();
        let payload = json!({"status": "ok", "articles": [{"title": "A"}]});

        cache.set_at("headlines_general_us_1_20", &payload, NEWS_TTL, t0());

        let found = cache.get_at("headlines_general_us_1_20", t0() + chrono::Duration::minutes(14));
        assert_eq!(found, Some(payload));
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_expired_entry_is_miss_and_deleted() {
        let cache = news_cache();
        cache.set_at("k", &json!({"status": "ok"}), NEWS_TTL, t0());

        assert!(cache.get_at("k", t0() + chrono::Duration::minutes(16)).is_none());

        let stats = cache.stats();
        assert_eq!(stats.expired, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 0);
    }

    #[test]
    fn test_len_counts_expired_rows_until_swept() {
        let cache = news_cache();
        cache.set_at("old", &json!(1), NEWS_TTL, t0());
        cache.set_at("new", &json!(2), NEWS_TTL, t0() + chrono::Duration::minutes(10));

        let later = t0() + chrono::Duration::minutes(16);
        assert_eq!(cache.len().unwrap(), 2);
        assert_eq!(cache.stats().total_entries, 2);

        assert_eq!(cache.sweep_at(later), 1);
        assert_eq!(cache.len().unwrap(), 1);
    }

    #[test]
    fn test_missing_key() {
        let cache = news_cache();
        assert!(cache.get("nope").is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_last_write_wins() {
        let cache = news_cache();
        cache.set_at("k", &json!("first"), NEWS_TTL, t0());
        cache.set_at("k", &json!("second"), NEWS_TTL, t0() + chrono::Duration::minutes(10));

        // The second write also resets the expiry
        let later = t0() + chrono::Duration::minutes(20);
        assert_eq!(cache.get_at("k", later), Some(json!("second")));
        assert_eq!(cache.len().unwrap(), 1);
    }

    #[test]
    fn test_namespaces_are_isolated() {
        let db = Database::open_in_memory().unwrap();
        let news = ResponseCache::new(db.clone(), "news", NEWS_TTL);
        let sports = ResponseCache::new(db, "sports", Duration::from_secs(300));

        news.put("shared", &json!("news"));
        sports.put("shared", &json!("sports"));

        assert_eq!(news.get("shared"), Some(json!("news")));
        assert_eq!(sports.get("shared"), Some(json!("sports")));
    }

    #[test]
    fn test_sweep_removes_only_expired() {
        let cache = news_cache();
        cache.set_at("old", &json!(1), Duration::from_secs(60), t0());
        cache.set_at("edge", &json!(2), Duration::from_secs(120), t0());
        cache.set_at("fresh", &json!(3), Duration::from_secs(600), t0());

        let removed = cache.sweep_at(t0() + chrono::Duration::seconds(120));

        assert_eq!(removed, 2);
        assert_eq!(cache.len().unwrap(), 1);
        assert_eq!(cache.stats().swept, 2);
        assert_eq!(
            cache.get_at("fresh", t0() + chrono::Duration::seconds(120)),
            Some(json!(3))
        );
    }

    #[test]
    fn test_sweep_leaves_other_namespace() {
        let db = Database::open_in_memory().unwrap();
        let news = ResponseCache::new(db.clone(), "news", NEWS_TTL);
        let sports = ResponseCache::new(db, "sports", NEWS_TTL);
        news.set_at("k", &json!(1), Duration::from_secs(1), t0());
        sports.set_at("k", &json!(1), Duration::from_secs(1), t0());

        assert_eq!(news.sweep_at(t0() + chrono::Duration::seconds(5)), 1);
        assert_eq!(sports.len().unwrap(), 1);
    }

    #[test]
    fn test_corrupted_payload_degrades_to_miss() {
        let db = Database::open_in_memory().unwrap();
        let cache = ResponseCache::new(db.clone(), "news", NEWS_TTL);
        let far_future = t0().timestamp_millis() + 3_600_000;
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO response_cache VALUES ('news', 'bad', 'not json', ?1, ?2)",
                params![t0().timestamp_millis(), far_future],
            )
        })
        .unwrap();

        assert!(cache.get_at("bad", t0()).is_none());
        let stats = cache.stats();
        assert_eq!(stats.read_failures, 1);
        assert_eq!(stats.misses, 1);
    }
}
