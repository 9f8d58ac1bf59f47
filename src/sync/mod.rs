//! Sync Module
//!
//! Periodic jobs behind `/sports-sync`: mirror the live-score feed into
//! `sport_events`, sweep the sports cache, and notify subscribers of matches
//! about to start. Each job logs its own failures and reports counts.

mod notify;

pub use notify::{LogDispatcher, NotificationDispatcher};

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::cache::ResponseCache;
use crate::db::{Database, EventQuery};
use crate::models::records::{timestamp, EventStatus, EventUpsert};
use crate::upstream::SportsFeed;

/// Matches starting sooner than this are not announced any more.
const NOTIFY_WINDOW_START_MINUTES: i64 = 5;
/// Matches starting later than this are announced on a later run.
const NOTIFY_WINDOW_END_MINUTES: i64 = 15;

// == Results ==
/// Outcome of one live-score sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncResult {
    /// Events written to the mirror table
    pub updated: usize,
    /// Feed items or database writes that failed
    pub errors: usize,
    /// Wall time in milliseconds
    pub duration: u64,
}

/// Outcome of a full cron run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CronReport {
    pub sync: SyncResult,
    pub cache_entries: usize,
    pub notifications_sent: usize,
}

// == Sync Service ==
#[derive(Clone)]
pub struct SyncService {
    db: Database,
    feed: SportsFeed,
    cache: ResponseCache,
    dispatcher: Arc<dyn NotificationDispatcher>,
}

impl SyncService {
    /// Creates a service that only logs notification candidates.
    pub fn new(db: Database, feed: SportsFeed, cache: ResponseCache) -> Self {
        Self {
            db,
            feed,
            cache,
            dispatcher: Arc::new(LogDispatcher),
        }
    }

    pub fn with_dispatcher(mut self, dispatcher: Arc<dyn NotificationDispatcher>) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    // == Live Matches ==
    /// Mirrors the live feed into `sport_events`.
    ///
    /// Events still marked live but absent from a non-empty feed are marked
    /// finished. An empty or failed feed leaves existing rows alone.
    pub async fn update_live_matches(&self) -> SyncResult {
        self.update_live_matches_at(Utc::now()).await
    }

    pub async fn update_live_matches_at(&self, now: DateTime<Utc>) -> SyncResult {
        let started = Instant::now();
        let mut result = SyncResult::default();

        match self.feed.live_scores().await {
            Ok(items) => self.apply_feed(&items, now, &mut result),
            Err(e) => {
                error!("Live feed fetch failed: {}", e);
                result.errors += 1;
            }
        }

        result.duration = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(
            updated = result.updated,
            errors = result.errors,
            duration_ms = result.duration,
            "Live sync finished"
        );
        result
    }

    fn apply_feed(&self, items: &[Value], now: DateTime<Utc>, result: &mut SyncResult) {
        let mut live_ids = HashSet::new();

        for item in items {
            let Some(upsert) = EventUpsert::from_feed(item, now) else {
                warn!("Skipping feed item without an id or team names");
                result.errors += 1;
                continue;
            };
            live_ids.insert(upsert.external_api_id.clone());

            match self.db.upsert_event(&upsert) {
                Ok(()) => result.updated += 1,
                Err(e) => {
                    warn!(external_id = %upsert.external_api_id, "Event upsert failed: {}", e);
                    result.errors += 1;
                }
            }
        }

        if live_ids.is_empty() {
            return;
        }

        let stale = match self.db.live_event_ids() {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Failed to load live events: {}", e);
                result.errors += 1;
                return;
            }
        };
        for (id, external_id) in stale {
            let still_live = external_id.is_some_and(|ext| live_ids.contains(&ext));
            if still_live {
                continue;
            }
            match self.db.mark_finished(&id, now) {
                Ok(()) => debug!(event_id = %id, "Event left the live feed, marked finished"),
                Err(e) => {
                    warn!(event_id = %id, "Failed to finish event: {}", e);
                    result.errors += 1;
                }
            }
        }
    }

    // == Cache Cleanup ==
    /// Sweeps expired sports cache entries, returning how many were removed.
    pub fn clean_expired_cache(&self) -> usize {
        self.clean_expired_cache_at(Utc::now())
    }

    pub fn clean_expired_cache_at(&self, now: DateTime<Utc>) -> usize {
        let cleaned = self.cache.sweep_at(now);
        info!("Cleaned {} expired sports cache entries", cleaned);
        cleaned
    }

    // == Notifications ==
    /// Notifies subscribers of upcoming matches starting in 5 to 15 minutes.
    pub async fn send_match_notifications(&self) -> usize {
        self.send_match_notifications_at(Utc::now()).await
    }

    pub async fn send_match_notifications_at(&self, now: DateTime<Utc>) -> usize {
        let query = EventQuery {
            statuses: vec![EventStatus::Upcoming],
            from: Some(timestamp(now + Duration::minutes(NOTIFY_WINDOW_START_MINUTES))),
            to: Some(timestamp(now + Duration::minutes(NOTIFY_WINDOW_END_MINUTES))),
            ..EventQuery::default()
        };
        let events = match self.db.find_events(&query) {
            Ok(events) => events,
            Err(e) => {
                error!("Notification query failed: {}", e);
                return 0;
            }
        };
        info!("Found {} matches starting soon", events.len());

        let mut sent = 0;
        for event in &events {
            let recipients = match self.db.notification_recipients(&event.id) {
                Ok(recipients) if recipients.is_empty() => continue,
                Ok(recipients) => recipients,
                Err(e) => {
                    warn!(event_id = %event.id, "Failed to load subscribers: {}", e);
                    continue;
                }
            };
            match self.dispatcher.dispatch(event, &recipients).await {
                Ok(delivered) => sent += delivered,
                Err(e) => warn!(event_id = %event.id, "Notification dispatch failed: {}", e),
            }
        }
        sent
    }

    // == Cron ==
    /// Runs every job in order.
    pub async fn run_all(&self) -> CronReport {
        let sync = self.update_live_matches().await;
        let cache_entries = self.clean_expired_cache();
        let notifications_sent = self.send_match_notifications().await;

        CronReport {
            sync,
            cache_entries,
            notifications_sent,
        }
    }
}

impl std::fmt::Debug for SyncService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncService")
            .field("db", &self.db)
            .field("feed", &self.feed)
            .field("cache", &self.cache.namespace())
            .finish_non_exhaustive()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::fixtures::sample_event;
    use crate::error::Result;
    use crate::models::records::SportEvent;
    use crate::upstream::UpstreamClient;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use serde_json::json;
    use std::sync::Mutex;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    async fn feed_returning(body: Value) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/3/livescore.php"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;
        server
    }

    fn service(db: &Database, server: &MockServer) -> SyncService {
        let client =
            UpstreamClient::new(std::time::Duration::from_secs(5), 0, std::time::Duration::ZERO)
                .unwrap();
        let feed = SportsFeed::new(client, server.uri(), "3");
        let cache = ResponseCache::new(db.clone(), "sports", std::time::Duration::from_secs(300));
        SyncService::new(db.clone(), feed, cache)
    }

    /// Records who would have been notified.
    #[derive(Default)]
    struct RecordingDispatcher {
        calls: Mutex<Vec<(String, Vec<String>)>>,
    }

    #[async_trait]
    impl NotificationDispatcher for RecordingDispatcher {
        async fn dispatch(&self, event: &SportEvent, recipients: &[String]) -> Result<usize> {
            self.calls
                .lock()
                .unwrap()
                .push((event.id.clone(), recipients.to_vec()));
            Ok(recipients.len())
        }
    }

    #[tokio::test]
    async fn test_sync_upserts_and_finishes_missing() {
        let db = Database::open_in_memory().unwrap();
        db.insert_event(&sample_event("m1", EventStatus::Live, "2024-05-01T11:00:00Z"))
            .unwrap();
        db.insert_event(&sample_event("m2", EventStatus::Live, "2024-05-01T11:00:00Z"))
            .unwrap();

        let server = feed_returning(json!({"events": [
            {"idEvent": "ext-m1", "strHomeTeam": "Home m1", "strAwayTeam": "Away m1",
             "intHomeScore": "2", "intAwayScore": "1", "strProgress": "67"},
            {"idEvent": "ext-new", "strHomeTeam": "Lions", "strAwayTeam": "Tigers",
             "strProgress": "12"}
        ]}))
        .await;

        let result = service(&db, &server).update_live_matches_at(t0()).await;

        assert_eq!(result.updated, 2);
        assert_eq!(result.errors, 0);

        let m1 = db.event_by_id("m1").unwrap().unwrap();
        assert_eq!(m1.status, EventStatus::Live);
        assert_eq!((m1.home_score, m1.away_score), (2, 1));

        let m2 = db.event_by_id("m2").unwrap().unwrap();
        assert_eq!(m2.status, EventStatus::Finished);

        let live = db
            .find_events(&EventQuery {
                statuses: vec![EventStatus::Live],
                ..EventQuery::default()
            })
            .unwrap();
        assert_eq!(live.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_feed_keeps_live_events() {
        let db = Database::open_in_memory().unwrap();
        db.insert_event(&sample_event("m1", EventStatus::Live, "2024-05-01T11:00:00Z"))
            .unwrap();
        let server = feed_returning(json!({"events": null})).await;

        let result = service(&db, &server).update_live_matches_at(t0()).await;

        assert_eq!(result, SyncResult { duration: result.duration, ..SyncResult::default() });
        assert_eq!(db.event_by_id("m1").unwrap().unwrap().status, EventStatus::Live);
    }

    #[tokio::test]
    async fn test_invalid_items_count_as_errors() {
        let db = Database::open_in_memory().unwrap();
        let server = feed_returning(json!({"events": [{"strHomeTeam": "No id"}]})).await;

        let result = service(&db, &server).update_live_matches_at(t0()).await;
        assert_eq!(result.updated, 0);
        assert_eq!(result.errors, 1);
    }

    #[tokio::test]
    async fn test_feed_failure_counts_one_error() {
        let db = Database::open_in_memory().unwrap();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = service(&db, &server).update_live_matches_at(t0()).await;
        assert_eq!(result.errors, 1);
    }

    #[tokio::test]
    async fn test_notifications_only_in_window() {
        let db = Database::open_in_memory().unwrap();
        let at = |minutes: i64| timestamp(t0() + Duration::minutes(minutes));
        db.insert_event(&sample_event("soon", EventStatus::Upcoming, &at(3))).unwrap();
        db.insert_event(&sample_event("window", EventStatus::Upcoming, &at(10))).unwrap();
        db.insert_event(&sample_event("later", EventStatus::Upcoming, &at(20))).unwrap();
        db.insert_event(&sample_event("started", EventStatus::Live, &at(10))).unwrap();
        db.insert_event(&sample_event("nobody", EventStatus::Upcoming, &at(12))).unwrap();
        for event in ["soon", "window", "later", "started"] {
            db.subscribe("alice", event, true).unwrap();
        }
        db.subscribe("bob", "window", true).unwrap();

        let server = feed_returning(json!({"events": []})).await;
        let dispatcher = Arc::new(RecordingDispatcher::default());
        let sync = service(&db, &server).with_dispatcher(dispatcher.clone());

        let sent = sync.send_match_notifications_at(t0()).await;

        assert_eq!(sent, 2);
        let calls = dispatcher.calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![("window".to_string(), vec!["alice".to_string(), "bob".to_string()])]
        );
    }

    #[tokio::test]
    async fn test_clean_expired_cache_counts() {
        let db = Database::open_in_memory().unwrap();
        let server = feed_returning(json!({"events": []})).await;
        let sync = service(&db, &server);
        let cache = ResponseCache::new(db.clone(), "sports", std::time::Duration::from_secs(300));
        cache.set_at("live_all_all_all", &json!([]), std::time::Duration::from_secs(300), t0());

        assert_eq!(sync.clean_expired_cache_at(t0()), 0);
        assert_eq!(sync.clean_expired_cache_at(t0() + Duration::minutes(6)), 1);
    }
}
