//! API Handlers
//!
//! Shared state, the cache-aware response type, and the service-level
//! handlers (`/health`, `/stats`, unknown paths). Route groups live in
//! `news`, `sports` and `sync`.

use std::time::Duration;

use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::cache::{ResponseCache, NEWS_NAMESPACE, SPORTS_NAMESPACE};
use crate::config::Config;
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{HealthResponse, StatsResponse};
use crate::sync::SyncService;
use crate::upstream::{NewsApi, SportsFeed, UpstreamClient};

/// Header reporting whether a response was served from the cache.
pub const X_CACHE: &str = "x-cache";

/// Application state shared across all handlers.
///
/// Every field is a cheap handle over the shared database connection or
/// the shared HTTP client.
#[derive(Clone, Debug)]
pub struct AppState {
    pub db: Database,
    pub news_cache: ResponseCache,
    pub sports_cache: ResponseCache,
    pub news: NewsApi,
    pub sync: SyncService,
}

impl AppState {
    /// Opens the configured database and builds every component over it.
    pub fn from_config(config: &Config) -> Result<Self> {
        let db = Database::open(&config.database_path)?;
        Self::with_database(config, db)
    }

    /// Builds the state over an already opened database.
    pub fn with_database(config: &Config, db: Database) -> Result<Self> {
        let client = UpstreamClient::from_config(config)?;

        let news_cache = ResponseCache::new(
            db.clone(),
            NEWS_NAMESPACE,
            Duration::from_secs(config.news_cache_ttl),
        );
        let sports_cache = ResponseCache::new(
            db.clone(),
            SPORTS_NAMESPACE,
            Duration::from_secs(config.sports_cache_ttl),
        );

        let news = NewsApi::new(
            client.clone(),
            &config.news_api_base_url,
            &config.news_api_key,
        );
        let feed = SportsFeed::new(client, &config.sports_api_base_url, &config.sports_api_key);
        let sync = SyncService::new(db.clone(), feed, sports_cache.clone());

        Ok(Self {
            db,
            news_cache,
            sports_cache,
            news,
            sync,
        })
    }
}

// == Cached Response ==
/// JSON response tagged with `X-Cache: HIT` or `X-Cache: MISS`.
#[derive(Debug, Clone)]
pub struct Cached<T> {
    pub hit: bool,
    pub status: StatusCode,
    pub body: T,
}

impl<T> Cached<T> {
    pub fn hit(body: T) -> Self {
        Self {
            hit: true,
            status: StatusCode::OK,
            body,
        }
    }

    pub fn miss(status: StatusCode, body: T) -> Self {
        Self {
            hit: false,
            status,
            body,
        }
    }
}

impl<T: Serialize> IntoResponse for Cached<T> {
    fn into_response(self) -> Response {
        let marker = HeaderValue::from_static(if self.hit { "HIT" } else { "MISS" });
        (self.status, [(X_CACHE, marker)], Json(self.body)).into_response()
    }
}

/// Handler for GET /stats
///
/// Returns the counters of both cache namespaces.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        news: state.news_cache.stats().into(),
        sports: state.sports_cache.stats().into(),
    })
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Fallback for paths outside every route group.
pub async fn not_found_handler() -> AppError {
    AppError::NotFound("Invalid endpoint".to_string())
}
