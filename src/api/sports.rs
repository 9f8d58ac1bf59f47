//! Sports API handlers (`/sports-api/*`).
//!
//! All data comes from the mirror tables. List routes except search go
//! through the sports cache; database errors are returned as 500 and never
//! cached.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use super::extract::JsonBody;
use super::handlers::{AppState, Cached};
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::requests::{
    providers_cache_key, LeaguesRequest, LiveRequest, RegionRequest, SportsSearchRequest,
    UpcomingRequest,
};
use crate::models::responses::{
    EventResponse, EventsResponse, LeaguesResponse, ProvidersResponse, StreamingOptionsResponse,
};
use crate::models::{Source, UnknownEndpointResponse};

pub const SPORTS_ENDPOINTS: &[&str] = &[
    "/live - Get live matches",
    "/upcoming - Get upcoming matches",
    "/match/:id - Get match details",
    "/search - Search matches",
    "/leagues - Get leagues",
    "/providers - Get streaming providers",
    "/streaming/:matchId - Get streaming options for match",
];

/// Returns the cached value of `key`, or runs `load`, caches and returns it.
///
/// Runs on the blocking pool since both the cache and `load` touch SQLite.
/// The flag is `true` on a cache hit.
async fn cached_rows<T, F>(state: &AppState, key: String, load: F) -> Result<(Value, bool)>
where
    T: Serialize + 'static,
    F: FnOnce(&Database) -> Result<T> + Send + 'static,
{
    let cache = state.sports_cache.clone();
    state
        .db
        .blocking(move |db| {
            if let Some(payload) = cache.get(&key) {
                debug!("Cache hit for key: {}", key);
                return Ok((payload, true));
            }

            let rows = serde_json::to_value(load(db)?)?;
            cache.put(&key, &rows);
            Ok((rows, false))
        })
        .await
}

fn events_response(events: Value, hit: bool) -> Cached<EventsResponse> {
    if hit {
        Cached::hit(EventsResponse::new(events, Some(Source::Cache)))
    } else {
        Cached::miss(
            StatusCode::OK,
            EventsResponse::new(events, Some(Source::Database)),
        )
    }
}

fn tagged<T>(body: T, hit: bool) -> Cached<T> {
    if hit {
        Cached::hit(body)
    } else {
        Cached::miss(StatusCode::OK, body)
    }
}

/// Handler for POST /sports-api/live
pub async fn live(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LiveRequest>,
) -> Result<Cached<EventsResponse>> {
    let query = req.resolve();
    let key = query.cache_key();
    let (events, hit) = cached_rows(&state, key, move |db| {
        db.find_events(&query.event_query())
    })
    .await?;
    Ok(events_response(events, hit))
}

/// Handler for POST /sports-api/upcoming
///
/// Upcoming and live events ordered by start time, paginated.
pub async fn upcoming(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<UpcomingRequest>,
) -> Result<Cached<EventsResponse>> {
    let query = req.resolve();
    let key = query.cache_key();
    let (events, hit) = cached_rows(&state, key, move |db| {
        db.find_events(&query.event_query())
    })
    .await?;
    Ok(events_response(events, hit))
}

/// Handler for /sports-api/match/:id
pub async fn match_details(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EventResponse>> {
    let event = state
        .db
        .blocking(move |db| db.event_by_id(&id))
        .await?
        .ok_or_else(|| AppError::NotFound("Match not found".to_string()))?;
    Ok(Json(EventResponse::new(event)))
}

/// Handler for POST /sports-api/search
///
/// Team-name search, at most 50 rows, never cached.
pub async fn search(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<SportsSearchRequest>,
) -> Result<Json<EventsResponse>> {
    let query = req.resolve()?;
    let events = state.db.blocking(move |db| db.find_events(&query)).await?;
    info!("Match search returned {} events", events.len());
    Ok(Json(EventsResponse::new(serde_json::to_value(events)?, None)))
}

/// Handler for POST /sports-api/leagues
pub async fn leagues(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LeaguesRequest>,
) -> Result<Cached<LeaguesResponse>> {
    let query = req.resolve();
    let key = query.cache_key();
    let (leagues, hit) = cached_rows(&state, key, move |db| {
        db.leagues(query.sport_type.as_deref(), query.country.as_deref())
    })
    .await?;
    Ok(tagged(LeaguesResponse::new(leagues), hit))
}

/// Handler for POST /sports-api/providers
pub async fn providers(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RegionRequest>,
) -> Result<Cached<ProvidersResponse>> {
    let region = req.resolve();
    let key = providers_cache_key(region.as_deref());
    let (providers, hit) = cached_rows(&state, key, move |db| db.providers(region.as_deref()))
        .await?;
    Ok(tagged(ProvidersResponse::new(providers), hit))
}

/// Handler for POST /sports-api/streaming/:id
pub async fn streaming_options(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<RegionRequest>,
) -> Result<Json<StreamingOptionsResponse>> {
    let region = req.resolve();
    let options = state
        .db
        .blocking(move |db| db.streaming_options(&id, region.as_deref()))
        .await?;
    Ok(Json(StreamingOptionsResponse::new(options)))
}

pub async fn unknown_endpoint() -> (StatusCode, Json<UnknownEndpointResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(UnknownEndpointResponse::new(SPORTS_ENDPOINTS)),
    )
}
