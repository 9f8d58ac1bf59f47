//! News proxy handlers (`/news-proxy/*`).
//!
//! Responses are NewsAPI bodies passed through unchanged, with the upstream
//! status. Only a 200 answer whose body says `"status": "ok"` is cached.

use std::future::Future;

use axum::{extract::State, http::StatusCode, Json};
use serde_json::Value;
use tracing::info;

use super::extract::JsonBody;
use super::handlers::{AppState, Cached};
use crate::cache::ResponseCache;
use crate::error::Result;
use crate::models::requests::{HeadlinesRequest, SearchRequest, SourcesRequest};
use crate::models::responses::ClearCacheResponse;
use crate::models::UnknownEndpointResponse;
use crate::upstream::UpstreamResponse;

pub const NEWS_ENDPOINTS: &[&str] = &[
    "/top-headlines - Get top headlines",
    "/search - Search articles",
    "/sources - Get news sources",
    "/clear-cache - Remove expired cache entries",
];

/// Handler for POST /news-proxy/top-headlines
pub async fn top_headlines(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<HeadlinesRequest>,
) -> Result<Cached<Value>> {
    let query = req.resolve();
    let key = query.cache_key();
    cached_proxy(&state.news_cache, &key, || state.news.top_headlines(&query)).await
}

/// Handler for POST /news-proxy/search
///
/// `q` is required; a blank query is a 400.
pub async fn search(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<SearchRequest>,
) -> Result<Cached<Value>> {
    let query = req.resolve()?;
    let key = query.cache_key();
    cached_proxy(&state.news_cache, &key, || state.news.everything(&query)).await
}

/// Handler for POST /news-proxy/sources
pub async fn sources(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<SourcesRequest>,
) -> Result<Cached<Value>> {
    let query = req.resolve();
    let key = query.cache_key();
    cached_proxy(&state.news_cache, &key, || state.news.sources(&query)).await
}

/// Handler for POST /news-proxy/clear-cache
///
/// Removes the expired news entries; fresh ones stay.
pub async fn clear_cache(State(state): State<AppState>) -> Json<ClearCacheResponse> {
    let cleared = state.news_cache.sweep();
    info!("News cache cleared, {} expired entries removed", cleared);
    Json(ClearCacheResponse::new(cleared))
}

pub async fn unknown_endpoint() -> (StatusCode, Json<UnknownEndpointResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(UnknownEndpointResponse::new(NEWS_ENDPOINTS)),
    )
}

/// Serves `key` from the cache, or fetches it upstream and caches a success.
async fn cached_proxy<F, Fut>(cache: &ResponseCache, key: &str, fetch: F) -> Result<Cached<Value>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<UpstreamResponse>>,
{
    if let Some(payload) = cache.get(key) {
        info!("Cache hit for key: {}", key);
        return Ok(Cached::hit(payload));
    }
    info!("Cache miss for key: {}", key);

    let response = fetch().await?;
    if is_cacheable(&response) {
        cache.put(key, &response.body);
    }

    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::BAD_GATEWAY);
    Ok(Cached::miss(status, response.body))
}

fn is_cacheable(response: &UpstreamResponse) -> bool {
    response.status == 200 && response.body.get("status").and_then(Value::as_str) == Some("ok")
}
