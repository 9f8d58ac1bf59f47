//! Sports sync handlers (`/sports-sync/*`), normally driven by a scheduler.

use axum::{extract::State, http::StatusCode, Json};

use super::handlers::AppState;
use crate::models::responses::{
    CleanCacheResponse, CronResponse, NotificationsResponse, SyncLiveResponse,
};
use crate::models::UnknownEndpointResponse;

pub const SYNC_ENDPOINTS: &[&str] = &[
    "/sync-live - Sync live matches",
    "/clean-cache - Clean expired cache",
    "/send-notifications - Send match notifications",
    "/cron - Run all tasks (for scheduled cron job)",
];

pub async fn sync_live(State(state): State<AppState>) -> Json<SyncLiveResponse> {
    Json(SyncLiveResponse::new(state.sync.update_live_matches().await))
}

pub async fn clean_cache(State(state): State<AppState>) -> Json<CleanCacheResponse> {
    Json(CleanCacheResponse::new(state.sync.clean_expired_cache()))
}

pub async fn send_notifications(State(state): State<AppState>) -> Json<NotificationsResponse> {
    Json(NotificationsResponse::new(
        state.sync.send_match_notifications().await,
    ))
}

/// Runs live sync, cache cleanup and notifications in that order.
pub async fn cron(State(state): State<AppState>) -> Json<CronResponse> {
    Json(CronResponse::new(state.sync.run_all().await))
}

pub async fn unknown_endpoint() -> (StatusCode, Json<UnknownEndpointResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(UnknownEndpointResponse::new(SYNC_ENDPOINTS)),
    )
}
