//! API Routes
//!
//! Configures the Axum router with the three route groups and the service
//! endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{health_handler, not_found_handler, stats_handler, AppState};
use super::{news, sports, sync};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `POST /news-proxy/{top-headlines,search,sources,clear-cache}`
/// - `POST /sports-api/{live,upcoming,search,leagues,providers}`
/// - `GET|POST /sports-api/match/:id`, `POST /sports-api/streaming/:id`
/// - `GET|POST /sports-sync/{sync-live,clean-cache,send-notifications,cron}`
/// - `GET /stats` - Cache statistics per namespace
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin, method and header
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any);

    let news_routes = Router::new()
        .route("/top-headlines", post(news::top_headlines))
        .route("/search", post(news::search))
        .route("/sources", post(news::sources))
        .route("/clear-cache", post(news::clear_cache))
        .fallback(news::unknown_endpoint);

    let sports_routes = Router::new()
        .route("/live", post(sports::live))
        .route("/upcoming", post(sports::upcoming))
        .route(
            "/match/:id",
            get(sports::match_details).post(sports::match_details),
        )
        .route("/search", post(sports::search))
        .route("/leagues", post(sports::leagues))
        .route("/providers", post(sports::providers))
        .route("/streaming/:id", post(sports::streaming_options))
        .fallback(sports::unknown_endpoint);

    // Schedulers tend to issue GETs, the app issues POSTs
    let sync_routes = Router::new()
        .route("/sync-live", get(sync::sync_live).post(sync::sync_live))
        .route("/clean-cache", get(sync::clean_cache).post(sync::clean_cache))
        .route(
            "/send-notifications",
            get(sync::send_notifications).post(sync::send_notifications),
        )
        .route("/cron", get(sync::cron).post(sync::cron))
        .fallback(sync::unknown_endpoint);

    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .nest("/news-proxy", news_routes)
        .nest("/sports-api", sports_routes)
        .nest("/sports-sync", sync_routes)
        .fallback(not_found_handler)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::tests::test_state;
    use crate::db::fixtures::sample_event;
    use crate::models::EventStatus;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::Response,
    };
    use serde_json::Value;
    use tower::util::ServiceExt;

    fn create_test_app() -> Router {
        create_router(test_state())
    }

    async fn post_json(app: Router, uri: &str, body: &'static str) -> Response {
        app.oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(Request::builder().uri("/stats").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["news"].get("hit_rate").is_some());
        assert!(body["sports"].get("total_entries").is_some());
    }

    #[tokio::test]
    async fn test_news_search_without_query() {
        let response = post_json(create_test_app(), "/news-proxy/search", "{}").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "Query parameter is required");
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let response = post_json(create_test_app(), "/sports-api/live", "{oops").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_group_endpoint_lists_routes() {
        let response = post_json(create_test_app(), "/sports-api/nope", "").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Unknown endpoint");
        assert_eq!(body["availableEndpoints"].as_array().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn test_unknown_path() {
        let app = create_test_app();

        let response = app
            .oneshot(Request::builder().uri("/nowhere").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_live_sets_cache_header() {
        let state = test_state();
        state
            .db
            .insert_event(&sample_event("m1", EventStatus::Live, "2024-05-01T12:00:00Z"))
            .unwrap();
        let app = create_router(state);

        let first = post_json(app.clone(), "/sports-api/live", "").await;
        assert_eq!(first.headers()["x-cache"], "MISS");

        let second = post_json(app, "/sports-api/live", "{}").await;
        assert_eq!(second.headers()["x-cache"], "HIT");
        let body = body_json(second).await;
        assert_eq!(body["source"], "cache");
        assert_eq!(body["events"][0]["id"], "m1");
    }

    #[tokio::test]
    async fn test_match_details_by_get() {
        let state = test_state();
        state
            .db
            .insert_event(&sample_event("m1", EventStatus::Upcoming, "2024-05-01T12:00:00Z"))
            .unwrap();
        let app = create_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/sports-api/match/m1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["event"]["home_team"], "Home m1");
    }
}
