//! API Module
//!
//! HTTP handlers and routing for the gateway.
//!
//! # Route groups
//! - `/news-proxy/*` - NewsAPI passthrough behind the news cache
//! - `/sports-api/*` - Queries over the sports mirror tables
//! - `/sports-sync/*` - Live sync, cache cleanup and notifications
//! - `GET /stats`, `GET /health`

mod extract;
pub mod handlers;
pub mod news;
pub mod routes;
pub mod sports;
pub mod sync;

pub use extract::JsonBody;
pub use handlers::{AppState, Cached, X_CACHE};
pub use routes::create_router;
