//! News & Sports Gateway - backend for a mobile news and sports app
//!
//! Proxies NewsAPI and serves a local sports mirror, both behind a durable
//! TTL response cache stored in SQLite.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod sync;
pub mod tasks;
pub mod upstream;

pub use api::{create_router, AppState};
pub use config::Config;
pub use error::{AppError, Result};
pub use tasks::{spawn_cleanup_task, spawn_sync_task};
