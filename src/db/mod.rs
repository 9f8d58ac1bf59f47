//! Database Module
//!
//! Process-wide SQLite handle shared by the response cache and the sports
//! mirror tables. The connection is opened once at startup and cloned into
//! every component that needs it.

mod catalog;
mod events;
mod notifications;

#[cfg(test)]
pub(crate) mod fixtures;

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use tracing::info;

use crate::error::{AppError, Result};

pub use events::EventQuery;

/// Schema for the cache table and the sports mirror tables.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS response_cache (
    namespace TEXT NOT NULL,
    cache_key TEXT NOT NULL,
    payload TEXT NOT NULL,
    stored_at INTEGER NOT NULL,
    expires_at INTEGER NOT NULL,
    PRIMARY KEY (namespace, cache_key)
);
CREATE INDEX IF NOT EXISTS idx_response_cache_expiry
    ON response_cache(namespace, expires_at);

CREATE TABLE IF NOT EXISTS leagues (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    sport_type TEXT NOT NULL,
    country TEXT,
    logo_url TEXT,
    is_active INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS streaming_providers (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    logo_url TEXT,
    website_url TEXT,
    available_regions TEXT NOT NULL DEFAULT '[]',
    is_active INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS sport_events (
    id TEXT PRIMARY KEY,
    external_api_id TEXT UNIQUE,
    home_team TEXT NOT NULL,
    away_team TEXT NOT NULL,
    home_team_logo TEXT,
    away_team_logo TEXT,
    sport_type TEXT NOT NULL DEFAULT 'football',
    league_id TEXT REFERENCES leagues(id),
    start_time TEXT,
    status TEXT NOT NULL DEFAULT 'upcoming',
    home_score INTEGER NOT NULL DEFAULT 0,
    away_score INTEGER NOT NULL DEFAULT 0,
    period TEXT,
    time_in_period TEXT,
    venue TEXT,
    region TEXT,
    last_synced_at TEXT,
    updated_at TEXT
);
CREATE INDEX IF NOT EXISTS idx_sport_events_status ON sport_events(status, start_time);

CREATE TABLE IF NOT EXISTS broadcasting_rights (
    id TEXT PRIMARY KEY,
    event_id TEXT NOT NULL REFERENCES sport_events(id),
    provider_id TEXT NOT NULL REFERENCES streaming_providers(id),
    available_regions TEXT,
    stream_url TEXT,
    is_active INTEGER NOT NULL DEFAULT 1
);
CREATE INDEX IF NOT EXISTS idx_broadcasting_rights_event ON broadcasting_rights(event_id);

CREATE TABLE IF NOT EXISTS user_sport_notifications (
    user_id TEXT NOT NULL,
    event_id TEXT NOT NULL REFERENCES sport_events(id),
    notify_on_start INTEGER NOT NULL DEFAULT 1,
    PRIMARY KEY (user_id, event_id)
);
";

// == Database Handle ==
/// Shared SQLite connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens (or creates) the database file and applies the schema.
    ///
    /// `:memory:` opens a private in-memory database.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        info!("Database opened at {}", path.as_ref().display());
        Self::init(conn)
    }

    /// Opens a private in-memory database with the schema applied.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` with exclusive access to the connection.
    ///
    /// The lock is released before returning, so callers never hold it
    /// across an `.await`.
    pub fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> rusqlite::Result<T>) -> Result<T> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| AppError::Storage("database lock poisoned".to_string()))?;
        Ok(f(&conn)?)
    }

    /// Runs `f` on the blocking thread pool.
    ///
    /// Handlers use this so SQLite I/O and lock waits stay off the async
    /// workers.
    pub async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T> + Send + 'static,
    {
        let db = self.clone();
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| AppError::Internal(format!("database task failed: {}", e)))?
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}
