//! Response DTOs for the gateway API
//!
//! Defines the structure of outgoing HTTP response bodies. Cached routes
//! carry `serde_json::Value` so a cache hit and a fresh query serialize the
//! same way.

use serde::Serialize;
use serde_json::Value;

use crate::cache::CacheStats;
use crate::models::records::{SportEvent, StreamingOption};
use crate::sync::{CronReport, SyncResult};

const SUCCESS: &str = "success";

/// Where a sports list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Cache,
    Database,
}

/// Response body for `/news-proxy/clear-cache`
#[derive(Debug, Clone, Serialize)]
pub struct ClearCacheResponse {
    pub status: &'static str,
    pub message: String,
    /// Expired entries removed
    pub cleared: usize,
}

impl ClearCacheResponse {
    pub fn new(cleared: usize) -> Self {
        Self {
            status: "ok",
            message: "Cache cleared successfully".to_string(),
            cleared,
        }
    }
}

/// Response body for the event list routes
#[derive(Debug, Clone, Serialize)]
pub struct EventsResponse {
    pub status: &'static str,
    pub events: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
}

impl EventsResponse {
    pub fn new(events: Value, source: Option<Source>) -> Self {
        Self {
            status: SUCCESS,
            events,
            source,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EventResponse {
    pub status: &'static str,
    pub event: SportEvent,
}

impl EventResponse {
    pub fn new(event: SportEvent) -> Self {
        Self {
            status: SUCCESS,
            event,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaguesResponse {
    pub status: &'static str,
    pub leagues: Value,
}

impl LeaguesResponse {
    pub fn new(leagues: Value) -> Self {
        Self {
            status: SUCCESS,
            leagues,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProvidersResponse {
    pub status: &'static str,
    pub providers: Value,
}

impl ProvidersResponse {
    pub fn new(providers: Value) -> Self {
        Self {
            status: SUCCESS,
            providers,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StreamingOptionsResponse {
    pub status: &'static str,
    pub options: Vec<StreamingOption>,
}

impl StreamingOptionsResponse {
    pub fn new(options: Vec<StreamingOption>) -> Self {
        Self {
            status: SUCCESS,
            options,
        }
    }
}

// == Sync Responses ==

#[derive(Debug, Clone, Serialize)]
pub struct SyncLiveResponse {
    pub status: &'static str,
    pub message: &'static str,
    #[serde(flatten)]
    pub result: SyncResult,
}

impl SyncLiveResponse {
    pub fn new(result: SyncResult) -> Self {
        Self {
            status: SUCCESS,
            message: "Live matches synced",
            result,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CleanCacheResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub cleaned: usize,
}

impl CleanCacheResponse {
    pub fn new(cleaned: usize) -> Self {
        Self {
            status: SUCCESS,
            message: "Cache cleaned",
            cleaned,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationsResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub sent: usize,
}

impl NotificationsResponse {
    pub fn new(sent: usize) -> Self {
        Self {
            status: SUCCESS,
            message: "Notifications sent",
            sent,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CronResponse {
    pub status: &'static str,
    pub message: &'static str,
    #[serde(flatten)]
    pub report: CronReport,
}

impl CronResponse {
    pub fn new(report: CronReport) -> Self {
        Self {
            status: SUCCESS,
            message: "All tasks completed",
            report,
        }
    }
}

// == Service Responses ==

/// Per-namespace cache statistics
#[derive(Debug, Clone, Serialize)]
pub struct NamespaceStats {
    #[serde(flatten)]
    pub stats: CacheStats,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheStats> for NamespaceStats {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            stats,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub news: NamespaceStats,
    pub sports: NamespaceStats,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Body returned for an unknown path inside a route group
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnknownEndpointResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub available_endpoints: &'static [&'static str],
}

impl UnknownEndpointResponse {
    pub fn new(available_endpoints: &'static [&'static str]) -> Self {
        Self {
            status: "error",
            message: "Unknown endpoint",
            available_endpoints,
        }
    }
}
