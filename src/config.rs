//! Configuration Module
//!
//! Handles loading and managing gateway configuration from environment variables.

use std::env;
use std::str::FromStr;

/// Gateway configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// SQLite database file (`:memory:` for an in-process database)
    pub database_path: String,
    /// NewsAPI key, sent as the `X-Api-Key` header
    pub news_api_key: String,
    /// NewsAPI base URL
    pub news_api_base_url: String,
    /// TheSportsDB key, sent as a path segment
    pub sports_api_key: String,
    /// TheSportsDB base URL
    pub sports_api_base_url: String,
    /// TTL in seconds for cached news responses
    pub news_cache_ttl: u64,
    /// TTL in seconds for cached sports responses
    pub sports_cache_ttl: u64,
    /// Background cache sweep interval in seconds
    pub cleanup_interval: u64,
    /// Background sync interval in seconds, 0 disables the in-process cron
    pub sync_interval: u64,
    /// Per-request timeout for upstream calls in seconds
    pub upstream_timeout_secs: u64,
    /// Extra attempts after a failed upstream call
    pub upstream_max_retries: u32,
    /// First backoff delay in milliseconds, doubled on each retry
    pub upstream_retry_base_ms: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `DATABASE_PATH` - SQLite file (default: gateway.db)
    /// - `NEWS_API_KEY` / `NEWS_API_BASE_URL`
    /// - `SPORTS_API_KEY` / `SPORTS_API_BASE_URL`
    /// - `NEWS_CACHE_TTL` - seconds (default: 900)
    /// - `SPORTS_CACHE_TTL` - seconds (default: 300)
    /// - `CLEANUP_INTERVAL` - seconds (default: 60)
    /// - `SYNC_INTERVAL` - seconds (default: 0, disabled)
    /// - `UPSTREAM_TIMEOUT_SECS` (default: 10)
    /// - `UPSTREAM_MAX_RETRIES` (default: 2)
    /// - `UPSTREAM_RETRY_BASE_MS` (default: 200)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            server_port: parse_var("SERVER_PORT", defaults.server_port),
            database_path: string_var("DATABASE_PATH", defaults.database_path),
            news_api_key: string_var("NEWS_API_KEY", defaults.news_api_key),
            news_api_base_url: string_var("NEWS_API_BASE_URL", defaults.news_api_base_url),
            sports_api_key: string_var("SPORTS_API_KEY", defaults.sports_api_key),
            sports_api_base_url: string_var("SPORTS_API_BASE_URL", defaults.sports_api_base_url),
            news_cache_ttl: parse_var("NEWS_CACHE_TTL", defaults.news_cache_ttl),
            sports_cache_ttl: parse_var("SPORTS_CACHE_TTL", defaults.sports_cache_ttl),
            cleanup_interval: parse_var("CLEANUP_INTERVAL", defaults.cleanup_interval),
            sync_interval: parse_var("SYNC_INTERVAL", defaults.sync_interval),
            upstream_timeout_secs: parse_var(
                "UPSTREAM_TIMEOUT_SECS",
                defaults.upstream_timeout_secs,
            ),
            upstream_max_retries: parse_var("UPSTREAM_MAX_RETRIES", defaults.upstream_max_retries),
            upstream_retry_base_ms: parse_var(
                "UPSTREAM_RETRY_BASE_MS",
                defaults.upstream_retry_base_ms,
            ),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            database_path: "gateway.db".to_string(),
            news_api_key: String::new(),
            news_api_base_url: "https://newsapi.org/v2".to_string(),
            sports_api_key: "3".to_string(),
            sports_api_base_url: "https://www.thesportsdb.com/api/v1/json".to_string(),
            news_cache_ttl: 15 * 60,
            sports_cache_ttl: 5 * 60,
            cleanup_interval: 60,
            sync_interval: 0,
            upstream_timeout_secs: 10,
            upstream_max_retries: 2,
            upstream_retry_base_ms: 200,
        }
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn string_var(name: &str, default: String) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.news_cache_ttl, 900);
        assert_eq!(config.sports_cache_ttl, 300);
        assert_eq!(config.sync_interval, 0);
        assert_eq!(config.upstream_max_retries, 2);
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("SERVER_PORT");
        env::remove_var("NEWS_CACHE_TTL");
        env::remove_var("SPORTS_CACHE_TTL");
        env::remove_var("NEWS_API_BASE_URL");

        let config = Config::from_env();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.news_cache_ttl, 900);
        assert_eq!(config.sports_cache_ttl, 300);
        assert_eq!(config.news_api_base_url, "https://newsapi.org/v2");
    }

    #[test]
    fn test_parse_var_falls_back_on_garbage() {
        env::set_var("GATEWAY_TEST_GARBAGE_PORT", "not-a-number");
        assert_eq!(parse_var("GATEWAY_TEST_GARBAGE_PORT", 8080u16), 8080);
        env::remove_var("GATEWAY_TEST_GARBAGE_PORT");
    }
}
