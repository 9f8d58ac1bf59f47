//! Request DTOs for the gateway API
//!
//! Each route decodes its body into one of these structs, then resolves it
//! into a query type with every default applied. Cache keys and upstream
//! parameters are derived only from the resolved query.

use serde::Deserialize;

use crate::cache::CacheKey;
use crate::db::EventQuery;
use crate::error::{AppError, Result};
use crate::models::records::EventStatus;

/// Default page for paginated routes
pub const DEFAULT_PAGE: u32 = 1;
/// Default page size for paginated routes
pub const DEFAULT_PAGE_SIZE: u32 = 20;
/// Largest page size forwarded upstream or to the database
pub const MAX_PAGE_SIZE: u32 = 100;
/// Row limit for sports search
pub const SEARCH_LIMIT: u32 = 50;

/// Catch-all key segment for an unset filter
const ALL: &str = "all";

/// Trims a string parameter, treating blank as absent.
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn page_or_default(page: Option<u32>) -> u32 {
    page.filter(|p| *p > 0).unwrap_or(DEFAULT_PAGE)
}

fn page_size_or_default(page_size: Option<u32>) -> u32 {
    page_size
        .filter(|s| *s > 0)
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .min(MAX_PAGE_SIZE)
}

// == News: top headlines ==

/// Body of `/news-proxy/top-headlines`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadlinesRequest {
    pub category: Option<String>,
    pub country: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlinesQuery {
    pub category: String,
    pub country: String,
    pub page: u32,
    pub page_size: u32,
}

impl HeadlinesRequest {
    pub fn resolve(self) -> HeadlinesQuery {
        HeadlinesQuery {
            category: present(self.category).unwrap_or_else(|| "general".to_string()),
            country: present(self.country).unwrap_or_else(|| "us".to_string()),
            page: page_or_default(self.page),
            page_size: page_size_or_default(self.page_size),
        }
    }
}

impl HeadlinesQuery {
    pub fn cache_key(&self) -> String {
        CacheKey::new("headlines")
            .part(&self.category)
            .part(&self.country)
            .part(self.page)
            .part(self.page_size)
            .build()
    }

    pub fn upstream_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("category", self.category.clone()),
            ("country", self.country.clone()),
            ("page", self.page.to_string()),
            ("pageSize", self.page_size.to_string()),
        ]
    }
}

// == News: search ==

/// Body of `/news-proxy/search`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub q: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub sort_by: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub q: String,
    pub from: Option<String>,
    pub to: Option<String>,
    pub sort_by: String,
    pub page: u32,
    pub page_size: u32,
}

impl SearchRequest {
    /// Fails with a 400 when `q` is missing or blank.
    pub fn resolve(self) -> Result<SearchQuery> {
        let q = present(self.q)
            .ok_or_else(|| AppError::InvalidRequest("Query parameter is required".to_string()))?;

        Ok(SearchQuery {
            q,
            from: present(self.from),
            to: present(self.to),
            sort_by: present(self.sort_by).unwrap_or_else(|| "publishedAt".to_string()),
            page: page_or_default(self.page),
            page_size: page_size_or_default(self.page_size),
        })
    }
}

impl SearchQuery {
    pub fn cache_key(&self) -> String {
        CacheKey::new("search")
            .part(&self.q)
            .part(self.page)
            .part(&self.sort_by)
            .part(self.page_size)
            .labelled("from", self.from.as_deref())
            .labelled("to", self.to.as_deref())
            .build()
    }

    pub fn upstream_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("q", self.q.clone())];
        if let Some(from) = &self.from {
            params.push(("from", from.clone()));
        }
        if let Some(to) = &self.to {
            params.push(("to", to.clone()));
        }
        params.push(("sortBy", self.sort_by.clone()));
        params.push(("page", self.page.to_string()));
        params.push(("pageSize", self.page_size.to_string()));
        params
    }
}

// == News: sources ==

/// Body of `/news-proxy/sources`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourcesRequest {
    pub category: Option<String>,
    pub language: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcesQuery {
    pub category: Option<String>,
    pub language: Option<String>,
    pub country: Option<String>,
}

impl SourcesRequest {
    pub fn resolve(self) -> SourcesQuery {
        SourcesQuery {
            category: present(self.category),
            language: present(self.language),
            country: present(self.country),
        }
    }
}

impl SourcesQuery {
    pub fn cache_key(&self) -> String {
        CacheKey::new("sources")
            .part(self.category.as_deref().unwrap_or(ALL))
            .part(self.language.as_deref().unwrap_or(ALL))
            .part(self.country.as_deref().unwrap_or(ALL))
            .build()
    }

    /// Unset filters are omitted, the upstream has no "all" value.
    pub fn upstream_params(&self) -> Vec<(&'static str, String)> {
        [
            ("category", &self.category),
            ("language", &self.language),
            ("country", &self.country),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.clone().map(|v| (name, v)))
        .collect()
    }
}

// == Sports: live ==

/// Body of `/sports-api/live`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LiveRequest {
    pub sport_type: Option<String>,
    pub league_id: Option<String>,
    pub region: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveQuery {
    pub sport_type: Option<String>,
    pub league_id: Option<String>,
    pub region: Option<String>,
}

impl LiveRequest {
    pub fn resolve(self) -> LiveQuery {
        LiveQuery {
            sport_type: present(self.sport_type),
            league_id: present(self.league_id),
            region: present(self.region),
        }
    }
}

impl LiveQuery {
    pub fn cache_key(&self) -> String {
        CacheKey::new("live")
            .part(self.sport_type.as_deref().unwrap_or(ALL))
            .part(self.league_id.as_deref().unwrap_or(ALL))
            .part(self.region.as_deref().unwrap_or(ALL))
            .build()
    }

    pub fn event_query(&self) -> EventQuery {
        EventQuery {
            statuses: vec![EventStatus::Live],
            sport_type: self.sport_type.clone(),
            league_id: self.league_id.clone(),
            region: self.region.clone(),
            ..EventQuery::default()
        }
    }
}

// == Sports: upcoming ==

/// Body of `/sports-api/upcoming`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpcomingRequest {
    pub sport_type: Option<String>,
    pub league_id: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpcomingQuery {
    pub sport_type: Option<String>,
    pub league_id: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub page: u32,
    pub page_size: u32,
}

impl UpcomingRequest {
    pub fn resolve(self) -> UpcomingQuery {
        UpcomingQuery {
            sport_type: present(self.sport_type),
            league_id: present(self.league_id),
            from_date: present(self.from_date),
            to_date: present(self.to_date),
            page: page_or_default(self.page),
            page_size: page_size_or_default(self.page_size),
        }
    }
}

impl UpcomingQuery {
    pub fn cache_key(&self) -> String {
        CacheKey::new("upcoming")
            .part(self.sport_type.as_deref().unwrap_or(ALL))
            .part(self.league_id.as_deref().unwrap_or(ALL))
            .part(self.page)
            .part(self.page_size)
            .labelled("from", self.from_date.as_deref())
            .labelled("to", self.to_date.as_deref())
            .build()
    }

    /// Upcoming and live events, paginated by start time.
    pub fn event_query(&self) -> EventQuery {
        EventQuery {
            statuses: vec![EventStatus::Upcoming, EventStatus::Live],
            sport_type: self.sport_type.clone(),
            league_id: self.league_id.clone(),
            from: self.from_date.clone(),
            to: self.to_date.clone(),
            limit: Some(self.page_size),
            offset: Some(u64::from(self.page - 1) * u64::from(self.page_size)),
            ..EventQuery::default()
        }
    }
}

// == Sports: search ==

/// Body of `/sports-api/search`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SportsSearchRequest {
    pub query: Option<String>,
    pub sport_type: Option<String>,
    pub status: Option<EventStatus>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
}

impl SportsSearchRequest {
    /// Fails with a 400 when `query` is missing or blank.
    pub fn resolve(self) -> Result<EventQuery> {
        let team = present(self.query)
            .ok_or_else(|| AppError::InvalidRequest("Query parameter is required".to_string()))?;

        Ok(EventQuery {
            statuses: self.status.into_iter().collect(),
            sport_type: present(self.sport_type),
            from: present(self.from_date),
            to: present(self.to_date),
            team_search: Some(team),
            limit: Some(SEARCH_LIMIT),
            ..EventQuery::default()
        })
    }
}

// == Sports: catalog ==

/// Body of `/sports-api/leagues`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeaguesRequest {
    pub sport_type: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaguesQuery {
    pub sport_type: Option<String>,
    pub country: Option<String>,
}

impl LeaguesRequest {
    pub fn resolve(self) -> LeaguesQuery {
        LeaguesQuery {
            sport_type: present(self.sport_type),
            country: present(self.country),
        }
    }
}

impl LeaguesQuery {
    pub fn cache_key(&self) -> String {
        CacheKey::new("leagues")
            .part(self.sport_type.as_deref().unwrap_or(ALL))
            .part(self.country.as_deref().unwrap_or(ALL))
            .build()
    }
}

/// Body of `/sports-api/providers` and `/sports-api/streaming/:id`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegionRequest {
    pub region: Option<String>,
}

impl RegionRequest {
    pub fn resolve(self) -> Option<String> {
        present(self.region)
    }
}

/// Cache key for the provider list of a region.
pub fn providers_cache_key(region: Option<&str>) -> String {
    CacheKey::new("providers").part(region.unwrap_or(ALL)).build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headlines_defaults_match_explicit_defaults() {
        let omitted: HeadlinesRequest = serde_json::from_str("{}").unwrap();
        let explicit: HeadlinesRequest = serde_json::from_str(
            r#"{"category":"general","country":"us","page":1,"pageSize":20}"#,
        )
        .unwrap();

        assert_eq!(omitted.resolve().cache_key(), "headlines_general_us_1_20");
        assert_eq!(explicit.resolve().cache_key(), "headlines_general_us_1_20");
    }

    #[test]
    fn test_headlines_blank_and_zero_fall_back() {
        let req = HeadlinesRequest {
            category: Some("  ".to_string()),
            country: Some("gb".to_string()),
            page: Some(0),
            page_size: Some(500),
        };
        let query = req.resolve();
        assert_eq!(query.category, "general");
        assert_eq!(query.page, 1);
        assert_eq!(query.page_size, MAX_PAGE_SIZE);
        assert_eq!(query.cache_key(), "headlines_general_gb_1_100");
    }

    #[test]
    fn test_search_requires_query() {
        let missing = SearchRequest::default().resolve();
        assert!(matches!(missing, Err(AppError::InvalidRequest(_))));

        let blank = SearchRequest {
            q: Some("   ".to_string()),
            ..SearchRequest::default()
        }
        .resolve();
        assert!(matches!(blank, Err(AppError::InvalidRequest(_))));
    }

    #[test]
    fn test_search_key_and_params() {
        let req: SearchRequest =
            serde_json::from_str(r#"{"q":"rust","to":"2024-02-01","pageSize":50}"#).unwrap();
        let query = req.resolve().unwrap();

        assert_eq!(query.cache_key(), "search_rust_1_publishedAt_50_to2024-02-01");

        let params = query.upstream_params();
        assert!(params.contains(&("q", "rust".to_string())));
        assert!(params.contains(&("to", "2024-02-01".to_string())));
        assert!(params.contains(&("sortBy", "publishedAt".to_string())));
        assert!(!params.iter().any(|(name, _)| *name == "from"));
    }

    #[test]
    fn test_search_page_size_changes_key() {
        let small = SearchRequest {
            q: Some("rust".to_string()),
            page_size: Some(10),
            ..SearchRequest::default()
        };
        let large = SearchRequest {
            q: Some("rust".to_string()),
            page_size: Some(50),
            ..SearchRequest::default()
        };
        assert_ne!(
            small.resolve().unwrap().cache_key(),
            large.resolve().unwrap().cache_key()
        );
    }

    #[test]
    fn test_sources_key_includes_every_filter() {
        let query = SourcesRequest {
            category: Some("technology".to_string()),
            language: None,
            country: Some("de".to_string()),
        }
        .resolve();

        assert_eq!(query.cache_key(), "sources_technology_all_de");
        assert_eq!(
            query.upstream_params(),
            vec![
                ("category", "technology".to_string()),
                ("country", "de".to_string())
            ]
        );
    }

    #[test]
    fn test_live_key_defaults() {
        let query = LiveRequest::default().resolve();
        assert_eq!(query.cache_key(), "live_all_all_all");
        assert_eq!(query.event_query().statuses, vec![EventStatus::Live]);
    }

    #[test]
    fn test_upcoming_pagination() {
        let query = UpcomingRequest {
            page: Some(3),
            page_size: Some(10),
            ..UpcomingRequest::default()
        }
        .resolve();

        let events = query.event_query();
        assert_eq!(events.limit, Some(10));
        assert_eq!(events.offset, Some(20));
        assert_eq!(query.cache_key(), "upcoming_all_all_3_10");
    }

    #[test]
    fn test_upcoming_huge_page_offset_does_not_overflow() {
        let req: UpcomingRequest =
            serde_json::from_str(r#"{"page":50000000,"page_size":100}"#).unwrap();
        let events = req.resolve().event_query();
        assert_eq!(events.offset, Some(4_999_999_900));

        let last = UpcomingRequest {
            page: Some(u32::MAX),
            page_size: Some(u32::MAX),
            ..UpcomingRequest::default()
        }
        .resolve()
        .event_query();
        assert_eq!(last.offset, Some(u64::from(u32::MAX - 1) * 100));
    }

    #[test]
    fn test_sports_search_status_decoding() {
        let req: SportsSearchRequest =
            serde_json::from_str(r#"{"query":"arsenal","status":"live"}"#).unwrap();
        let query = req.resolve().unwrap();
        assert_eq!(query.statuses, vec![EventStatus::Live]);
        assert_eq!(query.team_search.as_deref(), Some("arsenal"));
        assert_eq!(query.limit, Some(SEARCH_LIMIT));

        let bad = serde_json::from_str::<SportsSearchRequest>(r#"{"query":"x","status":"paused"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_catalog_keys() {
        assert_eq!(LeaguesRequest::default().resolve().cache_key(), "leagues_all_all");
        assert_eq!(providers_cache_key(Some("us")), "providers_us");
        assert_eq!(providers_cache_key(None), "providers_all");
    }
}
