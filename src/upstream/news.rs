//! NewsAPI request builders.

use tracing::debug;

use super::client::{UpstreamClient, UpstreamResponse};
use crate::error::Result;
use crate::models::requests::{HeadlinesQuery, SearchQuery, SourcesQuery};

/// NewsAPI v2 endpoints used by the news proxy.
#[derive(Debug, Clone)]
pub struct NewsApi {
    client: UpstreamClient,
    base_url: String,
    api_key: String,
}

impl NewsApi {
    pub fn new(client: UpstreamClient, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    pub async fn top_headlines(&self, query: &HeadlinesQuery) -> Result<UpstreamResponse> {
        self.fetch("/top-headlines", &query.upstream_params()).await
    }

    pub async fn everything(&self, query: &SearchQuery) -> Result<UpstreamResponse> {
        self.fetch("/everything", &query.upstream_params()).await
    }

    pub async fn sources(&self, query: &SourcesQuery) -> Result<UpstreamResponse> {
        self.fetch("/top-headlines/sources", &query.upstream_params()).await
    }

    async fn fetch(&self, path: &str, params: &[(&'static str, String)]) -> Result<UpstreamResponse> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);
        debug!("Fetching from NewsAPI: {}", path);
        self.client
            .get_json(&url, params, &[("X-Api-Key", self.api_key.as_str())])
            .await
    }
}
