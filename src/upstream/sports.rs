//! TheSportsDB live-score feed.

use serde_json::Value;
use tracing::debug;

use super::client::UpstreamClient;
use crate::error::{AppError, Result};

/// Live-score source for the sync job.
#[derive(Debug, Clone)]
pub struct SportsFeed {
    client: UpstreamClient,
    base_url: String,
    api_key: String,
}

impl SportsFeed {
    pub fn new(client: UpstreamClient, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Current live events as raw feed items.
    ///
    /// A feed answering `{"events": null}` has nothing live and yields an
    /// empty list; a non-2xx answer is an error.
    pub async fn live_scores(&self) -> Result<Vec<Value>> {
        let url = format!(
            "{}/{}/livescore.php",
            self.base_url.trim_end_matches('/'),
            self.api_key
        );
        let response = self.client.get_json(&url, &[], &[]).await?;
        if !response.is_success() {
            return Err(AppError::Upstream(format!(
                "Sports API returned status {}",
                response.status
            )));
        }

        let events = match response.body.get("events") {
            Some(Value::Array(events)) => events.clone(),
            _ => Vec::new(),
        };
        debug!("Live feed returned {} events", events.len());
        Ok(events)
    }
}
