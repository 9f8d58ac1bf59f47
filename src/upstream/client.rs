//! Shared HTTP client with timeout and bounded retry.

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppError, Result};

/// Status and decoded JSON body of an upstream response.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: Value,
}

impl UpstreamResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// == Upstream Client ==
/// `reqwest::Client` wrapper shared by every upstream API.
///
/// Transport errors, 429 and 5xx responses are retried with exponential
/// backoff. Any other response is returned as-is, whatever its status.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    max_retries: u32,
    retry_base: Duration,
}

impl UpstreamClient {
    pub fn new(timeout: Duration, max_retries: u32, retry_base: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("news-sports-gateway/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            max_retries,
            retry_base,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            Duration::from_secs(config.upstream_timeout_secs),
            config.upstream_max_retries,
            Duration::from_millis(config.upstream_retry_base_ms),
        )
    }

    /// Sends a GET and decodes the JSON body.
    ///
    /// Fails with [`AppError::Upstream`] when every attempt failed at the
    /// transport level or the final body is not JSON.
    pub async fn get_json(
        &self,
        url: &str,
        query: &[(&str, String)],
        headers: &[(&str, &str)],
    ) -> Result<UpstreamResponse> {
        let mut attempts = 0;
        let mut delay = self.retry_base;

        loop {
            let mut request = self.http.get(url).query(query);
            for (name, value) in headers {
                request = request.header(*name, *value);
            }

            let reason = match request.send().await {
                Ok(response) if attempts >= self.max_retries || !is_retryable(response.status()) => {
                    if attempts > 0 {
                        info!("Upstream request succeeded after {} retries", attempts);
                    }
                    return decode(response).await;
                }
                Ok(response) => format!("status {}", response.status()),
                Err(e) if attempts >= self.max_retries => {
                    return Err(AppError::Upstream(format!(
                        "request failed after {} attempts: {}",
                        attempts + 1,
                        e.without_url()
                    )));
                }
                Err(e) => e.without_url().to_string(),
            };

            attempts += 1;
            warn!(
                "Upstream attempt {} failed ({}), retrying in {}ms",
                attempts,
                reason,
                delay.as_millis()
            );
            sleep(delay).await;
            delay = delay.saturating_mul(2);
        }
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

async fn decode(response: reqwest::Response) -> Result<UpstreamResponse> {
    let status = response.status().as_u16();
    let text = response.text().await?;
    debug!(status, bytes = text.len(), "Upstream response received");

    let body = if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text)
            .map_err(|e| AppError::Upstream(format!("invalid JSON body (status {}): {}", status, e)))?
    };

    Ok(UpstreamResponse { status, body })
}
