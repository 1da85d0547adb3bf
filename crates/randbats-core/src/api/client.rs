//! HTTP client for the randbats and Smogon data repositories.
//!
//! Every endpoint is a static JSON file keyed by format name, so the client
//! is little more than URL building plus status classification and a
//! backoff loop for rate limiting.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::{
    Config, DEFAULT_METADATA_BASE_URL, DEFAULT_RANDBATS_BASE_URL, DEFAULT_SMOGON_BASE_URL,
    DEFAULT_STATS_BASE_URL,
};
use crate::models::{FormatData, FormatMetadata};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Retries after a 429 before giving up.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// First backoff delay; doubles per retry.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// GitHub rejects API requests without a User-Agent.
const USER_AGENT: &str = concat!("pokemon-randbats/", env!("CARGO_PKG_VERSION"));

const GITHUB_ACCEPT: &str = "application/vnd.github+json";

/// Base URLs for each upstream file family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEndpoints {
    pub randbats: String,
    pub stats: String,
    pub metadata: String,
    pub smogon: String,
}

impl Default for RemoteEndpoints {
    fn default() -> Self {
        Self {
            randbats: DEFAULT_RANDBATS_BASE_URL.to_string(),
            stats: DEFAULT_STATS_BASE_URL.to_string(),
            metadata: DEFAULT_METADATA_BASE_URL.to_string(),
            smogon: DEFAULT_SMOGON_BASE_URL.to_string(),
        }
    }
}

impl RemoteEndpoints {
    pub fn from_config(config: &Config) -> Self {
        Self {
            randbats: config.randbats_base_url.clone(),
            stats: config.stats_base_url.clone(),
            metadata: config.metadata_base_url.clone(),
            smogon: config.smogon_base_url.clone(),
        }
    }

    /// Lay every endpoint out under one host, e.g. a local mirror.
    ///
    /// `{base}/data`, `{base}/data/stats`, `{base}/contents/data`, `{base}/smogon`
    pub fn under(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            randbats: format!("{}/data", base),
            stats: format!("{}/data/stats", base),
            metadata: format!("{}/contents/data", base),
            smogon: format!("{}/smogon", base),
        }
    }

    fn file_url(base: &str, format: &str) -> String {
        format!("{}/{}.json", base.trim_end_matches('/'), format)
    }
}

/// Client for the upstream data files. Clones share one connection pool.
#[derive(Clone)]
pub struct RemoteClient {
    client: Client,
    endpoints: RemoteEndpoints,
    initial_backoff: Duration,
}

impl RemoteClient {
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::with_endpoints(RemoteEndpoints::from_config(config), config.request_timeout())
    }

    pub fn with_endpoints(endpoints: RemoteEndpoints, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoints,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
        })
    }

    /// Override the first rate-limit backoff delay (doubles on each retry)
    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    pub fn endpoints(&self) -> &RemoteEndpoints {
        &self.endpoints
    }

    /// `Ok(None)` means rate limited: back off and try again.
    async fn check_response_for_retry(
        response: reqwest::Response,
    ) -> Result<Option<reqwest::Response>, ApiError> {
        let status = response.status();
        if status.is_success() {
            Ok(Some(response))
        } else if status == StatusCode::TOO_MANY_REQUESTS {
            Ok(None)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: &str, accept: Option<&str>) -> Result<T> {
        let mut retries = 0;
        let mut backoff = self.initial_backoff;

        loop {
            let mut request = self.client.get(url);
            if let Some(accept) = accept {
                request = request.header(header::ACCEPT, accept);
            }

            let response = request
                .send()
                .await
                .map_err(ApiError::NetworkError)
                .with_context(|| format!("GET {} failed", url))?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    let body = response
                        .text()
                        .await
                        .with_context(|| format!("Failed to read response body from {}", url))?;
                    return serde_json::from_str(&body).map_err(|e| {
                        ApiError::InvalidResponse(format!("{}: {}", url, e)).into()
                    });
                }
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited.into());
                    }
                    warn!(url = url, retry = retries, backoff_ms = backoff.as_millis() as u64, "Rate limited, backing off");
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
            }
        }
    }

    // ===== Upstream Files =====

    /// Fetch the set file for a random battle format
    pub async fn fetch_format_data(&self, format: &str) -> Result<FormatData> {
        let url = RemoteEndpoints::file_url(&self.endpoints.randbats, format);
        debug!(format, %url, "Fetching format data");
        self.get(&url, None).await
    }

    /// Fetch per-Pokemon probability stats for a format.
    /// Not every format publishes stats, so a 404 is `Ok(None)`.
    pub async fn fetch_format_stats(&self, format: &str) -> Result<Option<FormatData>> {
        let url = RemoteEndpoints::file_url(&self.endpoints.stats, format);
        debug!(format, %url, "Fetching format stats");
        match self.get(&url, None).await {
            Ok(stats) => Ok(Some(stats)),
            Err(e) if is_not_found(&e) => {
                debug!(format, "No stats published");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Fetch the GitHub contents entry (with the blob sha) for a format file
    pub async fn fetch_metadata(&self, format: &str) -> Result<FormatMetadata> {
        let url = RemoteEndpoints::file_url(&self.endpoints.metadata, format);
        debug!(format, %url, "Fetching format metadata");
        self.get(&url, Some(GITHUB_ACCEPT)).await
    }

    /// Fetch Smogon competitive sets for a tier
    pub async fn fetch_smogon_sets(&self, format: &str) -> Result<FormatData> {
        let url = RemoteEndpoints::file_url(&self.endpoints.smogon, format);
        debug!(format, %url, "Fetching Smogon sets");
        self.get(&url, None).await
    }
}

/// True when the error chain bottoms out in a 404.
pub fn is_not_found(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<ApiError>())
        .any(ApiError::is_not_found)
}
