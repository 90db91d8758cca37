//! Jikan API client with cooperative cancellation.

use super::error::CatalogError;
use super::types::*;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use shared::config::CatalogConfig;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Read-only view of the anime catalog
///
/// Every call takes the token of the request it belongs to. Once the token is
/// cancelled the call resolves to [`CatalogError::Canceled`], whatever the
/// network was doing.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Free-text search, one page at a time
    async fn search_anime(
        &self,
        query: &str,
        page: u32,
        cancel: &CancellationToken,
    ) -> Result<AnimeSearchResponse, CatalogError>;

    /// Full entry by MAL ID
    async fn anime_full(
        &self,
        mal_id: u32,
        cancel: &CancellationToken,
    ) -> Result<AnimeFull, CatalogError>;
}

/// Jikan API v4 client
#[derive(Debug, Clone)]
pub struct JikanClient {
    /// HTTP client
    client: Client,
    /// Base URL for Jikan API
    base_url: String,
    /// Send `sfw=true` with searches
    sfw: bool,
}

impl JikanClient {
    /// Create a new Jikan client
    pub fn new(
        base_url: String,
        user_agent: &str,
        sfw: bool,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut builder = Client::builder().user_agent(user_agent);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            sfw,
        })
    }

    /// Create a client from the `[catalog]` config section
    pub fn from_config(config: &CatalogConfig) -> Result<Self> {
        Self::new(
            config.base_url.clone(),
            &config.user_agent,
            config.sfw,
            config.request_timeout(),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn search_params(&self, query: &str, page: u32) -> Vec<(&'static str, String)> {
        let mut params = vec![("q", query.to_string()), ("page", page.to_string())];
        if self.sfw {
            params.push(("sfw", "true".to_string()));
        }
        params
    }

    /// Make a GET request that gives up as soon as `cancel` fires
    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
        cancel: &CancellationToken,
    ) -> Result<T, CatalogError> {
        if cancel.is_cancelled() {
            return Err(CatalogError::Canceled);
        }

        let url = format!("{}{}", self.base_url, endpoint);
        debug!(url = %url, "Making API request");

        // Dropping the losing branch drops the reqwest future, which closes
        // the connection.
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(url = %url, "Request canceled");
                Err(CatalogError::Canceled)
            }
            result = self.fetch(&url, params) => result,
        }
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<T, CatalogError> {
        let response = self.client.get(url).query(params).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if status.is_success() {
            let data = serde_json::from_slice(&body).map_err(|e| {
                warn!(url = %url, error = %e, "Failed to parse response");
                CatalogError::from(e)
            })?;
            debug!(url = %url, "Request successful");
            return Ok(data);
        }

        let message = serde_json::from_slice::<JikanError>(&body)
            .ok()
            .and_then(|payload| payload.message);

        warn!(
            url = %url,
            status = %status,
            message = message.as_deref().unwrap_or(""),
            "Request failed"
        );

        Err(CatalogError::Service { status, message })
    }
}

#[async_trait]
impl CatalogApi for JikanClient {
    async fn search_anime(
        &self,
        query: &str,
        page: u32,
        cancel: &CancellationToken,
    ) -> Result<AnimeSearchResponse, CatalogError> {
        debug!(query = query, page = page, "Searching anime");
        let params = self.search_params(query, page);
        self.get("/anime", &params, cancel).await
    }

    async fn anime_full(
        &self,
        mal_id: u32,
        cancel: &CancellationToken,
    ) -> Result<AnimeFull, CatalogError> {
        debug!(mal_id = mal_id, "Fetching anime details");
        let response: AnimeFullResponse = self
            .get(&format!("/anime/{}/full", mal_id), &[], cancel)
            .await?;
        Ok(response.data)
    }
}
