//! HTTP transport: implements `DirectoryClient` against the dashboard
//! server's `/api/search` and `/api/org` endpoints.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::DirectoryError;
use crate::service::DirectoryClient;
use crate::types::{DirectoryEntry, Org, SearchQuery};

const SEARCH_PATH: &str = "api/search";
const ORG_PATH: &str = "api/org";
const DASHBOARD_TYPE: &str = "dash-db";
const MAX_ERROR_BODY: usize = 256;

/// Configuration for the HTTP transport.
#[derive(Debug, Clone)]
pub struct HttpDirectoryConfig {
    pub base_url: String,
    pub api_token: Option<String>,
    /// Limit applied when the query does not carry its own.
    pub search_limit: usize,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for HttpDirectoryConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".into(),
            api_token: None,
            search_limit: 1000,
            connect_timeout: Duration::from_secs(2),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Search hit as returned on the wire.
#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(default)]
    uid: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
}

/// Directory client backed by the dashboard server's HTTP API.
pub struct HttpDirectoryClient {
    config: HttpDirectoryConfig,
    base: Url,
    client: reqwest::Client,
}

impl HttpDirectoryClient {
    pub fn new(config: HttpDirectoryConfig) -> Result<Self, DirectoryError> {
        let trimmed = config.base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(DirectoryError::InvalidArgument("base_url is required".into()));
        }
        // A trailing slash keeps sub-path mounts when joining endpoint paths.
        let base = Url::parse(&format!("{trimmed}/"))
            .map_err(|e| DirectoryError::InvalidArgument(format!("invalid base_url: {e}")))?;

        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| DirectoryError::Transport(e.to_string()))?;

        Ok(Self {
            config,
            base,
            client,
        })
    }

    pub fn search_url(&self, query: &SearchQuery) -> Result<Url, DirectoryError> {
        let mut url = self
            .base
            .join(SEARCH_PATH)
            .map_err(|e| DirectoryError::InvalidArgument(e.to_string()))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("type", DASHBOARD_TYPE);
            let limit = query.limit.unwrap_or(self.config.search_limit);
            pairs.append_pair("limit", &limit.to_string());
            for id in &query.ids {
                pairs.append_pair("dashboardUIDs", id);
            }
        }
        Ok(url)
    }

    pub fn org_url(&self) -> Result<Url, DirectoryError> {
        self.base
            .join(ORG_PATH)
            .map_err(|e| DirectoryError::InvalidArgument(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, DirectoryError> {
        let mut request = self.client.get(url.clone());
        if let Some(token) = &self.config.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message: String = body.trim().chars().take(MAX_ERROR_BODY).collect();
            return Err(DirectoryError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response.bytes().await?;
        debug!(url = %url, bytes = bytes.len(), "directory response");
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl DirectoryClient for HttpDirectoryClient {
    async fn search(&self, query: SearchQuery) -> Result<Vec<DirectoryEntry>, DirectoryError> {
        let url = self.search_url(&query)?;
        let hits: Vec<SearchHit> = self.get_json(url).await?;
        Ok(hits
            .into_iter()
            .filter(|hit| !hit.uid.is_empty())
            .map(|hit| DirectoryEntry::new(hit.uid, hit.title, hit.url))
            .collect())
    }

    async fn current_org(&self) -> Result<Org, DirectoryError> {
        let url = self.org_url()?;
        self.get_json(url).await
    }
}
