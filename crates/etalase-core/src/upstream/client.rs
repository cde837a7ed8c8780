//! reqwest-backed upstream client

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{parse_envelope, CollectionKind, UpstreamError, UpstreamSource};
use crate::util::{compact_text, is_http_url, normalize_text_option, sanitize};
use crate::{Error, Result};

const ENV_BASE_URL: &str = "UPSTREAM_BASE_URL";
const ENV_API_TOKEN: &str = "UPSTREAM_API_TOKEN";
const ENV_TIMEOUT_SECS: &str = "UPSTREAM_TIMEOUT_SECS";

const DEFAULT_BASE_URL: &str = "https://drwgroup.id";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MIN_TIMEOUT_SECS: u64 = 5;
const MAX_TIMEOUT_SECS: u64 = 300;

/// Connection settings for the partner API.
#[derive(Clone, PartialEq, Eq)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub api_token: String,
    pub timeout: Duration,
}

impl fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("base_url", &self.base_url)
            .field("api_token", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl UpstreamConfig {
    /// Load from `UPSTREAM_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base_url = normalize_text_option(lookup(ENV_BASE_URL))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !is_http_url(&base_url) {
            return Err(Error::InvalidInput(format!(
                "{ENV_BASE_URL} must start with http:// or https://"
            )));
        }

        let api_token = normalize_text_option(lookup(ENV_API_TOKEN))
            .ok_or_else(|| Error::InvalidInput(format!("{ENV_API_TOKEN} is required")))?;

        let timeout_secs = match normalize_text_option(lookup(ENV_TIMEOUT_SECS)) {
            None => DEFAULT_TIMEOUT_SECS,
            Some(raw) => raw.parse::<u64>().map_err(|_| {
                Error::InvalidInput(format!("{ENV_TIMEOUT_SECS} must be a positive integer"))
            })?,
        };
        if !(MIN_TIMEOUT_SECS..=MAX_TIMEOUT_SECS).contains(&timeout_secs) {
            return Err(Error::InvalidInput(format!(
                "{ENV_TIMEOUT_SECS} must be between {MIN_TIMEOUT_SECS} and {MAX_TIMEOUT_SECS}"
            )));
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    fn collection_url(&self, kind: CollectionKind) -> String {
        format!("{}{}", self.base_url, kind.path())
    }
}

/// Bearer-authenticated client for the partner collections.
#[derive(Debug, Clone)]
pub struct HttpUpstreamClient {
    config: UpstreamConfig,
    client: reqwest::Client,
}

impl HttpUpstreamClient {
    pub fn new(config: UpstreamConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { config, client })
    }

    #[must_use]
    pub const fn config(&self) -> &UpstreamConfig {
        &self.config
    }
}

#[async_trait]
impl UpstreamSource for HttpUpstreamClient {
    async fn fetch_collection(
        &self,
        kind: CollectionKind,
    ) -> std::result::Result<Vec<Value>, UpstreamError> {
        let unavailable = |message: String| UpstreamError::Unavailable { kind, message };
        let url = self.config.collection_url(kind);

        tracing::debug!(%kind, %url, "Fetching upstream collection");
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.api_token)
            .send()
            .await
            .map_err(|error| unavailable(sanitize(&error)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| unavailable(sanitize(&error)))?;

        if !status.is_success() {
            return Err(unavailable(format!(
                "HTTP {}: {}",
                status.as_u16(),
                compact_text(&body)
            )));
        }

        let records = parse_envelope(kind, &body)?;
        tracing::debug!(%kind, count = records.len(), "Fetched upstream collection");
        Ok(records)
    }
}
