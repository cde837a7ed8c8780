//! Image migration: copy remote images into durable object storage.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

use crate::storage::{ObjectStore, R2Config, R2Storage};
use crate::util::{compact_text, is_http_url};
use crate::{Error, Result};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Copies a remote image to durable storage.
#[async_trait]
pub trait ImageMigrator: Send + Sync {
    /// Migrate `source_url`, returning the durable URL.
    ///
    /// `Ok(None)` means migration is switched off and nothing was attempted.
    async fn migrate(&self, source_url: &str, destination_name: &str) -> Result<Option<String>>;
}

/// Downloads images over HTTP and re-uploads them to an [`ObjectStore`].
pub struct BlobImageMigrator {
    client: reqwest::Client,
    store: Arc<dyn ObjectStore>,
}

impl BlobImageMigrator {
    pub fn new(store: Arc<dyn ObjectStore>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, store })
    }
}

#[async_trait]
impl ImageMigrator for BlobImageMigrator {
    async fn migrate(
        &self,
        source_url: &str,
        destination_name: &str,
    ) -> Result<Option<String>> {
        if !is_http_url(source_url) {
            return Err(Error::InvalidInput(format!(
                "Image source is not an http(s) URL: {}",
                compact_text(source_url)
            )));
        }

        let response = self.client.get(source_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Storage(format!(
                "Failed to fetch image {source_url} status={}",
                status.as_u16()
            )));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();
        let bytes = response.bytes().await?.to_vec();

        tracing::debug!(
            source = source_url,
            destination = destination_name,
            size = bytes.len(),
            "Uploading migrated image"
        );
        let url = self
            .store
            .put_public(destination_name, bytes, &content_type)
            .await?;
        Ok(Some(url))
    }
}

/// Used when no object storage is configured; callers keep raw URLs.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledImageMigrator;

#[async_trait]
impl ImageMigrator for DisabledImageMigrator {
    async fn migrate(&self, _source_url: &str, _destination_name: &str) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Build the migrator for the current environment: R2-backed when the `R2_*`
/// variables are set, disabled otherwise.
pub fn image_migrator_from_env(timeout: Duration) -> Result<Arc<dyn ImageMigrator>> {
    image_migrator_for(R2Config::from_env()?, timeout)
}

/// R2-backed migrator for `r2`, or a disabled one when it is `None`.
pub fn image_migrator_for(
    r2: Option<R2Config>,
    timeout: Duration,
) -> Result<Arc<dyn ImageMigrator>> {
    match r2 {
        Some(config) => {
            tracing::info!(bucket = %config.bucket, "Image migration to R2 enabled");
            let store = Arc::new(R2Storage::new(config));
            Ok(Arc::new(BlobImageMigrator::new(store, timeout)?))
        }
        None => {
            tracing::info!("R2 not configured; image migration disabled");
            Ok(Arc::new(DisabledImageMigrator))
        }
    }
}
