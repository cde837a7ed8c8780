//! Object storage for migrated media.

mod r2;

use async_trait::async_trait;

use crate::Result;

pub use r2::{R2Config, R2Storage};

/// A bucket that serves uploaded objects at public URLs.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload `bytes` under a key derived from `name` and return the public URL.
    ///
    /// Keys carry a random suffix so repeated uploads of the same name never
    /// overwrite each other.
    async fn put_public(&self, name: &str, bytes: Vec<u8>, content_type: &str) -> Result<String>;
}
