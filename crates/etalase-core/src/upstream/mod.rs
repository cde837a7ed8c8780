//! Upstream partner API: collection fetching and typed record views.

mod client;
mod records;

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

pub use client::{HttpUpstreamClient, UpstreamConfig};
pub use records::{
    decode, parse_price, PhotoAccessor, RawPrices, UpstreamBundle, UpstreamProduct,
    UpstreamReseller, PHOTO_CANDIDATES,
};

/// The three collections the partner API exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    Resellers,
    Products,
    Bundling,
}

impl CollectionKind {
    /// Path of the collection endpoint, relative to the upstream base URL.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Resellers => "/apis/reseller/get",
            Self::Products => "/apis/product/get",
            Self::Bundling => "/apis/bundling/get",
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Resellers => "resellers",
            Self::Products => "products",
            Self::Bundling => "bundling",
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whole-collection fetch failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpstreamError {
    /// Transport failure or non-success status
    #[error("upstream {kind} unavailable: {message}")]
    Unavailable {
        kind: CollectionKind,
        message: String,
    },

    /// Body is not JSON or has no `data` array
    #[error("upstream {kind} response malformed: {message}")]
    Malformed {
        kind: CollectionKind,
        message: String,
    },
}

impl UpstreamError {
    #[must_use]
    pub const fn kind(&self) -> CollectionKind {
        match self {
            Self::Unavailable { kind, .. } | Self::Malformed { kind, .. } => *kind,
        }
    }
}

/// Source of raw upstream records.
#[async_trait]
pub trait UpstreamSource: Send + Sync {
    /// Fetch every record of one collection, in upstream order.
    async fn fetch_collection(&self, kind: CollectionKind) -> Result<Vec<Value>, UpstreamError>;
}

/// Extract the `data` array from an upstream response body.
pub fn parse_envelope(kind: CollectionKind, body: &str) -> Result<Vec<Value>, UpstreamError> {
    let malformed = |message: String| UpstreamError::Malformed { kind, message };

    let mut envelope: Value = serde_json::from_str(body)
        .map_err(|error| malformed(format!("invalid JSON: {error}")))?;

    match envelope.get_mut("data").map(Value::take) {
        Some(Value::Array(records)) => Ok(records),
        Some(other) => Err(malformed(format!(
            "expected `data` to be an array, got {}",
            json_type(&other)
        ))),
        None => Err(malformed("missing `data` field".to_string())),
    }
}

const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
