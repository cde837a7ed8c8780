//! Error types for etalase-core

use thiserror::Error;

/// Result type alias using etalase-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in etalase-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Entity not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Upstream record could not be interpreted
    #[error("Invalid upstream record: {0}")]
    InvalidRecord(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Outbound HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Media/object storage error
    #[error("Storage error: {0}")]
    Storage(String),
}

impl Error {
    /// Whether this error is the store rejecting a duplicate reseller phone number.
    ///
    /// Upstream occasionally reassigns a phone number to a new reseller id; the
    /// sync engine answers that with a merge instead of a failure.
    pub fn is_phone_conflict(&self) -> bool {
        let message = self.to_string().to_ascii_lowercase();
        message.contains("unique constraint failed") && message.contains("nomor_hp")
    }
}
