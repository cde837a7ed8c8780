use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] etalase_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Failed to resolve data directory; pass --db-path or set ETALASE_DB_PATH")]
    NoDataDir,
    #[error("Sync failed for {0}")]
    SyncIncomplete(String),
}
