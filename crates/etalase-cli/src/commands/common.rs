use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use etalase_core::db::{Database, ReplicaConfig};
use etalase_core::media::image_migrator_from_env;
use etalase_core::upstream::{HttpUpstreamClient, UpstreamConfig};
use etalase_core::SyncEngine;

use crate::error::CliError;

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    resolve_db_path_with(cli_db_path, env::var_os("ETALASE_DB_PATH").map(PathBuf::from))
}

pub fn resolve_db_path_with(
    cli_db_path: Option<PathBuf>,
    env_db_path: Option<PathBuf>,
) -> Result<PathBuf, CliError> {
    match cli_db_path.or(env_db_path) {
        Some(path) => Ok(path),
        None => default_db_path(),
    }
}

pub fn default_db_path() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join("etalase").join("etalase.db"))
        .ok_or(CliError::NoDataDir)
}

pub async fn open_database(path: &Path) -> Result<Database, CliError> {
    Ok(Database::open_auto(path, ReplicaConfig::from_env()).await?)
}

pub async fn build_engine(db_path: &Path) -> Result<SyncEngine, CliError> {
    let db = Arc::new(open_database(db_path).await?);
    let upstream_config = UpstreamConfig::from_env()?;
    let timeout = upstream_config.timeout;
    let upstream = Arc::new(HttpUpstreamClient::new(upstream_config)?);
    let images = image_migrator_from_env(timeout)?;
    Ok(SyncEngine::new(db, upstream, images))
}
