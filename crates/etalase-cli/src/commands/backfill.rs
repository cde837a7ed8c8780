use std::path::Path;

use etalase_core::db::{Database, LibSqlResellerRepository};

use crate::commands::common::open_database;
use crate::error::CliError;

pub async fn run_backfill_profiles(db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path).await?;
    let updated = backfill_profiles(&db).await?;
    println!("Backfilled {updated} profile(s) from upstream data");
    Ok(())
}

pub async fn run_backfill_sync_stamps(db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path).await?;
    let updated = LibSqlResellerRepository::new(db.connection())
        .backfill_sync_stamps()
        .await?;
    println!("Stamped last_api_sync_at on {updated} reseller(s)");
    Ok(())
}

async fn backfill_profiles(db: &Database) -> Result<usize, CliError> {
    let updated = LibSqlResellerRepository::new(db.connection())
        .backfill_profiles_from_api_data()
        .await?;
    if db.is_replica() {
        db.sync_replica().await?;
    }
    Ok(updated)
}
