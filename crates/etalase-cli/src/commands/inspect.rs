use std::path::Path;

use etalase_core::db::{Database, LibSqlResellerRepository, StoreCounts};
use etalase_core::{ResellerProfile, ResellerRecord};
use serde::Serialize;

use crate::commands::common::open_database;
use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct StoreSnapshot {
    pub counts: StoreCounts,
    pub resellers: Vec<ResellerRecord>,
    pub profiles: Vec<ResellerProfile>,
}

pub async fn run_inspect(limit: usize, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path).await?;
    let snapshot = snapshot(&db, limit).await?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

pub async fn snapshot(db: &Database, limit: usize) -> Result<StoreSnapshot, CliError> {
    let repo = LibSqlResellerRepository::new(db.connection());
    Ok(StoreSnapshot {
        counts: repo.counts().await?,
        resellers: repo.list(limit).await?,
        profiles: repo.list_profiles(limit).await?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use etalase_core::db::ResellerWrite;
    use pretty_assertions::assert_eq;

    #[tokio::test(flavor = "multi_thread")]
    async fn snapshot_respects_limit() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = LibSqlResellerRepository::new(db.connection());
        for api_id in ["R1", "R2", "R3"] {
            repo.upsert_from_upstream(&ResellerWrite {
                api_reseller_id: api_id.to_string(),
                nomor_hp: None,
                status: "active".to_string(),
            })
            .await
            .unwrap();
        }

        let snapshot = snapshot(&db, 2).await.unwrap();

        assert_eq!(snapshot.counts.resellers, 3);
        assert_eq!(snapshot.counts.profiles, 0);
        assert_eq!(snapshot.resellers.len(), 2);
        assert!(snapshot.profiles.is_empty());
    }
}
