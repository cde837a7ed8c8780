//! libSQL store handle: local file, in-memory, or Turso embedded replica

use std::fmt;
use std::path::Path;
use std::time::Duration;

use libsql::{Builder, Connection, Database as LibSqlDatabase};

use super::migrations;
use crate::error::Result;
use crate::util::normalize_text_option;

const ENV_REPLICA_URL: &str = "TURSO_DATABASE_URL";
const ENV_REPLICA_TOKEN: &str = "TURSO_AUTH_TOKEN";
const REPLICA_SYNC_INTERVAL: Duration = Duration::from_secs(60);

/// Remote primary for an embedded replica.
#[derive(Clone)]
pub struct ReplicaConfig {
    pub url: String,
    pub auth_token: String,
    /// Background pull interval; `None` syncs only on demand
    pub sync_interval: Option<Duration>,
}

impl fmt::Debug for ReplicaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplicaConfig")
            .field("url", &self.url)
            .field("auth_token", &"[REDACTED]")
            .field("sync_interval", &self.sync_interval)
            .finish()
    }
}

impl ReplicaConfig {
    /// `None` unless both `TURSO_DATABASE_URL` and `TURSO_AUTH_TOKEN` are set.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        Some(Self {
            url: normalize_text_option(lookup(ENV_REPLICA_URL))?,
            auth_token: normalize_text_option(lookup(ENV_REPLICA_TOKEN))?,
            sync_interval: Some(REPLICA_SYNC_INTERVAL),
        })
    }
}

/// The store. Migrations have run by the time a `Database` exists.
pub struct Database {
    db: LibSqlDatabase,
    conn: Connection,
    replica: bool,
}

impl Database {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Builder::new_local(path.as_ref()).build().await?;
        Self::ready(db, false).await
    }

    pub async fn open_in_memory() -> Result<Self> {
        let db = Builder::new_local(":memory:").build().await?;
        Self::ready(db, false).await
    }

    /// Open `local_path` as an embedded replica. Reads hit the local file;
    /// writes go to the primary.
    pub async fn open_with_replica(
        local_path: impl AsRef<Path>,
        replica: ReplicaConfig,
    ) -> Result<Self> {
        let mut builder =
            Builder::new_remote_replica(local_path.as_ref(), replica.url, replica.auth_token);
        if let Some(interval) = replica.sync_interval {
            builder = builder.sync_interval(interval);
        }
        let db = builder.build().await?;
        Self::ready(db, true).await
    }

    /// Replica when `replica` is set, otherwise a local file. Creates the
    /// parent directory of `path`.
    pub async fn open_auto(path: impl AsRef<Path>, replica: Option<ReplicaConfig>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        match replica {
            Some(replica) => {
                tracing::info!(url = %replica.url, "Opening embedded replica");
                Self::open_with_replica(path, replica).await
            }
            None => {
                tracing::info!(path = %path.display(), "Opening local store");
                Self::open(path).await
            }
        }
    }

    async fn ready(db: LibSqlDatabase, replica: bool) -> Result<Self> {
        let conn = db.connect()?;
        let database = Self { db, conn, replica };

        // Pull the primary first so migrations see its schema version.
        database.sync_replica().await?;
        // WAL is refused by replicas.
        database
            .conn
            .execute("PRAGMA journal_mode = WAL;", ())
            .await
            .ok();
        database.conn.execute("PRAGMA foreign_keys = ON;", ()).await?;
        migrations::run(&database.conn).await?;
        Ok(database)
    }

    /// Pull from the primary. No-op for local stores.
    pub async fn sync_replica(&self) -> Result<()> {
        if self.replica {
            self.db.sync().await?;
            tracing::debug!("Replica synced");
        }
        Ok(())
    }

    pub const fn is_replica(&self) -> bool {
        self.replica
    }

    pub const fn connection(&self) -> &Connection {
        &self.conn
    }
}
