//! Database migrations

use crate::error::Result;
use libsql::Connection;

/// Current schema version
const CURRENT_VERSION: i32 = 2;

/// Run all pending migrations
pub async fn run(conn: &Connection) -> Result<()> {
    let version = get_version(conn).await?;

    if version < 1 {
        migrate_v1(conn).await?;
    }
    if version < 2 {
        migrate_v2(conn).await?;
    }

    Ok(())
}

/// Get the current schema version
async fn get_version(conn: &Connection) -> Result<i32> {
    let mut rows = conn
        .query(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            (),
        )
        .await?;

    let exists: bool = if let Some(row) = rows.next().await? {
        row.get::<i32>(0)? != 0
    } else {
        false
    };

    if !exists {
        return Ok(0);
    }

    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM schema_version", ())
        .await?;

    let version: i32 = if let Some(row) = rows.next().await? {
        row.get(0)?
    } else {
        0
    };

    Ok(version)
}

/// Migration to version 1: resellers and reseller profiles
async fn migrate_v1(conn: &Connection) -> Result<()> {
    let statements = [
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )",
        "CREATE TABLE IF NOT EXISTS resellers (
            id TEXT PRIMARY KEY,
            api_reseller_id TEXT NOT NULL UNIQUE,
            nomor_hp TEXT UNIQUE,
            status TEXT NOT NULL DEFAULT 'active',
            last_api_sync_at INTEGER,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )",
        "CREATE TABLE IF NOT EXISTS reseller_profiles (
            id TEXT PRIMARY KEY,
            reseller_id TEXT NOT NULL UNIQUE REFERENCES resellers(id) ON DELETE CASCADE,
            nama_reseller TEXT,
            whatsapp_number TEXT,
            city TEXT,
            facebook TEXT,
            instagram TEXT,
            alamat TEXT,
            provinsi TEXT,
            kabupaten TEXT,
            kecamatan TEXT,
            bank TEXT,
            rekening TEXT,
            bio TEXT,
            photo_url TEXT,
            email_address TEXT,
            level TEXT,
            api_data TEXT,
            last_user_update INTEGER,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_reseller_profiles_user_update
            ON reseller_profiles(last_user_update)",
        "INSERT INTO schema_version (version) VALUES (1)",
    ];

    apply(conn, &statements).await?;
    tracing::info!("Migrated database to version 1");
    Ok(())
}

/// Migration to version 2: catalog (categories and products)
async fn migrate_v2(conn: &Connection) -> Result<()> {
    // Category names are not unique: get-or-create is lookup-then-insert
    let statements = [
        "CREATE TABLE IF NOT EXISTS categories (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            slug TEXT NOT NULL,
            description TEXT,
            created_at INTEGER NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_categories_name ON categories(name)",
        "CREATE TABLE IF NOT EXISTS products (
            id TEXT PRIMARY KEY,
            id_produk TEXT NOT NULL UNIQUE,
            api_bundling_id TEXT UNIQUE,
            nama_produk TEXT,
            bpom TEXT,
            harga_umum REAL,
            harga_consultant REAL,
            harga_supervisor REAL,
            harga_manager REAL,
            harga_director REAL,
            foto_produk TEXT,
            gambar TEXT,
            deskripsi TEXT,
            slug TEXT NOT NULL,
            is_bundling INTEGER NOT NULL DEFAULT 0,
            category_id TEXT REFERENCES categories(id) ON DELETE SET NULL,
            items TEXT,
            api_data TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_products_slug ON products(slug)",
        "CREATE INDEX IF NOT EXISTS idx_products_category ON products(category_id)",
        "INSERT INTO schema_version (version) VALUES (2)",
    ];

    apply(conn, &statements).await?;
    tracing::info!("Migrated database to version {CURRENT_VERSION}");
    Ok(())
}

/// Run statements in one transaction, rolling back on the first failure.
async fn apply(conn: &Connection, statements: &[&str]) -> Result<()> {
    // libsql doesn't have execute_batch with rollback semantics we can rely on
    conn.execute("BEGIN TRANSACTION", ()).await?;

    for stmt in statements {
        if let Err(e) = conn.execute(stmt, ()).await {
            conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }
    }

    if let Err(e) = conn.execute("COMMIT", ()).await {
        conn.execute("ROLLBACK", ()).await.ok();
        return Err(e.into());
    }

    Ok(())
}
