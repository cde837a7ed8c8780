//! Product and category repository

use libsql::{params, Connection, Row};
use serde_json::Value as JsonValue;

use crate::error::{Error, Result};
use crate::models::{Category, CategoryId, CategorySeed, PriceTiers, ProductId, ProductRecord};
use crate::util::now_millis;

use super::values::{
    json, opt_integer, opt_json, opt_real, opt_text, parse_id, real, req_integer, req_text,
    text,
};

const PRODUCT_COLUMNS: &str = "id, id_produk, api_bundling_id, nama_produk, bpom, harga_umum, \
     harga_consultant, harga_supervisor, harga_manager, harga_director, foto_produk, gambar, \
     deskripsi, slug, is_bundling, category_id, items, api_data, created_at, updated_at";

const CATEGORY_COLUMNS: &str = "id, name, slug, description, created_at";

/// Upstream-derived product values for one upsert.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductWrite {
    pub id_produk: String,
    /// Set for bundles; bundles are keyed by this instead of `id_produk`
    pub api_bundling_id: Option<String>,
    pub nama_produk: Option<String>,
    pub bpom: Option<String>,
    pub prices: PriceTiers,
    pub foto_produk: Option<String>,
    pub gambar: Option<String>,
    pub deskripsi: Option<String>,
    /// Only used when the row is created
    pub slug: String,
    pub is_bundling: bool,
    pub category_id: Option<CategoryId>,
    pub items: Option<JsonValue>,
    pub api_data: Option<JsonValue>,
}

/// libSQL repository for products and categories
pub struct LibSqlProductRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlProductRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create or update a product.
    ///
    /// Bundles match on `api_bundling_id`, everything else on `id_produk`. The
    /// slug of an existing row is never changed, and a `None` category keeps
    /// whatever category the row already has.
    pub async fn upsert(&self, write: &ProductWrite) -> Result<ProductRecord> {
        let existing = match write.api_bundling_id.as_deref() {
            Some(bundling_id) => self.find_by_bundling_id(bundling_id).await?,
            None => self.find_by_id_produk(&write.id_produk).await?,
        };
        let now = now_millis();
        let category_id = write.category_id.as_ref().map(CategoryId::as_str);

        if let Some(existing) = existing {
            self.conn
                .execute(
                    "UPDATE products SET
                        id_produk = ?, nama_produk = ?, bpom = ?, harga_umum = ?,
                        harga_consultant = ?, harga_supervisor = ?, harga_manager = ?,
                        harga_director = ?, foto_produk = ?, gambar = ?, deskripsi = ?,
                        is_bundling = ?, category_id = COALESCE(?, category_id), items = ?, api_data = ?,
                        updated_at = ?
                     WHERE id = ?",
                    params![
                        write.id_produk.as_str(),
                        text(write.nama_produk.as_deref()),
                        text(write.bpom.as_deref()),
                        real(write.prices.umum),
                        real(write.prices.consultant),
                        real(write.prices.supervisor),
                        real(write.prices.manager),
                        real(write.prices.director),
                        text(write.foto_produk.as_deref()),
                        text(write.gambar.as_deref()),
                        text(write.deskripsi.as_deref()),
                        i64::from(write.is_bundling),
                        text(category_id.as_deref()),
                        json(write.items.as_ref())?,
                        json(write.api_data.as_ref())?,
                        now,
                        existing.id.as_str()
                    ],
                )
                .await?;
            return self.require(&existing.id).await;
        }

        let id = ProductId::new();
        self.conn
            .execute(
                "INSERT INTO products (
                    id, id_produk, api_bundling_id, nama_produk, bpom, harga_umum,
                    harga_consultant, harga_supervisor, harga_manager, harga_director,
                    foto_produk, gambar, deskripsi, slug, is_bundling, category_id, items,
                    api_data, created_at, updated_at
                 ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    id.as_str(),
                    write.id_produk.as_str(),
                    text(write.api_bundling_id.as_deref()),
                    text(write.nama_produk.as_deref()),
                    text(write.bpom.as_deref()),
                    real(write.prices.umum),
                    real(write.prices.consultant),
                    real(write.prices.supervisor),
                    real(write.prices.manager),
                    real(write.prices.director),
                    text(write.foto_produk.as_deref()),
                    text(write.gambar.as_deref()),
                    text(write.deskripsi.as_deref()),
                    write.slug.as_str(),
                    i64::from(write.is_bundling),
                    text(category_id.as_deref()),
                    json(write.items.as_ref())?,
                    json(write.api_data.as_ref())?,
                    now,
                    now
                ],
            )
            .await?;
        self.require(&id).await
    }

    /// Get a product by internal id
    pub async fn get(&self, id: &ProductId) -> Result<Option<ProductRecord>> {
        self.find_one("id", &id.as_str()).await
    }

    /// Find a product by its upstream `id_produk`
    pub async fn find_by_id_produk(&self, id_produk: &str) -> Result<Option<ProductRecord>> {
        self.find_one("id_produk", id_produk).await
    }

    /// Find a bundle product by its upstream bundle id
    pub async fn find_by_bundling_id(&self, bundling_id: &str) -> Result<Option<ProductRecord>> {
        self.find_one("api_bundling_id", bundling_id).await
    }

    /// List products, most recently updated first
    pub async fn list(&self, limit: usize) -> Result<Vec<ProductRecord>> {
        let sql =
            format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY updated_at DESC LIMIT ?");
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut rows = self.conn.query(&sql, [limit]).await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(parse_product(&row)?);
        }
        Ok(out)
    }

    /// Find the first category with the given name
    pub async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE name = ?
             ORDER BY created_at ASC LIMIT 1"
        );
        let mut rows = self.conn.query(&sql, [name]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(parse_category(&row)?)),
            None => Ok(None),
        }
    }

    /// Look a category up by name, creating it from the seed when missing.
    pub async fn get_or_create_category(&self, seed: &CategorySeed) -> Result<Category> {
        if let Some(category) = self.find_category_by_name(seed.name).await? {
            return Ok(category);
        }

        let id = CategoryId::new();
        self.conn
            .execute(
                "INSERT INTO categories (id, name, slug, description, created_at)
                 VALUES (?, ?, ?, ?, ?)",
                params![
                    id.as_str(),
                    seed.name,
                    seed.slug,
                    seed.description,
                    now_millis()
                ],
            )
            .await?;
        tracing::info!("Created category {}", seed.name);

        self.find_category_by_name(seed.name)
            .await?
            .ok_or_else(|| Error::NotFound(format!("category {}", seed.name)))
    }

    async fn find_one(&self, column: &str, value: &str) -> Result<Option<ProductRecord>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE {column} = ?");
        let mut rows = self.conn.query(&sql, [value]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(parse_product(&row)?)),
            None => Ok(None),
        }
    }

    async fn require(&self, id: &ProductId) -> Result<ProductRecord> {
        self.get(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("product {id}")))
    }
}

fn parse_product(row: &Row) -> Result<ProductRecord> {
    let category_id = opt_text(row, 15)?
        .map(|raw| parse_id::<CategoryId>(&raw))
        .transpose()?;

    Ok(ProductRecord {
        id: parse_id(&req_text(row, 0)?)?,
        id_produk: req_text(row, 1)?,
        api_bundling_id: opt_text(row, 2)?,
        nama_produk: opt_text(row, 3)?,
        bpom: opt_text(row, 4)?,
        prices: PriceTiers {
            umum: opt_real(row, 5)?,
            consultant: opt_real(row, 6)?,
            supervisor: opt_real(row, 7)?,
            manager: opt_real(row, 8)?,
            director: opt_real(row, 9)?,
        },
        foto_produk: opt_text(row, 10)?,
        gambar: opt_text(row, 11)?,
        deskripsi: opt_text(row, 12)?,
        slug: req_text(row, 13)?,
        is_bundling: opt_integer(row, 14)?.unwrap_or(0) != 0,
        category_id,
        items: opt_json(row, 16)?,
        api_data: opt_json(row, 17)?,
        created_at: req_integer(row, 18)?,
        updated_at: req_integer(row, 19)?,
    })
}

fn parse_category(row: &Row) -> Result<Category> {
    Ok(Category {
        id: parse_id(&req_text(row, 0)?)?,
        name: req_text(row, 1)?,
        slug: req_text(row, 2)?,
        description: opt_text(row, 3)?,
        created_at: req_integer(row, 4)?,
    })
}
