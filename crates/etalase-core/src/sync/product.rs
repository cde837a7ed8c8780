//! Product and bundle upserts. Upstream always wins for catalog rows.

use serde_json::Value;

use super::Pass;
use crate::db::{LibSqlProductRepository, ProductWrite};
use crate::models::CategoryId;
use crate::upstream::{decode, UpstreamBundle, UpstreamProduct};
use crate::util::create_slug;
use crate::Result;

pub(super) async fn sync_product(pass: &mut Pass<'_>, raw: &Value) -> Result<()> {
    let upstream: UpstreamProduct = decode(raw)?;
    let id_produk = upstream.external_id()?;
    let prices = upstream.prices.parse()?;

    let gambar = match upstream.foto_produk.as_deref() {
        Some(source) => {
            pass.migrate_image(source, &format!("product-{id_produk}-image.jpg"))
                .await
        }
        None => None,
    };

    let slug = upstream
        .slug
        .clone()
        .unwrap_or_else(|| derive_slug(upstream.nama_produk.as_deref(), &id_produk));

    let write = ProductWrite {
        id_produk,
        api_bundling_id: None,
        nama_produk: upstream.nama_produk,
        bpom: upstream.bpom,
        prices,
        foto_produk: upstream.foto_produk,
        gambar,
        deskripsi: upstream.deskripsi,
        slug,
        is_bundling: false,
        category_id: None,
        items: None,
        api_data: Some(raw.clone()),
    };
    LibSqlProductRepository::new(pass.conn).upsert(&write).await?;
    Ok(())
}

pub(super) async fn sync_bundle(
    pass: &mut Pass<'_>,
    raw: &Value,
    category_id: CategoryId,
) -> Result<()> {
    let upstream: UpstreamBundle = decode(raw)?;
    let id_bundling = upstream.external_id()?;
    let prices = upstream.prices.parse()?;
    let id_produk = UpstreamBundle::product_id(&id_bundling);

    let gambar = match upstream.foto_bundling.as_deref() {
        Some(source) => {
            pass.migrate_image(source, &format!("bundling-{id_bundling}-image.jpg"))
                .await
        }
        None => None,
    };

    let slug = derive_slug(upstream.nama_bundling.as_deref(), &id_produk);
    let write = ProductWrite {
        id_produk,
        api_bundling_id: Some(id_bundling),
        nama_produk: upstream.nama_bundling,
        bpom: None,
        prices,
        foto_produk: upstream.foto_bundling,
        gambar,
        deskripsi: upstream.deskripsi,
        slug,
        is_bundling: true,
        category_id: Some(category_id),
        items: upstream.items,
        api_data: Some(raw.clone()),
    };
    LibSqlProductRepository::new(pass.conn).upsert(&write).await?;
    Ok(())
}

/// Slug from the display name, or from the id when the name yields nothing.
fn derive_slug(name: Option<&str>, fallback: &str) -> String {
    let slug = name.map(create_slug).unwrap_or_default();
    if slug.is_empty() {
        create_slug(fallback)
    } else {
        slug
    }
}
