//! Product model

use serde::{Deserialize, Serialize};

use super::{CategoryId, ProductId};

/// Tiered reseller prices. Absent tiers are `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceTiers {
    pub umum: Option<f64>,
    pub consultant: Option<f64>,
    pub supervisor: Option<f64>,
    pub manager: Option<f64>,
    pub director: Option<f64>,
}

/// A catalog product, either standalone or synthesized from a bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Internal surrogate identifier
    pub id: ProductId,
    /// Upstream product id, or `bundling-{id}` for bundles
    pub id_produk: String,
    /// Upstream bundle id (bundles only)
    pub api_bundling_id: Option<String>,
    pub nama_produk: Option<String>,
    pub bpom: Option<String>,
    pub prices: PriceTiers,
    /// Upstream photo URL, kept verbatim
    pub foto_produk: Option<String>,
    /// Durable copy of `foto_produk` when migration succeeded
    pub gambar: Option<String>,
    pub deskripsi: Option<String>,
    /// Public URL segment, fixed at creation
    pub slug: String,
    pub is_bundling: bool,
    pub category_id: Option<CategoryId>,
    /// Bundle contents as sent by upstream
    pub items: Option<serde_json::Value>,
    /// Raw upstream payload from the latest sync
    pub api_data: Option<serde_json::Value>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl ProductRecord {
    /// Image to render: the migrated copy, else the upstream original.
    #[must_use]
    pub fn display_image(&self) -> Option<&str> {
        self.gambar.as_deref().or(self.foto_produk.as_deref())
    }
}
