//! Category model

use serde::{Deserialize, Serialize};

use super::CategoryId;

/// Category that bundle-origin products are filed under.
pub const PAKET_CATEGORY: CategorySeed = CategorySeed {
    name: "Paket",
    slug: "paket",
    description: "Paket produk bundling",
};

/// Static definition used by get-or-create lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategorySeed {
    pub name: &'static str,
    pub slug: &'static str,
    pub description: &'static str,
}

/// A product category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
}
