//! Reseller and reseller profile models

use serde::{Deserialize, Serialize};

use super::{ProfileId, ResellerId};

/// Lifecycle status stored when upstream sends none.
pub const DEFAULT_STATUS: &str = "active";

/// A reseller row, keyed upstream by `api_reseller_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResellerRecord {
    /// Internal surrogate identifier
    pub id: ResellerId,
    /// Upstream reseller identifier (unique)
    pub api_reseller_id: String,
    /// Phone number as sent by upstream (unique when present)
    pub nomor_hp: Option<String>,
    /// Free-text lifecycle status
    pub status: String,
    /// Last time upstream data was written to this row (Unix ms)
    pub last_api_sync_at: Option<i64>,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Last update timestamp (Unix ms)
    pub updated_at: i64,
}

/// User-editable overlay for a reseller's public storefront.
///
/// Upstream owns these fields until the reseller edits their profile; from then
/// on `last_user_update` is set and sync stops overwriting them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResellerProfile {
    pub id: ProfileId,
    pub reseller_id: ResellerId,
    pub nama_reseller: Option<String>,
    pub whatsapp_number: Option<String>,
    pub city: Option<String>,
    pub facebook: Option<String>,
    pub instagram: Option<String>,
    pub alamat: Option<String>,
    pub provinsi: Option<String>,
    pub kabupaten: Option<String>,
    pub kecamatan: Option<String>,
    pub bank: Option<String>,
    pub rekening: Option<String>,
    pub bio: Option<String>,
    pub photo_url: Option<String>,
    pub email_address: Option<String>,
    pub level: Option<String>,
    /// Raw upstream payload from the latest sync
    pub api_data: Option<serde_json::Value>,
    /// Set only by a direct user edit (Unix ms)
    pub last_user_update: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl ResellerProfile {
    /// Whether the reseller has customized this profile by hand.
    #[must_use]
    pub const fn is_user_edited(&self) -> bool {
        self.last_user_update.is_some()
    }
}

/// Fields a reseller may change through a direct profile edit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileEdit {
    pub nama_reseller: Option<String>,
    pub whatsapp_number: Option<String>,
    pub city: Option<String>,
    pub facebook: Option<String>,
    pub instagram: Option<String>,
    pub alamat: Option<String>,
    pub provinsi: Option<String>,
    pub kabupaten: Option<String>,
    pub kecamatan: Option<String>,
    pub bank: Option<String>,
    pub rekening: Option<String>,
    pub bio: Option<String>,
    pub photo_url: Option<String>,
}
