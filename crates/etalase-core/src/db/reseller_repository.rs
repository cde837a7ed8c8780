//! Reseller and reseller profile repository

use libsql::{params, Connection, Row};
use serde_json::Value as JsonValue;

use crate::error::{Error, Result};
use crate::models::{ProfileEdit, ProfileId, ResellerId, ResellerProfile, ResellerRecord};
use crate::util::{normalize_text_option, now_millis};

use super::values::{
    integer, json, opt_integer, opt_json, opt_text, parse_id, req_integer, req_text, text,
};

const RESELLER_COLUMNS: &str =
    "id, api_reseller_id, nomor_hp, status, last_api_sync_at, created_at, updated_at";

const PROFILE_COLUMNS: &str = "id, reseller_id, nama_reseller, whatsapp_number, city, facebook, \
     instagram, alamat, provinsi, kabupaten, kecamatan, bank, rekening, bio, photo_url, \
     email_address, level, api_data, last_user_update, created_at, updated_at";

/// Upstream-owned reseller columns written on every sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResellerWrite {
    pub api_reseller_id: String,
    pub nomor_hp: Option<String>,
    pub status: String,
}

/// Profile values derived from one upstream reseller record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileFields {
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
    pub api_data: Option<JsonValue>,
}

/// How a sync pass may touch an existing profile.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileWrite {
    /// No user edits recorded: upstream wins for every field.
    Overwrite(ProfileFields),
    /// User edits recorded: only upstream-owned fields (`city`, `bio`,
    /// `email_address`, `level`, `api_data`) are refreshed.
    RefreshUpstreamOwned(ProfileFields),
}

impl ProfileWrite {
    /// Upstream values carried by this write.
    pub const fn fields(&self) -> &ProfileFields {
        match self {
            Self::Overwrite(fields) | Self::RefreshUpstreamOwned(fields) => fields,
        }
    }
}

/// Row counts for store inspection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct StoreCounts {
    pub resellers: i64,
    pub profiles: i64,
    pub user_edited_profiles: i64,
    pub products: i64,
    pub bundles: i64,
    pub categories: i64,
}

/// libSQL repository for resellers and their profiles
pub struct LibSqlResellerRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlResellerRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Find a reseller by its upstream id
    pub async fn find_by_api_id(&self, api_reseller_id: &str) -> Result<Option<ResellerRecord>> {
        let sql = format!("SELECT {RESELLER_COLUMNS} FROM resellers WHERE api_reseller_id = ?");
        let mut rows = self.conn.query(&sql, [api_reseller_id]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(parse_reseller(&row)?)),
            None => Ok(None),
        }
    }

    /// Find a reseller by phone number
    pub async fn find_by_phone(&self, nomor_hp: &str) -> Result<Option<ResellerRecord>> {
        let sql = format!("SELECT {RESELLER_COLUMNS} FROM resellers WHERE nomor_hp = ?");
        let mut rows = self.conn.query(&sql, [nomor_hp]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(parse_reseller(&row)?)),
            None => Ok(None),
        }
    }

    /// Get a reseller by internal id
    pub async fn get(&self, id: &ResellerId) -> Result<Option<ResellerRecord>> {
        let sql = format!("SELECT {RESELLER_COLUMNS} FROM resellers WHERE id = ?");
        let mut rows = self.conn.query(&sql, [id.as_str()]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(parse_reseller(&row)?)),
            None => Ok(None),
        }
    }

    /// Create or update a reseller keyed by `api_reseller_id`, stamping the sync time.
    pub async fn upsert_from_upstream(&self, write: &ResellerWrite) -> Result<ResellerRecord> {
        let now = now_millis();

        if let Some(existing) = self.find_by_api_id(&write.api_reseller_id).await? {
            self.conn
                .execute(
                    "UPDATE resellers
                     SET nomor_hp = ?, status = ?, updated_at = ?, last_api_sync_at = ?
                     WHERE id = ?",
                    params![
                        text(write.nomor_hp.as_deref()),
                        write.status.as_str(),
                        now,
                        now,
                        existing.id.as_str()
                    ],
                )
                .await?;
            return self.require(&existing.id).await;
        }

        let id = ResellerId::new();
        self.conn
            .execute(
                "INSERT INTO resellers
                 (id, api_reseller_id, nomor_hp, status, last_api_sync_at, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
                params![
                    id.as_str(),
                    write.api_reseller_id.as_str(),
                    text(write.nomor_hp.as_deref()),
                    write.status.as_str(),
                    now,
                    now,
                    now
                ],
            )
            .await?;
        self.require(&id).await
    }

    /// Re-point an existing reseller at a new upstream id (phone merge).
    pub async fn repoint(
        &self,
        id: &ResellerId,
        api_reseller_id: &str,
        status: &str,
    ) -> Result<ResellerRecord> {
        let now = now_millis();
        let changed = self
            .conn
            .execute(
                "UPDATE resellers
                 SET api_reseller_id = ?, status = ?, updated_at = ?, last_api_sync_at = ?
                 WHERE id = ?",
                params![api_reseller_id, status, now, now, id.as_str()],
            )
            .await?;
        if changed == 0 {
            return Err(Error::NotFound(format!("reseller {id}")));
        }
        self.require(id).await
    }

    /// Load the profile overlay for a reseller, if one exists
    pub async fn find_profile(&self, reseller_id: &ResellerId) -> Result<Option<ResellerProfile>> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM reseller_profiles WHERE reseller_id = ?");
        let mut rows = self.conn.query(&sql, [reseller_id.as_str()]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(parse_profile(&row)?)),
            None => Ok(None),
        }
    }

    /// Create or update a profile from upstream data.
    ///
    /// A new profile always takes the full payload; a profile that does not exist
    /// yet cannot carry user edits. `last_user_update` is never written here.
    pub async fn upsert_profile(
        &self,
        reseller_id: &ResellerId,
        write: &ProfileWrite,
    ) -> Result<ResellerProfile> {
        let now = now_millis();
        let fields = write.fields();
        let api_data = json(fields.api_data.as_ref())?;

        let Some(existing) = self.find_profile(reseller_id).await? else {
            self.insert_profile(reseller_id, fields, None, now).await?;
            return self.require_profile(reseller_id).await;
        };

        match write {
            ProfileWrite::Overwrite(fields) => {
                self.conn
                    .execute(
                        "UPDATE reseller_profiles SET
                            nama_reseller = ?, whatsapp_number = ?, city = ?, facebook = ?,
                            instagram = ?, alamat = ?, provinsi = ?, kabupaten = ?,
                            kecamatan = ?, bank = ?, rekening = ?, bio = ?, photo_url = ?,
                            email_address = ?, level = ?, api_data = ?, updated_at = ?
                         WHERE id = ?",
                        params![
                            text(fields.nama_reseller.as_deref()),
                            text(fields.whatsapp_number.as_deref()),
                            text(fields.city.as_deref()),
                            text(fields.facebook.as_deref()),
                            text(fields.instagram.as_deref()),
                            text(fields.alamat.as_deref()),
                            text(fields.provinsi.as_deref()),
                            text(fields.kabupaten.as_deref()),
                            text(fields.kecamatan.as_deref()),
                            text(fields.bank.as_deref()),
                            text(fields.rekening.as_deref()),
                            text(fields.bio.as_deref()),
                            text(fields.photo_url.as_deref()),
                            text(fields.email_address.as_deref()),
                            text(fields.level.as_deref()),
                            api_data,
                            now,
                            existing.id.as_str()
                        ],
                    )
                    .await?;
            }
            ProfileWrite::RefreshUpstreamOwned(fields) => {
                self.conn
                    .execute(
                        "UPDATE reseller_profiles SET
                            city = ?, bio = ?, email_address = ?, level = ?, api_data = ?,
                            updated_at = ?
                         WHERE id = ?",
                        params![
                            text(fields.city.as_deref()),
                            text(fields.bio.as_deref()),
                            text(fields.email_address.as_deref()),
                            text(fields.level.as_deref()),
                            api_data,
                            now,
                            existing.id.as_str()
                        ],
                    )
                    .await?;
            }
        }

        self.require_profile(reseller_id).await
    }

    /// Apply a direct edit by the reseller, marking the profile as user-owned.
    pub async fn apply_user_edit(
        &self,
        reseller_id: &ResellerId,
        edit: &ProfileEdit,
    ) -> Result<ResellerProfile> {
        if self.get(reseller_id).await?.is_none() {
            return Err(Error::NotFound(format!("reseller {reseller_id}")));
        }

        let now = now_millis();
        let fields = ProfileFields {
            nama_reseller: normalize_text_option(edit.nama_reseller.clone()),
            whatsapp_number: normalize_text_option(edit.whatsapp_number.clone()),
            city: normalize_text_option(edit.city.clone()),
            facebook: normalize_text_option(edit.facebook.clone()),
            instagram: normalize_text_option(edit.instagram.clone()),
            alamat: normalize_text_option(edit.alamat.clone()),
            provinsi: normalize_text_option(edit.provinsi.clone()),
            kabupaten: normalize_text_option(edit.kabupaten.clone()),
            kecamatan: normalize_text_option(edit.kecamatan.clone()),
            bank: normalize_text_option(edit.bank.clone()),
            rekening: normalize_text_option(edit.rekening.clone()),
            bio: normalize_text_option(edit.bio.clone()),
            photo_url: normalize_text_option(edit.photo_url.clone()),
            ..ProfileFields::default()
        };

        let Some(existing) = self.find_profile(reseller_id).await? else {
            self.insert_profile(reseller_id, &fields, Some(now), now)
                .await?;
            return self.require_profile(reseller_id).await;
        };

        self.conn
            .execute(
                "UPDATE reseller_profiles SET
                    nama_reseller = ?, whatsapp_number = ?, city = ?, facebook = ?,
                    instagram = ?, alamat = ?, provinsi = ?, kabupaten = ?, kecamatan = ?,
                    bank = ?, rekening = ?, bio = ?, photo_url = ?, last_user_update = ?,
                    updated_at = ?
                 WHERE id = ?",
                params![
                    text(fields.nama_reseller.as_deref()),
                    text(fields.whatsapp_number.as_deref()),
                    text(fields.city.as_deref()),
                    text(fields.facebook.as_deref()),
                    text(fields.instagram.as_deref()),
                    text(fields.alamat.as_deref()),
                    text(fields.provinsi.as_deref()),
                    text(fields.kabupaten.as_deref()),
                    text(fields.kecamatan.as_deref()),
                    text(fields.bank.as_deref()),
                    text(fields.rekening.as_deref()),
                    text(fields.bio.as_deref()),
                    text(fields.photo_url.as_deref()),
                    now,
                    now,
                    existing.id.as_str()
                ],
            )
            .await?;

        self.require_profile(reseller_id).await
    }

    /// Fill profile columns from the mirrored upstream payload for profiles the
    /// reseller never edited. Returns the number of profiles changed.
    ///
    /// Only values present in `api_data` are written; existing columns are kept
    /// when upstream has nothing for them.
    pub async fn backfill_profiles_from_api_data(&self) -> Result<usize> {
        let sql = format!(
            "SELECT {PROFILE_COLUMNS} FROM reseller_profiles
             WHERE api_data IS NOT NULL AND last_user_update IS NULL"
        );
        let mut rows = self.conn.query(&sql, ()).await?;
        let mut profiles = Vec::new();
        while let Some(row) = rows.next().await? {
            profiles.push(parse_profile(&row)?);
        }

        let mut updated = 0;
        for profile in profiles {
            let Some(data) = profile.api_data.as_ref() else {
                continue;
            };
            let Some(merged) = backfilled(&profile, data) else {
                continue;
            };

            self.conn
                .execute(
                    "UPDATE reseller_profiles SET
                        nama_reseller = ?, whatsapp_number = ?, city = ?, facebook = ?,
                        instagram = ?, alamat = ?, provinsi = ?, kabupaten = ?,
                        kecamatan = ?, bank = ?, rekening = ?, level = ?, updated_at = ?
                     WHERE id = ? AND last_user_update IS NULL",
                    params![
                        text(merged.nama_reseller.as_deref()),
                        text(merged.whatsapp_number.as_deref()),
                        text(merged.city.as_deref()),
                        text(merged.facebook.as_deref()),
                        text(merged.instagram.as_deref()),
                        text(merged.alamat.as_deref()),
                        text(merged.provinsi.as_deref()),
                        text(merged.kabupaten.as_deref()),
                        text(merged.kecamatan.as_deref()),
                        text(merged.bank.as_deref()),
                        text(merged.rekening.as_deref()),
                        text(merged.level.as_deref()),
                        now_millis(),
                        profile.id.as_str()
                    ],
                )
                .await?;
            updated += 1;
        }

        Ok(updated)
    }

    /// Stamp `last_api_sync_at` from `updated_at` where it was never recorded.
    pub async fn backfill_sync_stamps(&self) -> Result<u64> {
        let changed = self
            .conn
            .execute(
                "UPDATE resellers SET last_api_sync_at = updated_at WHERE last_api_sync_at IS NULL",
                (),
            )
            .await?;
        Ok(changed)
    }

    /// List resellers, most recently updated first
    pub async fn list(&self, limit: usize) -> Result<Vec<ResellerRecord>> {
        let sql =
            format!("SELECT {RESELLER_COLUMNS} FROM resellers ORDER BY updated_at DESC LIMIT ?");
        let mut rows = self.conn.query(&sql, [to_limit(limit)]).await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(parse_reseller(&row)?);
        }
        Ok(out)
    }

    /// List profiles, most recently updated first
    pub async fn list_profiles(&self, limit: usize) -> Result<Vec<ResellerProfile>> {
        let sql = format!(
            "SELECT {PROFILE_COLUMNS} FROM reseller_profiles ORDER BY updated_at DESC LIMIT ?"
        );
        let mut rows = self.conn.query(&sql, [to_limit(limit)]).await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(parse_profile(&row)?);
        }
        Ok(out)
    }

    /// Row counts across the reconciled tables
    pub async fn counts(&self) -> Result<StoreCounts> {
        Ok(StoreCounts {
            resellers: self.count("SELECT COUNT(*) FROM resellers").await?,
            profiles: self.count("SELECT COUNT(*) FROM reseller_profiles").await?,
            user_edited_profiles: self
                .count("SELECT COUNT(*) FROM reseller_profiles WHERE last_user_update IS NOT NULL")
                .await?,
            products: self
                .count("SELECT COUNT(*) FROM products WHERE is_bundling = 0")
                .await?,
            bundles: self
                .count("SELECT COUNT(*) FROM products WHERE is_bundling = 1")
                .await?,
            categories: self.count("SELECT COUNT(*) FROM categories").await?,
        })
    }

    async fn count(&self, sql: &str) -> Result<i64> {
        let mut rows = self.conn.query(sql, ()).await?;
        match rows.next().await? {
            Some(row) => req_integer(&row, 0),
            None => Ok(0),
        }
    }

    async fn insert_profile(
        &self,
        reseller_id: &ResellerId,
        fields: &ProfileFields,
        last_user_update: Option<i64>,
        now: i64,
    ) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO reseller_profiles (
                    id, reseller_id, nama_reseller, whatsapp_number, city, facebook, instagram,
                    alamat, provinsi, kabupaten, kecamatan, bank, rekening, bio, photo_url,
                    email_address, level, api_data, last_user_update, created_at, updated_at
                 ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    ProfileId::new().as_str(),
                    reseller_id.as_str(),
                    text(fields.nama_reseller.as_deref()),
                    text(fields.whatsapp_number.as_deref()),
                    text(fields.city.as_deref()),
                    text(fields.facebook.as_deref()),
                    text(fields.instagram.as_deref()),
                    text(fields.alamat.as_deref()),
                    text(fields.provinsi.as_deref()),
                    text(fields.kabupaten.as_deref()),
                    text(fields.kecamatan.as_deref()),
                    text(fields.bank.as_deref()),
                    text(fields.rekening.as_deref()),
                    text(fields.bio.as_deref()),
                    text(fields.photo_url.as_deref()),
                    text(fields.email_address.as_deref()),
                    text(fields.level.as_deref()),
                    json(fields.api_data.as_ref())?,
                    integer(last_user_update),
                    now,
                    now
                ],
            )
            .await?;
        Ok(())
    }

    async fn require(&self, id: &ResellerId) -> Result<ResellerRecord> {
        self.get(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("reseller {id}")))
    }

    async fn require_profile(&self, reseller_id: &ResellerId) -> Result<ResellerProfile> {
        self.find_profile(reseller_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("profile for reseller {reseller_id}")))
    }
}

/// Overlay trimmed `api_data` values onto a profile; `None` when nothing changes.
fn backfilled(profile: &ResellerProfile, data: &JsonValue) -> Option<ResellerProfile> {
    let pick = |key: &str| -> Option<String> {
        let raw = match data.get(key)? {
            JsonValue::String(value) => value.clone(),
            JsonValue::Number(value) => value.to_string(),
            _ => return None,
        };
        normalize_text_option(Some(raw))
    };

    let mut merged = profile.clone();
    let assign = |slot: &mut Option<String>, key: &str| {
        if let Some(value) = pick(key) {
            *slot = Some(value);
        }
    };
    assign(&mut merged.nama_reseller, "nama_reseller");
    assign(&mut merged.whatsapp_number, "nomor_hp");
    assign(&mut merged.city, "area");
    assign(&mut merged.facebook, "facebook");
    assign(&mut merged.instagram, "instagram");
    assign(&mut merged.alamat, "alamat");
    assign(&mut merged.provinsi, "provinsi");
    assign(&mut merged.kabupaten, "kabupaten");
    assign(&mut merged.kecamatan, "kecamatan");
    assign(&mut merged.bank, "bank");
    assign(&mut merged.rekening, "rekening");
    assign(&mut merged.level, "level");
    if merged.nama_reseller.is_none() {
        merged.nama_reseller = pick("id_reseller");
    }

    (merged != *profile).then_some(merged)
}

fn to_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

fn parse_reseller(row: &Row) -> Result<ResellerRecord> {
    Ok(ResellerRecord {
        id: parse_id(&req_text(row, 0)?)?,
        api_reseller_id: req_text(row, 1)?,
        nomor_hp: opt_text(row, 2)?,
        status: req_text(row, 3)?,
        last_api_sync_at: opt_integer(row, 4)?,
        created_at: req_integer(row, 5)?,
        updated_at: req_integer(row, 6)?,
    })
}

fn parse_profile(row: &Row) -> Result<ResellerProfile> {
    Ok(ResellerProfile {
        id: parse_id(&req_text(row, 0)?)?,
        reseller_id: parse_id(&req_text(row, 1)?)?,
        nama_reseller: opt_text(row, 2)?,
        whatsapp_number: opt_text(row, 3)?,
        city: opt_text(row, 4)?,
        facebook: opt_text(row, 5)?,
        instagram: opt_text(row, 6)?,
        alamat: opt_text(row, 7)?,
        provinsi: opt_text(row, 8)?,
        kabupaten: opt_text(row, 9)?,
        kecamatan: opt_text(row, 10)?,
        bank: opt_text(row, 11)?,
        rekening: opt_text(row, 12)?,
        bio: opt_text(row, 13)?,
        photo_url: opt_text(row, 14)?,
        email_address: opt_text(row, 15)?,
        level: opt_text(row, 16)?,
        api_data: opt_json(row, 17)?,
        last_user_update: opt_integer(row, 18)?,
        created_at: req_integer(row, 19)?,
        updated_at: req_integer(row, 20)?,
    })
}
