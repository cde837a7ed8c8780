//! Reseller upsert with the user-edit conflict policy.

use serde_json::Value;

use super::Pass;
use crate::db::{LibSqlResellerRepository, ProfileFields, ProfileWrite, ResellerWrite};
use crate::models::ResellerRecord;
use crate::upstream::{decode, UpstreamReseller};
use crate::util::sanitize;
use crate::{Error, Result};

pub(super) async fn sync_reseller(pass: &mut Pass<'_>, raw: &Value) -> Result<()> {
    let upstream: UpstreamReseller = decode(raw)?;
    let write = ResellerWrite {
        api_reseller_id: upstream.external_id()?,
        nomor_hp: upstream.nomor_hp.clone(),
        status: upstream.status_or_default().to_string(),
    };
    let repo = LibSqlResellerRepository::new(pass.conn);

    let reseller = match repo.upsert_from_upstream(&write).await {
        Ok(reseller) => reseller,
        Err(error) if error.is_phone_conflict() => {
            tracing::info!(
                api_reseller_id = %write.api_reseller_id,
                "Phone number already in use, merging into the existing reseller"
            );
            merge_by_phone(&repo, &write).await.map_err(|merge_error| {
                Error::Database(format!("phone merge failed: {}", sanitize(&merge_error)))
            })?
        }
        Err(error) => return Err(error),
    };

    let photo_url = match upstream.photo_source() {
        Some(source) => {
            let destination = format!("reseller-{}-photo.jpg", write.api_reseller_id);
            let migrated = pass.migrate_image(source, &destination).await;
            migrated.or_else(|| Some(source.to_string()))
        }
        None => None,
    };

    let fields = profile_fields(&upstream, photo_url, raw);
    let respects_user = repo
        .find_profile(&reseller.id)
        .await?
        .is_some_and(|profile| profile.is_user_edited());
    let profile_write = if respects_user {
        ProfileWrite::RefreshUpstreamOwned(fields)
    } else {
        ProfileWrite::Overwrite(fields)
    };
    repo.upsert_profile(&reseller.id, &profile_write).await?;

    Ok(())
}

/// Re-point the reseller that already owns this phone number at the new upstream id.
async fn merge_by_phone(
    repo: &LibSqlResellerRepository<'_>,
    write: &ResellerWrite,
) -> Result<ResellerRecord> {
    let phone = write
        .nomor_hp
        .as_deref()
        .ok_or_else(|| Error::InvalidRecord("phone conflict without a phone".to_string()))?;
    let existing = repo
        .find_by_phone(phone)
        .await?
        .ok_or_else(|| Error::NotFound(format!("reseller with phone {phone}")))?;

    repo.repoint(&existing.id, &write.api_reseller_id, &write.status)
        .await
}

fn profile_fields(upstream: &UpstreamReseller, photo_url: Option<String>, raw: &Value) -> ProfileFields {
    ProfileFields {
        nama_reseller: upstream.nama_reseller.clone(),
        whatsapp_number: upstream.nomor_hp.clone(),
        city: upstream.area.clone(),
        facebook: upstream.facebook.clone(),
        instagram: upstream.instagram.clone(),
        alamat: upstream.alamat.clone(),
        provinsi: upstream.provinsi.clone(),
        kabupaten: upstream.kabupaten.clone(),
        kecamatan: upstream.kecamatan.clone(),
        bank: upstream.bank.clone(),
        rekening: upstream.rekening.clone(),
        bio: upstream.bio_text().map(ToOwned::to_owned),
        photo_url,
        email_address: upstream.email.clone(),
        level: upstream.level.clone(),
        api_data: Some(raw.clone()),
    }
}
