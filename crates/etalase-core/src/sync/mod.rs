//! Sync orchestration: one pass over the upstream collections.
//!
//! A pass fetches each requested collection in a fixed order (resellers,
//! products, bundles) and upserts its records one at a time. Failures are
//! contained at the smallest level possible: a bad record is recorded and
//! skipped, an unreachable collection is recorded and counted as empty. Only
//! store failures outside any record (creating the bundle category) abort the
//! pass.

mod product;
mod reseller;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use libsql::Connection;
use serde::Serialize;
use serde_json::Value;

use crate::db::{Database, LibSqlProductRepository};
use crate::media::ImageMigrator;
use crate::models::PAKET_CATEGORY;
use crate::upstream::{CollectionKind, UpstreamError, UpstreamSource};
use crate::util::{iso_timestamp, now_millis, sanitize};
use crate::{Error, Result};

/// Which collections a pass covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncScope {
    #[default]
    All,
    Resellers,
    Products,
    Bundling,
}

impl SyncScope {
    /// Collections in the order they are synced.
    #[must_use]
    pub const fn kinds(self) -> &'static [CollectionKind] {
        match self {
            Self::All => &[
                CollectionKind::Resellers,
                CollectionKind::Products,
                CollectionKind::Bundling,
            ],
            Self::Resellers => &[CollectionKind::Resellers],
            Self::Products => &[CollectionKind::Products],
            Self::Bundling => &[CollectionKind::Bundling],
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Resellers => "resellers",
            Self::Products => "products",
            Self::Bundling => "bundling",
        }
    }
}

impl fmt::Display for SyncScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SyncScope {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl FromStr for SyncScope {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(Self::All),
            "resellers" => Ok(Self::Resellers),
            "products" => Ok(Self::Products),
            "bundling" => Ok(Self::Bundling),
            other => Err(Error::InvalidInput(format!(
                "Unknown sync type '{other}'. Expected one of: resellers, products, bundling"
            ))),
        }
    }
}

/// A record that could not be upserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordFailure {
    pub kind: CollectionKind,
    /// Upstream id, when the record had one
    pub external_id: Option<String>,
    pub reason: String,
}

/// A collection that could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KindFailure {
    pub kind: CollectionKind,
    pub reason: String,
}

impl From<UpstreamError> for KindFailure {
    fn from(error: UpstreamError) -> Self {
        Self {
            kind: error.kind(),
            reason: error.to_string(),
        }
    }
}

/// An image whose migration failed; the raw URL was kept instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageFailure {
    pub source: String,
    pub destination: String,
    pub reason: String,
}

/// Image migration counters for one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImageStats {
    pub attempted: usize,
    pub migrated: usize,
    pub failed: usize,
    /// Images left as raw URLs because migration is disabled
    pub skipped: usize,
}

/// Everything that went wrong (or was worth counting) during one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub record_failures: Vec<RecordFailure>,
    pub kind_failures: Vec<KindFailure>,
    pub images: ImageStats,
    pub image_failures: Vec<ImageFailure>,
}

impl SyncReport {
    /// No record or collection failed. Image failures do not count.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.record_failures.is_empty() && self.kind_failures.is_empty()
    }

    #[must_use]
    pub fn failures_for(&self, kind: CollectionKind) -> usize {
        self.record_failures
            .iter()
            .filter(|failure| failure.kind == kind)
            .count()
    }
}

/// Result of a pass. Counts are upstream records seen, not rows written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub scope: SyncScope,
    pub resellers: usize,
    pub products: usize,
    pub bundling: usize,
    /// RFC 3339, millisecond precision, UTC
    pub last_sync: String,
    pub report: SyncReport,
}

impl SyncSummary {
    #[must_use]
    pub const fn count(&self, kind: CollectionKind) -> usize {
        match kind {
            CollectionKind::Resellers => self.resellers,
            CollectionKind::Products => self.products,
            CollectionKind::Bundling => self.bundling,
        }
    }
}

/// Runs sync passes against one store.
#[derive(Clone)]
pub struct SyncEngine {
    db: Arc<Database>,
    upstream: Arc<dyn UpstreamSource>,
    images: Arc<dyn ImageMigrator>,
}

impl SyncEngine {
    pub fn new(
        db: Arc<Database>,
        upstream: Arc<dyn UpstreamSource>,
        images: Arc<dyn ImageMigrator>,
    ) -> Self {
        Self {
            db,
            upstream,
            images,
        }
    }

    #[must_use]
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Run one pass over the collections in `scope`.
    pub async fn run(&self, scope: SyncScope) -> Result<SyncSummary> {
        let mut pass = Pass {
            conn: self.db.connection(),
            images: self.images.as_ref(),
            report: SyncReport::default(),
        };
        let mut counts = [0_usize; 3];

        tracing::info!(%scope, "Sync pass started");
        for &kind in scope.kinds() {
            let records = match self.upstream.fetch_collection(kind).await {
                Ok(records) => records,
                Err(error) => {
                    tracing::warn!(%kind, "Upstream fetch failed: {error}");
                    pass.report.kind_failures.push(KindFailure::from(error));
                    continue;
                }
            };

            tracing::info!(%kind, count = records.len(), "Syncing collection");
            counts[slot(kind)] = records.len();
            pass.sync_collection(kind, &records).await?;
            tracing::info!(
                %kind,
                count = records.len(),
                failed = pass.report.failures_for(kind),
                "Collection synced"
            );
        }

        let summary = SyncSummary {
            scope,
            resellers: counts[slot(CollectionKind::Resellers)],
            products: counts[slot(CollectionKind::Products)],
            bundling: counts[slot(CollectionKind::Bundling)],
            last_sync: iso_timestamp(now_millis()),
            report: pass.report,
        };
        tracing::info!(
            %scope,
            resellers = summary.resellers,
            products = summary.products,
            bundling = summary.bundling,
            record_failures = summary.report.record_failures.len(),
            kind_failures = summary.report.kind_failures.len(),
            "Sync pass finished"
        );
        Ok(summary)
    }
}

const fn slot(kind: CollectionKind) -> usize {
    match kind {
        CollectionKind::Resellers => 0,
        CollectionKind::Products => 1,
        CollectionKind::Bundling => 2,
    }
}

/// State threaded through one pass.
struct Pass<'a> {
    conn: &'a Connection,
    images: &'a dyn ImageMigrator,
    report: SyncReport,
}

impl Pass<'_> {
    async fn sync_collection(&mut self, kind: CollectionKind, records: &[Value]) -> Result<()> {
        match kind {
            CollectionKind::Resellers => {
                for raw in records {
                    let outcome = reseller::sync_reseller(self, raw).await;
                    self.settle(kind, raw, outcome);
                }
            }
            CollectionKind::Products => {
                for raw in records {
                    let outcome = product::sync_product(self, raw).await;
                    self.settle(kind, raw, outcome);
                }
            }
            CollectionKind::Bundling => {
                let paket = LibSqlProductRepository::new(self.conn)
                    .get_or_create_category(&PAKET_CATEGORY)
                    .await?;
                for raw in records {
                    let outcome = product::sync_bundle(self, raw, paket.id).await;
                    self.settle(kind, raw, outcome);
                }
            }
        }
        Ok(())
    }

    fn settle(&mut self, kind: CollectionKind, raw: &Value, outcome: Result<()>) {
        if let Err(error) = outcome {
            let external_id = external_id(kind, raw);
            let reason = sanitize(&error);
            tracing::warn!(
                %kind,
                external_id = external_id.as_deref().unwrap_or("<missing>"),
                "Record sync failed: {reason}"
            );
            self.report.record_failures.push(RecordFailure {
                kind,
                external_id,
                reason,
            });
        }
    }

    /// Migrate one image, recording the outcome. `None` when nothing durable
    /// was produced.
    async fn migrate_image(&mut self, source: &str, destination: &str) -> Option<String> {
        match self.images.migrate(source, destination).await {
            Ok(Some(url)) => {
                self.report.images.attempted += 1;
                self.report.images.migrated += 1;
                tracing::debug!(source, url = %url, "Image migrated");
                Some(url)
            }
            Ok(None) => {
                self.report.images.skipped += 1;
                None
            }
            Err(error) => {
                let reason = sanitize(&error);
                tracing::warn!(source, destination, "Image migration failed: {reason}");
                self.report.images.attempted += 1;
                self.report.images.failed += 1;
                self.report.image_failures.push(ImageFailure {
                    source: source.to_string(),
                    destination: destination.to_string(),
                    reason,
                });
                None
            }
        }
    }
}

fn external_id(kind: CollectionKind, raw: &Value) -> Option<String> {
    let key = match kind {
        CollectionKind::Resellers => "id_reseller",
        CollectionKind::Products => "id_produk",
        CollectionKind::Bundling => "id_bundling",
    };
    match raw.get(key)? {
        Value::String(value) if !value.trim().is_empty() => Some(value.trim().to_string()),
        Value::Number(value) => Some(value.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::db::LibSqlResellerRepository;
    use crate::media::DisabledImageMigrator;
    use crate::models::{ProductRecord, ProfileEdit, ResellerProfile};

    #[derive(Default)]
    struct FakeUpstream {
        collections: Mutex<HashMap<CollectionKind, std::result::Result<Vec<Value>, UpstreamError>>>,
        fetched: Mutex<Vec<CollectionKind>>,
    }

    impl FakeUpstream {
        fn set(&self, kind: CollectionKind, records: Vec<Value>) {
            self.collections.lock().unwrap().insert(kind, Ok(records));
        }

        fn fail(&self, kind: CollectionKind) {
            self.collections.lock().unwrap().insert(
                kind,
                Err(UpstreamError::Unavailable {
                    kind,
                    message: "HTTP 502: bad gateway".to_string(),
                }),
            );
        }
    }

    #[async_trait]
    impl UpstreamSource for FakeUpstream {
        async fn fetch_collection(
            &self,
            kind: CollectionKind,
        ) -> std::result::Result<Vec<Value>, UpstreamError> {
            self.fetched.lock().unwrap().push(kind);
            self.collections
                .lock()
                .unwrap()
                .get(&kind)
                .cloned()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    /// Succeeds with a CDN URL unless the source is listed as failing.
    #[derive(Default)]
    struct FakeMigrator {
        failing: HashSet<String>,
    }

    impl FakeMigrator {
        fn failing(sources: &[&str]) -> Self {
            Self {
                failing: sources.iter().map(|source| (*source).to_string()).collect(),
            }
        }
    }

    #[async_trait]
    impl ImageMigrator for FakeMigrator {
        async fn migrate(&self, source_url: &str, destination_name: &str) -> Result<Option<String>> {
            if self.failing.contains(source_url) {
                return Err(Error::Storage(format!(
                    "Failed to fetch image {source_url} status=404"
                )));
            }
            Ok(Some(format!("https://cdn.test/{destination_name}")))
        }
    }

    struct Harness {
        engine: SyncEngine,
        upstream: Arc<FakeUpstream>,
    }

    impl Harness {
        async fn new(images: Arc<dyn ImageMigrator>) -> Self {
            let db = Arc::new(Database::open_in_memory().await.unwrap());
            let upstream = Arc::new(FakeUpstream::default());
            let engine = SyncEngine::new(db, upstream.clone(), images);
            Self { engine, upstream }
        }

        async fn with_fake_images() -> Self {
            Self::new(Arc::new(FakeMigrator::default())).await
        }

        fn resellers(&self) -> LibSqlResellerRepository<'_> {
            LibSqlResellerRepository::new(self.engine.database().connection())
        }

        fn products(&self) -> LibSqlProductRepository<'_> {
            LibSqlProductRepository::new(self.engine.database().connection())
        }

        async fn profile_of(&self, api_reseller_id: &str) -> ResellerProfile {
            let repo = self.resellers();
            let reseller = repo.find_by_api_id(api_reseller_id).await.unwrap().unwrap();
            repo.find_profile(&reseller.id).await.unwrap().unwrap()
        }

        async fn product(&self, id_produk: &str) -> ProductRecord {
            self.products()
                .find_by_id_produk(id_produk)
                .await
                .unwrap()
                .unwrap()
        }
    }

    fn reseller(id: &str, name: &str, phone: &str, area: &str) -> Value {
        json!({
            "id_reseller": id,
            "nama_reseller": name,
            "nomor_hp": phone,
            "area": area
        })
    }

    fn product(id: &str, name: &str, price: &str) -> Value {
        json!({
            "id_produk": id,
            "nama_produk": name,
            "harga_umum": price,
            "harga_director": "90000",
            "foto_produk": format!("https://img.test/{id}.jpg")
        })
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn end_to_end_single_reseller() {
        let h = Harness::with_fake_images().await;
        h.upstream.set(
            CollectionKind::Resellers,
            vec![reseller("R1", "Toko A", "0811", "Jakarta")],
        );

        let summary = h.engine.run(SyncScope::All).await.unwrap();

        assert_eq!(summary.resellers, 1);
        assert_eq!(summary.products, 0);
        assert_eq!(summary.bundling, 0);
        assert!(summary.report.is_clean());
        assert!(summary.last_sync.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&summary.last_sync).is_ok());

        let record = h.resellers().find_by_api_id("R1").await.unwrap().unwrap();
        assert_eq!(record.nomor_hp.as_deref(), Some("0811"));
        assert_eq!(record.status, "active");

        let profile = h.profile_of("R1").await;
        assert_eq!(profile.nama_reseller.as_deref(), Some("Toko A"));
        assert_eq!(profile.city.as_deref(), Some("Jakarta"));
        assert_eq!(profile.whatsapp_number.as_deref(), Some("0811"));
        assert_eq!(profile.last_user_update, None);
        assert_eq!(h.resellers().counts().await.unwrap().resellers, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn second_identical_run_changes_nothing() {
        let h = Harness::with_fake_images().await;
        h.upstream.set(
            CollectionKind::Resellers,
            vec![
                reseller("R1", "Toko A", "0811", "Jakarta"),
                reseller("R2", "Toko B", "0812", "Bandung"),
            ],
        );
        h.upstream.set(
            CollectionKind::Products,
            vec![product("P1", "Serum", "150000"), product("P2", "Toner", "80000")],
        );
        h.upstream.set(
            CollectionKind::Bundling,
            vec![json!({ "id_bundling": "B1", "nama_bundling": "Paket Glow", "harga_umum": "200000" })],
        );

        h.engine.run(SyncScope::All).await.unwrap();
        let counts = h.resellers().counts().await.unwrap();
        let first_product = h.product("P1").await;
        let first_profile = h.profile_of("R1").await;

        h.engine.run(SyncScope::All).await.unwrap();

        assert_eq!(h.resellers().counts().await.unwrap(), counts);
        assert_eq!(counts.resellers, 2);
        assert_eq!(counts.products, 2);
        assert_eq!(counts.bundles, 1);

        let second_product = h.product("P1").await;
        assert_eq!(
            ProductRecord {
                updated_at: 0,
                ..second_product
            },
            ProductRecord {
                updated_at: 0,
                ..first_product
            }
        );

        let second_profile = h.profile_of("R1").await;
        assert_eq!(
            ResellerProfile {
                updated_at: 0,
                ..second_profile
            },
            ResellerProfile {
                updated_at: 0,
                ..first_profile
            }
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn user_edited_profile_keeps_user_fields() {
        let h = Harness::with_fake_images().await;
        h.upstream.set(
            CollectionKind::Resellers,
            vec![reseller("R1", "Toko A", "0811", "Jakarta")],
        );
        h.engine.run(SyncScope::Resellers).await.unwrap();

        let record = h.resellers().find_by_api_id("R1").await.unwrap().unwrap();
        let edit = ProfileEdit {
            nama_reseller: Some("Alice".to_string()),
            whatsapp_number: Some("0999".to_string()),
            city: Some("Depok".to_string()),
            bio: Some("old".to_string()),
            photo_url: Some("https://me/p.jpg".to_string()),
            ..ProfileEdit::default()
        };
        let edited = h.resellers().apply_user_edit(&record.id, &edit).await.unwrap();

        let updated = json!({
            "id_reseller": "R1",
            "nama_reseller": "Bob",
            "nomor_hp": "0822",
            "area": "Surabaya",
            "bio": "new",
            "foto": "https://x/new.jpg",
            "email": "bob@example.com"
        });
        h.upstream
            .set(CollectionKind::Resellers, vec![updated.clone()]);
        let summary = h.engine.run(SyncScope::Resellers).await.unwrap();
        assert!(summary.report.is_clean());

        let profile = h.profile_of("R1").await;
        assert_eq!(profile.nama_reseller.as_deref(), Some("Alice"));
        assert_eq!(profile.whatsapp_number.as_deref(), Some("0999"));
        assert_eq!(profile.photo_url.as_deref(), Some("https://me/p.jpg"));
        assert_eq!(profile.city.as_deref(), Some("Surabaya"));
        assert_eq!(profile.bio.as_deref(), Some("new"));
        assert_eq!(profile.email_address.as_deref(), Some("bob@example.com"));
        assert_eq!(profile.api_data, Some(updated));
        assert_eq!(profile.last_user_update, edited.last_user_update);

        let record = h.resellers().find_by_api_id("R1").await.unwrap().unwrap();
        assert_eq!(record.nomor_hp.as_deref(), Some("0822"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unedited_profile_follows_upstream() {
        let h = Harness::with_fake_images().await;
        h.upstream.set(
            CollectionKind::Resellers,
            vec![reseller("R1", "Alice", "0811", "Jakarta")],
        );
        h.engine.run(SyncScope::Resellers).await.unwrap();

        h.upstream.set(
            CollectionKind::Resellers,
            vec![reseller("R1", "Bob", "0811", "Jakarta")],
        );
        h.engine.run(SyncScope::Resellers).await.unwrap();

        assert_eq!(h.profile_of("R1").await.nama_reseller.as_deref(), Some("Bob"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn product_and_bundle_with_same_id_do_not_collide() {
        let h = Harness::with_fake_images().await;
        h.upstream
            .set(CollectionKind::Products, vec![product("P1", "Serum", "150000")]);
        h.upstream.set(
            CollectionKind::Bundling,
            vec![json!({
                "id_bundling": "P1",
                "nama_bundling": "Paket Serum",
                "items": [{ "id_produk": "P1", "qty": 2 }]
            })],
        );

        h.engine.run(SyncScope::All).await.unwrap();

        let standalone = h.product("P1").await;
        assert!(!standalone.is_bundling);
        assert_eq!(standalone.category_id, None);

        let bundle = h.product("bundling-P1").await;
        assert!(bundle.is_bundling);
        assert_eq!(bundle.api_bundling_id.as_deref(), Some("P1"));
        assert_eq!(bundle.slug, "paket-serum");
        assert_eq!(bundle.items, Some(json!([{ "id_produk": "P1", "qty": 2 }])));

        let paket = h
            .products()
            .find_category_by_name("Paket")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(bundle.category_id, Some(paket.id));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn slug_is_derived_once() {
        let h = Harness::with_fake_images().await;
        h.upstream.set(
            CollectionKind::Products,
            vec![
                product("P1", "Serum  C+E!!", "150000"),
                json!({ "id_produk": "P2", "nama_produk": "Toner", "slug": "toner-special" }),
            ],
        );
        h.engine.run(SyncScope::Products).await.unwrap();

        assert_eq!(h.product("P1").await.slug, "serum-c-e");
        assert_eq!(h.product("P2").await.slug, "toner-special");

        h.upstream.set(
            CollectionKind::Products,
            vec![product("P1", "Serum Vitamin C", "150000")],
        );
        h.engine.run(SyncScope::Products).await.unwrap();

        let renamed = h.product("P1").await;
        assert_eq!(renamed.nama_produk.as_deref(), Some("Serum Vitamin C"));
        assert_eq!(renamed.slug, "serum-c-e");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_photo_migration_keeps_raw_url() {
        let h = Harness::new(Arc::new(FakeMigrator::failing(&[
            "https://x/y.jpg",
            "https://img.test/P1.jpg",
        ])))
        .await;
        h.upstream.set(
            CollectionKind::Resellers,
            vec![json!({ "id_reseller": "R1", "foto": "https://x/y.jpg", "avatar": "https://x/z.jpg" })],
        );
        h.upstream
            .set(CollectionKind::Products, vec![product("P1", "Serum", "1")]);

        let summary = h.engine.run(SyncScope::All).await.unwrap();

        assert_eq!(h.profile_of("R1").await.photo_url.as_deref(), Some("https://x/y.jpg"));

        let stored = h.product("P1").await;
        assert_eq!(stored.gambar, None);
        assert_eq!(stored.display_image(), Some("https://img.test/P1.jpg"));

        assert!(summary.report.is_clean());
        assert_eq!(summary.report.images.failed, 2);
        assert_eq!(summary.report.images.migrated, 0);
        assert_eq!(summary.report.image_failures[0].source, "https://x/y.jpg");
        assert_eq!(summary.report.image_failures[0].destination, "reseller-R1-photo.jpg");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn migrated_images_are_stored() {
        let h = Harness::with_fake_images().await;
        h.upstream.set(
            CollectionKind::Resellers,
            vec![json!({ "id_reseller": "R1", "image_url": "https://x/r1.jpg" })],
        );
        h.upstream
            .set(CollectionKind::Products, vec![product("P1", "Serum", "1")]);

        let summary = h.engine.run(SyncScope::All).await.unwrap();

        assert_eq!(
            h.profile_of("R1").await.photo_url.as_deref(),
            Some("https://cdn.test/reseller-R1-photo.jpg")
        );
        let stored = h.product("P1").await;
        assert_eq!(stored.gambar.as_deref(), Some("https://cdn.test/product-P1-image.jpg"));
        assert_eq!(stored.foto_produk.as_deref(), Some("https://img.test/P1.jpg"));
        assert_eq!(summary.report.images.attempted, 2);
        assert_eq!(summary.report.images.migrated, 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn disabled_migration_uses_raw_urls() {
        let h = Harness::new(Arc::new(DisabledImageMigrator)).await;
        h.upstream.set(
            CollectionKind::Resellers,
            vec![json!({ "id_reseller": "R1", "foto_profile": "https://x/r1.jpg" })],
        );

        let summary = h.engine.run(SyncScope::Resellers).await.unwrap();

        assert_eq!(h.profile_of("R1").await.photo_url.as_deref(), Some("https://x/r1.jpg"));
        assert_eq!(summary.report.images.skipped, 1);
        assert_eq!(summary.report.images.attempted, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn bad_price_fails_only_that_record() {
        let h = Harness::with_fake_images().await;
        let records = (1..=10)
            .map(|n| {
                let price = if n == 5 { "abc" } else { "150000" };
                product(&format!("P{n}"), &format!("Produk {n}"), price)
            })
            .collect();
        h.upstream.set(CollectionKind::Products, records);

        let summary = h.engine.run(SyncScope::Products).await.unwrap();

        assert_eq!(summary.products, 10);
        assert_eq!(h.resellers().counts().await.unwrap().products, 9);
        assert_eq!(summary.report.record_failures.len(), 1);

        let failure = &summary.report.record_failures[0];
        assert_eq!(failure.kind, CollectionKind::Products);
        assert_eq!(failure.external_id.as_deref(), Some("P5"));
        assert!(failure.reason.contains("harga_umum"));
        assert!(h
            .products()
            .find_by_id_produk("P5")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn reassigned_phone_merges_into_existing_reseller() {
        let h = Harness::with_fake_images().await;
        h.upstream.set(
            CollectionKind::Resellers,
            vec![reseller("R1", "Toko A", "0811", "Jakarta")],
        );
        h.engine.run(SyncScope::Resellers).await.unwrap();
        let original = h.resellers().find_by_api_id("R1").await.unwrap().unwrap();

        h.upstream.set(
            CollectionKind::Resellers,
            vec![reseller("R9", "Toko A Baru", "0811", "Jakarta")],
        );
        let summary = h.engine.run(SyncScope::Resellers).await.unwrap();

        assert!(summary.report.is_clean());
        assert!(h.resellers().find_by_api_id("R1").await.unwrap().is_none());
        let merged = h.resellers().find_by_api_id("R9").await.unwrap().unwrap();
        assert_eq!(merged.id, original.id);
        assert_eq!(h.resellers().counts().await.unwrap().resellers, 1);
        assert_eq!(
            h.profile_of("R9").await.nama_reseller.as_deref(),
            Some("Toko A Baru")
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_phone_merge_skips_only_that_record() {
        let h = Harness::with_fake_images().await;
        h.upstream.set(
            CollectionKind::Resellers,
            vec![
                reseller("R1", "Toko A", "0811", "Jakarta"),
                reseller("R2", "Toko B", "0812", "Bandung"),
            ],
        );
        h.engine.run(SyncScope::Resellers).await.unwrap();

        // R1 takes R2's phone; moving R2 onto id R1 collides with R1 itself.
        h.upstream.set(
            CollectionKind::Resellers,
            vec![
                reseller("R1", "Toko A", "0812", "Jakarta"),
                reseller("R3", "Toko C", "0813", "Medan"),
            ],
        );
        let summary = h.engine.run(SyncScope::Resellers).await.unwrap();

        assert_eq!(summary.resellers, 2);
        assert_eq!(summary.report.record_failures.len(), 1);
        let failure = &summary.report.record_failures[0];
        assert_eq!(failure.kind, CollectionKind::Resellers);
        assert_eq!(failure.external_id.as_deref(), Some("R1"));
        assert!(failure.reason.contains("phone merge failed"));

        let r1 = h.resellers().find_by_api_id("R1").await.unwrap().unwrap();
        let r2 = h.resellers().find_by_api_id("R2").await.unwrap().unwrap();
        assert_eq!(r1.nomor_hp.as_deref(), Some("0811"));
        assert_eq!(r2.nomor_hp.as_deref(), Some("0812"));
        assert!(h.resellers().find_by_api_id("R3").await.unwrap().is_some());
        assert_eq!(h.resellers().counts().await.unwrap().resellers, 3);
    }

    #[test]
    fn kind_failure_takes_kind_from_error() {
        let failure = KindFailure::from(UpstreamError::Malformed {
            kind: CollectionKind::Bundling,
            message: "missing `data` field".to_string(),
        });

        assert_eq!(failure.kind, CollectionKind::Bundling);
        assert_eq!(
            failure.reason,
            "upstream bundling response malformed: missing `data` field"
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_collection_does_not_stop_the_pass() {
        let h = Harness::with_fake_images().await;
        h.upstream.set(
            CollectionKind::Resellers,
            vec![reseller("R1", "Toko A", "0811", "Jakarta")],
        );
        h.upstream.fail(CollectionKind::Products);
        h.upstream.set(
            CollectionKind::Bundling,
            vec![json!({ "id_bundling": "B1", "nama_bundling": "Paket" })],
        );

        let summary = h.engine.run(SyncScope::All).await.unwrap();

        assert_eq!(summary.resellers, 1);
        assert_eq!(summary.products, 0);
        assert_eq!(summary.bundling, 1);
        assert_eq!(summary.report.kind_failures.len(), 1);
        assert_eq!(summary.report.kind_failures[0].kind, CollectionKind::Products);
        assert!(summary.report.kind_failures[0].reason.contains("502"));
        assert_eq!(h.resellers().counts().await.unwrap().bundles, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn counts_are_records_seen() {
        let h = Harness::with_fake_images().await;
        h.upstream.set(
            CollectionKind::Resellers,
            vec![
                reseller("R1", "A", "0811", "Jakarta"),
                json!({ "nama_reseller": "No id" }),
                reseller("R3", "C", "0813", "Medan"),
            ],
        );

        let summary = h.engine.run(SyncScope::Resellers).await.unwrap();

        assert_eq!(summary.resellers, 3);
        assert_eq!(h.resellers().counts().await.unwrap().resellers, 2);
        assert_eq!(summary.report.record_failures.len(), 1);
        assert_eq!(summary.report.record_failures[0].external_id, None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn paket_category_is_created_once() {
        let h = Harness::with_fake_images().await;
        h.upstream.set(
            CollectionKind::Bundling,
            vec![
                json!({ "id_bundling": "B1", "nama_bundling": "Paket A" }),
                json!({ "id_bundling": "B2", "nama_bundling": "Paket B" }),
            ],
        );

        h.engine.run(SyncScope::Bundling).await.unwrap();
        h.engine.run(SyncScope::Bundling).await.unwrap();

        assert_eq!(h.resellers().counts().await.unwrap().categories, 1);
        assert_eq!(h.resellers().counts().await.unwrap().bundles, 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn scope_limits_fetched_collections() {
        let h = Harness::with_fake_images().await;

        h.engine.run(SyncScope::Products).await.unwrap();
        assert_eq!(*h.upstream.fetched.lock().unwrap(), vec![CollectionKind::Products]);

        h.engine.run(SyncScope::All).await.unwrap();
        assert_eq!(
            *h.upstream.fetched.lock().unwrap(),
            vec![
                CollectionKind::Products,
                CollectionKind::Resellers,
                CollectionKind::Products,
                CollectionKind::Bundling
            ]
        );
    }

    #[test]
    fn scope_parsing() {
        assert_eq!("resellers".parse::<SyncScope>().unwrap(), SyncScope::Resellers);
        assert_eq!(" Products ".parse::<SyncScope>().unwrap(), SyncScope::Products);
        assert_eq!("bundling".parse::<SyncScope>().unwrap(), SyncScope::Bundling);
        assert_eq!("".parse::<SyncScope>().unwrap(), SyncScope::All);
        assert!("orders".parse::<SyncScope>().is_err());
    }
}
