//! Typed views over raw upstream records.
//!
//! Upstream sends ids and numbers as strings or numbers interchangeably and
//! uses empty strings for missing values; every text field here is decoded
//! leniently so that `""`, `"  "` and `null` all become `None`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::models::{PriceTiers, DEFAULT_STATUS};
use crate::{Error, Result};

/// Decode one raw record into a typed view.
pub fn decode<T: DeserializeOwned>(raw: &Value) -> Result<T> {
    T::deserialize(raw).map_err(|error| Error::InvalidRecord(error.to_string()))
}

fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let text = match value {
        Some(Value::String(text)) => text,
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        _ => return Ok(None),
    };
    Ok(crate::util::normalize_text_option(Some(text)))
}

fn required(value: Option<&String>, field: &str) -> Result<String> {
    value
        .cloned()
        .ok_or_else(|| Error::InvalidRecord(format!("missing {field}")))
}

/// Reseller as sent by `/apis/reseller/get`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UpstreamReseller {
    #[serde(deserialize_with = "lenient_text")]
    pub id_reseller: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub nama_reseller: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub nomor_hp: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub status: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub area: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub facebook: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub instagram: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub alamat: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub provinsi: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub kabupaten: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub kecamatan: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub bank: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub rekening: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub bio: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub keterangan: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub email: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub level: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub foto_reseller: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub foto: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub photo: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub image: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub image_url: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub avatar: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub foto_profile: Option<String>,
}

impl UpstreamReseller {
    /// External id; a record without one cannot be reconciled.
    pub fn external_id(&self) -> Result<String> {
        required(self.id_reseller.as_ref(), "id_reseller")
    }

    #[must_use]
    pub fn status_or_default(&self) -> &str {
        self.status.as_deref().unwrap_or(DEFAULT_STATUS)
    }

    /// Bio text, falling back to the older `keterangan` field.
    #[must_use]
    pub fn bio_text(&self) -> Option<&str> {
        self.bio.as_deref().or(self.keterangan.as_deref())
    }

    /// First non-empty photo URL among [`PHOTO_CANDIDATES`].
    #[must_use]
    pub fn photo_source(&self) -> Option<&str> {
        PHOTO_CANDIDATES
            .iter()
            .find_map(|(_, accessor)| accessor(self))
    }
}

/// Reads one photo field of a reseller.
pub type PhotoAccessor = for<'a> fn(&'a UpstreamReseller) -> Option<&'a str>;

macro_rules! photo_candidates {
    ($($field:ident),+ $(,)?) => {
        /// Reseller photo fields in priority order.
        pub const PHOTO_CANDIDATES: &[(&str, PhotoAccessor)] = &[$(
            (stringify!($field), {
                fn $field(reseller: &UpstreamReseller) -> Option<&str> {
                    reseller.$field.as_deref()
                }
                $field
            }),
        )+];
    };
}

photo_candidates!(foto_reseller, foto, photo, image, image_url, avatar, foto_profile);

/// Price tier fields shared by products and bundles, kept raw until parsed.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawPrices {
    pub harga_umum: Option<Value>,
    pub harga_consultant: Option<Value>,
    pub harga_supervisor: Option<Value>,
    pub harga_manager: Option<Value>,
    pub harga_director: Option<Value>,
}

impl RawPrices {
    /// Parse every tier. Any unparseable tier fails the whole record.
    pub fn parse(&self) -> Result<PriceTiers> {
        Ok(PriceTiers {
            umum: parse_price("harga_umum", self.harga_umum.as_ref())?,
            consultant: parse_price("harga_consultant", self.harga_consultant.as_ref())?,
            supervisor: parse_price("harga_supervisor", self.harga_supervisor.as_ref())?,
            manager: parse_price("harga_manager", self.harga_manager.as_ref())?,
            director: parse_price("harga_director", self.harga_director.as_ref())?,
        })
    }
}

/// Parse one upstream price.
///
/// Absent, `null` and blank strings are `None`. Numeric strings (trimmed) and
/// JSON numbers are accepted. Anything else, including non-finite values, is
/// an [`Error::InvalidRecord`].
pub fn parse_price(field: &str, raw: Option<&Value>) -> Result<Option<f64>> {
    let invalid = |shown: &dyn std::fmt::Display| {
        Error::InvalidRecord(format!("{field} is not a valid price: {shown}"))
    };

    let parsed = match raw {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(number)) => number.as_f64().ok_or_else(|| invalid(number))?,
        Some(Value::String(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            text.parse::<f64>().map_err(|_| invalid(&text))?
        }
        Some(other) => return Err(invalid(other)),
    };

    if parsed.is_finite() {
        Ok(Some(parsed))
    } else {
        Err(invalid(&parsed))
    }
}

/// Product as sent by `/apis/product/get`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct UpstreamProduct {
    #[serde(deserialize_with = "lenient_text")]
    pub id_produk: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub nama_produk: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub bpom: Option<String>,
    #[serde(flatten)]
    pub prices: RawPrices,
    #[serde(deserialize_with = "lenient_text")]
    pub foto_produk: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub deskripsi: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub slug: Option<String>,
}

impl UpstreamProduct {
    pub fn external_id(&self) -> Result<String> {
        required(self.id_produk.as_ref(), "id_produk")
    }
}

/// Bundle as sent by `/apis/bundling/get`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct UpstreamBundle {
    #[serde(deserialize_with = "lenient_text")]
    pub id_bundling: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub nama_bundling: Option<String>,
    #[serde(flatten)]
    pub prices: RawPrices,
    #[serde(deserialize_with = "lenient_text")]
    pub foto_bundling: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub deskripsi: Option<String>,
    pub items: Option<Value>,
}

impl UpstreamBundle {
    pub fn external_id(&self) -> Result<String> {
        required(self.id_bundling.as_ref(), "id_bundling")
    }

    /// Synthetic `id_produk` for the bundle's catalog row.
    #[must_use]
    pub fn product_id(id_bundling: &str) -> String {
        format!("bundling-{id_bundling}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn reseller_text_fields_are_lenient() {
        let reseller: UpstreamReseller = decode(&json!({
            "id_reseller": 42,
            "nama_reseller": "  Ani  ",
            "nomor_hp": "",
            "area": null,
            "bank": { "nested": true },
            "unknown_field": "ignored"
        }))
        .unwrap();

        assert_eq!(reseller.external_id().unwrap(), "42");
        assert_eq!(reseller.nama_reseller.as_deref(), Some("Ani"));
        assert_eq!(reseller.nomor_hp, None);
        assert_eq!(reseller.area, None);
        assert_eq!(reseller.bank, None);
        assert_eq!(reseller.status_or_default(), "active");
    }

    #[test]
    fn reseller_without_id_is_invalid() {
        let reseller: UpstreamReseller = decode(&json!({ "nama_reseller": "Ani" })).unwrap();
        assert!(matches!(
            reseller.external_id(),
            Err(Error::InvalidRecord(message)) if message.contains("id_reseller")
        ));
    }

    #[test]
    fn non_object_record_is_invalid() {
        let err = decode::<UpstreamProduct>(&json!("P1")).unwrap_err();
        assert!(matches!(err, Error::InvalidRecord(_)));
    }

    #[test]
    fn photo_source_follows_candidate_order() {
        let reseller: UpstreamReseller = decode(&json!({
            "id_reseller": "R1",
            "foto_reseller": " ",
            "photo": "https://img/photo.jpg",
            "avatar": "https://img/avatar.jpg"
        }))
        .unwrap();
        assert_eq!(reseller.photo_source(), Some("https://img/photo.jpg"));

        let names: Vec<&str> = PHOTO_CANDIDATES.iter().map(|(name, _)| *name).collect();
        assert_eq!(
            names,
            ["foto_reseller", "foto", "photo", "image", "image_url", "avatar", "foto_profile"]
        );
    }

    #[test]
    fn photo_source_absent() {
        let reseller: UpstreamReseller = decode(&json!({ "id_reseller": "R1" })).unwrap();
        assert_eq!(reseller.photo_source(), None);
    }

    #[test]
    fn bio_falls_back_to_keterangan() {
        let reseller: UpstreamReseller =
            decode(&json!({ "id_reseller": "R1", "keterangan": "Halo" })).unwrap();
        assert_eq!(reseller.bio_text(), Some("Halo"));
    }

    #[test]
    fn price_parsing() {
        assert_eq!(parse_price("p", None).unwrap(), None);
        assert_eq!(parse_price("p", Some(&json!(null))).unwrap(), None);
        assert_eq!(parse_price("p", Some(&json!("  "))).unwrap(), None);
        assert_eq!(parse_price("p", Some(&json!(" 150000 "))).unwrap(), Some(150_000.0));
        assert_eq!(parse_price("p", Some(&json!("12.5"))).unwrap(), Some(12.5));
        assert_eq!(parse_price("p", Some(&json!(99))).unwrap(), Some(99.0));
    }

    #[test]
    fn price_parsing_rejects_garbage() {
        for raw in [json!("abc"), json!("12abc"), json!("NaN"), json!("inf"), json!([1])] {
            let err = parse_price("harga_umum", Some(&raw)).unwrap_err();
            assert!(err.to_string().contains("harga_umum"), "{raw}");
        }
    }

    #[test]
    fn product_prices_flatten() {
        let product: UpstreamProduct = decode(&json!({
            "id_produk": "P1",
            "nama_produk": "Serum",
            "harga_umum": "150000",
            "harga_director": 90000,
            "harga_manager": ""
        }))
        .unwrap();

        let prices = product.prices.parse().unwrap();
        assert_eq!(prices.umum, Some(150_000.0));
        assert_eq!(prices.director, Some(90_000.0));
        assert_eq!(prices.manager, None);
        assert_eq!(prices.consultant, None);
    }

    #[test]
    fn bundle_keeps_items() {
        let bundle: UpstreamBundle = decode(&json!({
            "id_bundling": 7,
            "nama_bundling": "Paket Glow",
            "items": [{ "id_produk": "P1" }]
        }))
        .unwrap();

        assert_eq!(bundle.external_id().unwrap(), "7");
        assert_eq!(UpstreamBundle::product_id("7"), "bundling-7");
        assert_eq!(bundle.items, Some(json!([{ "id_produk": "P1" }])));
    }
}
