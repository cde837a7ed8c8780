//! Data models for Etalase

mod category;
mod id;
mod product;
mod reseller;

pub use category::{Category, CategorySeed, PAKET_CATEGORY};
pub use id::{CategoryId, ProductId, ProfileId, ResellerId};
pub use product::{PriceTiers, ProductRecord};
pub use reseller::{ProfileEdit, ResellerProfile, ResellerRecord, DEFAULT_STATUS};
