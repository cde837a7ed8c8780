//! etalase-core - Core library for Etalase
//!
//! This crate contains the models, the libSQL store, the upstream partner
//! client, image migration and the reseller/product sync engine shared by the
//! Etalase API server and CLI.

pub mod db;
pub mod error;
pub mod media;
pub mod models;
pub mod storage;
pub mod sync;
pub mod upstream;
pub mod util;

pub use error::{Error, Result};
pub use models::{
    Category, CategoryId, ProductId, ProductRecord, ProfileId, ResellerId, ResellerProfile,
    ResellerRecord,
};
pub use sync::{SyncEngine, SyncReport, SyncScope, SyncSummary};
