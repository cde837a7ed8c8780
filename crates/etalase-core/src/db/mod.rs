//! Database layer for Etalase

mod connection;
mod migrations;
mod product_repository;
mod reseller_repository;
mod values;

pub use connection::{Database, ReplicaConfig};
pub use product_repository::{LibSqlProductRepository, ProductWrite};
pub use reseller_repository::{
    LibSqlResellerRepository, ProfileFields, ProfileWrite, ResellerWrite, StoreCounts,
};
