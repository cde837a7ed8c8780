pub mod backfill;
pub mod common;
pub mod inspect;
pub mod sync;
