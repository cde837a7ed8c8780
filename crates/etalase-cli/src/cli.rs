use std::path::PathBuf;

use clap::{Parser, Subcommand};
use etalase_core::SyncScope;

#[derive(Parser)]
#[command(name = "etalase")]
#[command(about = "Operate the Etalase reseller and catalog store")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Pull resellers, products and bundles from upstream
    Sync {
        /// Collection to sync: all, resellers, products or bundling
        #[arg(long = "type", value_name = "TYPE", default_value = "all", value_parser = parse_scope)]
        scope: SyncScope,
        /// Write image upload failures to a CSV file
        #[arg(long, value_name = "PATH")]
        failures_csv: Option<PathBuf>,
        /// Output the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Fill unedited profiles from their stored upstream payload
    BackfillProfiles,
    /// Stamp `last_api_sync_at` on resellers that never had one
    BackfillSyncStamps,
    /// Show row counts and sample rows
    Inspect {
        /// Number of sample rows to show
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },
}

pub fn parse_scope(value: &str) -> Result<SyncScope, String> {
    value.parse::<SyncScope>().map_err(|error| error.to_string())
}
