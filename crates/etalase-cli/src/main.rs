//! Etalase CLI - operator commands for the reseller and catalog store

mod cli;
mod commands;
mod error;

use clap::Parser;

use cli::{Cli, Commands};
use commands::backfill::{run_backfill_profiles, run_backfill_sync_stamps};
use commands::common::resolve_db_path;
use commands::inspect::run_inspect;
use commands::sync::run_sync;
use error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("etalase_cli=info".parse().expect("valid directive"))
                .add_directive("etalase_core=info".parse().expect("valid directive")),
        )
        .init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path)?;

    match cli.command {
        Commands::Sync {
            scope,
            failures_csv,
            json,
        } => run_sync(scope, failures_csv.as_deref(), json, &db_path).await?,
        Commands::BackfillProfiles => run_backfill_profiles(&db_path).await?,
        Commands::BackfillSyncStamps => run_backfill_sync_stamps(&db_path).await?,
        Commands::Inspect { limit } => run_inspect(limit, &db_path).await?,
    }

    Ok(())
}
