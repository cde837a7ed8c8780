mod auth;
mod config;
mod error;
mod routes;
mod scheduler;

use std::sync::Arc;

use config::AppConfig;
use etalase_core::db::Database;
use etalase_core::media::image_migrator_for;
use etalase_core::upstream::HttpUpstreamClient;
use etalase_core::SyncEngine;
use routes::{app_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Only load .env in development; production uses platform-native env injection.
    #[cfg(debug_assertions)]
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("etalase_api=info".parse().expect("valid directive"))
                .add_directive("etalase_core=info".parse().expect("valid directive")),
        )
        .init();

    let config = Arc::new(AppConfig::from_env()?);
    tracing::info!("Starting etalase-api with config: {:?}", config);

    let db = Arc::new(Database::open_auto(&config.db_path, config.replica.clone()).await?);
    let upstream = Arc::new(HttpUpstreamClient::new(config.upstream.clone())?);
    let images = image_migrator_for(config.r2.clone(), config.upstream.timeout)?;
    let engine = SyncEngine::new(db, upstream, images);

    if let Some(period) = config.sync_interval {
        tracing::info!("Scheduled sync every {:?}", period);
        scheduler::spawn(engine.clone(), period);
    }

    let state = AppState::new(config.clone(), engine);
    let router = app_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("etalase-api listening on {}", config.bind_addr);
    axum::serve(listener, router).await?;
    Ok(())
}
