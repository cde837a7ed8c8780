//! In-process interval trigger for the scheduled sync sequence.

use std::time::Duration;

use etalase_core::SyncEngine;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::routes::run_scheduled;

/// Run the scheduled sequence every `period`, starting one period from now.
///
/// Passes never overlap within this task: a slow pass delays the next tick
/// instead of stacking.
pub fn spawn(engine: SyncEngine, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            tracing::info!("Scheduled sync starting");
            match run_scheduled(&engine).await {
                Ok((resellers, products)) => tracing::info!(
                    resellers = resellers.resellers,
                    products = products.products,
                    "Scheduled sync finished"
                ),
                Err(error) => tracing::error!("Scheduled sync failed: {error}"),
            }
        }
    })
}
