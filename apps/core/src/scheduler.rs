use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::catalog_sync::CatalogSyncService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Fresh,
    Synced,
    Failed,
}

/// One best-effort staleness check. Failures are logged and reported as
/// `Failed`; they are never retried before the next tick.
pub async fn run_sync_tick(service: &CatalogSyncService) -> TickOutcome {
    match service.is_stale() {
        Ok(false) => return TickOutcome::Fresh,
        Ok(true) => log::info!("catalog is stale; starting background sync"),
        Err(error) => {
            log::error!("background staleness check failed: {error}");
            return TickOutcome::Failed;
        }
    }

    let report = |current: usize, total: usize| {
        log::debug!("sync progress: {current}/{total} problems");
    };
    match service.sync(Some(&report)).await {
        Ok(true) => TickOutcome::Synced,
        Ok(false) => TickOutcome::Fresh,
        Err(error) => {
            log::error!("background sync failed: {error}");
            TickOutcome::Failed
        }
    }
}

/// Runs `run_sync_tick` immediately and then once per `interval` until the
/// returned task is aborted.
pub fn spawn_periodic_sync(service: Arc<CatalogSyncService>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let outcome = run_sync_tick(&service).await;
            log::debug!("periodic sync tick finished: {outcome:?}");
        }
    })
}
