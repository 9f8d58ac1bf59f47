//! In-process cron: runs the full sync job on a fixed interval.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::info;

use crate::sync::SyncService;

/// Spawns a task running [`SyncService::run_all`] every `interval_secs`.
///
/// Deployments with an external scheduler hitting `/sports-sync/cron` leave
/// this disabled.
pub fn spawn_sync_task(sync: SyncService, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs);

    tokio::spawn(async move {
        info!("Starting sync task with interval of {} seconds", interval_secs);

        loop {
            tokio::time::sleep(interval).await;

            let report = sync.run_all().await;
            info!(
                updated = report.sync.updated,
                errors = report.sync.errors,
                cleaned = report.cache_entries,
                notified = report.notifications_sent,
                "Scheduled sync finished"
            );
        }
    })
}
