//! TTL Cleanup Task
//!
//! Background task that periodically sweeps expired entries from every
//! cache namespace.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::ResponseCache;

/// Spawns a background task that periodically removes expired cache entries.
///
/// The task runs in an infinite loop, sleeping for the specified interval
/// between sweeps. Reads already ignore expired rows, so the sweep only
/// bounds the table size.
///
/// # Arguments
/// * `caches` - The namespaces to sweep
/// * `cleanup_interval_secs` - Interval in seconds between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
pub fn spawn_cleanup_task(caches: Vec<ResponseCache>, cleanup_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting TTL cleanup task with interval of {} seconds",
            cleanup_interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            for cache in &caches {
                let removed = cache.sweep();
                if removed > 0 {
                    info!(
                        "TTL cleanup: removed {} expired entries from {}",
                        removed,
                        cache.namespace()
                    );
                } else {
                    debug!("TTL cleanup: no expired entries in {}", cache.namespace());
                }
            }
        }
    })
}
