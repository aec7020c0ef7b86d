//! Prune Task
//!
//! Background task that periodically sweeps expired entry files.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::cache::{CacheStore, ValueCodec};

/// Spawns a background task that periodically prunes expired cache entries.
///
/// The task runs in an infinite loop, sleeping for the specified interval
/// between sweeps. Each sweep does blocking filesystem I/O, so it runs on
/// tokio's blocking pool. A failed sweep is logged and retried on the next
/// tick.
///
/// # Arguments
/// * `cache` - Shared reference to the cache store
/// * `prune_interval_secs` - Interval in seconds between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during shutdown.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(CacheStore::new("cache/", Duration::from_secs(3600))?);
/// let prune_handle = spawn_prune_task(cache.clone(), 60);
/// // Later, during shutdown:
/// prune_handle.abort();
/// ```
pub fn spawn_prune_task<C>(cache: Arc<CacheStore<C>>, prune_interval_secs: u64) -> JoinHandle<()>
where
    C: ValueCodec + 'static,
{
    let interval = Duration::from_secs(prune_interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting prune task with interval of {} seconds",
            prune_interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let cache = Arc::clone(&cache);
            match tokio::task::spawn_blocking(move || cache.prune()).await {
                Ok(Ok(removed)) if removed > 0 => {
                    info!("Prune: removed {} expired entries", removed);
                }
                Ok(Ok(_)) => {
                    debug!("Prune: no expired entries found");
                }
                Ok(Err(e)) => {
                    error!(error = %e, "Prune sweep failed");
                }
                Err(e) => {
                    error!(error = %e, "Prune sweep panicked or was cancelled");
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    use filetime::FileTime;

    fn shared_store() -> (tempfile::TempDir, Arc<CacheStore>) {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path().join("cache"), Duration::from_secs(300)).unwrap();
        (dir, Arc::new(store))
    }

    #[tokio::test]
    async fn test_prune_task_removes_expired_entries() {
        let (_dir, cache) = shared_store();

        cache.store("expire_soon", "value").unwrap();
        let path = cache.entry_path("expire_soon").unwrap();
        let past = SystemTime::now() - Duration::from_secs(600);
        filetime::set_file_mtime(&path, FileTime::from_system_time(past)).unwrap();

        // Spawn prune task with 1 second interval
        let handle = spawn_prune_task(cache.clone(), 1);

        // Wait for the sweep to run
        tokio::time::sleep(Duration::from_millis(2500)).await;

        assert!(!path.exists(), "Expired entry should have been pruned");
        assert_eq!(cache.stats().pruned, 1);

        handle.abort();
    }

    #[tokio::test]
    async fn test_prune_task_preserves_valid_entries() {
        let (_dir, cache) = shared_store();

        cache.store("long_lived", "value").unwrap();

        let handle = spawn_prune_task(cache.clone(), 1);
        tokio::time::sleep(Duration::from_millis(1500)).await;

        let value: Option<String> = cache.get("long_lived").unwrap();
        assert_eq!(value.as_deref(), Some("value"), "Valid entry should not be removed");

        handle.abort();
    }

    #[tokio::test]
    async fn test_prune_task_can_be_aborted() {
        let (_dir, cache) = shared_store();

        let handle = spawn_prune_task(cache, 1);

        // Abort immediately
        handle.abort();

        // Wait a bit and verify task is finished
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
