//! Disk Cache Janitor
//!
//! Keeps a cache directory tidy by pruning expired entries on an interval
//! until interrupted.

use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use disk_cache::{spawn_prune_task, CacheStore, Config};

/// Main entry point for the cache janitor.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open the cache directory, creating it if missing
/// 4. Run one prune sweep immediately
/// 5. Start the periodic prune task
/// 6. Stop on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "disk_cache=info,disk_cache_janitor=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting disk cache janitor");

    let config = Config::from_env();
    info!(
        "Configuration loaded: cache_dir={}, expiration={}s, prune_interval={}s",
        config.cache_dir.display(),
        config.expiration_secs,
        config.prune_interval_secs
    );

    let cache = Arc::new(CacheStore::open(&config).context("failed to open cache directory")?);

    let removed = cache.prune().context("initial prune failed")?;
    info!("Initial prune removed {} expired entries", removed);

    let prune_handle = spawn_prune_task(cache.clone(), config.prune_interval_secs);

    shutdown_signal().await;

    prune_handle.abort();
    warn!("Prune task aborted");

    let stats = cache.stats();
    info!(pruned = stats.pruned, "Janitor shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
