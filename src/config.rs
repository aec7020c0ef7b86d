//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::{DEFAULT_CACHE_DIR, DEFAULT_EXPIRATION_SECS};
use crate::error::{CacheError, Result};

/// Default interval between background prune sweeps, in seconds
pub const DEFAULT_PRUNE_INTERVAL_SECS: u64 = 60;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
/// They are read once when the store is opened; the store never re-reads them.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding one file per cached entry
    pub cache_dir: PathBuf,
    /// Age in seconds after which an entry is expired
    pub expiration_secs: u64,
    /// Background prune task interval in seconds
    pub prune_interval_secs: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_DIR` - Cache directory (default: `cache/`)
    /// - `CACHE_EXPIRATION` - Expiration in seconds (default: 3600)
    /// - `PRUNE_INTERVAL` - Prune frequency in seconds (default: 60)
    pub fn from_env() -> Self {
        Self {
            cache_dir: env::var("CACHE_DIR")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR)),
            expiration_secs: env::var("CACHE_EXPIRATION")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_EXPIRATION_SECS),
            prune_interval_secs: env::var("PRUNE_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_PRUNE_INTERVAL_SECS),
        }
    }

    /// Rejects values the store cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.cache_dir.as_os_str().is_empty() {
            return Err(CacheError::Config("cache_dir must not be empty".to_string()));
        }
        if self.expiration_secs == 0 {
            return Err(CacheError::Config(
                "expiration_secs must be greater than zero".to_string(),
            ));
        }
        if self.prune_interval_secs == 0 {
            return Err(CacheError::Config(
                "prune_interval_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Expiration as a `Duration`.
    pub fn expiration(&self) -> Duration {
        Duration::from_secs(self.expiration_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            expiration_secs: DEFAULT_EXPIRATION_SECS,
            prune_interval_secs: DEFAULT_PRUNE_INTERVAL_SECS,
        }
    }
}
