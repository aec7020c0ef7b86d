//! Cache Store Module
//!
//! Main cache engine: one file per entry, expiration by modification time.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use crate::cache::entry::{is_expired_at, EntryFile};
use crate::cache::locks::{open_lock_file, KeyLocks, WriteGuard};
use crate::cache::stats::StatsCounters;
use crate::cache::{
    name, Base64JsonCodec, CacheStats, ValueCodec, LOCK_FILE_NAME, TEMP_FILE_PREFIX,
};
use crate::config::Config;
use crate::error::{CacheError, Result};

// == Cache Store ==
/// Disk-backed cache storing each value in its own file.
///
/// The directory and expiration are fixed at construction. The store is not
/// `Clone`; share it behind an `Arc`.
#[derive(Debug)]
pub struct CacheStore<C: ValueCodec = Base64JsonCodec> {
    /// Directory holding the entry files
    cache_dir: PathBuf,
    /// Age at which an entry becomes stale
    expiration: Duration,
    /// Payload encoding
    codec: C,
    /// Activity counters
    stats: StatsCounters,
    /// In-process writer serialization per entry hash
    key_locks: KeyLocks,
}

impl CacheStore<Base64JsonCodec> {
    // == Constructors ==
    /// Opens a cache in `cache_dir` using the default base64 JSON payloads.
    ///
    /// Creates the directory if it does not exist.
    pub fn new(cache_dir: impl Into<PathBuf>, expiration: Duration) -> Result<Self> {
        Self::with_codec(cache_dir, expiration, Base64JsonCodec)
    }

    /// Opens a cache from a validated configuration.
    pub fn open(config: &Config) -> Result<Self> {
        config.validate()?;
        Self::new(config.cache_dir.clone(), config.expiration())
    }
}

impl<C: ValueCodec> CacheStore<C> {
    /// Opens a cache in `cache_dir` with a custom value codec.
    ///
    /// # Errors
    /// `CacheError::Storage` if the directory cannot be created, is not a
    /// directory, or is not writable.
    pub fn with_codec(cache_dir: impl Into<PathBuf>, expiration: Duration, codec: C) -> Result<Self> {
        let cache_dir = cache_dir.into();
        ensure_cache_dir(&cache_dir)?;

        info!(
            cache_dir = %cache_dir.display(),
            expiration_secs = expiration.as_secs(),
            "Disk cache opened"
        );

        Ok(Self {
            cache_dir,
            expiration,
            codec,
            stats: StatsCounters::default(),
            key_locks: KeyLocks::default(),
        })
    }

    // == Store ==
    /// Stores a value under `key`.
    ///
    /// Returns `Ok(false)` without touching the file if a live entry already
    /// occupies the key; delete it first to replace it. A stale file is
    /// removed and overwritten.
    pub fn store<T: Serialize + ?Sized>(&self, key: impl AsRef<str>, value: &T) -> Result<bool> {
        let (hash, path) = self.resolve(key.as_ref())?;
        let key_lock = self.key_locks.handle(&hash);
        let _guard = WriteGuard::acquire(&key_lock, &self.lock_path())?;

        if let Some(entry) = self.stat(&path)? {
            if !entry.is_expired(self.expiration) {
                debug!(hash = %hash, "Store skipped, live entry present");
                return Ok(false);
            }
            self.remove_file(&path)?;
            debug!(hash = %hash, "Removed stale entry before store");
        }

        let payload = self.codec.encode(value).map_err(CacheError::Encode)?;
        self.write_atomic(&path, &payload)?;
        self.stats.record_store();

        debug!(hash = %hash, bytes = payload.len(), "Entry stored");
        Ok(true)
    }

    // == Get ==
    /// Retrieves and decodes the value stored under `key`.
    ///
    /// Missing and expired entries return `Ok(None)`; an expired file is
    /// removed on the way.
    ///
    /// # Errors
    /// - `CacheError::Retrieval` if the file exists but cannot be read or decoded.
    /// - `CacheError::Storage` if an expired file cannot be removed.
    pub fn get<T: DeserializeOwned>(&self, key: impl AsRef<str>) -> Result<Option<T>> {
        let (hash, path) = self.resolve(key.as_ref())?;

        if !self.check_live(&hash, &path)? {
            self.stats.record_miss();
            return Ok(None);
        }

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            // Deleted or pruned between the check and the read
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.stats.record_miss();
                return Ok(None);
            }
            Err(e) => return Err(CacheError::retrieval(&path, e)),
        };

        let value = self
            .codec
            .decode(&bytes)
            .map_err(|reason| CacheError::retrieval(&path, reason))?;

        self.stats.record_hit();
        debug!(hash = %hash, "Cache hit");
        Ok(Some(value))
    }

    // == Exists ==
    /// Reports whether a live entry exists for `key`.
    ///
    /// Removes an expired file as a side effect. Invalid keys and I/O faults
    /// are logged and reported as absent.
    pub fn exists(&self, key: impl AsRef<str>) -> bool {
        let result = self
            .resolve(key.as_ref())
            .and_then(|(hash, path)| self.check_live(&hash, &path));

        match result {
            Ok(live) => live,
            Err(e) => {
                warn!(error = %e, "Existence check failed, reporting absent");
                false
            }
        }
    }

    // == Delete ==
    /// Removes the entry for `key`.
    ///
    /// Returns `Ok(false)` if there was no live entry (a stale file is still
    /// removed), `Ok(true)` if a live entry was deleted.
    pub fn delete(&self, key: impl AsRef<str>) -> Result<bool> {
        let (hash, path) = self.resolve(key.as_ref())?;
        let key_lock = self.key_locks.handle(&hash);
        let _held = key_lock.lock();

        let Some(entry) = self.stat(&path)? else {
            return Ok(false);
        };
        let live = !entry.is_expired(self.expiration);
        let removed = self.remove_file(&path)?;

        debug!(hash = %hash, live, "Entry deleted");
        Ok(live && removed)
    }

    // == Prune ==
    /// Removes every expired entry file in the cache directory.
    ///
    /// Entries whose modification time lies in the future are removed too, as
    /// are temp files abandoned by interrupted writes once they are older than
    /// the expiration. The lock file and other dot-files are left alone.
    /// Returns the number of files deleted. A failure aborts the sweep; files
    /// already removed stay removed.
    pub fn prune(&self) -> Result<usize> {
        let entries =
            fs::read_dir(&self.cache_dir).map_err(|e| CacheError::storage(&self.cache_dir, e))?;
        let now = SystemTime::now();
        let mut removed = 0;

        for entry in entries {
            let entry = entry.map_err(|e| CacheError::storage(&self.cache_dir, e))?;
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            let path = entry.path();

            if file_name.starts_with(TEMP_FILE_PREFIX) {
                // Left behind by a writer that never renamed it into place
                if self.remove_stale_temp(&path, now)? {
                    removed += 1;
                }
                continue;
            }
            if file_name.starts_with('.') {
                continue;
            }

            let Some(file) = self.stat(&path)? else {
                continue;
            };
            if !is_expired_at(file.modified_at, now, self.expiration) {
                continue;
            }

            if self.remove_if_expired(&file_name, &path)? {
                removed += 1;
            }
        }

        self.stats.record_pruned(removed);
        if removed > 0 {
            info!(removed, cache_dir = %self.cache_dir.display(), "Pruned expired entries");
        } else {
            debug!(cache_dir = %self.cache_dir.display(), "Prune found no expired entries");
        }
        Ok(removed)
    }

    // == Accessors ==
    /// Number of successful retrievals so far.
    pub fn hits(&self) -> u64 {
        self.stats.hits()
    }

    /// Snapshot of all activity counters.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    /// Directory holding the entry files.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Age at which entries expire.
    pub fn expiration(&self) -> Duration {
        self.expiration
    }

    /// Path of the file that holds (or would hold) the entry for `key`.
    pub fn entry_path(&self, key: impl AsRef<str>) -> Result<PathBuf> {
        name::derive_path(&self.cache_dir, key.as_ref())
    }

    /// Counts entry files on disk, expired or not.
    pub fn len(&self) -> Result<usize> {
        let entries =
            fs::read_dir(&self.cache_dir).map_err(|e| CacheError::storage(&self.cache_dir, e))?;
        let mut count = 0;
        for entry in entries {
            let entry = entry.map_err(|e| CacheError::storage(&self.cache_dir, e))?;
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Returns true if no entry files are on disk.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    // == Internals ==
    fn resolve(&self, key: &str) -> Result<(String, PathBuf)> {
        let hash = name::hash(&name::normalize(key)?);
        let path = self.cache_dir.join(&hash);
        Ok((hash, path))
    }

    fn lock_path(&self) -> PathBuf {
        self.cache_dir.join(LOCK_FILE_NAME)
    }

    fn stat(&self, path: &Path) -> Result<Option<EntryFile>> {
        EntryFile::stat(path).map_err(|e| CacheError::storage(path, e))
    }

    /// Live check used by reads; lazily removes an expired file.
    ///
    /// A failure to remove the expired file is returned, not swallowed.
    fn check_live(&self, hash: &str, path: &Path) -> Result<bool> {
        match self.stat(path)? {
            None => Ok(false),
            Some(entry) if entry.is_expired(self.expiration) => {
                self.remove_if_expired(hash, path)?;
                debug!(hash = %hash, "Removed expired entry on access");
                Ok(false)
            }
            Some(_) => Ok(true),
        }
    }

    /// Re-checks under the key lock so a concurrent store is never undone.
    fn remove_if_expired(&self, hash: &str, path: &Path) -> Result<bool> {
        let key_lock = self.key_locks.handle(hash);
        let _held = key_lock.lock();

        match self.stat(path)? {
            Some(entry) if entry.is_expired(self.expiration) => self.remove_file(path),
            _ => Ok(false),
        }
    }

    /// Removes an abandoned temp file once it is older than the expiration.
    fn remove_stale_temp(&self, path: &Path, now: SystemTime) -> Result<bool> {
        match self.stat(path)? {
            Some(file) if is_expired_at(file.modified_at, now, self.expiration) => {
                debug!(path = %path.display(), "Removing abandoned temp file");
                self.remove_file(path)
            }
            _ => Ok(false),
        }
    }

    /// Removes a file, treating an already-missing file as not removed.
    fn remove_file(&self, path: &Path) -> Result<bool> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CacheError::storage(path, e)),
        }
    }

    /// Writes to a dot-prefixed temp file and renames it into place.
    fn write_atomic(&self, path: &Path, payload: &[u8]) -> Result<()> {
        let mut tmp = tempfile::Builder::new()
            .prefix(TEMP_FILE_PREFIX)
            .tempfile_in(&self.cache_dir)
            .map_err(|e| CacheError::storage(&self.cache_dir, e))?;

        tmp.write_all(payload)
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| CacheError::storage(tmp.path(), e))?;

        tmp.persist(path)
            .map_err(|e| CacheError::storage(path, e.error))?;
        Ok(())
    }
}

// == Directory Bootstrap ==
/// Creates the cache directory if needed and checks that it is writable.
fn ensure_cache_dir(cache_dir: &Path) -> Result<()> {
    if !cache_dir.exists() {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o755);
        }
        builder
            .create(cache_dir)
            .map_err(|e| CacheError::storage(cache_dir, e))?;
        debug!(cache_dir = %cache_dir.display(), "Created cache directory");
    }

    if !cache_dir.is_dir() {
        return Err(CacheError::storage(
            cache_dir,
            io::Error::new(io::ErrorKind::Other, "cache path is not a directory"),
        ));
    }

    // Creating the lock file proves the directory is writable
    open_lock_file(&cache_dir.join(LOCK_FILE_NAME))?;
    Ok(())
}
