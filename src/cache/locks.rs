//! Write locking for entry files.
//!
//! A per-hash mutex serializes writers inside the process; an exclusive
//! `fs2` lock on the directory lock file serializes them across processes.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fs2::FileExt;
use parking_lot::{Mutex, MutexGuard};

use crate::error::{CacheError, Result};

/// Process-local mutexes keyed by entry hash.
#[derive(Debug, Default)]
pub(crate) struct KeyLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyLocks {
    /// Returns the mutex guarding `hash`, creating it on first use.
    pub fn handle(&self, hash: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock();
        // Drop mutexes nobody else holds so the map stays bounded.
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks
            .entry(hash.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// Holds both the in-process key lock and the directory file lock.
pub(crate) struct WriteGuard<'a> {
    _key: MutexGuard<'a, ()>,
    file: File,
}

impl<'a> WriteGuard<'a> {
    /// Blocks until exclusive write access is granted.
    pub fn acquire(key_lock: &'a Mutex<()>, lock_path: &Path) -> Result<Self> {
        let key = key_lock.lock();
        let file = open_lock_file(lock_path)?;
        FileExt::lock_exclusive(&file)
            .map_err(|e| CacheError::storage(lock_path, e))?;
        Ok(Self { _key: key, file })
    }
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// Opens (creating if needed) the lock file.
pub(crate) fn open_lock_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(path)
        .map_err(|e| CacheError::storage(PathBuf::from(path), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_hash_shares_mutex() {
        let locks = KeyLocks::default();
        let a = locks.handle("0000abcd");
        let b = locks.handle("0000abcd");
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_distinct_hashes_do_not_share() {
        let locks = KeyLocks::default();
        let a = locks.handle("0000abcd");
        let b = locks.handle("ffff0000");
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_unused_mutexes_are_dropped() {
        let locks = KeyLocks::default();
        drop(locks.handle("0000abcd"));
        let _held = locks.handle("ffff0000");
        assert_eq!(locks.locks.lock().len(), 1);
    }

    #[test]
    fn test_write_guard_creates_lock_file() {
        let dir = tempfile::tempdir().unwrap();
        let lock_path = dir.path().join(".lock");
        let key_lock = Mutex::new(());

        {
            let _guard = WriteGuard::acquire(&key_lock, &lock_path).unwrap();
            assert!(key_lock.try_lock().is_none());
        }

        assert!(lock_path.exists());
        assert!(key_lock.try_lock().is_some());
    }
}
