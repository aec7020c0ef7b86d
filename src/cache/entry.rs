//! Cache Entry Module
//!
//! An entry is a file in the cache directory; its modification time is the
//! only expiration signal.

use std::fs;
use std::io;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

// == Entry File ==
/// Metadata of one entry file on disk.
#[derive(Debug, Clone)]
pub struct EntryFile {
    /// Last modification time reported by the filesystem
    pub modified_at: SystemTime,
}

impl EntryFile {
    // == Stat ==
    /// Reads the entry metadata, returning `None` if no regular file is there.
    pub fn stat(path: &Path) -> io::Result<Option<Self>> {
        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        if !metadata.is_file() {
            return Ok(None);
        }

        Ok(Some(Self {
            modified_at: metadata.modified()?,
        }))
    }

    // == Is Expired ==
    /// Checks the entry against `expiration` using the current clock.
    pub fn is_expired(&self, expiration: Duration) -> bool {
        is_expired_at(self.modified_at, SystemTime::now(), expiration)
    }
}

// == Expiration Check ==
/// Decides whether a file modified at `modified_at` is stale at `now`.
///
/// Boundary condition: an entry whose age equals `expiration` is expired.
/// An mtime in a later second than `now` (clock skew) also counts as expired;
/// sub-second differences are ignored so a just-written file stays fresh.
pub fn is_expired_at(modified_at: SystemTime, now: SystemTime, expiration: Duration) -> bool {
    if unix_secs(modified_at) > unix_secs(now) {
        return true;
    }
    let age = now.duration_since(modified_at).unwrap_or(Duration::ZERO);
    age >= expiration
}

fn unix_secs(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    #[test]
    fn test_fresh_entry_not_expired() {
        let now = SystemTime::now();
        let modified = now - Duration::from_secs(10);
        assert!(!is_expired_at(modified, now, HOUR));
    }

    #[test]
    fn test_old_entry_expired() {
        let now = SystemTime::now();
        let modified = now - Duration::from_secs(3601);
        assert!(is_expired_at(modified, now, HOUR));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let now = SystemTime::now();
        let modified = now - HOUR;
        assert!(is_expired_at(modified, now, HOUR), "Entry should be expired at boundary");
    }

    #[test]
    fn test_future_mtime_is_expired() {
        let now = SystemTime::now();
        let modified = now + Duration::from_secs(120);
        assert!(is_expired_at(modified, now, HOUR));
    }

    #[test]
    fn test_same_second_is_fresh() {
        let now = UNIX_EPOCH + Duration::from_millis(1_700_000_000_100);
        let modified = UNIX_EPOCH + Duration::from_millis(1_700_000_000_900);
        assert!(!is_expired_at(modified, now, HOUR));
    }

    #[test]
    fn test_stat_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let entry = EntryFile::stat(&dir.path().join("missing")).unwrap();
        assert!(entry.is_none());
    }

    #[test]
    fn test_stat_directory_is_not_an_entry() {
        let dir = tempfile::tempdir().unwrap();
        assert!(EntryFile::stat(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_stat_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("0000abcd");
        fs::write(&path, b"payload").unwrap();

        let entry = EntryFile::stat(&path).unwrap().unwrap();
        assert!(!entry.is_expired(HOUR));
        assert!(entry.modified_at <= SystemTime::now() + Duration::from_secs(1));
    }
}
