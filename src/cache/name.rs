//! Key normalization and hashing.
//!
//! Maps a caller key to the file name that holds its entry.

use std::path::{Path, PathBuf};

use crate::error::{CacheError, Result};

/// Trims surrounding whitespace and lower-cases the key.
///
/// Applying it twice yields the same string.
pub fn normalize(key: &str) -> Result<String> {
    let normalized = key.trim().to_lowercase();
    if normalized.is_empty() {
        return Err(CacheError::InvalidKey(
            "key must not be empty or whitespace".to_string(),
        ));
    }
    Ok(normalized)
}

/// CRC32 of the normalized key as 8 lowercase hex digits.
///
/// Not a security control; distinct keys may collide.
pub fn hash(normalized: &str) -> String {
    format!("{:08x}", crc32fast::hash(normalized.as_bytes()))
}

/// Path of the entry file for `key` under `cache_dir`.
pub fn derive_path(cache_dir: &Path, key: &str) -> Result<PathBuf> {
    Ok(cache_dir.join(hash(&normalize(key)?)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_trims_and_lowercases() {
        assert_eq!(normalize("  Foo Bar\t").unwrap(), "foo bar");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize(" MiXeD ").unwrap();
        assert_eq!(normalize(&once).unwrap(), once);
    }

    #[test]
    fn test_normalize_rejects_empty() {
        assert!(matches!(normalize(""), Err(CacheError::InvalidKey(_))));
        assert!(matches!(normalize("   \n"), Err(CacheError::InvalidKey(_))));
    }

    #[test]
    fn test_hash_known_value() {
        // CRC32 (IEEE) check value
        assert_eq!(hash("123456789"), "cbf43926");
    }

    #[test]
    fn test_hash_is_fixed_width() {
        for key in ["a", "foo", "a much longer cache key with spaces"] {
            let digest = hash(key);
            assert_eq!(digest.len(), 8);
            assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        }
    }

    #[test]
    fn test_derive_path_ignores_case_and_padding() {
        let dir = Path::new("cache");
        assert_eq!(
            derive_path(dir, "  Foo ").unwrap(),
            derive_path(dir, "foo").unwrap()
        );
        assert_ne!(
            derive_path(dir, "foo").unwrap(),
            derive_path(dir, "bar").unwrap()
        );
    }
}
