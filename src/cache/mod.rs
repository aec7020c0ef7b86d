//! Cache Module
//!
//! Provides file-per-entry disk caching with modification-time expiration.

mod codec;
mod entry;
mod locks;
pub mod name;
mod stats;
mod store;


// Re-export public types
pub use codec::{Base64JsonCodec, JsonCodec, ValueCodec};
pub use entry::{is_expired_at, EntryFile};
pub use stats::CacheStats;
pub use store::CacheStore;

// == Public Constants ==
/// Cache directory used when none is configured
pub const DEFAULT_CACHE_DIR: &str = "cache/";

/// Default entry lifetime in seconds
pub const DEFAULT_EXPIRATION_SECS: u64 = 3600;

/// Lock file taken exclusively while an entry is written
pub const LOCK_FILE_NAME: &str = ".lock";

/// Name prefix of the temp files entries are written to before the rename
pub const TEMP_FILE_PREFIX: &str = ".tmp";
