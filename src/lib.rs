//! Disk Cache - A persistent file-per-entry key/value cache
//!
//! Stores each value in its own file named by a hash of the normalized key,
//! with expiration driven by file modification time and a prune sweep.

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{Base64JsonCodec, CacheStats, CacheStore, JsonCodec, ValueCodec};
pub use config::Config;
pub use error::{CacheError, Result};
pub use tasks::spawn_prune_task;
