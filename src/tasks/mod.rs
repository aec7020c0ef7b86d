//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside the host application.
//!
//! # Tasks
//! - Prune: Removes expired entry files at configured intervals

mod prune;

pub use prune::spawn_prune_task;
