//! Background Tasks Module
//!
//! Contains tasks that run alongside a shared cache.
//!
//! # Tasks
//! - Cache Sync: flushes the cache on host backgrounding and at a configured interval

mod sync;

pub use sync::spawn_sync_task;
