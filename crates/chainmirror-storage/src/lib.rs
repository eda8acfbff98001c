//! chainmirror-storage — durable tiers for the mirror's cache.
//!
//! Backends:
//! - memory — re-exported [`MemoryBackend`] (dev/testing, no persistence)
//! - [`sqlite`] — single-file persistence via `sqlx` (feature `sqlite`)

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use chainmirror_core::cache::MemoryBackend;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
