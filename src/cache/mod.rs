//! Key-value persistence for session state.
//!
//! The session client stores its serialized cookie jar through the
//! [`KeyValueCache`] capability. Two backends are provided:
//! - [`InMemoryCache`] for tests and single-process use
//! - [`FileCache`] for state that survives process restarts
//!
//! Entries carry a TTL; expired entries read as absent.

mod file;
mod memory;

pub use file::{FileCache, default_cache_dir};
pub use memory::InMemoryCache;

/// Errors from cache backends.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// No suitable user config directory is available.
    #[error("unable to determine config directory (set XDG_CONFIG_HOME or HOME)")]
    ConfigDirUnavailable,
    /// Filesystem I/O failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// A stored entry is malformed.
    #[error("cache entry for '{key}' is invalid")]
    InvalidPayload {
        /// Key of the malformed entry.
        key: String,
    },
}

/// Durable key-value store with per-entry expiry.
///
/// Writes are last-writer-wins; no locking spans a read-modify-write cycle.
pub trait KeyValueCache: Send + Sync {
    /// Returns the value stored under `key`, or `None` if absent or expired.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Stores `value` under `key` for `ttl_secs` seconds.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when the backend cannot be written.
    fn put(&self, key: &str, value: &[u8], ttl_secs: u64) -> Result<(), CacheError>;

    /// Removes `key`; removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), CacheError>;
}
