//! Process-local cache backend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime};

use super::{CacheError, KeyValueCache};
use crate::clock::{Clock, SystemClock};

struct Entry {
    value: Vec<u8>,
    /// `None` when the TTL runs past the representable time range.
    expires_at: Option<SystemTime>,
}

impl Entry {
    fn is_live(&self, now: SystemTime) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// Mutex-guarded map with per-entry expiry.
///
/// Clones share the same entries.
#[derive(Clone)]
pub struct InMemoryCache {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for InMemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryCache")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl InMemoryCache {
    /// Creates an empty cache that reads expiry against `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            clock,
        }
    }

    /// Number of stored entries, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remaining lifetime of `key`, if present and unexpired.
    #[must_use]
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get(key)?;
        match entry.expires_at {
            Some(at) => at.duration_since(self.clock.now()).ok().filter(|d| !d.is_zero()),
            None => Some(Duration::MAX),
        }
    }
}

impl KeyValueCache for InMemoryCache {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn put(&self, key: &str, value: &[u8], ttl_secs: u64) -> Result<(), CacheError> {
        let expires_at = self.clock.now().checked_add(Duration::from_secs(ttl_secs));
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                key.to_string(),
                Entry {
                    value: value.to_vec(),
                    expires_at,
                },
            );
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}
