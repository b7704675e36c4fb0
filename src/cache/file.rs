//! On-disk cache backend.
//!
//! Each entry lives in its own file under the cache directory (default
//! `~/.config/session-client/cache` or `$XDG_CONFIG_HOME/session-client/cache`).
//! File names are the SHA-256 hex digest of the key. Layout:
//!
//! ```text
//! "SKV1" | expiry (i64 big-endian unix seconds) | value bytes
//! ```

use std::env;
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use super::{CacheError, KeyValueCache};
use crate::clock::{Clock, SystemClock, unix_seconds};

const APP_DIR_NAME: &str = "session-client";
const CACHE_DIR_NAME: &str = "cache";
const MAGIC: &[u8; 4] = b"SKV1";
const HEADER_LEN: usize = MAGIC.len() + 8;

/// Cache storing one file per key.
#[derive(Clone)]
pub struct FileCache {
    dir: PathBuf,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for FileCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileCache")
            .field("dir", &self.dir)
            .finish_non_exhaustive()
    }
}

impl FileCache {
    /// Creates a cache rooted at `dir`; the directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_clock(dir, Arc::new(SystemClock))
    }

    /// Creates a cache rooted at `dir` that reads expiry against `clock`.
    #[must_use]
    pub fn with_clock(dir: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            dir: dir.into(),
            clock,
        }
    }

    /// Creates a cache in the default per-user directory.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConfigDirUnavailable`] if no usable config dir is found.
    pub fn in_default_dir() -> Result<Self, CacheError> {
        Ok(Self::new(default_cache_dir()?))
    }

    /// Returns the cache directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{:x}", Sha256::digest(key.as_bytes())))
    }
}

impl KeyValueCache for FileCache {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let path = self.entry_path(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let Some((expires_at, value)) = decode_entry(&bytes) else {
            warn!(path = %path.display(), "ignoring malformed cache entry");
            return Ok(None);
        };

        if expires_at <= unix_seconds(self.clock.now()) {
            debug!(path = %path.display(), "cache entry expired");
            return Ok(None);
        }
        Ok(Some(value.to_vec()))
    }

    fn put(&self, key: &str, value: &[u8], ttl_secs: u64) -> Result<(), CacheError> {
        let ttl = i64::try_from(ttl_secs).unwrap_or(i64::MAX);
        let expires_at = unix_seconds(self.clock.now()).saturating_add(ttl);
        let mut payload = Vec::with_capacity(HEADER_LEN + value.len());
        payload.extend_from_slice(MAGIC);
        payload.extend_from_slice(&expires_at.to_be_bytes());
        payload.extend_from_slice(value);

        fs::create_dir_all(&self.dir)?;
        let path = self.entry_path(key);
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, &payload)?;
        set_owner_only_permissions(&tmp)?;
        fs::rename(&tmp, &path)?;
        debug!(path = %path.display(), ttl_secs, "cache entry written");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        match fs::remove_file(self.entry_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn decode_entry(bytes: &[u8]) -> Option<(i64, &[u8])> {
    if bytes.len() < HEADER_LEN || &bytes[..MAGIC.len()] != MAGIC {
        return None;
    }
    let expiry: [u8; 8] = bytes[MAGIC.len()..HEADER_LEN].try_into().ok()?;
    Some((i64::from_be_bytes(expiry), &bytes[HEADER_LEN..]))
}

#[cfg(unix)]
fn set_owner_only_permissions(path: &Path) -> Result<(), CacheError> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_owner_only_permissions(_path: &Path) -> Result<(), CacheError> {
    Ok(())
}

/// Returns the default cache directory.
///
/// # Errors
///
/// Returns [`CacheError::ConfigDirUnavailable`] if neither `XDG_CONFIG_HOME`,
/// `HOME` nor `APPDATA` is set.
pub fn default_cache_dir() -> Result<PathBuf, CacheError> {
    resolve_config_dir(
        sanitize_env_path(env::var_os("XDG_CONFIG_HOME")),
        sanitize_env_path(env::var_os("HOME")),
        sanitize_env_path(env::var_os("APPDATA")),
    )
    .map(|dir| dir.join(CACHE_DIR_NAME))
}

fn sanitize_env_path(value: Option<OsString>) -> Option<PathBuf> {
    let value = value?;
    if value.to_string_lossy().trim().is_empty() {
        return None;
    }

    Some(PathBuf::from(value))
}

fn resolve_config_dir(
    xdg_config_home: Option<PathBuf>,
    home: Option<PathBuf>,
    app_data: Option<PathBuf>,
) -> Result<PathBuf, CacheError> {
    if let Some(xdg) = xdg_config_home {
        return Ok(xdg.join(APP_DIR_NAME));
    }
    if let Some(home) = home {
        return Ok(home.join(".config").join(APP_DIR_NAME));
    }
    if let Some(app_data) = app_data {
        return Ok(app_data.join(APP_DIR_NAME));
    }

    Err(CacheError::ConfigDirUnavailable)
}
