//! Key-value stores backing the directory cache.
//!
//! The cache only needs `get`/`put`/`remove` of string blobs, so any backend
//! satisfying [`PersistedStore`] works:
//!
//! - [`MemoryStore`] - in-process map with an optional byte quota
//! - [`FileStore`] - one JSON file per key in a directory (native only)
//! - [`SessionStore`] - browser sessionStorage, cleared when the tab closes (wasm only)

use std::collections::HashMap;

use crate::core::error::StoreError;

/// Session-scoped string storage.
pub trait PersistedStore {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, replacing any previous value.
    fn put(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete `key`. Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

// =============================================================================
// MemoryStore
// =============================================================================

/// In-memory store. Optionally bounded by the total size of stored values,
/// like browser storage quotas.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    items: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that rejects writes once values exceed `bytes` in total.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            items: HashMap::new(),
            quota: Some(bytes),
        }
    }

    /// Total size of stored values in bytes.
    pub fn used_bytes(&self) -> usize {
        self.items.values().map(String::len).sum()
    }
}

impl PersistedStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.items.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if let Some(limit) = self.quota {
            let replaced = self.items.get(key).map_or(0, String::len);
            let needed = self.used_bytes() - replaced + value.len();
            if needed > limit {
                return Err(StoreError::QuotaExceeded { needed, limit });
            }
        }
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.items.remove(key);
        Ok(())
    }
}

// =============================================================================
// FileStore
// =============================================================================

/// Stores each key as `<dir>/<key>.json`.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: std::path::PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<std::path::PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> std::path::PathBuf {
        let file: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", file))
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl PersistedStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        match std::fs::remove_file(self.path_for(key)) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

// =============================================================================
// SessionStore
// =============================================================================

/// Browser sessionStorage. Cleared automatically when the tab is closed,
/// so navigation within a session stays fast without serving stale data on
/// the next visit.
#[cfg(target_arch = "wasm32")]
#[derive(Clone, Debug, Default)]
pub struct SessionStore;

#[cfg(target_arch = "wasm32")]
impl PersistedStore for SessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let storage = super::dom::session_storage().ok_or(StoreError::Unavailable)?;
        storage.get_item(key).map_err(|_| StoreError::Unavailable)
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let storage = super::dom::session_storage().ok_or(StoreError::Unavailable)?;
        storage
            .set_item(key, value)
            .map_err(|e| StoreError::WriteFailed(e.as_string().unwrap_or_else(|| "quota".to_string())))
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        let storage = super::dom::session_storage().ok_or(StoreError::Unavailable)?;
        storage.remove_item(key).map_err(|_| StoreError::WriteFailed(key.to_string()))
    }
}
