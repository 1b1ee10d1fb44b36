//! Bounded LRU cache of directory listings.
//!
//! The whole cache lives in one JSON blob inside a [`PersistedStore`]:
//!
//! ```json
//! { "entries": { "<dir>|shallow|asc": { "entries": [...], "scrollOffset": 120.0, "lastWrittenAt": 1700000000000 } },
//!   "order": ["<dir>|shallow|asc", ...] }
//! ```
//!
//! `order` lists keys most-recent first. Storage failures never reach the
//! caller: unreadable blobs read as empty and failed writes are dropped.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use web_time::{SystemTime, UNIX_EPOCH};

use crate::models::{CacheKey, Entry};
use crate::utils::storage::PersistedStore;

/// Cached listing and scroll position of one (directory, mode) slot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub entries: Vec<Entry>,
    #[serde(default)]
    pub scroll_offset: Option<f64>,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub last_written_at: u64,
}

/// Field-wise update for [`DirCache::put`]. `None` keeps the stored value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CachePatch {
    pub entries: Option<Vec<Entry>>,
    pub scroll_offset: Option<f64>,
}

impl CachePatch {
    pub fn entries(entries: Vec<Entry>) -> Self {
        Self {
            entries: Some(entries),
            scroll_offset: None,
        }
    }

    pub fn scroll(offset: f64) -> Self {
        Self {
            entries: None,
            scroll_offset: Some(offset),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    entries: HashMap<String, CacheEntry>,
    #[serde(default)]
    order: Vec<String>,
}

impl Snapshot {
    /// Make `order` and `entries` describe the same key set, within capacity.
    fn repair(&mut self, capacity: usize) {
        let mut seen = HashSet::new();
        let entries = &self.entries;
        self.order
            .retain(|key| entries.contains_key(key) && seen.insert(key.clone()));

        let mut orphans: Vec<String> = self
            .entries
            .keys()
            .filter(|key| !seen.contains(*key))
            .cloned()
            .collect();
        orphans.sort();
        self.order.extend(orphans);

        self.evict_beyond(capacity);
    }

    fn touch(&mut self, key: &str) {
        self.order.retain(|k| k != key);
        self.order.insert(0, key.to_string());
    }

    fn evict_beyond(&mut self, capacity: usize) {
        if self.order.len() <= capacity {
            return;
        }
        for key in self.order.drain(capacity..) {
            tracing::debug!(key = %key, "evicting cached listing");
            self.entries.remove(&key);
        }
    }
}

/// LRU cache of directory listings keyed by [`CacheKey`].
pub struct DirCache<S> {
    store: S,
    storage_key: String,
    capacity: usize,
}

impl<S: PersistedStore> DirCache<S> {
    /// Cache persisted under `storage_key`, holding at most `capacity` slots.
    pub fn new(store: S, storage_key: impl Into<String>, capacity: usize) -> Self {
        Self {
            store,
            storage_key: storage_key.into(),
            capacity: capacity.max(1),
        }
    }

    /// Read a slot and mark it most recently used.
    pub fn get(&mut self, key: &CacheKey) -> Option<CacheEntry> {
        let mut snapshot = self.load();
        let encoded = key.encode();
        let entry = snapshot.entries.get(&encoded)?.clone();

        if snapshot.order.first() != Some(&encoded) {
            snapshot.touch(&encoded);
            self.save(&snapshot);
        }
        Some(entry)
    }

    /// Read a slot without changing recency.
    pub fn peek(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.load().entries.remove(&key.encode())
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.load().entries.contains_key(&key.encode())
    }

    /// Apply `patch` to a slot, stamp it and mark it most recently used.
    ///
    /// A slot that did not exist is created (with no entries if the patch
    /// carries none). Slots beyond capacity are evicted oldest first.
    pub fn put(&mut self, key: &CacheKey, patch: CachePatch) {
        self.put_with(key, |_| Some(patch));
    }

    /// Derive a patch from the slot's current value and apply it as
    /// [`put`](Self::put) would, reading the blob once. When `f` returns
    /// `None` nothing is written. Returns whether a patch was applied.
    pub fn put_with(
        &mut self,
        key: &CacheKey,
        f: impl FnOnce(Option<&CacheEntry>) -> Option<CachePatch>,
    ) -> bool {
        let mut snapshot = self.load();
        let encoded = key.encode();
        let Some(patch) = f(snapshot.entries.get(&encoded)) else {
            return false;
        };
        let previous = snapshot.entries.remove(&encoded);

        let (old_entries, old_scroll) = match previous {
            Some(entry) => (entry.entries, entry.scroll_offset),
            None => (Vec::new(), None),
        };
        let entry = CacheEntry {
            entries: dedup_by_name(patch.entries.unwrap_or(old_entries)),
            scroll_offset: patch.scroll_offset.or(old_scroll),
            last_written_at: now_ms(),
        };

        snapshot.entries.insert(encoded.clone(), entry);
        snapshot.touch(&encoded);
        snapshot.evict_beyond(self.capacity);
        self.save(&snapshot);
        true
    }

    /// Number of cached slots.
    pub fn len(&self) -> usize {
        self.load().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every slot.
    pub fn clear(&mut self) {
        if let Err(e) = self.store.remove(&self.storage_key) {
            tracing::warn!(error = %e, "failed to clear directory cache");
        }
    }

    fn load(&self) -> Snapshot {
        let raw = match self.store.get(&self.storage_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Snapshot::default(),
            Err(e) => {
                tracing::warn!(error = %e, "directory cache unreadable");
                return Snapshot::default();
            }
        };

        match serde_json::from_str::<Snapshot>(&raw) {
            Ok(mut snapshot) => {
                snapshot.repair(self.capacity);
                snapshot
            }
            Err(e) => {
                tracing::warn!(error = %e, "discarding corrupt directory cache");
                Snapshot::default()
            }
        }
    }

    fn save(&mut self, snapshot: &Snapshot) {
        let json = match serde_json::to_string(snapshot) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize directory cache");
                return;
            }
        };
        if let Err(e) = self.store.put(&self.storage_key, &json) {
            tracing::warn!(error = %e, "failed to persist directory cache");
        }
    }
}

/// Keep the last occurrence of each name, preserving order otherwise.
fn dedup_by_name(entries: Vec<Entry>) -> Vec<Entry> {
    let mut seen = HashSet::new();
    let mut kept: Vec<Entry> = entries
        .into_iter()
        .rev()
        .filter(|e| seen.insert(e.name.clone()))
        .collect();
    kept.reverse();
    kept
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
