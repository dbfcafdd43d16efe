//! Ledger entry cache.
//!
//! Keyed by canonical [`RecordKey`]. One cache belongs to one fetcher, and one
//! fetcher to one target, so entries from different networks never mix.
//!
//! # Example
//!
//! ```
//! use erst_state_fetcher::EntryCache;
//! use erst_types::RecordKey;
//!
//! let cache = EntryCache::new();
//! cache.put(RecordKey::from_encoded("AAAABg=="), "AAAA".to_string());
//! assert!(cache.contains(&RecordKey::from_encoded("AAAABg==")));
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use erst_types::paths::atomic_write_json;
use erst_types::RecordKey;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

const ENTRIES_FILE_NAME: &str = "ledger_entries.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheFile {
    ledger_entries: HashMap<RecordKey, String>,
}

/// In-memory entry cache.
///
/// Thread-safe via internal RwLock. Can optionally persist to disk.
#[derive(Debug, Default)]
pub struct EntryCache {
    entries: RwLock<HashMap<RecordKey, String>>,

    /// Optional persistence directory.
    storage_dir: Option<PathBuf>,
}

impl EntryCache {
    /// Create a new in-memory cache (no persistence).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache persisted under `storage_dir`.
    ///
    /// Entries flushed by a previous run are loaded immediately.
    pub fn with_storage(storage_dir: impl AsRef<Path>) -> Result<Self> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        fs::create_dir_all(&storage_dir).with_context(|| {
            format!("Failed to create cache directory {}", storage_dir.display())
        })?;

        let cache = Self {
            entries: RwLock::new(HashMap::new()),
            storage_dir: Some(storage_dir),
        };
        cache.load_from_disk()?;
        Ok(cache)
    }

    pub fn storage_dir(&self) -> Option<&Path> {
        self.storage_dir.as_deref()
    }

    pub fn get(&self, key: &RecordKey) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    pub fn contains(&self, key: &RecordKey) -> bool {
        self.entries.read().contains_key(key)
    }

    pub fn put(&self, key: RecordKey, value: String) {
        self.entries.write().insert(key, value);
    }

    /// Store multiple entries under a single write lock.
    pub fn put_many(&self, entries: impl IntoIterator<Item = (RecordKey, String)>) {
        let mut cache = self.entries.write();
        for (key, value) in entries {
            cache.insert(key, value);
        }
    }

    /// Split `keys` into cached entries and keys still to fetch.
    ///
    /// The order of `keys` is preserved in the returned miss list.
    pub fn partition(&self, keys: &[RecordKey]) -> (HashMap<RecordKey, String>, Vec<RecordKey>) {
        let cache = self.entries.read();
        let mut hits = HashMap::new();
        let mut misses = Vec::new();
        for key in keys {
            match cache.get(key) {
                Some(value) => {
                    hits.insert(key.clone(), value.clone());
                }
                None => misses.push(key.clone()),
            }
        }
        (hits, misses)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Flush cached entries to disk (if storage is enabled).
    pub fn flush(&self) -> Result<()> {
        let Some(ref storage_dir) = self.storage_dir else {
            return Ok(());
        };
        let file = CacheFile {
            ledger_entries: self.entries.read().clone(),
        };
        atomic_write_json(&storage_dir.join(ENTRIES_FILE_NAME), &file)
    }

    fn load_from_disk(&self) -> Result<()> {
        let Some(ref storage_dir) = self.storage_dir else {
            return Ok(());
        };
        let path = storage_dir.join(ENTRIES_FILE_NAME);
        if !path.exists() {
            return Ok(());
        }
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file: CacheFile = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        self.put_many(file.ledger_entries);
        Ok(())
    }
}
