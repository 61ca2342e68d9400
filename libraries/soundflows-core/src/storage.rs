//! Durable key-value storage
//!
//! String key-value storage in the shape of the browser's `localStorage`.
//! Only mixer presets are persisted; caches are rebuilt on every start.

use crate::config::StorageConfig;
use crate::error::Result;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// String key-value storage
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;
}

/// Volatile store, lost when dropped
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries().remove(key);
        Ok(())
    }
}

/// Store persisted as one JSON object in a file
///
/// Every write replaces the file through a temporary sibling and a rename,
/// so a crash mid-write leaves the previous contents intact.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`, reading existing contents if the file exists
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let json = std::fs::read_to_string(&path)?;
            if json.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&json)?
            }
        } else {
            BTreeMap::new()
        };

        tracing::debug!(path = %path.display(), entries = entries.len(), "Opened file store");

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries();
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries();
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }
}

/// Open the store described by the configuration
pub fn open_store(config: &StorageConfig) -> Result<Arc<dyn KeyValueStore>> {
    match &config.path {
        Some(path) => Ok(Arc::new(FileStore::open(path)?)),
        None => Ok(Arc::new(MemoryStore::new())),
    }
}
