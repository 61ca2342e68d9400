//! Built-in and user-saved mixer presets
//!
//! Custom presets are persisted as one JSON object (`name -> categories`)
//! under a single storage key. Built-in presets are never written out.

use crate::types::Preset;
use soundflows_core::{KeyValueStore, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Names and categories of the presets that ship with the player
pub const BUILTIN_PRESETS: [(&str, [&str; 2]); 4] = [
    ("sleep", ["Rain", "meditation"]),
    ("focus", ["running water", "meditation"]),
    ("relax", ["Animal sounds", "Singing bowl sound"]),
    ("deep-meditation", ["Chakra", "Singing bowl sound"]),
];

pub fn is_builtin(name: &str) -> bool {
    BUILTIN_PRESETS.iter().any(|(builtin, _)| *builtin == name)
}

/// In-memory preset map, built-ins first then custom presets
#[derive(Debug, Clone, PartialEq)]
pub struct PresetBook {
    presets: Vec<Preset>,
}

impl PresetBook {
    /// Book holding only the built-in presets
    pub fn builtin() -> Self {
        Self {
            presets: BUILTIN_PRESETS
                .iter()
                .map(|(name, categories)| Preset::new(*name, *categories))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Preset> {
        self.presets.iter().find(|preset| preset.name == name)
    }

    /// Insert or overwrite in place
    ///
    /// Built-in names may be overwritten here; they are still skipped when
    /// persisting.
    pub fn insert(&mut self, name: &str, categories: Vec<String>) {
        match self.presets.iter_mut().find(|preset| preset.name == name) {
            Some(preset) => preset.categories = categories,
            None => self.presets.push(Preset {
                name: name.to_string(),
                categories,
            }),
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.presets.iter().map(|preset| preset.name.clone()).collect()
    }

    /// Presets that are persisted (everything not built in)
    pub fn custom(&self) -> BTreeMap<String, Vec<String>> {
        self.presets
            .iter()
            .filter(|preset| !is_builtin(&preset.name))
            .map(|preset| (preset.name.clone(), preset.categories.clone()))
            .collect()
    }

    /// Merge stored presets over the current ones
    pub fn merge(&mut self, stored: BTreeMap<String, Vec<String>>) {
        for (name, categories) in stored {
            self.insert(&name, categories);
        }
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}

impl Default for PresetBook {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Durable storage for custom presets
#[derive(Clone)]
pub struct PresetStore {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl PresetStore {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Stored custom presets; empty when nothing was saved yet
    pub fn load(&self) -> Result<BTreeMap<String, Vec<String>>> {
        match self.store.get(&self.key)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(BTreeMap::new()),
        }
    }

    /// Persist the custom presets of `book`
    pub fn save(&self, book: &PresetBook) -> Result<()> {
        let custom = book.custom();
        let json = serde_json::to_string(&custom)?;
        self.store.set(&self.key, &json)?;
        debug!(key = %self.key, presets = custom.len(), "Presets persisted");
        Ok(())
    }
}

impl std::fmt::Debug for PresetStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresetStore")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}
