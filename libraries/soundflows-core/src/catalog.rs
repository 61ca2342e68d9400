//! Track catalog
//!
//! Static map of category key to track file names, plus the URL helper used
//! by the loader and the mixer. The data shape matches the JSON the web
//! player ships:
//!
//! ```json
//! { "baseUrl": "...", "categories": { "Rain": { "name": "...", "icon": "...",
//!   "description": "...", "folder": "rain-sounds", "files": ["a.mp3"] } } }
//! ```

use crate::error::{Result, SoundflowsError};
use crate::types::TrackRef;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Characters `encodeURIComponent` leaves untouched are removed from the set
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const BUILTIN_CATALOG: &str = include_str!("../assets/catalog.json");

/// One therapeutic category of tracks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Display name
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub icon: String,

    #[serde(default)]
    pub description: String,

    /// Folder under the base URL; derived from the key when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,

    /// Track file names, in display order
    #[serde(default)]
    pub files: Vec<String>,
}

impl Category {
    /// Category with only files set (handy for tests and small catalogs)
    pub fn with_files<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: String::new(),
            icon: String::new(),
            description: String::new(),
            folder: None,
            files: files.into_iter().map(Into::into).collect(),
        }
    }

    pub fn folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = Some(folder.into());
        self
    }
}

/// The full track catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    /// Prefix for every track URL (normally ends with `/`)
    pub base_url: String,

    #[serde(default)]
    categories: BTreeMap<String, Category>,
}

impl Catalog {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            categories: BTreeMap::new(),
        }
    }

    /// Add (or replace) a category
    pub fn with_category(mut self, key: impl Into<String>, category: Category) -> Self {
        self.categories.insert(key.into(), category);
        self
    }

    /// Parse a catalog from its JSON representation
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a catalog JSON file
    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// The catalog bundled with the player (archive.org collection)
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_CATALOG)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.categories.contains_key(key)
    }

    /// Category keys, sorted
    pub fn category_keys(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    pub fn category(&self, key: &str) -> Result<&Category> {
        self.categories
            .get(key)
            .ok_or_else(|| SoundflowsError::UnknownCategory(key.to_string()))
    }

    pub fn files(&self, key: &str) -> Result<&[String]> {
        Ok(&self.category(key)?.files)
    }

    /// Folder for a category: the configured one, or the key lower-cased with
    /// every whitespace run replaced by `-`
    pub fn folder(&self, key: &str) -> Result<String> {
        let category = self.category(key)?;
        Ok(category
            .folder
            .clone()
            .unwrap_or_else(|| folder_from_key(key)))
    }

    /// `baseUrl + folder + "/" + encodeURIComponent(fileName)`
    pub fn audio_url(&self, key: &str, file_name: &str) -> Result<String> {
        let folder = self.folder(key)?;
        Ok(format!(
            "{}{}/{}",
            self.base_url,
            folder,
            utf8_percent_encode(file_name, URI_COMPONENT)
        ))
    }

    /// Like [`audio_url`](Self::audio_url), but absolute `http(s)://` file
    /// names are returned unchanged.
    pub fn resolve_url(&self, key: &str, file_name: &str) -> Result<String> {
        if file_name.starts_with("http://") || file_name.starts_with("https://") {
            return Ok(file_name.to_string());
        }
        self.audio_url(key, file_name)
    }

    pub fn track_ref(&self, key: &str, file_name: &str) -> Result<TrackRef> {
        self.category(key)?;
        Ok(TrackRef::new(key, file_name))
    }

    /// Pick a random file from a category; `None` when it has no files
    pub fn random_file<R: Rng + ?Sized>(&self, key: &str, rng: &mut R) -> Result<Option<&str>> {
        Ok(self.files(key)?.choose(rng).map(String::as_str))
    }
}

fn folder_from_key(key: &str) -> String {
    let mut folder = String::with_capacity(key.len());
    let mut in_whitespace = false;
    for c in key.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                folder.push('-');
            }
            in_whitespace = true;
        } else {
            folder.extend(c.to_lowercase());
            in_whitespace = false;
        }
    }
    folder
}
