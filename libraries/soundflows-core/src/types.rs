//! Core value types

use serde::{Deserialize, Serialize};
use std::fmt;

/// One playable asset in the catalog
///
/// Immutable once constructed; resolved to a URL through the
/// [`Catalog`](crate::Catalog).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackRef {
    category: String,
    file_name: String,
}

impl TrackRef {
    pub fn new(category: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            file_name: file_name.into(),
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Cache key in `category:fileName` form
    pub fn cache_key(&self) -> String {
        format!("{}:{}", self.category, self.file_name)
    }
}

impl fmt::Display for TrackRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.file_name)
    }
}
