//! Mixer value types

use serde::{Deserialize, Serialize};

/// Snapshot of one mixer track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackInfo {
    pub track_id: String,
    pub category: String,
    pub file_name: String,
    /// Linear gain (0.0-1.0)
    pub volume: f32,
    pub is_playing: bool,
}

/// A named list of categories mixed together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub categories: Vec<String>,
}

impl Preset {
    pub fn new<I, S>(name: impl Into<String>, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            categories: categories.into_iter().map(Into::into).collect(),
        }
    }
}
