//! Error types shared by all SoundFlows crates

use std::time::Duration;
use thiserror::Error;

/// Result type alias using `SoundflowsError`
pub type Result<T> = std::result::Result<T, SoundflowsError>;

/// Core error type for SoundFlows
#[derive(Error, Debug)]
pub enum SoundflowsError {
    /// Category key is not part of the catalog
    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    /// Category exists but lists no files
    #[error("Category has no audio files: {0}")]
    EmptyCategory(String),

    /// Preset name is neither built-in nor saved
    #[error("Unknown preset: {0}")]
    UnknownPreset(String),

    /// Mixer already holds the maximum number of tracks
    #[error("Track limit exceeded: at most {max} tracks can play at once")]
    TrackLimitExceeded { max: usize },

    /// No mixer track with this id
    #[error("Track not found: {0}")]
    TrackNotFound(String),

    /// Configuration value out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Metadata load did not settle in time
    #[error("Loading {file_name} timed out after {after:?}")]
    LoadTimeout { file_name: String, after: Duration },

    /// Metadata load failed (network or decode)
    #[error("Load error: {0}")]
    Load(String),

    /// Platform has no usable audio context
    #[error("Audio unavailable: {0}")]
    AudioUnavailable(String),

    /// Media element refused to play
    #[error("Playback error: {0}")]
    Playback(String),

    /// Key-value storage failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SoundflowsError {
    /// Create a load error
    pub fn load(msg: impl Into<String>) -> Self {
        Self::Load(msg.into())
    }

    /// Create a playback error
    pub fn playback(msg: impl Into<String>) -> Self {
        Self::Playback(msg.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Whether a batch operation may count this failure and carry on.
    ///
    /// Resource failures (timeouts, network errors) only reduce a success
    /// count; everything else is surfaced to the caller.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::LoadTimeout { .. } | Self::Load(_))
    }
}
