/// Runtime configuration for the loader, mixer and preset storage
use crate::error::{Result, SoundflowsError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default config file looked up by [`SoundflowsConfig::load`]
pub const DEFAULT_CONFIG_FILE: &str = "soundflows.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SoundflowsConfig {
    #[serde(default)]
    pub loader: LoaderConfig,

    #[serde(default)]
    pub mixer: MixerConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoaderConfig {
    /// Metadata cache slots
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Per-item metadata load timeout
    #[serde(default = "default_item_timeout_ms")]
    pub item_timeout_ms: u64,

    /// Items loaded per background continuation
    #[serde(default = "default_background_batch_size")]
    pub background_batch_size: usize,

    /// Pause between background items
    #[serde(default = "default_background_yield_ms")]
    pub background_yield_ms: u64,

    /// Delay before background work when no idle callback exists
    #[serde(default = "default_idle_fallback_delay_ms")]
    pub idle_fallback_delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MixerConfig {
    #[serde(default = "default_max_tracks")]
    pub max_tracks: usize,

    /// Volume for tracks added without an explicit volume
    #[serde(default = "default_track_volume")]
    pub default_track_volume: f32,

    /// Volume for tracks added while applying a preset
    #[serde(default = "default_preset_track_volume")]
    pub preset_track_volume: f32,

    /// Initial master gain
    #[serde(default = "default_master_volume")]
    pub master_volume: f32,

    /// Length of the linear gain ramp applied on volume changes
    #[serde(default = "default_ramp_ms")]
    pub ramp_ms: u64,

    /// Mixer tracks loop instead of ending
    #[serde(default = "default_loop_tracks")]
    pub loop_tracks: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Key under which custom presets are persisted
    #[serde(default = "default_presets_key")]
    pub presets_key: String,

    /// Backing file for the file store (in-memory storage when unset)
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl SoundflowsConfig {
    /// Load configuration from `soundflows.toml` (if present) and environment
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(DEFAULT_CONFIG_FILE))
    }

    /// Load configuration from a file (if it exists) and environment.
    ///
    /// Environment variables are prefixed with `SOUNDFLOWS_` and use `__`
    /// between sections, e.g. `SOUNDFLOWS_MIXER__MAX_TRACKS=3`.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut settings = config::Config::builder();

        if path.exists() {
            settings = settings.add_source(config::File::from(path.to_path_buf()));
        }

        settings = settings.add_source(
            config::Environment::with_prefix("SOUNDFLOWS")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = settings
            .build()
            .and_then(|settings| settings.try_deserialize::<Self>())
            .map_err(|e| SoundflowsError::invalid_config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.loader.cache_capacity == 0 {
            return Err(SoundflowsError::invalid_config(
                "loader.cache_capacity must be at least 1",
            ));
        }
        if self.loader.background_batch_size == 0 {
            return Err(SoundflowsError::invalid_config(
                "loader.background_batch_size must be at least 1",
            ));
        }
        if self.mixer.max_tracks == 0 {
            return Err(SoundflowsError::invalid_config(
                "mixer.max_tracks must be at least 1",
            ));
        }

        for (name, value) in [
            ("mixer.default_track_volume", self.mixer.default_track_volume),
            ("mixer.preset_track_volume", self.mixer.preset_track_volume),
            ("mixer.master_volume", self.mixer.master_volume),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(SoundflowsError::invalid_config(format!(
                    "{name} must be between 0 and 1 (got {value})"
                )));
            }
        }

        if self.storage.presets_key.is_empty() {
            return Err(SoundflowsError::invalid_config(
                "storage.presets_key cannot be empty",
            ));
        }

        Ok(())
    }
}

impl LoaderConfig {
    pub fn item_timeout(&self) -> Duration {
        Duration::from_millis(self.item_timeout_ms)
    }

    pub fn background_yield(&self) -> Duration {
        Duration::from_millis(self.background_yield_ms)
    }

    pub fn idle_fallback_delay(&self) -> Duration {
        Duration::from_millis(self.idle_fallback_delay_ms)
    }
}

impl MixerConfig {
    pub fn ramp(&self) -> Duration {
        Duration::from_millis(self.ramp_ms)
    }
}

// Default values
fn default_cache_capacity() -> usize {
    10
}

fn default_item_timeout_ms() -> u64 {
    10_000
}

fn default_background_batch_size() -> usize {
    3
}

fn default_background_yield_ms() -> u64 {
    100
}

fn default_idle_fallback_delay_ms() -> u64 {
    2_000
}

fn default_max_tracks() -> usize {
    5
}

fn default_track_volume() -> f32 {
    0.5
}

fn default_preset_track_volume() -> f32 {
    0.6
}

fn default_master_volume() -> f32 {
    0.8
}

fn default_ramp_ms() -> u64 {
    100
}

fn default_loop_tracks() -> bool {
    true
}

fn default_presets_key() -> String {
    "soundHealing_mixerPresets".to_string()
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            cache_capacity: default_cache_capacity(),
            item_timeout_ms: default_item_timeout_ms(),
            background_batch_size: default_background_batch_size(),
            background_yield_ms: default_background_yield_ms(),
            idle_fallback_delay_ms: default_idle_fallback_delay_ms(),
        }
    }
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            max_tracks: default_max_tracks(),
            default_track_volume: default_track_volume(),
            preset_track_volume: default_preset_track_volume(),
            master_volume: default_master_volume(),
            ramp_ms: default_ramp_ms(),
            loop_tracks: default_loop_tracks(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            presets_key: default_presets_key(),
            path: None,
        }
    }
}
