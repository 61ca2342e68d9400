//! Mixer UI controller
//!
//! The commands a mixer panel issues, on top of [`MixerEngine`]: random track
//! selection per category, preset application, percent-based sliders and a
//! render-ready [`MixerView`].

use crate::engine::MixerEngine;
use crate::types::TrackInfo;
use crate::volume::volume_percent;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use soundflows_core::{Result, SoundflowsError};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

const AUDIO_EXTENSIONS: [&str; 7] = ["mp3", "wav", "ogg", "m4a", "wma", "flac", "aac"];

/// Sink for short user-facing messages (toasts, screen-reader announcements)
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// One preset button
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresetButton {
    pub name: String,
    pub label: String,
}

/// One track row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackRow {
    pub track_id: String,
    pub display_name: String,
    pub category: String,
    pub volume_percent: u8,
    pub is_playing: bool,
}

/// Everything the mixer panel renders
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MixerView {
    pub presets: Vec<PresetButton>,
    pub tracks: Vec<TrackRow>,
    pub master_volume_percent: u8,
    pub master_muted: bool,
}

/// Mixer panel commands
pub struct MixerController {
    engine: MixerEngine,
    notifier: Option<Arc<dyn Notifier>>,
    rng: StdRng,
}

impl MixerController {
    pub fn new(engine: MixerEngine) -> Self {
        Self {
            engine,
            notifier: None,
            rng: StdRng::from_entropy(),
        }
    }

    /// Send messages to `notifier` instead of the log
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Deterministic track selection
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn engine(&self) -> &MixerEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut MixerEngine {
        &mut self.engine
    }

    pub fn into_engine(self) -> MixerEngine {
        self.engine
    }

    /// Add a random file from `category` at the default volume and play it
    pub async fn add_random_track(&mut self, category: &str) -> Result<TrackInfo> {
        let file_name = self.pick_file(category)?;
        let track_id = new_track_id();
        let volume = self.engine.config().default_track_volume;

        self.engine
            .add_track(&track_id, category, &file_name, Some(volume))
            .await?;
        self.engine.play_track(&track_id).await?;

        self.notify(&format!("Added: {}", display_name(&file_name)));
        self.engine
            .track(&track_id)
            .ok_or_else(|| SoundflowsError::TrackNotFound(track_id))
    }

    /// Replace the mix with one random track per preset category, then play
    ///
    /// Categories missing from the catalog or without files are skipped.
    pub async fn apply_preset(&mut self, name: &str) -> Result<Vec<TrackInfo>> {
        let categories = self.engine.load_preset(name)?;
        let volume = self.engine.config().preset_track_volume;

        for category in &categories {
            let file_name = match self.pick_file(category) {
                Ok(file_name) => file_name,
                Err(e) => {
                    info!(
                        preset = %name,
                        category = %category,
                        error = %e,
                        "Skipping preset category"
                    );
                    continue;
                }
            };
            let track_id = new_track_id();
            self.engine
                .add_track(&track_id, category, &file_name, Some(volume))
                .await?;
        }

        self.engine.play_all().await?;

        self.notify(&format!("Preset loaded: {}", preset_label(name)));
        Ok(self.engine.tracks())
    }

    /// Pause a playing track or play a paused one; unknown ids are ignored
    pub async fn toggle_track(&mut self, track_id: &str) -> Result<()> {
        match self.engine.track(track_id) {
            Some(track) if track.is_playing => {
                self.engine.pause_track(track_id);
                Ok(())
            }
            Some(_) => self.engine.play_track(track_id).await,
            None => Ok(()),
        }
    }

    /// Slider value 0-100
    pub fn set_track_volume_percent(&mut self, track_id: &str, percent: f32) {
        self.engine.set_track_volume(track_id, percent / 100.0);
    }

    /// Slider value 0-100
    pub fn set_master_volume_percent(&mut self, percent: f32) {
        self.engine.set_master_volume(percent / 100.0);
    }

    pub fn toggle_master_mute(&mut self) -> bool {
        self.engine.toggle_master_mute()
    }

    pub fn remove_track(&mut self, track_id: &str) -> bool {
        self.engine.remove_track(track_id)
    }

    pub async fn play_all(&mut self) -> Result<()> {
        self.engine.play_all().await?;
        self.notify("Playing all tracks");
        Ok(())
    }

    pub fn pause_all(&mut self) {
        self.engine.pause_all();
        self.notify("Paused all tracks");
    }

    pub fn clear_all(&mut self) {
        self.engine.stop_all();
        self.notify("Cleared all tracks");
    }

    pub fn view(&self) -> MixerView {
        MixerView {
            presets: self
                .engine
                .preset_names()
                .into_iter()
                .map(|name| PresetButton {
                    label: preset_label(&name),
                    name,
                })
                .collect(),
            tracks: self
                .engine
                .tracks()
                .into_iter()
                .map(|track| TrackRow {
                    display_name: display_name(&track.file_name).to_string(),
                    volume_percent: volume_percent(track.volume),
                    track_id: track.track_id,
                    category: track.category,
                    is_playing: track.is_playing,
                })
                .collect(),
            master_volume_percent: volume_percent(self.engine.master_volume()),
            master_muted: self.engine.is_master_muted(),
        }
    }

    fn pick_file(&mut self, category: &str) -> Result<String> {
        self.engine
            .catalog()
            .random_file(category, &mut self.rng)?
            .map(str::to_string)
            .ok_or_else(|| SoundflowsError::EmptyCategory(category.to_string()))
    }

    fn notify(&self, message: &str) {
        match &self.notifier {
            Some(notifier) => notifier.notify(message),
            None => info!(message = %message, "Mixer notification"),
        }
    }
}

impl std::fmt::Debug for MixerController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MixerController")
            .field("engine", &self.engine)
            .field("notifier", &self.notifier.is_some())
            .finish_non_exhaustive()
    }
}

fn new_track_id() -> String {
    format!("mixer_{}", Uuid::new_v4().simple())
}

/// File name without a trailing audio extension (case-insensitive)
pub fn display_name(file_name: &str) -> &str {
    match file_name.rsplit_once('.') {
        Some((stem, extension))
            if AUDIO_EXTENSIONS
                .iter()
                .any(|known| extension.eq_ignore_ascii_case(known)) =>
        {
            stem
        }
        _ => file_name,
    }
}

/// Button label for a preset name
pub fn preset_label(name: &str) -> String {
    match name {
        "sleep" => "Sleep Mode".to_string(),
        "focus" => "Focus Mode".to_string(),
        "relax" => "Relax Mode".to_string(),
        "deep-meditation" => "Deep Meditation".to_string(),
        other => other.to_string(),
    }
}
