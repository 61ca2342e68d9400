//! Mixer Events
//!
//! Emitted after every state change so presentation layers can re-render
//! without polling. Subscribe per [`MixerEventKind`] on the engine's
//! [`EventBus`](soundflows_core::EventBus).

use serde::{Deserialize, Serialize};
use soundflows_core::Event;

/// Events emitted by the mixer engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MixerEvent {
    /// Track added to the graph (paused)
    #[serde(rename_all = "camelCase")]
    TrackAdded {
        track_id: String,
        category: String,
        file_name: String,
    },

    /// Track torn down and removed
    #[serde(rename_all = "camelCase")]
    TrackRemoved { track_id: String },

    #[serde(rename_all = "camelCase")]
    TrackPlayed { track_id: String },

    #[serde(rename_all = "camelCase")]
    TrackPaused { track_id: String },

    /// Media reached its natural end (only when looping is off)
    #[serde(rename_all = "camelCase")]
    TrackEnded { track_id: String },

    /// Track gain changed (clamped value)
    #[serde(rename_all = "camelCase")]
    TrackVolumeChanged { track_id: String, volume: f32 },

    /// Master gain changed (clamped value)
    MasterVolumeChanged { volume: f32 },

    /// Master output muted or restored
    MasterMuteChanged { muted: bool, volume: f32 },

    /// Preset applied; the caller populates tracks for `categories`
    #[serde(rename_all = "camelCase")]
    PresetLoaded {
        preset_name: String,
        categories: Vec<String>,
    },

    #[serde(rename_all = "camelCase")]
    PresetSaved {
        preset_name: String,
        categories: Vec<String>,
    },
}

/// Discriminant of [`MixerEvent`], used to subscribe to one kind of event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MixerEventKind {
    TrackAdded,
    TrackRemoved,
    TrackPlayed,
    TrackPaused,
    TrackEnded,
    TrackVolumeChanged,
    MasterVolumeChanged,
    MasterMuteChanged,
    PresetLoaded,
    PresetSaved,
}

impl MixerEventKind {
    /// Event name as dispatched by the web player (`mixer:<name>`)
    pub fn name(self) -> &'static str {
        match self {
            Self::TrackAdded => "mixer:trackAdded",
            Self::TrackRemoved => "mixer:trackRemoved",
            Self::TrackPlayed => "mixer:trackPlay",
            Self::TrackPaused => "mixer:trackPause",
            Self::TrackEnded => "mixer:trackEnded",
            Self::TrackVolumeChanged => "mixer:trackVolumeChange",
            Self::MasterVolumeChanged => "mixer:masterVolumeChange",
            Self::MasterMuteChanged => "mixer:masterMuteChange",
            Self::PresetLoaded => "mixer:presetLoaded",
            Self::PresetSaved => "mixer:presetSaved",
        }
    }
}

impl MixerEvent {
    /// Track the event refers to, if any
    pub fn track_id(&self) -> Option<&str> {
        match self {
            Self::TrackAdded { track_id, .. }
            | Self::TrackRemoved { track_id }
            | Self::TrackPlayed { track_id }
            | Self::TrackPaused { track_id }
            | Self::TrackEnded { track_id }
            | Self::TrackVolumeChanged { track_id, .. } => Some(track_id),
            _ => None,
        }
    }
}

impl Event for MixerEvent {
    type Kind = MixerEventKind;

    fn kind(&self) -> MixerEventKind {
        match self {
            Self::TrackAdded { .. } => MixerEventKind::TrackAdded,
            Self::TrackRemoved { .. } => MixerEventKind::TrackRemoved,
            Self::TrackPlayed { .. } => MixerEventKind::TrackPlayed,
            Self::TrackPaused { .. } => MixerEventKind::TrackPaused,
            Self::TrackEnded { .. } => MixerEventKind::TrackEnded,
            Self::TrackVolumeChanged { .. } => MixerEventKind::TrackVolumeChanged,
            Self::MasterVolumeChanged { .. } => MixerEventKind::MasterVolumeChanged,
            Self::MasterMuteChanged { .. } => MixerEventKind::MasterMuteChanged,
            Self::PresetLoaded { .. } => MixerEventKind::PresetLoaded,
            Self::PresetSaved { .. } => MixerEventKind::PresetSaved,
        }
    }
}
