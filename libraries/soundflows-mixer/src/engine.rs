//! Mixer Engine
//!
//! Owns one audio context with a master gain node and up to `max_tracks`
//! looping tracks, each wired `source -> track gain -> master gain`.
//!
//! Per-track lifecycle: added (paused) -> playing <-> paused -> removed.
//! A removed id must be added again from scratch.

use crate::events::MixerEvent;
use crate::presets::{PresetBook, PresetStore};
use crate::types::TrackInfo;
use crate::volume::{clamp_volume, MasterVolume};
use futures_util::future::join_all;
use soundflows_core::{
    open_store, AudioBackend, AudioContext, AudioNode, Catalog, ContextState, EventBus, GainNode,
    MediaElement, MixerConfig, Result, SoundflowsConfig, SoundflowsError,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

struct AudioGraph {
    context: Box<dyn AudioContext>,
    master: Box<dyn GainNode>,
}

struct MixerTrack {
    id: String,
    category: String,
    file_name: String,
    element: Box<dyn MediaElement>,
    source: Box<dyn AudioNode>,
    gain: Box<dyn GainNode>,
    volume: f32,
    is_playing: bool,
}

impl MixerTrack {
    fn info(&self) -> TrackInfo {
        TrackInfo {
            track_id: self.id.clone(),
            category: self.category.clone(),
            file_name: self.file_name.clone(),
            volume: self.volume,
            is_playing: self.is_playing,
        }
    }
}

/// Multi-track mixer
pub struct MixerEngine {
    backend: Arc<dyn AudioBackend>,
    catalog: Arc<Catalog>,
    config: MixerConfig,
    events: Arc<EventBus<MixerEvent>>,
    graph: Option<AudioGraph>,
    /// Insertion order
    tracks: Vec<MixerTrack>,
    master: MasterVolume,
    presets: PresetBook,
    preset_store: PresetStore,
}

impl MixerEngine {
    /// Create an engine and merge any persisted custom presets
    ///
    /// The audio context is not created until [`initialize`](Self::initialize)
    /// or the first [`add_track`](Self::add_track).
    pub fn new(
        backend: Arc<dyn AudioBackend>,
        catalog: Arc<Catalog>,
        preset_store: PresetStore,
        config: MixerConfig,
    ) -> Self {
        let mut engine = Self {
            backend,
            catalog,
            master: MasterVolume::new(config.master_volume),
            config,
            events: Arc::new(EventBus::new()),
            graph: None,
            tracks: Vec::new(),
            presets: PresetBook::builtin(),
            preset_store,
        };

        if let Err(e) = engine.load_persisted_presets() {
            error!(error = %e, "Failed to load mixer presets");
        }

        engine
    }

    /// Create an engine with preset storage opened from `config`
    pub fn from_config(
        backend: Arc<dyn AudioBackend>,
        catalog: Arc<Catalog>,
        config: &SoundflowsConfig,
    ) -> Result<Self> {
        config.validate()?;
        let store = open_store(&config.storage)?;
        let presets = PresetStore::new(store, config.storage.presets_key.clone());
        Ok(Self::new(backend, catalog, presets, config.mixer.clone()))
    }

    /// Event bus every state change is published on
    pub fn events(&self) -> &Arc<EventBus<MixerEvent>> {
        &self.events
    }

    pub fn config(&self) -> &MixerConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    // ===== Lifecycle =====

    /// Create the audio context and master gain once
    ///
    /// Returns `false` when the platform cannot provide an audio context.
    pub fn initialize(&mut self) -> bool {
        if self.graph.is_some() {
            return true;
        }

        match self.build_graph() {
            Ok(graph) => {
                self.graph = Some(graph);
                info!(master_volume = self.master.level(), "Mixer initialized");
                true
            }
            Err(e) => {
                error!(error = %e, "Mixer initialization failed");
                false
            }
        }
    }

    fn build_graph(&self) -> Result<AudioGraph> {
        let mut context = self.backend.create_context()?;
        let mut master = context.create_gain()?;
        master.connect(context.destination());
        master.set_value(self.master.level());
        Ok(AudioGraph { context, master })
    }

    pub fn is_initialized(&self) -> bool {
        self.graph.is_some()
    }

    pub fn context_state(&self) -> Option<ContextState> {
        self.graph.as_ref().map(|graph| graph.context.state())
    }

    /// Remove every track and close the audio context
    ///
    /// The engine is unusable until [`initialize`](Self::initialize) runs again.
    pub fn cleanup(&mut self) {
        self.stop_all();

        if let Some(mut graph) = self.graph.take() {
            graph.master.disconnect();
            graph.context.close();
        }

        info!("Mixer cleaned up");
    }

    // ===== Tracks =====

    /// Add a paused track
    ///
    /// Fails when the mixer is full, the category is unknown or the audio
    /// graph cannot be built. Adding an id that already exists returns the
    /// existing track unchanged. `volume` defaults to the configured track
    /// volume and is clamped to `[0, 1]`.
    pub async fn add_track(
        &mut self,
        track_id: &str,
        category: &str,
        file_name: &str,
        volume: Option<f32>,
    ) -> Result<TrackInfo> {
        if self.tracks.len() >= self.config.max_tracks {
            warn!(track_id = %track_id, max = self.config.max_tracks, "Track limit reached");
            return Err(SoundflowsError::TrackLimitExceeded {
                max: self.config.max_tracks,
            });
        }

        if let Some(existing) = self.find(track_id) {
            warn!(track_id = %track_id, "Track already exists");
            return Ok(existing.info());
        }

        if !self.initialize() {
            return Err(SoundflowsError::AudioUnavailable(
                "audio context could not be created".to_string(),
            ));
        }
        let graph = self
            .graph
            .as_mut()
            .ok_or_else(|| SoundflowsError::AudioUnavailable("mixer not initialized".to_string()))?;

        if graph.context.state() == ContextState::Suspended {
            debug!("Resuming suspended audio context");
            graph.context.resume().await?;
        }

        let url = self.catalog.resolve_url(category, file_name)?;

        let mut element = graph.context.create_media_element(&url)?;
        element.set_loop(self.config.loop_tracks);

        let mut source = match graph.context.create_media_source(element.as_ref()) {
            Ok(source) => source,
            Err(e) => {
                element.release();
                return Err(e);
            }
        };
        let mut gain = match graph.context.create_gain() {
            Ok(gain) => gain,
            Err(e) => {
                source.disconnect();
                element.release();
                return Err(e);
            }
        };

        source.connect(gain.id());
        gain.connect(graph.master.id());

        let volume = clamp_volume(volume.unwrap_or(self.config.default_track_volume));
        gain.set_value(volume);

        let track = MixerTrack {
            id: track_id.to_string(),
            category: category.to_string(),
            file_name: file_name.to_string(),
            element,
            source,
            gain,
            volume,
            is_playing: false,
        };
        let info = track.info();
        self.tracks.push(track);

        info!(track_id = %track_id, category = %category, file = %file_name, "Track added");
        self.events.emit(&MixerEvent::TrackAdded {
            track_id: track_id.to_string(),
            category: category.to_string(),
            file_name: file_name.to_string(),
        });

        Ok(info)
    }

    /// Start or resume a track from its current position
    pub async fn play_track(&mut self, track_id: &str) -> Result<()> {
        let track = self
            .find_mut(track_id)
            .ok_or_else(|| SoundflowsError::TrackNotFound(track_id.to_string()))?;

        if let Err(e) = track.element.play().await {
            error!(track_id = %track_id, error = %e, "Track failed to play");
            return Err(e);
        }
        track.is_playing = true;

        info!(track_id = %track_id, "Track playing");
        self.events.emit(&MixerEvent::TrackPlayed {
            track_id: track_id.to_string(),
        });
        Ok(())
    }

    /// Pause a track, keeping its position; unknown ids are ignored
    pub fn pause_track(&mut self, track_id: &str) {
        let Some(track) = self.find_mut(track_id) else {
            debug!(track_id = %track_id, "Pause ignored, no such track");
            return;
        };

        track.element.pause();
        track.is_playing = false;

        info!(track_id = %track_id, "Track paused");
        self.events.emit(&MixerEvent::TrackPaused {
            track_id: track_id.to_string(),
        });
    }

    /// Stop a track, release its media and disconnect its nodes
    pub fn remove_track(&mut self, track_id: &str) -> bool {
        let Some(index) = self.tracks.iter().position(|track| track.id == track_id) else {
            return false;
        };

        let mut track = self.tracks.remove(index);
        track.element.pause();
        track.element.release();
        track.source.disconnect();
        track.gain.disconnect();

        info!(track_id = %track_id, file = %track.file_name, "Track removed");
        self.events.emit(&MixerEvent::TrackRemoved {
            track_id: track_id.to_string(),
        });
        true
    }

    /// Ramp a track's gain to `volume` (clamped); unknown ids are ignored
    pub fn set_track_volume(&mut self, track_id: &str, volume: f32) {
        let Some(graph) = self.graph.as_ref() else {
            return;
        };
        let Some(track) = self.tracks.iter_mut().find(|track| track.id == track_id) else {
            return;
        };

        let volume = clamp_volume(volume);
        ramp(
            track.gain.as_mut(),
            graph.context.current_time(),
            volume,
            self.config.ramp(),
        );
        track.volume = volume;

        debug!(track_id = %track_id, volume, "Track volume changed");
        self.events.emit(&MixerEvent::TrackVolumeChanged {
            track_id: track_id.to_string(),
            volume,
        });
    }

    // ===== Master =====

    /// Ramp the master gain to `volume` (clamped); ignored before initialization
    pub fn set_master_volume(&mut self, volume: f32) {
        if self.graph.is_none() {
            return;
        }

        let volume = self.master.set_level(volume);
        self.apply_master();

        debug!(volume, "Master volume changed");
        self.events.emit(&MixerEvent::MasterVolumeChanged { volume });
    }

    pub fn master_volume(&self) -> f32 {
        self.master.level()
    }

    pub fn is_master_muted(&self) -> bool {
        self.master.is_muted()
    }

    /// Silence the master output, remembering the current level
    pub fn mute_master(&mut self) {
        self.master.mute();
        self.master_mute_changed();
    }

    /// Restore the level recorded by the last mute (0.5 when none)
    pub fn unmute_master(&mut self) {
        self.master.unmute();
        self.master_mute_changed();
    }

    pub fn toggle_master_mute(&mut self) -> bool {
        self.master.toggle_mute();
        self.master_mute_changed();
        self.master.is_muted()
    }

    fn master_mute_changed(&mut self) {
        self.apply_master();

        let muted = self.master.is_muted();
        let volume = self.master.level();
        info!(muted, volume, "Master mute changed");
        self.events.emit(&MixerEvent::MasterMuteChanged { muted, volume });
    }

    fn apply_master(&mut self) {
        if let Some(graph) = self.graph.as_mut() {
            let now = graph.context.current_time();
            ramp(
                graph.master.as_mut(),
                now,
                self.master.level(),
                self.config.ramp(),
            );
        }
    }

    // ===== Bulk =====

    /// Play every paused track concurrently
    ///
    /// All plays settle before this returns; the first failure is returned
    /// after the others have started.
    pub async fn play_all(&mut self) -> Result<()> {
        let results = join_all(
            self.tracks
                .iter_mut()
                .filter(|track| !track.is_playing)
                .map(|track| async move {
                    let result = track.element.play().await;
                    if result.is_ok() {
                        track.is_playing = true;
                    }
                    (track.id.clone(), result)
                }),
        )
        .await;

        let mut first_error = None;
        for (track_id, result) in results {
            match result {
                Ok(()) => self.events.emit(&MixerEvent::TrackPlayed { track_id }),
                Err(e) => {
                    error!(track_id = %track_id, error = %e, "Track failed to play");
                    first_error.get_or_insert(e);
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    pub fn pause_all(&mut self) {
        for track_id in self.track_ids() {
            self.pause_track(&track_id);
        }
    }

    /// Remove every track
    pub fn stop_all(&mut self) {
        for track_id in self.track_ids() {
            self.remove_track(&track_id);
        }
    }

    // ===== Presets =====

    /// Clear the mixer and announce the preset's categories
    ///
    /// Tracks for the categories are added by the caller.
    pub fn load_preset(&mut self, name: &str) -> Result<Vec<String>> {
        let categories = self
            .presets
            .get(name)
            .map(|preset| preset.categories.clone())
            .ok_or_else(|| SoundflowsError::UnknownPreset(name.to_string()))?;

        self.stop_all();

        info!(preset = %name, categories = ?categories, "Preset loaded");
        self.events.emit(&MixerEvent::PresetLoaded {
            preset_name: name.to_string(),
            categories: categories.clone(),
        });
        Ok(categories)
    }

    /// Save the current tracks' categories under `name` and persist
    /// custom presets
    pub fn save_as_preset(&mut self, name: &str) -> Result<Vec<String>> {
        let categories: Vec<String> = self
            .tracks
            .iter()
            .map(|track| track.category.clone())
            .collect();

        self.presets.insert(name, categories.clone());
        self.preset_store.save(&self.presets)?;

        info!(preset = %name, categories = ?categories, "Preset saved");
        self.events.emit(&MixerEvent::PresetSaved {
            preset_name: name.to_string(),
            categories: categories.clone(),
        });
        Ok(categories)
    }

    /// Merge stored custom presets into the preset map
    pub fn load_persisted_presets(&mut self) -> Result<usize> {
        let stored = self.preset_store.load()?;
        let count = stored.len();
        self.presets.merge(stored);
        debug!(count, "Persisted presets loaded");
        Ok(count)
    }

    /// Built-ins first, then custom presets
    pub fn preset_names(&self) -> Vec<String> {
        self.presets.names()
    }

    pub fn preset_categories(&self, name: &str) -> Option<&[String]> {
        self.presets
            .get(name)
            .map(|preset| preset.categories.as_slice())
    }

    // ===== Queries =====

    /// Snapshot of every track in insertion order
    pub fn tracks(&self) -> Vec<TrackInfo> {
        self.tracks.iter().map(MixerTrack::info).collect()
    }

    pub fn track(&self, track_id: &str) -> Option<TrackInfo> {
        self.find(track_id).map(MixerTrack::info)
    }

    pub fn has_track(&self, track_id: &str) -> bool {
        self.find(track_id).is_some()
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    // ===== End of media =====

    /// Mark playing tracks whose media ended as paused
    ///
    /// Returns the ids that ended. Only reachable when looping is off.
    pub fn poll_ended(&mut self) -> Vec<String> {
        let ended: Vec<String> = self
            .tracks
            .iter()
            .filter(|track| track.is_playing && track.element.has_ended())
            .map(|track| track.id.clone())
            .collect();

        for track_id in &ended {
            self.notify_track_ended(track_id);
        }
        ended
    }

    /// Record that a track's media reached its end
    pub fn notify_track_ended(&mut self, track_id: &str) {
        let Some(track) = self.find_mut(track_id) else {
            return;
        };
        track.is_playing = false;

        info!(track_id = %track_id, "Track ended");
        self.events.emit(&MixerEvent::TrackEnded {
            track_id: track_id.to_string(),
        });
    }

    fn find(&self, track_id: &str) -> Option<&MixerTrack> {
        self.tracks.iter().find(|track| track.id == track_id)
    }

    fn find_mut(&mut self, track_id: &str) -> Option<&mut MixerTrack> {
        self.tracks.iter_mut().find(|track| track.id == track_id)
    }

    fn track_ids(&self) -> Vec<String> {
        self.tracks.iter().map(|track| track.id.clone()).collect()
    }
}

impl std::fmt::Debug for MixerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MixerEngine")
            .field("initialized", &self.is_initialized())
            .field("tracks", &self.tracks())
            .field("master", &self.master)
            .field("presets", &self.presets.names())
            .finish_non_exhaustive()
    }
}

/// Hold the current gain at `now`, then ramp linearly to `target`
fn ramp(gain: &mut dyn GainNode, now: f64, target: f32, length: Duration) {
    let current = gain.value();
    gain.set_value_at_time(current, now);
    gain.linear_ramp_to_value_at_time(target, now + length.as_secs_f64());
}
