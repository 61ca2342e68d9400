//! SoundFlows Mixer
//!
//! Plays several ambient tracks at once, each with its own gain, summed
//! through one master gain.
//!
//! This crate provides:
//! - Mixer engine (audio graph lifecycle, track limit, per-track ramps)
//! - Master volume with mute that remembers the previous level
//! - Built-in and persisted presets
//! - Typed mixer events
//! - The mixer panel controller
//!
//! # Architecture
//!
//! The engine never touches a platform API directly. The audio graph comes
//! from an injected [`AudioBackend`](soundflows_core::AudioBackend) and
//! presets are stored through a [`KeyValueStore`](soundflows_core::KeyValueStore).
//!
//! # Example
//!
//! ```rust,no_run
//! use soundflows_core::{AudioBackend, Catalog, SoundflowsConfig};
//! use soundflows_mixer::{MixerEngine, MixerEvent, MixerEventKind};
//! use std::sync::Arc;
//!
//! # async fn example(backend: Arc<dyn AudioBackend>) -> soundflows_core::Result<()> {
//! let catalog = Arc::new(Catalog::builtin()?);
//! let mut mixer = MixerEngine::from_config(backend, catalog, &SoundflowsConfig::default())?;
//!
//! mixer.events().subscribe(MixerEventKind::TrackAdded, |event: &MixerEvent| {
//!     println!("{event:?}");
//! });
//!
//! let categories = mixer.load_preset("sleep")?;
//! for (i, category) in categories.iter().enumerate() {
//!     let file = mixer.catalog().files(category)?[0].clone();
//!     mixer.add_track(&format!("t{i}"), category, &file, Some(0.6)).await?;
//! }
//! mixer.play_all().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod controller;
pub mod engine;
pub mod events;
pub mod presets;
pub mod types;
pub mod volume;

pub use controller::{
    display_name, preset_label, MixerController, MixerView, Notifier, PresetButton, TrackRow,
};
pub use engine::MixerEngine;
pub use events::{MixerEvent, MixerEventKind};
pub use presets::{is_builtin, PresetBook, PresetStore, BUILTIN_PRESETS};
pub use types::{Preset, TrackInfo};
pub use volume::{clamp_volume, MasterVolume};
