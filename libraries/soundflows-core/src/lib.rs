//! SoundFlows Core
//!
//! Shared building blocks for the SoundFlows ambient sound player: the track
//! catalog, configuration, error handling, preset storage, a typed event bus
//! and the platform traits the loader and mixer are written against.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Catalog**: category key to track file names, plus URL resolution
//! - **Platform Traits**: `MediaProbe`, `AudioBackend`, `NetworkInfo`, `IdleScheduler`
//! - **Storage**: `KeyValueStore` with in-memory and JSON file backends
//! - **Error Handling**: unified `SoundflowsError` and `Result` types
//!
//! Platform fakes for tests live in [`test_utils`] behind the `test-utils`
//! feature.
//!
//! # Example
//!
//! ```rust
//! use soundflows_core::{Catalog, Category};
//!
//! let catalog = Catalog::new("https://example.org/sounds/")
//!     .with_category("Rain", Category::with_files(["rain.mp3"]).folder("rain-sounds"));
//!
//! let url = catalog.audio_url("Rain", "rain.mp3").unwrap();
//! assert_eq!(url, "https://example.org/sounds/rain-sounds/rain.mp3");
//! ```

#![forbid(unsafe_code)]

pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod storage;
pub mod traits;
pub mod types;

#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use catalog::{Catalog, Category};
pub use config::{LoaderConfig, MixerConfig, SoundflowsConfig, StorageConfig};
pub use error::{Result, SoundflowsError};
pub use events::{Event, EventBus, SubscriptionId};
pub use storage::{open_store, FileStore, KeyValueStore, MemoryStore};
pub use traits::{
    AudioBackend, AudioContext, AudioNode, ConnectionInfo, ContextState, GainNode, IdleScheduler,
    MediaElement, MediaHandle, MediaProbe, NetworkInfo, NoNetworkInfo, NodeId, ProbedMedia,
};
pub use types::TrackRef;
