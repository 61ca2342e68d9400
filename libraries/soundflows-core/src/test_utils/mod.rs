//! Fake platform implementations
//!
//! In-process stand-ins for the browser collaborators so loader and mixer
//! behaviour can be verified without a network or an audio device.

pub mod audio;
pub mod network;
pub mod probe;
pub mod scheduler;

pub use audio::{Automation, ElementRecord, FakeAudioBackend, GainRecord};
pub use network::StaticNetwork;
pub use probe::{FakeProbe, ProbeOutcome};
pub use scheduler::ManualScheduler;
