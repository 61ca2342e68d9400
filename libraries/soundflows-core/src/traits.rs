//! Platform traits
//!
//! Everything the loader and mixer need from the host platform (network
//! media loading, the audio graph, the network information signal, idle-time
//! scheduling) is reached through these traits. Implementations are injected
//! at construction so tests can substitute fakes.

use crate::error::Result;
use async_trait::async_trait;
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// Media loading
// ============================================================================

/// A preloaded media resource (metadata-only audio element, decoder, ...)
pub trait MediaHandle: Send {
    /// Free the underlying network/decoder resource.
    ///
    /// Called when the owning cache evicts the entry. Must be idempotent.
    fn release(&mut self);
}

/// Result of a metadata-only load
pub struct ProbedMedia {
    pub handle: Box<dyn MediaHandle>,
    pub duration: Duration,
}

impl std::fmt::Debug for ProbedMedia {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbedMedia")
            .field("duration", &self.duration)
            .finish_non_exhaustive()
    }
}

/// Loads just enough of a media resource to know its duration and playability
#[async_trait]
pub trait MediaProbe: Send + Sync {
    /// Load metadata for `url`.
    ///
    /// May never settle; callers race it against their own timeout.
    async fn load_metadata(&self, url: &str) -> Result<ProbedMedia>;
}

// ============================================================================
// Network information
// ============================================================================

/// Snapshot of the platform's network information signal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    /// One of `slow-2g`, `2g`, `3g`, `4g`
    pub effective_type: String,
    pub save_data: bool,
}

pub trait NetworkInfo: Send + Sync {
    /// `None` when the platform exposes no network information
    fn connection(&self) -> Option<ConnectionInfo>;
}

/// Network information source for platforms without the signal
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNetworkInfo;

impl NetworkInfo for NoNetworkInfo {
    fn connection(&self) -> Option<ConnectionInfo> {
        None
    }
}

// ============================================================================
// Scheduling
// ============================================================================

/// Runs best-effort background work when the host is idle
pub trait IdleScheduler: Send + Sync {
    fn schedule(&self, job: BoxFuture<'static, ()>);
}

// ============================================================================
// Audio graph
// ============================================================================

/// Identifies a node inside one audio context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

/// Audio context lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContextState {
    Running,
    /// Waiting for a user gesture before output starts
    Suspended,
    Closed,
}

/// Factory for audio contexts
pub trait AudioBackend: Send + Sync {
    /// Create a new audio context.
    ///
    /// Fails when the platform has no compatible implementation.
    fn create_context(&self) -> Result<Box<dyn AudioContext>>;
}

/// An audio processing graph with one output destination
#[async_trait]
pub trait AudioContext: Send {
    fn state(&self) -> ContextState;

    /// Resume a suspended context
    async fn resume(&mut self) -> Result<()>;

    fn close(&mut self);

    /// Context clock in seconds, used to schedule gain automation
    fn current_time(&self) -> f64;

    /// The output node every signal path ends in
    fn destination(&self) -> NodeId;

    fn create_gain(&mut self) -> Result<Box<dyn GainNode>>;

    /// Create a streaming media element for `url`
    fn create_media_element(&mut self, url: &str) -> Result<Box<dyn MediaElement>>;

    /// Create a source node fed by `element`
    fn create_media_source(&mut self, element: &dyn MediaElement) -> Result<Box<dyn AudioNode>>;
}

/// Any node in the graph
pub trait AudioNode: Send {
    fn id(&self) -> NodeId;

    fn connect(&mut self, destination: NodeId);

    /// Disconnect every outgoing connection
    fn disconnect(&mut self);
}

/// Gain node with automatable gain parameter
pub trait GainNode: AudioNode {
    fn value(&self) -> f32;

    fn set_value(&mut self, value: f32);

    fn set_value_at_time(&mut self, value: f32, time: f64);

    fn linear_ramp_to_value_at_time(&mut self, value: f32, end_time: f64);
}

/// Streaming media element backing a mixer track
#[async_trait]
pub trait MediaElement: Send {
    fn id(&self) -> NodeId;

    fn url(&self) -> &str;

    fn set_loop(&mut self, looping: bool);

    /// Start or resume playback from the current position
    async fn play(&mut self) -> Result<()>;

    /// Pause, keeping the current position
    fn pause(&mut self);

    /// Drop the media source so its network/decoder resources are freed
    fn release(&mut self);

    /// Whether playback reached the natural end of the media
    fn has_ended(&self) -> bool;
}
