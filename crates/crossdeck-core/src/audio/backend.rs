//! Render graph trait for pluggable audio backends
//!
//! The engine never touches samples. It drives a render graph through this
//! trait:
//! - **Gain nodes** chained in series down to a destination
//! - **One-shot sources** bound to a decoded track, started once at an offset,
//!   stopped once
//! - **A monotonic clock** shared by all decks
//! - **A decoder** that turns raw bytes into track handles off the engine thread
//!
//! [`OfflineGraph`](super::OfflineGraph) is the in-process implementation;
//! hosts with a real output device provide their own.

use std::sync::Arc;

use super::error::{AudioResult, DecodeError};

/// Handle to a gain node inside a render graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// Handle to a one-shot render source inside a render graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(pub usize);

/// A decoded track handle
///
/// Handles are cheap to clone; the sample data is shared.
pub trait AudioTrack: Clone + Send + 'static {
    /// Track length in seconds
    fn duration_seconds(&self) -> f64;
}

/// Decodes raw bytes into track handles
///
/// Called from the load worker thread, so implementations must be
/// `Send + Sync`.
pub trait TrackDecoder: Send + Sync + 'static {
    type Track: AudioTrack;

    /// Decode a complete encoded file held in memory
    fn decode(&self, bytes: &[u8]) -> Result<Self::Track, DecodeError>;
}

/// The audio render graph collaborator
///
/// Every method is called from the thread that owns the engine.
pub trait RenderGraph {
    type Track: AudioTrack;
    type Decoder: TrackDecoder<Track = Self::Track>;

    /// Decoder shared with the load worker
    fn decoder(&self) -> Arc<Self::Decoder>;

    /// Current clock time in seconds (monotonic)
    fn now(&self) -> f64;

    /// Whether the output clock is suspended
    fn is_suspended(&self) -> bool;

    /// Resume a suspended output clock (no-op when already running)
    fn resume(&mut self) -> AudioResult<()>;

    /// The final node every chain must reach to be audible
    fn destination(&self) -> NodeId;

    /// Create a gain node with an initial gain
    fn create_gain(&mut self, initial: f32) -> NodeId;

    /// Set a gain node's value
    fn set_gain(&mut self, node: NodeId, value: f32) -> AudioResult<()>;

    /// Read a gain node's value
    fn gain(&self, node: NodeId) -> AudioResult<f32>;

    /// Route `from`'s output into `to`
    fn connect(&mut self, from: NodeId, to: NodeId) -> AudioResult<()>;

    /// Create a one-shot source for `track` feeding `output`
    fn create_source(&mut self, track: &Self::Track, output: NodeId) -> AudioResult<SourceId>;

    /// Start a source at a track-relative offset in seconds
    fn start_source(&mut self, source: SourceId, offset: f64) -> AudioResult<()>;

    /// Change a source's playback-rate multiplier while it runs
    fn set_playback_rate(&mut self, source: SourceId, rate: f64) -> AudioResult<()>;

    /// Stop a source and release it; a stopped source can never restart
    fn stop_source(&mut self, source: SourceId) -> AudioResult<()>;
}
