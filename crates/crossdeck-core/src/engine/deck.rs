//! Deck - one track's timeline and output gains
//!
//! A deck never polls the render clock while it plays. It remembers where in
//! the track playback last (re)started and when, and derives the position
//! from the clock on demand:
//!
//! ```text
//! stopped: position = position_offset
//! playing: position = position_offset + (now - reference_clock_time) * speed
//! ```
//!
//! clamped to `[0, duration]`. A running render source exists exactly while
//! the deck plays, which is why `is_playing` is derived from it rather than
//! stored.

use crate::audio::{AudioTrack, NodeId, RenderGraph, SourceId};
use crate::types::{DeckId, DeckState};

use super::monitor::PositionMonitor;
use super::snapshot::DeckSnapshot;

/// The render source currently playing a deck
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct ActiveSource {
    pub source: SourceId,
    /// Clock time matching `position_offset`
    pub reference_clock_time: f64,
}

/// A single deck
///
/// Transport transitions live in `transport.rs`; this file holds state and
/// the position math.
#[derive(Debug)]
pub struct Deck<T: AudioTrack> {
    pub(super) id: DeckId,
    pub(super) track: Option<T>,
    pub(super) active: Option<ActiveSource>,
    pub(super) volume_node: NodeId,
    pub(super) crossfade_node: NodeId,
    pub(super) speed: f64,
    /// Track position in seconds; authoritative while stopped
    pub(super) position_offset: f64,
    pub(super) is_seeking: bool,
    pub(super) is_track_loading: bool,
    /// Bumped by every load call; only the latest completion is applied
    pub(super) load_generation: u64,
    pub(super) monitor: PositionMonitor,
}

impl<T: AudioTrack> Deck<T> {
    pub(super) fn new(id: DeckId, volume_node: NodeId, crossfade_node: NodeId) -> Self {
        Self {
            id,
            track: None,
            active: None,
            volume_node,
            crossfade_node,
            speed: 1.0,
            position_offset: 0.0,
            is_seeking: false,
            is_track_loading: false,
            load_generation: 0,
            monitor: PositionMonitor::new(),
        }
    }

    pub fn id(&self) -> DeckId {
        self.id
    }

    pub fn track(&self) -> Option<&T> {
        self.track.as_ref()
    }

    pub fn has_track(&self) -> bool {
        self.track.is_some()
    }

    /// Track length in seconds, 0 without a track
    pub fn duration_seconds(&self) -> f64 {
        self.track.as_ref().map_or(0.0, |t| t.duration_seconds())
    }

    /// Position in seconds at clock time `now`
    pub fn position_at(&self, now: f64) -> f64 {
        if self.track.is_none() {
            return 0.0;
        }
        match self.active {
            Some(active) => {
                let elapsed = now - active.reference_clock_time;
                (self.position_offset + elapsed * self.speed).clamp(0.0, self.duration_seconds())
            }
            None => self.position_offset,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.active.is_some()
    }

    pub fn is_seeking(&self) -> bool {
        self.is_seeking
    }

    pub fn is_track_loading(&self) -> bool {
        self.is_track_loading
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn position_offset(&self) -> f64 {
        self.position_offset
    }

    pub fn monitor(&self) -> &PositionMonitor {
        &self.monitor
    }

    pub fn volume_node(&self) -> NodeId {
        self.volume_node
    }

    pub fn crossfade_node(&self) -> NodeId {
        self.crossfade_node
    }

    /// Whether transport commands are accepted (a track is loaded and no
    /// load is pending)
    pub fn is_ready(&self) -> bool {
        self.track.is_some() && !self.is_track_loading
    }

    pub fn state(&self) -> DeckState {
        if self.is_track_loading {
            DeckState::Loading
        } else if self.track.is_none() {
            DeckState::Empty
        } else if self.is_playing() {
            DeckState::Playing
        } else {
            DeckState::Stopped
        }
    }

    pub(super) fn snapshot<G>(&self, graph: &G) -> DeckSnapshot
    where
        G: RenderGraph<Track = T>,
    {
        DeckSnapshot {
            id: self.id,
            state: self.state(),
            has_track: self.has_track(),
            duration: self.duration_seconds(),
            position: self.position_at(graph.now()),
            speed: self.speed,
            volume: graph.gain(self.volume_node).unwrap_or(0.0),
            crossfade_gain: graph.gain(self.crossfade_node).unwrap_or(0.0),
            is_playing: self.is_playing(),
            is_seeking: self.is_seeking,
            is_track_loading: self.is_track_loading,
        }
    }
}
