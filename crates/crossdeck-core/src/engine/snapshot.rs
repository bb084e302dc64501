//! Serializable engine state
//!
//! Snapshots are plain values: hosts render them, diff them, or forward them
//! to a reactive store alongside the event stream.

use serde::Serialize;

use crate::types::{DeckId, DeckState};

/// Observable state of one deck at a point in time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeckSnapshot {
    pub id: DeckId,
    pub state: DeckState,
    pub has_track: bool,
    /// Track length in seconds (0 without a track)
    pub duration: f64,
    /// Playback position in seconds
    pub position: f64,
    pub speed: f64,
    pub volume: f32,
    pub crossfade_gain: f32,
    pub is_playing: bool,
    pub is_seeking: bool,
    pub is_track_loading: bool,
}

/// Observable state of the whole engine
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineSnapshot {
    pub decks: Vec<DeckSnapshot>,
    pub crossfade: f64,
    pub master_gain: f32,
    /// Render graph clock in seconds
    pub clock_time: f64,
    pub suspended: bool,
}

impl EngineSnapshot {
    /// Pretty-printed JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self)
            .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize snapshot: {}\"}}", e))
    }

    pub fn deck(&self, id: DeckId) -> Option<&DeckSnapshot> {
        self.decks.iter().find(|d| d.id == id)
    }
}
