//! Deck engine configuration
//!
//! Gain staging, crossfader start position and position-monitor tolerance for
//! the deck engine, plus the render settings used by offline hosts.

use serde::{Deserialize, Serialize};

use crate::types::{clamp_gain, NUM_DECKS, SAMPLE_RATE};

/// Deck engine configuration
///
/// Every field has a default, so a partial YAML file is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Gain of the master bus all decks feed into
    /// Leaves headroom for two decks summed at full volume.
    /// Default: 0.25
    pub master_gain: f32,

    /// Crossfader position applied at startup (0.0 = deck A, 1.0 = deck B)
    /// Default: 0.5 (both decks at equal power)
    pub initial_crossfade: f64,

    /// Volume fader position of a freshly created deck
    /// Default: 1.0
    pub default_volume: f32,

    /// How close to the end (seconds) a playing deck may get before the
    /// position monitor treats the track as finished
    /// Default: 0.01
    pub end_tolerance: f64,

    /// Number of decks created at startup
    /// Default: 2
    pub deck_count: usize,

    /// Output sample rate for offline rendering
    /// Default: 48000 Hz
    pub sample_rate: u32,

    /// Frames rendered per block (one monitor tick per block)
    /// Default: 1024
    pub block_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            master_gain: 0.25,
            initial_crossfade: 0.5,
            default_volume: 1.0,
            end_tolerance: 0.01,
            deck_count: NUM_DECKS,
            sample_rate: SAMPLE_RATE,
            block_size: 1024,
        }
    }
}

impl EngineConfig {
    /// Return a copy with every value forced into its valid range
    ///
    /// Hand-edited files can carry anything; out-of-range values are pulled
    /// back rather than rejected.
    pub fn sanitized(&self) -> Self {
        let sanitized = Self {
            master_gain: clamp_gain(self.master_gain),
            initial_crossfade: if self.initial_crossfade.is_nan() {
                0.5
            } else {
                self.initial_crossfade.clamp(0.0, 1.0)
            },
            default_volume: clamp_gain(self.default_volume),
            end_tolerance: if self.end_tolerance.is_finite() {
                self.end_tolerance.max(0.0)
            } else {
                0.0
            },
            deck_count: self.deck_count,
            sample_rate: self.sample_rate.max(1),
            block_size: self.block_size.max(1),
        };

        if &sanitized != self {
            log::warn!("EngineConfig: out-of-range values adjusted: {:?}", sanitized);
        }
        sanitized
    }
}
