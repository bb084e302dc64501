//! Render configuration for crossdeck-render
//!
//! Stored as YAML in the user's config directory.
//! Default location: ~/.config/crossdeck/render.yaml

use std::path::PathBuf;

use crossdeck_core::config::{default_config_path, EngineConfig};
use serde::{Deserialize, Serialize};

/// Config file name under the crossdeck config directory
pub const CONFIG_FILE: &str = "render.yaml";

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Deck engine settings (gains, tolerances, sample rate, block size)
    pub engine: EngineConfig,
    /// Mix layout
    pub mix: MixConfig,
}

/// Mix layout section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixConfig {
    /// Length of the rendered mix in seconds
    /// Default: 30.0
    pub seconds: f64,
    /// Where the crossfader leaves deck A, as a fraction of the mix
    /// Default: 0.25
    pub fade_start: f64,
    /// Where the crossfader reaches deck B, as a fraction of the mix
    /// Default: 0.75
    pub fade_end: f64,
    /// Output WAV path
    /// Default: crossdeck-mix.wav
    pub output: PathBuf,
}

impl Default for MixConfig {
    fn default() -> Self {
        Self {
            seconds: 30.0,
            fade_start: 0.25,
            fade_end: 0.75,
            output: PathBuf::from("crossdeck-mix.wav"),
        }
    }
}

impl MixConfig {
    /// Crossfader position at `time` seconds into the mix
    ///
    /// Holds deck A until `fade_start`, sweeps linearly to deck B by
    /// `fade_end`, then holds deck B.
    pub fn crossfade_at(&self, time: f64) -> f64 {
        let start = self.fade_start.clamp(0.0, 1.0) * self.seconds;
        let end = self.fade_end.clamp(0.0, 1.0) * self.seconds;
        if end <= start {
            return if time < start { 0.0 } else { 1.0 };
        }
        ((time - start) / (end - start)).clamp(0.0, 1.0)
    }
}

/// Get the default config file path
///
/// Returns: ~/.config/crossdeck/render.yaml
pub fn config_path() -> PathBuf {
    default_config_path(CONFIG_FILE)
}
