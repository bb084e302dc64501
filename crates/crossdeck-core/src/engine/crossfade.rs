//! Equal-power crossfader law
//!
//! Deck A follows `cos(v·π/2)` and deck B `cos((1−v)·π/2)`, so
//! `gain_a² + gain_b² = 1` at every fader position and perceived loudness
//! stays constant through the fade.

use std::f64::consts::FRAC_PI_2;

/// Crossfader position used when none has been set
pub const CENTER: f64 = 0.5;

/// Clamp a fader position to `[0.0, 1.0]` (NaN maps to center)
pub fn clamp_position(value: f64) -> f64 {
    if value.is_nan() {
        CENTER
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Gains for decks A and B at crossfader position `value`
///
/// `value` is clamped first: 0.0 is full deck A, 1.0 is full deck B.
pub fn crossfade_gains(value: f64) -> (f32, f32) {
    let value = clamp_position(value);
    let gain_a = (value * FRAC_PI_2).cos();
    let gain_b = ((1.0 - value) * FRAC_PI_2).cos();
    (gain_a as f32, gain_b as f32)
}
