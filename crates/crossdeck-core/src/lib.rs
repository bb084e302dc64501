//! Crossdeck Core - dual-deck playback engine for DJ-style mixing

pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod loader;
pub mod services;
pub mod types;

#[cfg(test)]
mod test_support;

pub use error::{EngineError, EngineResult};
pub use types::*;
