//! Engine-level error type

use thiserror::Error;

use crate::audio::{AudioError, DecodeError};

/// Errors surfaced by [`DeckEngine`](crate::engine::DeckEngine) construction
/// and the background loader
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Audio graph error: {0}")]
    Audio(#[from] AudioError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Failed to spawn track loader: {0}")]
    LoaderSpawn(String),

    /// The loader thread exited and can no longer accept requests
    #[error("Track loader is not running")]
    LoaderStopped,
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
