//! Render graph and decoder error types

use thiserror::Error;

use super::backend::{NodeId, SourceId};

/// Errors reported by a render graph
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AudioError {
    /// Gain node handle not created by this graph
    #[error("Unknown gain node: {0:?}")]
    UnknownNode(NodeId),

    /// Source handle not created by this graph, or already stopped and released
    #[error("Unknown render source: {0:?}")]
    UnknownSource(SourceId),

    /// Render sources are single-use: started at most once
    #[error("Render source {0:?} was already started")]
    SourceAlreadyStarted(SourceId),

    /// Stop requested on a source that never started
    #[error("Render source {0:?} was never started")]
    SourceNotStarted(SourceId),

    /// Node would feed itself or route out of the destination
    #[error("Invalid connection: {from:?} -> {to:?}")]
    InvalidConnection { from: NodeId, to: NodeId },

    /// The output clock could not be resumed
    #[error("Failed to resume audio output: {0}")]
    ResumeFailed(String),
}

/// Errors that can occur while decoding track bytes
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// Container or codec not recognised
    #[error("Unsupported audio data: {0}")]
    Unsupported(String),

    /// Container parsed but holds no decodable audio track
    #[error("No audio track found")]
    NoAudioTrack,

    /// Stream header is missing required parameters
    #[error("Missing stream parameter: {0}")]
    MissingParameter(&'static str),

    /// Decoding produced no audio frames
    #[error("Decoded track is empty")]
    Empty,

    /// The decoder panicked on this input
    #[error("Decoder panicked: {0}")]
    Panicked(String),
}

/// Result type for render graph operations
pub type AudioResult<T> = Result<T, AudioError>;
