//! Audio boundary for Crossdeck
//!
//! The deck engine is written against the [`RenderGraph`] trait and never
//! handles samples itself. This module defines that boundary and ships two
//! collaborators:
//!
//! - **[`SymphoniaDecoder`]**: decodes complete in-memory files into [`PcmTrack`]s
//! - **[`OfflineGraph`]**: a software render graph with a sample-accurate clock
//!
//! # Example Usage
//!
//! ```ignore
//! use crossdeck_core::audio::OfflineGraph;
//! use crossdeck_core::engine::DeckEngine;
//!
//! let graph = OfflineGraph::new(48_000);
//! let mut engine = DeckEngine::new(graph, EngineConfig::default());
//!
//! // Render a block of master output
//! let mut block = StereoBuffer::silence(1024);
//! engine.graph_mut().render(&mut block);
//! engine.tick();
//! ```

mod backend;
mod decode;
mod error;
mod offline;

pub use backend::{AudioTrack, NodeId, RenderGraph, SourceId, TrackDecoder};
pub use decode::{PcmTrack, SymphoniaDecoder};
pub use error::{AudioError, AudioResult, DecodeError};
pub use offline::OfflineGraph;
