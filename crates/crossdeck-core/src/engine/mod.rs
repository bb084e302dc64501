//! Deck engine - decks, transport, crossfader, position monitoring
//!
//! This module contains the core of crossdeck:
//! - Deck: one track's timeline, derived position and gain nodes
//! - Transport: load/play/pause/seek/speed transitions on a deck
//! - Crossfade: the equal-power law driving decks A and B
//! - PositionMonitor: per-deck frame-tick sampling and end detection
//! - DeckEngine: owns graph, decks and loader, publishes change events

mod command;
mod crossfade;
mod deck;
mod engine;
mod monitor;
mod snapshot;
mod transport;

pub use command::{command_channel, EngineCommand, COMMAND_QUEUE_CAPACITY};
pub use crossfade::{clamp_position, crossfade_gains};
pub use deck::Deck;
pub use engine::DeckEngine;
pub use monitor::PositionMonitor;
pub use snapshot::{DeckSnapshot, EngineSnapshot};
