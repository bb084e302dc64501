//! Lock-free command queue for driving the engine from another thread
//!
//! The engine is a single-owner value. A host whose controls live on a
//! different thread (UI, MIDI, network) pushes [`EngineCommand`]s into an
//! `rtrb` ring buffer, and the engine thread drains it with
//! [`DeckEngine::process_commands`](super::DeckEngine::process_commands)
//! before each tick. Push and pop are wait-free and never allocate.
//!
//! # Usage
//!
//! ```ignore
//! // At startup
//! let (mut tx, mut rx) = command_channel();
//!
//! // Control thread
//! tx.push(EngineCommand::TogglePlay { deck: DeckId::A })?;
//!
//! // Engine thread, once per frame
//! engine.process_commands(&mut rx);
//! engine.tick();
//! ```

use crate::types::DeckId;

/// Commands sent to the engine thread
///
/// Each variant maps to one public [`DeckEngine`](super::DeckEngine)
/// operation and is applied in the order pushed.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    /// Load an encoded file onto a deck (decoded in the background)
    Load { deck: DeckId, bytes: Vec<u8> },
    TogglePlay { deck: DeckId },
    /// Seek to a position in seconds
    Seek { deck: DeckId, position: f64 },
    SetVolume { deck: DeckId, volume: f32 },
    SetSpeed { deck: DeckId, speed: f64 },
    /// Crossfader position (0.0 = deck A, 1.0 = deck B)
    SetCrossfade { value: f64 },
}

/// Ring buffer capacity in commands
pub const COMMAND_QUEUE_CAPACITY: usize = 256;

/// Create a new command channel (producer/consumer pair)
///
/// The producer belongs to the control thread, the consumer to the thread
/// owning the engine.
pub fn command_channel() -> (rtrb::Producer<EngineCommand>, rtrb::Consumer<EngineCommand>) {
    rtrb::RingBuffer::new(COMMAND_QUEUE_CAPACITY)
}
