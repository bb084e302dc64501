//! Deck change notifications
//!
//! Every state change the engine makes observable is published as a
//! [`DeckEvent`]. Subscribers register per [`EventKind`], so a waveform view
//! can follow `PositionUpdated` without waking on every fader move.

use crate::engine::DeckSnapshot;
use crate::types::DeckId;

/// Notification kinds a listener can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    StateChanged,
    PositionUpdated,
    LoadStatusChanged,
}

/// Events published by the deck engine
#[derive(Debug, Clone, PartialEq)]
pub enum DeckEvent {
    /// A deck's observable state changed
    ///
    /// Carries the deck's state after the change. `None` marks an
    /// engine-wide change such as a crossfader move.
    StateChanged { deck: Option<DeckSnapshot> },

    /// A playing deck's position was sampled by the monitor, or a stopped
    /// deck was repositioned
    PositionUpdated { deck: DeckId, position: f64 },

    /// A deck started (`loading = true`) or finished loading a track
    LoadStatusChanged { deck: DeckId, loading: bool },
}

impl DeckEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            DeckEvent::StateChanged { .. } => EventKind::StateChanged,
            DeckEvent::PositionUpdated { .. } => EventKind::PositionUpdated,
            DeckEvent::LoadStatusChanged { .. } => EventKind::LoadStatusChanged,
        }
    }

    /// Deck this event concerns, if any
    pub fn deck_id(&self) -> Option<DeckId> {
        match self {
            DeckEvent::StateChanged { deck } => deck.as_ref().map(|d| d.id),
            DeckEvent::PositionUpdated { deck, .. } => Some(*deck),
            DeckEvent::LoadStatusChanged { deck, .. } => Some(*deck),
        }
    }
}
