//! Per-kind fan-out of deck events
//!
//! Each subscription owns its own bounded crossbeam channel. Publishing never
//! blocks the engine: a listener that falls [`SUBSCRIBER_CAPACITY`] events
//! behind misses new events until it drains. Listeners that keep up see every
//! event of their kind, in publish order.

use std::collections::HashMap;

use crossbeam::channel::{self, Receiver, Sender, TrySendError};

use super::messages::{DeckEvent, EventKind};

/// Events queued per subscription before new ones are dropped
pub const SUBSCRIBER_CAPACITY: usize = 1024;

/// Identifies one subscription within an [`EventHub`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// A live subscription to one event kind
///
/// Drain it regularly (or unsubscribe); a full queue drops new events.
/// Dropping the subscription (or its receiver) disconnects it; the hub
/// prunes it on the next publish.
#[derive(Debug)]
pub struct Subscription {
    pub id: ListenerId,
    pub kind: EventKind,
    pub receiver: Receiver<DeckEvent>,
}

impl Subscription {
    /// Take every event currently queued (non-blocking)
    pub fn drain(&self) -> Vec<DeckEvent> {
        self.receiver.try_iter().collect()
    }
}

/// Registry of listeners keyed by event kind
#[derive(Default)]
pub struct EventHub {
    listeners: HashMap<EventKind, Vec<(ListenerId, Sender<DeckEvent>)>>,
    next_id: u64,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for `kind`
    pub fn subscribe(&mut self, kind: EventKind) -> Subscription {
        let id = ListenerId(self.next_id);
        self.next_id += 1;

        let (tx, rx) = channel::bounded(SUBSCRIBER_CAPACITY);
        self.listeners.entry(kind).or_default().push((id, tx));
        log::debug!("EventHub: listener {:?} subscribed to {:?}", id, kind);

        Subscription { id, kind, receiver: rx }
    }

    /// Remove a listener; returns false (and does nothing) if it was not registered
    pub fn unsubscribe(&mut self, kind: EventKind, id: ListenerId) -> bool {
        let Some(list) = self.listeners.get_mut(&kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|(listener, _)| *listener != id);
        before != list.len()
    }

    /// Deliver `event` to every listener of its kind
    pub fn publish(&mut self, event: DeckEvent) {
        let Some(list) = self.listeners.get_mut(&event.kind()) else {
            return;
        };
        list.retain(|(id, tx)| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                log::trace!("EventHub: listener {:?} is full, event dropped", id);
                true
            }
            Err(TrySendError::Disconnected(_)) => {
                log::debug!("EventHub: pruning disconnected listener {:?}", id);
                false
            }
        });
    }

    /// Number of listeners registered for `kind`
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.listeners.get(&kind).map_or(0, Vec::len)
    }
}
