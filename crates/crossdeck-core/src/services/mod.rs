//! Change notification for crossdeck hosts
//!
//! The engine publishes [`DeckEvent`]s into an [`EventHub`]; hosts subscribe
//! per [`EventKind`] and receive events on their own channel.
//!
//! ```text
//! ┌─────────────┐   publish    ┌──────────┐   per-kind channels   ┌──────────┐
//! │ DeckEngine  │ ───────────► │ EventHub │ ────────────────────► │ Listener │
//! └─────────────┘              └──────────┘                       └──────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let positions = engine.subscribe(EventKind::PositionUpdated);
//!
//! engine.tick();
//! for event in positions.drain() {
//!     if let DeckEvent::PositionUpdated { deck, position } = event {
//!         println!("{} at {:.2}s", deck, position);
//!     }
//! }
//! ```

pub mod events;
pub mod messages;

pub use events::{EventHub, ListenerId, Subscription, SUBSCRIBER_CAPACITY};
pub use messages::{DeckEvent, EventKind};
