//! Background loading for crossdeck decks
//!
//! Decoding a full track takes far longer than a UI frame, so it happens on
//! the [`TrackLoader`] thread. The engine queues [`LoadRequest`]s and polls
//! [`LoadResult`]s from `DeckEngine::tick`.

mod track;

pub use track::{LoadRequest, LoadResult, LoaderCommand, TrackLoader};
