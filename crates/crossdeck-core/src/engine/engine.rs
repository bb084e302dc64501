//! Main deck engine - ties together decks, crossfader, loader and events

use std::time::{Duration, Instant};

use crate::audio::{NodeId, RenderGraph};
use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::loader::{LoadRequest, LoadResult, TrackLoader};
use crate::services::{DeckEvent, EventHub, EventKind, ListenerId, Subscription};
use crate::types::{clamp_gain, DeckId};

use super::command::EngineCommand;
use super::crossfade::{clamp_position, crossfade_gains};
use super::deck::Deck;
use super::snapshot::{DeckSnapshot, EngineSnapshot};
use super::transport::MonitorSample;

/// Number of decks that participate in the crossfade law
const CROSSFADE_DECKS: usize = 2;

/// The deck engine
///
/// Owns the render graph, every deck and the background loader. Signal flow
/// per deck:
///
/// ```text
/// source ─► volume ─► crossfade ─┐
/// source ─► volume ─► crossfade ─┼─► master ─► destination
/// ```
///
/// All mutation goes through `&mut self`, so operations on one engine are
/// serialised by construction. Hosts call [`tick`](Self::tick) once per frame
/// to apply finished loads and run the position monitors.
pub struct DeckEngine<G: RenderGraph> {
    graph: G,
    config: EngineConfig,
    decks: Vec<Deck<G::Track>>,
    master_node: NodeId,
    /// Crossfader position in [0, 1]
    crossfade: f64,
    events: EventHub,
    loader: TrackLoader<G::Decoder>,
}

impl<G: RenderGraph> DeckEngine<G> {
    /// Build the master bus and the configured decks, and start the loader
    pub fn new(mut graph: G, config: EngineConfig) -> EngineResult<Self> {
        let config = config.sanitized();

        let master_node = graph.create_gain(config.master_gain);
        let destination = graph.destination();
        graph.connect(master_node, destination)?;

        let loader = TrackLoader::spawn(graph.decoder())?;

        let mut engine = Self {
            graph,
            decks: Vec::with_capacity(config.deck_count),
            master_node,
            crossfade: clamp_position(config.initial_crossfade),
            events: EventHub::new(),
            loader,
            config,
        };

        for _ in 0..engine.config.deck_count {
            engine.add_deck()?;
        }
        engine.apply_crossfade(engine.config.initial_crossfade);

        log::info!(
            "DeckEngine started: {} decks, master gain {:.2}, crossfade {:.2}",
            engine.decks.len(),
            engine.config.master_gain,
            engine.crossfade
        );
        Ok(engine)
    }

    /// Create another deck wired into the master bus
    ///
    /// Only the first two decks follow the crossfader; later decks keep a
    /// crossfade gain of 1.
    pub fn add_deck(&mut self) -> EngineResult<DeckId> {
        let id = DeckId(self.decks.len());

        let volume = self.graph.create_gain(self.config.default_volume);
        let crossfade = self.graph.create_gain(1.0);
        self.graph.connect(volume, crossfade)?;
        self.graph.connect(crossfade, self.master_node)?;

        self.decks.push(Deck::new(id, volume, crossfade));
        if id.0 < CROSSFADE_DECKS {
            self.apply_crossfade(self.crossfade);
        }

        log::debug!("Created {}", id);
        Ok(id)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Transport
    // ─────────────────────────────────────────────────────────────────────

    /// Load an encoded file onto a deck
    ///
    /// The deck stops and shows as loading immediately; decoding happens on
    /// the loader thread and is applied by a later [`tick`](Self::tick) or
    /// [`wait_for_loads`](Self::wait_for_loads). A successful load starts
    /// playback from 0. Failures are logged and leave the deck empty.
    ///
    /// Calling `load` again before the first finishes supersedes it.
    pub fn load(&mut self, deck: DeckId, bytes: Vec<u8>) {
        let Some(generation) = self.with_deck(deck, "load", |d, graph| d.begin_load(graph)) else {
            return;
        };
        log::info!("{}: loading {} bytes", deck, bytes.len());

        let request = LoadRequest { deck, generation, bytes };
        if let Err(e) = self.loader.request(request) {
            log::error!("{}: cannot queue load: {}", deck, e);
            self.abort_load(deck);
            return;
        }

        self.events.publish(DeckEvent::LoadStatusChanged { deck, loading: true });
        self.publish_state(deck);
    }

    /// Play a stopped deck or pause a playing one
    pub fn toggle_play_pause(&mut self, deck: DeckId) {
        if self.with_deck(deck, "toggle_play_pause", |d, graph| d.toggle(graph)).is_some() {
            self.publish_state(deck);
        }
    }

    /// Move a deck to `position` seconds (clamped to the track)
    pub fn seek(&mut self, deck: DeckId, position: f64) {
        let ready = self
            .with_deck(deck, "seek", |d, _| {
                let ready = d.is_ready();
                if ready {
                    d.is_seeking = true;
                }
                ready
            })
            .unwrap_or(false);
        if !ready {
            return;
        }
        self.publish_state(deck);

        let stopped_at = self
            .with_deck(deck, "seek", |d, graph| {
                d.seek(graph, position);
                d.is_seeking = false;
                (!d.is_playing()).then_some(d.position_offset)
            })
            .flatten();

        if let Some(position) = stopped_at {
            self.events.publish(DeckEvent::PositionUpdated { deck, position });
        }
        self.publish_state(deck);
    }

    /// Set a deck's volume fader (clamped to [0, 1])
    pub fn set_volume(&mut self, deck: DeckId, volume: f32) {
        let volume = clamp_gain(volume);
        let applied = self.with_deck(deck, "set_volume", |d, graph| {
            if let Err(e) = graph.set_gain(d.volume_node, volume) {
                log::error!("{}: failed to set volume: {}", d.id, e);
            }
        });
        if applied.is_some() {
            self.publish_state(deck);
        }
    }

    /// Set a deck's playback speed multiplier (must be finite and positive)
    pub fn set_speed(&mut self, deck: DeckId, speed: f64) {
        if let Some(true) = self.with_deck(deck, "set_speed", |d, graph| d.set_speed(graph, speed)) {
            self.publish_state(deck);
        }
    }

    /// Move the crossfader (0.0 = deck A only, 1.0 = deck B only)
    pub fn set_crossfade(&mut self, value: f64) {
        self.apply_crossfade(value);
        self.events.publish(DeckEvent::StateChanged { deck: None });
    }

    fn apply_crossfade(&mut self, value: f64) {
        self.crossfade = clamp_position(value);
        let (gain_a, gain_b) = crossfade_gains(self.crossfade);

        for (deck, gain) in self.decks.iter().take(CROSSFADE_DECKS).zip([gain_a, gain_b]) {
            if let Err(e) = self.graph.set_gain(deck.crossfade_node, gain) {
                log::error!("{}: failed to set crossfade gain: {}", deck.id, e);
            }
        }
    }

    /// Apply one queued command
    pub fn apply(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::Load { deck, bytes } => self.load(deck, bytes),
            EngineCommand::TogglePlay { deck } => self.toggle_play_pause(deck),
            EngineCommand::Seek { deck, position } => self.seek(deck, position),
            EngineCommand::SetVolume { deck, volume } => self.set_volume(deck, volume),
            EngineCommand::SetSpeed { deck, speed } => self.set_speed(deck, speed),
            EngineCommand::SetCrossfade { value } => self.set_crossfade(value),
        }
    }

    /// Drain and apply every pending command
    pub fn process_commands(&mut self, commands: &mut rtrb::Consumer<EngineCommand>) {
        while let Ok(command) = commands.pop() {
            self.apply(command);
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Frame loop
    // ─────────────────────────────────────────────────────────────────────

    /// Run one frame: apply finished loads, then sample every running
    /// position monitor and handle playback end
    pub fn tick(&mut self) {
        self.poll_loads();

        let end_tolerance = self.config.end_tolerance;
        for index in 0..self.decks.len() {
            let deck = DeckId(index);
            let sample = self
                .with_deck(deck, "tick", |d, graph| d.monitor_tick(graph, end_tolerance))
                .unwrap_or(MonitorSample::Idle);

            match sample {
                MonitorSample::Idle => {}
                MonitorSample::Position(position) => {
                    self.events.publish(DeckEvent::PositionUpdated { deck, position });
                }
                MonitorSample::Ended(duration) => {
                    self.events.publish(DeckEvent::PositionUpdated { deck, position: duration });
                    self.publish_state(deck);
                }
            }
        }
    }

    /// Block until every pending load has been applied, or `timeout` passes
    ///
    /// Returns true if no deck is left loading.
    pub fn wait_for_loads(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.poll_loads();
            if !self.decks.iter().any(|d| d.is_track_loading) {
                return true;
            }
            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                return false;
            };
            match self.loader.recv_timeout(remaining) {
                Some(result) => self.complete_load(result),
                None => return !self.decks.iter().any(|d| d.is_track_loading),
            }
        }
    }

    /// Apply finished loads; if the loader has died, fail what is left
    fn poll_loads(&mut self) {
        let loader_running = self.loader.is_running();
        while let Some(result) = self.loader.try_recv() {
            self.complete_load(result);
        }
        if !loader_running {
            self.fail_pending_loads();
        }
    }

    /// Abort every deck still waiting on a load; returns how many were aborted
    fn fail_pending_loads(&mut self) -> usize {
        let pending: Vec<DeckId> = self
            .decks
            .iter()
            .filter(|d| d.is_track_loading)
            .map(|d| d.id)
            .collect();
        for &deck in &pending {
            log::error!("{}: track loader stopped, load abandoned", deck);
            self.abort_load(deck);
        }
        pending.len()
    }

    /// Leave Loading without a result and tell listeners
    fn abort_load(&mut self, deck: DeckId) {
        if self.with_deck(deck, "abort_load", |d, graph| d.abort_load(graph)).is_some() {
            self.events.publish(DeckEvent::LoadStatusChanged { deck, loading: false });
            self.publish_state(deck);
        }
    }

    fn complete_load(&mut self, result: LoadResult<G::Track>) {
        let LoadResult { deck, generation, result } = result;
        let applied = self.with_deck(deck, "complete_load", |d, graph| {
            if generation != d.load_generation {
                log::debug!(
                    "{}: discarding superseded load (generation {} < {})",
                    d.id,
                    generation,
                    d.load_generation
                );
                return false;
            }
            d.complete_load(graph, result);
            true
        });

        if applied == Some(true) {
            self.events.publish(DeckEvent::LoadStatusChanged { deck, loading: false });
            self.publish_state(deck);
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────

    /// Current position in seconds (0 for an unknown deck)
    pub fn playback_time(&self, deck: DeckId) -> f64 {
        let now = self.graph.now();
        self.deck(deck).map_or(0.0, |d| d.position_at(now))
    }

    /// Track length in seconds (0 without a track or for an unknown deck)
    pub fn duration(&self, deck: DeckId) -> f64 {
        self.deck(deck).map_or(0.0, |d| d.duration_seconds())
    }

    pub fn volume(&self, deck: DeckId) -> f32 {
        self.deck(deck)
            .and_then(|d| self.graph.gain(d.volume_node).ok())
            .unwrap_or(0.0)
    }

    pub fn crossfade_gain(&self, deck: DeckId) -> f32 {
        self.deck(deck)
            .and_then(|d| self.graph.gain(d.crossfade_node).ok())
            .unwrap_or(0.0)
    }

    pub fn speed(&self, deck: DeckId) -> f64 {
        self.deck(deck).map_or(1.0, |d| d.speed)
    }

    /// Crossfader position in [0, 1]
    pub fn crossfade(&self) -> f64 {
        self.crossfade
    }

    pub fn is_playing(&self, deck: DeckId) -> bool {
        self.deck(deck).is_some_and(|d| d.is_playing())
    }

    pub fn is_seeking(&self, deck: DeckId) -> bool {
        self.deck(deck).is_some_and(|d| d.is_seeking)
    }

    pub fn is_track_loading(&self, deck: DeckId) -> bool {
        self.deck(deck).is_some_and(|d| d.is_track_loading)
    }

    pub fn has_track(&self, deck: DeckId) -> bool {
        self.deck(deck).is_some_and(|d| d.has_track())
    }

    pub fn deck(&self, deck: DeckId) -> Option<&Deck<G::Track>> {
        self.decks.get(deck.0)
    }

    pub fn deck_ids(&self) -> Vec<DeckId> {
        self.decks.iter().map(|d| d.id).collect()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }

    /// Mutable access to the render graph (for hosts that render or suspend it)
    pub fn graph_mut(&mut self) -> &mut G {
        &mut self.graph
    }

    pub fn deck_snapshot(&self, deck: DeckId) -> Option<DeckSnapshot> {
        self.deck(deck).map(|d| d.snapshot(&self.graph))
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            decks: self.decks.iter().map(|d| d.snapshot(&self.graph)).collect(),
            crossfade: self.crossfade,
            master_gain: self.graph.gain(self.master_node).unwrap_or(0.0),
            clock_time: self.graph.now(),
            suspended: self.graph.is_suspended(),
        }
    }

    /// Full engine state as pretty JSON
    pub fn debug_report(&self) -> String {
        self.snapshot().to_json()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Notifications
    // ─────────────────────────────────────────────────────────────────────

    pub fn subscribe(&mut self, kind: EventKind) -> Subscription {
        self.events.subscribe(kind)
    }

    /// Remove a listener; unknown listeners are ignored
    pub fn unsubscribe(&mut self, kind: EventKind, id: ListenerId) {
        self.events.unsubscribe(kind, id);
    }

    fn publish_state(&mut self, deck: DeckId) {
        let snapshot = self.deck_snapshot(deck);
        self.events.publish(DeckEvent::StateChanged { deck: snapshot });
    }

    /// Run `op` on a deck with the graph borrowed alongside it
    ///
    /// Unknown decks are logged and skipped.
    fn with_deck<R>(
        &mut self,
        deck: DeckId,
        operation: &str,
        op: impl FnOnce(&mut Deck<G::Track>, &mut G) -> R,
    ) -> Option<R> {
        match self.decks.get_mut(deck.0) {
            Some(d) => Some(op(d, &mut self.graph)),
            None => {
                log::debug!("{}: ignoring unknown {}", operation, deck);
                None
            }
        }
    }
}

impl<G: RenderGraph> Drop for DeckEngine<G> {
    fn drop(&mut self) {
        let now = self.graph.now();
        for deck in &mut self.decks {
            if deck.is_playing() {
                let position = deck.position_at(now);
                deck.stop_at(&mut self.graph, position);
            }
        }
        log::info!("DeckEngine shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::OfflineGraph;
    use crate::engine::command_channel;
    use crate::test_support::{
        assert_close, load_and_wait, test_engine, wav_bytes, PanickingGraph, PANIC_BYTES,
        TEST_RATE,
    };
    use crate::types::DeckState;

    const WAIT: Duration = Duration::from_secs(10);

    #[test]
    fn test_initial_state() {
        let engine = test_engine();
        assert_eq!(engine.deck_ids(), vec![DeckId::A, DeckId::B]);
        assert_eq!(engine.crossfade(), 0.5);

        let center = std::f32::consts::FRAC_1_SQRT_2;
        for deck in engine.deck_ids() {
            assert_eq!(engine.volume(deck), 1.0);
            assert_eq!(engine.speed(deck), 1.0);
            assert!((engine.crossfade_gain(deck) - center).abs() < 1e-6);
            assert!(!engine.has_track(deck));
            assert_eq!(engine.playback_time(deck), 0.0);
        }
        assert_eq!(engine.snapshot().master_gain, 0.25);
    }

    #[test]
    fn test_load_autoplay_pause_resume() {
        let mut engine = test_engine();
        load_and_wait(&mut engine, DeckId::A, 120.0);

        assert!(engine.is_playing(DeckId::A));
        assert!(!engine.is_track_loading(DeckId::A));
        assert_close(engine.duration(DeckId::A), 120.0);

        engine.graph_mut().advance(5.0);
        assert_close(engine.playback_time(DeckId::A), 5.0);

        engine.toggle_play_pause(DeckId::A);
        assert!(!engine.is_playing(DeckId::A));
        engine.graph_mut().advance(2.0);
        assert_close(engine.playback_time(DeckId::A), 5.0);

        engine.toggle_play_pause(DeckId::A);
        engine.graph_mut().advance(3.0);
        assert_close(engine.playback_time(DeckId::A), 8.0);
    }

    #[test]
    fn test_seek_while_playing_keeps_playing() {
        let mut engine = test_engine();
        load_and_wait(&mut engine, DeckId::A, 120.0);
        engine.graph_mut().advance(1.0);

        engine.seek(DeckId::A, 30.0);
        assert_close(engine.playback_time(DeckId::A), 30.0);
        assert!(engine.is_playing(DeckId::A));
        assert!(!engine.is_seeking(DeckId::A));
        assert_eq!(engine.graph().playing_source_count(), 1);

        engine.graph_mut().advance(5.0);
        assert_close(engine.playback_time(DeckId::A), 35.0);
    }

    #[test]
    fn test_seek_clamps_to_track() {
        let mut engine = test_engine();
        load_and_wait(&mut engine, DeckId::A, 20.0);
        engine.toggle_play_pause(DeckId::A);

        engine.seek(DeckId::A, -10.0);
        assert_eq!(engine.playback_time(DeckId::A), 0.0);

        engine.seek(DeckId::A, 120.0);
        assert_close(engine.playback_time(DeckId::A), 20.0);
    }

    #[test]
    fn test_toggle_twice_returns_to_offset() {
        let mut engine = test_engine();
        load_and_wait(&mut engine, DeckId::A, 60.0);
        engine.graph_mut().advance(4.0);
        engine.toggle_play_pause(DeckId::A);
        let offset = engine.playback_time(DeckId::A);

        engine.toggle_play_pause(DeckId::A);
        engine.toggle_play_pause(DeckId::A);
        assert_close(engine.playback_time(DeckId::A), offset);
        assert!(!engine.is_playing(DeckId::A));
    }

    #[test]
    fn test_position_advances_by_elapsed_times_speed() {
        let mut engine = test_engine();
        load_and_wait(&mut engine, DeckId::A, 60.0);
        engine.toggle_play_pause(DeckId::A);
        engine.set_speed(DeckId::A, 0.5);
        engine.toggle_play_pause(DeckId::A);

        let before = engine.playback_time(DeckId::A);
        engine.graph_mut().advance(4.0);
        assert_close(engine.playback_time(DeckId::A) - before, 2.0);
    }

    #[test]
    fn test_speed_change_is_continuous() {
        let mut engine = test_engine();
        load_and_wait(&mut engine, DeckId::A, 120.0);
        engine.graph_mut().advance(10.0);

        engine.set_speed(DeckId::A, 1.2);
        assert_close(engine.playback_time(DeckId::A), 10.0);
        assert_eq!(engine.speed(DeckId::A), 1.2);

        engine.graph_mut().advance(5.0);
        assert_close(engine.playback_time(DeckId::A), 16.0);
    }

    #[test]
    fn test_short_track_ends_at_duration() {
        let mut engine = test_engine();
        let ends = engine.subscribe(EventKind::PositionUpdated);
        load_and_wait(&mut engine, DeckId::A, 0.1);
        assert!(engine.is_playing(DeckId::A));

        engine.graph_mut().advance(0.2);
        engine.tick();

        assert!(!engine.is_playing(DeckId::A));
        assert_eq!(engine.playback_time(DeckId::A), engine.duration(DeckId::A));
        assert_eq!(engine.graph().playing_source_count(), 0);
        assert!(!engine.deck(DeckId::A).unwrap().monitor().is_running());

        let last = ends.drain().pop().unwrap();
        assert_eq!(
            last,
            DeckEvent::PositionUpdated { deck: DeckId::A, position: engine.duration(DeckId::A) }
        );
    }

    #[test]
    fn test_last_load_wins() {
        let mut engine = test_engine();
        engine.load(DeckId::A, wav_bytes(TEST_RATE, 3.0, 2));
        engine.load(DeckId::A, wav_bytes(TEST_RATE, 7.0, 2));
        assert!(engine.is_track_loading(DeckId::A));

        assert!(engine.wait_for_loads(WAIT));
        assert_close(engine.duration(DeckId::A), 7.0);
        assert!(engine.is_playing(DeckId::A));
        assert_eq!(engine.graph().playing_source_count(), 1);
    }

    #[test]
    fn test_load_stops_playing_deck() {
        let mut engine = test_engine();
        load_and_wait(&mut engine, DeckId::A, 30.0);

        engine.load(DeckId::A, wav_bytes(TEST_RATE, 10.0, 2));
        assert!(!engine.is_playing(DeckId::A));
        assert_eq!(engine.graph().playing_source_count(), 0);
        assert_eq!(engine.deck(DeckId::A).unwrap().state(), DeckState::Loading);

        // Transport is refused while loading
        engine.toggle_play_pause(DeckId::A);
        engine.seek(DeckId::A, 5.0);
        assert!(!engine.is_playing(DeckId::A));
        assert_eq!(engine.playback_time(DeckId::A), 0.0);

        assert!(engine.wait_for_loads(WAIT));
        assert_close(engine.duration(DeckId::A), 10.0);
    }

    #[test]
    fn test_decode_failure_clears_track() {
        let mut engine = test_engine();
        load_and_wait(&mut engine, DeckId::B, 5.0);
        let loads = engine.subscribe(EventKind::LoadStatusChanged);

        engine.load(DeckId::B, b"not an audio file".to_vec());
        assert!(engine.wait_for_loads(WAIT));

        assert!(!engine.has_track(DeckId::B));
        assert!(!engine.is_track_loading(DeckId::B));
        assert!(!engine.is_playing(DeckId::B));
        assert_eq!(engine.duration(DeckId::B), 0.0);
        assert_eq!(
            loads.drain(),
            vec![
                DeckEvent::LoadStatusChanged { deck: DeckId::B, loading: true },
                DeckEvent::LoadStatusChanged { deck: DeckId::B, loading: false },
            ]
        );
    }

    #[test]
    fn test_decoder_panic_fails_load() {
        let graph = PanickingGraph::new(TEST_RATE);
        let mut engine = DeckEngine::new(graph, EngineConfig::default()).unwrap();
        let loads = engine.subscribe(EventKind::LoadStatusChanged);

        engine.load(DeckId::A, PANIC_BYTES.to_vec());
        let deadline = Instant::now() + WAIT;
        while engine.is_track_loading(DeckId::A) && Instant::now() < deadline {
            engine.tick();
            std::thread::sleep(Duration::from_millis(5));
        }

        assert!(!engine.is_track_loading(DeckId::A));
        assert!(!engine.has_track(DeckId::A));
        assert_eq!(
            loads.drain(),
            vec![
                DeckEvent::LoadStatusChanged { deck: DeckId::A, loading: true },
                DeckEvent::LoadStatusChanged { deck: DeckId::A, loading: false },
            ]
        );

        // The loader keeps serving later loads
        engine.load(DeckId::A, wav_bytes(TEST_RATE, 2.0, 2));
        assert!(engine.wait_for_loads(WAIT));
        assert_close(engine.duration(DeckId::A), 2.0);
        assert!(engine.is_playing(DeckId::A));
    }

    #[test]
    fn test_load_refused_by_stopped_loader() {
        let mut engine = test_engine();
        engine.loader.shutdown();
        let loads = engine.subscribe(EventKind::LoadStatusChanged);
        let states = engine.subscribe(EventKind::StateChanged);

        engine.load(DeckId::A, wav_bytes(TEST_RATE, 1.0, 2));

        assert!(!engine.is_track_loading(DeckId::A));
        assert_eq!(engine.deck(DeckId::A).unwrap().state(), DeckState::Empty);
        assert_eq!(
            loads.drain(),
            vec![DeckEvent::LoadStatusChanged { deck: DeckId::A, loading: false }]
        );
        assert!(!states.drain().is_empty());
        assert!(engine.wait_for_loads(WAIT));
    }

    #[test]
    fn test_stopped_loader_abandons_pending_loads() {
        let mut engine = test_engine();
        let generation = engine.with_deck(DeckId::B, "load", |d, graph| d.begin_load(graph));
        assert_eq!(generation, Some(1));
        engine.loader.shutdown();
        let loads = engine.subscribe(EventKind::LoadStatusChanged);

        engine.tick();
        assert!(!engine.is_track_loading(DeckId::B));
        assert!(!engine.has_track(DeckId::B));
        assert_eq!(
            loads.drain(),
            vec![DeckEvent::LoadStatusChanged { deck: DeckId::B, loading: false }]
        );

        engine.tick();
        assert!(loads.drain().is_empty());
        assert_eq!(engine.fail_pending_loads(), 0);
    }

    #[test]
    fn test_result_decoded_before_loader_stops_is_applied() {
        let mut engine = test_engine();
        engine.load(DeckId::A, wav_bytes(TEST_RATE, 2.0, 2));
        // Shutdown is queued behind the load, so the decode finishes first
        engine.loader.shutdown();

        engine.tick();
        assert!(!engine.is_track_loading(DeckId::A));
        assert!(engine.has_track(DeckId::A));
        assert!(engine.is_playing(DeckId::A));
    }

    #[test]
    fn test_unknown_deck_is_ignored() {
        let mut engine = test_engine();
        let states = engine.subscribe(EventKind::StateChanged);
        let ghost = DeckId(7);

        engine.load(ghost, wav_bytes(TEST_RATE, 1.0, 2));
        engine.toggle_play_pause(ghost);
        engine.seek(ghost, 3.0);
        engine.set_volume(ghost, 0.5);
        engine.set_speed(ghost, 2.0);
        assert!(engine.wait_for_loads(WAIT));

        assert_eq!(engine.playback_time(ghost), 0.0);
        assert_eq!(engine.duration(ghost), 0.0);
        assert_eq!(engine.volume(ghost), 0.0);
        assert_eq!(engine.speed(ghost), 1.0);
        assert_eq!(engine.crossfade_gain(ghost), 0.0);
        assert!(!engine.is_playing(ghost));
        assert!(!engine.is_track_loading(ghost));
        assert!(states.drain().is_empty());
    }

    #[test]
    fn test_volume_and_crossfade_are_clamped() {
        let mut engine = test_engine();
        engine.set_volume(DeckId::A, 1.7);
        assert_eq!(engine.volume(DeckId::A), 1.0);
        engine.set_volume(DeckId::B, -0.3);
        assert_eq!(engine.volume(DeckId::B), 0.0);

        engine.set_crossfade(-2.0);
        assert_eq!(engine.crossfade(), 0.0);
        assert!((engine.crossfade_gain(DeckId::A) - 1.0).abs() < 1e-6);
        assert!(engine.crossfade_gain(DeckId::B).abs() < 1e-6);

        engine.set_crossfade(4.0);
        assert_eq!(engine.crossfade(), 1.0);
        assert!(engine.crossfade_gain(DeckId::A).abs() < 1e-6);
        assert!((engine.crossfade_gain(DeckId::B) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_extra_deck_ignores_crossfader() {
        let mut engine = test_engine();
        let deck = engine.add_deck().unwrap();
        assert_eq!(deck, DeckId(2));

        engine.set_crossfade(0.0);
        assert_eq!(engine.crossfade_gain(deck), 1.0);
    }

    #[test]
    fn test_suspended_graph_resumes_on_play() {
        let mut engine = test_engine();
        load_and_wait(&mut engine, DeckId::A, 30.0);
        engine.toggle_play_pause(DeckId::A);
        engine.graph_mut().suspend();

        engine.toggle_play_pause(DeckId::A);
        assert!(!engine.graph().is_suspended());
        assert!(engine.is_playing(DeckId::A));
    }

    #[test]
    fn test_monitor_follows_transport() {
        let mut engine = test_engine();
        load_and_wait(&mut engine, DeckId::A, 30.0);
        let monitor = |engine: &DeckEngine<OfflineGraph>| {
            engine.deck(DeckId::A).unwrap().monitor().is_running()
        };
        assert!(monitor(&engine));

        // Seeking while playing restarts source and monitor
        let runs = engine.deck(DeckId::A).unwrap().monitor().runs();
        engine.seek(DeckId::A, 10.0);
        assert!(monitor(&engine));
        assert_eq!(engine.deck(DeckId::A).unwrap().monitor().runs(), runs + 1);

        engine.toggle_play_pause(DeckId::A);
        assert!(!monitor(&engine));
        engine.tick();
        assert_eq!(engine.deck(DeckId::A).unwrap().monitor().runs(), runs + 1);
    }

    #[test]
    fn test_tick_publishes_positions() {
        let mut engine = test_engine();
        load_and_wait(&mut engine, DeckId::A, 30.0);
        let first = engine.subscribe(EventKind::PositionUpdated);
        let second = engine.subscribe(EventKind::PositionUpdated);

        engine.graph_mut().advance(1.0);
        engine.tick();
        engine.graph_mut().advance(1.0);
        engine.tick();

        let positions: Vec<f64> = first
            .drain()
            .into_iter()
            .filter_map(|e| match e {
                DeckEvent::PositionUpdated { deck: DeckId::A, position } => Some(position),
                _ => None,
            })
            .collect();
        assert_eq!(positions.len(), 2);
        assert_close(positions[0], 1.0);
        assert_close(positions[1], 2.0);
        assert_eq!(second.drain().len(), 2);

        engine.unsubscribe(EventKind::PositionUpdated, second.id);
        engine.tick();
        assert!(second.drain().is_empty());
        assert_eq!(first.drain().len(), 1);
    }

    #[test]
    fn test_seek_while_stopped_notifies() {
        let mut engine = test_engine();
        load_and_wait(&mut engine, DeckId::A, 30.0);
        engine.toggle_play_pause(DeckId::A);
        let states = engine.subscribe(EventKind::StateChanged);
        let positions = engine.subscribe(EventKind::PositionUpdated);

        engine.seek(DeckId::A, 12.0);

        assert_eq!(
            positions.drain(),
            vec![DeckEvent::PositionUpdated { deck: DeckId::A, position: 12.0 }]
        );
        let states = states.drain();
        assert_eq!(states.len(), 2);
        match &states[0] {
            DeckEvent::StateChanged { deck: Some(snapshot) } => assert!(snapshot.is_seeking),
            other => panic!("unexpected event {:?}", other),
        }
        match &states[1] {
            DeckEvent::StateChanged { deck: Some(snapshot) } => {
                assert!(!snapshot.is_seeking);
                assert_eq!(snapshot.position, 12.0);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_command_queue_dispatch() {
        let mut engine = test_engine();
        let (mut tx, mut rx) = command_channel();

        tx.push(EngineCommand::Load { deck: DeckId::B, bytes: wav_bytes(TEST_RATE, 20.0, 1) })
            .unwrap();
        tx.push(EngineCommand::SetVolume { deck: DeckId::B, volume: 0.4 }).unwrap();
        tx.push(EngineCommand::SetCrossfade { value: 1.0 }).unwrap();
        engine.process_commands(&mut rx);
        assert!(engine.wait_for_loads(WAIT));

        tx.push(EngineCommand::Seek { deck: DeckId::B, position: 8.0 }).unwrap();
        tx.push(EngineCommand::SetSpeed { deck: DeckId::B, speed: 2.0 }).unwrap();
        tx.push(EngineCommand::TogglePlay { deck: DeckId::B }).unwrap();
        engine.process_commands(&mut rx);

        assert!((engine.volume(DeckId::B) - 0.4).abs() < 1e-6);
        assert_eq!(engine.crossfade(), 1.0);
        assert_eq!(engine.speed(DeckId::B), 2.0);
        assert!(!engine.is_playing(DeckId::B));
        assert_close(engine.playback_time(DeckId::B), 8.0);
    }

    #[test]
    fn test_engine_renders_through_master_bus() {
        let mut engine = test_engine();
        load_and_wait(&mut engine, DeckId::A, 2.0);
        engine.set_crossfade(0.0);

        let mut block = crate::types::StereoBuffer::silence(500);
        engine.graph_mut().render(&mut block);
        // 0.5 sine amplitude through master gain 0.25
        let peak = block.peak();
        assert!(peak > 0.05 && peak <= 0.126, "peak {peak}");
    }

    #[test]
    fn test_debug_report_is_json() {
        let mut engine = test_engine();
        load_and_wait(&mut engine, DeckId::A, 3.0);
        let report: serde_json::Value = serde_json::from_str(&engine.debug_report()).unwrap();
        assert_eq!(report["decks"][0]["state"], "Playing");
        assert_eq!(report["decks"][1]["has_track"], false);
    }

    #[test]
    fn test_engines_are_independent() {
        let mut first = test_engine();
        let second = test_engine();
        load_and_wait(&mut first, DeckId::A, 3.0);

        assert!(first.is_playing(DeckId::A));
        assert!(!second.has_track(DeckId::A));
        drop(first);
        assert_eq!(second.graph().playing_source_count(), 0);
    }
}
