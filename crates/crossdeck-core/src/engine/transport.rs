//! Transport state machine
//!
//! ```text
//! Empty ─load─► Loading ─ok─► Playing ◄─toggle─► Stopped
//!                  │             │                  ▲
//!                  └─fail─► Empty└──── end ─────────┘
//! ```
//!
//! Render sources are single-use, so every transition into Playing creates a
//! new one at `position_offset` and re-captures the reference clock time.
//! Leaving Playing folds the elapsed time into `position_offset` first.

use crate::audio::{AudioTrack, DecodeError, RenderGraph};

use super::deck::{ActiveSource, Deck};

/// What a monitor tick observed on a deck
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) enum MonitorSample {
    /// Monitor not running
    Idle,
    Position(f64),
    /// Playback reached the end; the deck now rests at the duration
    Ended(f64),
}

impl<T: AudioTrack> Deck<T> {
    /// Transition into Playing at `position_offset`
    ///
    /// Returns false if the deck could not start; it then stays stopped at
    /// its offset.
    pub(super) fn start<G>(&mut self, graph: &mut G) -> bool
    where
        G: RenderGraph<Track = T>,
    {
        if self.active.is_some() {
            return true;
        }
        let Some(track) = self.track.as_ref() else {
            return false;
        };

        if graph.is_suspended() {
            if let Err(e) = graph.resume() {
                log::error!("{}: cannot resume audio output: {}", self.id, e);
                return false;
            }
        }

        let source = match graph.create_source(track, self.volume_node) {
            Ok(source) => source,
            Err(e) => {
                log::error!("{}: failed to create render source: {}", self.id, e);
                return false;
            }
        };
        let started = graph
            .set_playback_rate(source, self.speed)
            .and_then(|_| graph.start_source(source, self.position_offset));
        if let Err(e) = started {
            log::error!("{}: failed to start render source: {}", self.id, e);
            return false;
        }

        self.active = Some(ActiveSource {
            source,
            reference_clock_time: graph.now(),
        });
        self.monitor.start();
        log::debug!("{}: playing from {:.3}s", self.id, self.position_offset);
        true
    }

    /// Leave Playing (if playing) and rest at `offset`
    pub(super) fn stop_at<G>(&mut self, graph: &mut G, offset: f64)
    where
        G: RenderGraph<Track = T>,
    {
        if let Some(active) = self.active.take() {
            if let Err(e) = graph.stop_source(active.source) {
                log::warn!("{}: failed to stop render source: {}", self.id, e);
            }
        }
        self.position_offset = offset.clamp(0.0, self.duration_seconds());
        self.monitor.stop();
    }

    pub(super) fn pause<G>(&mut self, graph: &mut G)
    where
        G: RenderGraph<Track = T>,
    {
        let position = self.position_at(graph.now());
        self.stop_at(graph, position);
        log::debug!("{}: paused at {:.3}s", self.id, position);
    }

    /// Play/pause; returns false when refused (no track, or loading)
    pub(super) fn toggle<G>(&mut self, graph: &mut G) -> bool
    where
        G: RenderGraph<Track = T>,
    {
        if !self.is_ready() {
            log::debug!("{}: toggle ignored, no track ready", self.id);
            return false;
        }
        if self.is_playing() {
            self.pause(graph);
            true
        } else {
            self.start(graph)
        }
    }

    /// Jump to `target` seconds (clamped); returns false when refused
    ///
    /// Playing decks restart their source at the target and keep playing.
    pub(super) fn seek<G>(&mut self, graph: &mut G, target: f64) -> bool
    where
        G: RenderGraph<Track = T>,
    {
        if !self.is_ready() {
            log::debug!("{}: seek ignored, no track ready", self.id);
            return false;
        }
        if target.is_nan() {
            log::warn!("{}: seek to NaN ignored", self.id);
            return false;
        }

        let target = target.clamp(0.0, self.duration_seconds());
        if self.is_playing() {
            self.stop_at(graph, target);
            self.start(graph);
        } else {
            self.position_offset = target;
        }
        true
    }

    /// Change the playback rate; returns false if unchanged
    ///
    /// While playing, time elapsed at the old speed is folded into the offset
    /// first, so the position is continuous across the change.
    pub(super) fn set_speed<G>(&mut self, graph: &mut G, speed: f64) -> bool
    where
        G: RenderGraph<Track = T>,
    {
        if !speed.is_finite() || speed <= 0.0 {
            log::warn!("{}: rejected playback speed {}", self.id, speed);
            return false;
        }
        if speed == self.speed {
            return false;
        }

        if let Some(active) = self.active {
            let now = graph.now();
            self.position_offset = self.position_at(now);
            self.active = Some(ActiveSource {
                reference_clock_time: now,
                ..active
            });
            if let Err(e) = graph.set_playback_rate(active.source, speed) {
                log::error!("{}: failed to apply playback rate: {}", self.id, e);
            }
        }
        self.speed = speed;
        true
    }

    /// Playback reached the end of the track
    pub(super) fn finish<G>(&mut self, graph: &mut G)
    where
        G: RenderGraph<Track = T>,
    {
        let duration = self.duration_seconds();
        self.stop_at(graph, duration);
        log::info!("{}: playback ended at {:.3}s", self.id, duration);
    }

    /// Sample the position for a running monitor and detect the end
    pub(super) fn monitor_tick<G>(&mut self, graph: &mut G, end_tolerance: f64) -> MonitorSample
    where
        G: RenderGraph<Track = T>,
    {
        if !self.monitor.is_running() {
            return MonitorSample::Idle;
        }
        if !self.is_playing() {
            self.monitor.stop();
            return MonitorSample::Idle;
        }

        let duration = self.duration_seconds();
        let position = self.position_at(graph.now());
        if position >= duration - end_tolerance {
            self.finish(graph);
            MonitorSample::Ended(duration)
        } else {
            MonitorSample::Position(position)
        }
    }

    /// Enter Loading: silence the deck and return the new load generation
    pub(super) fn begin_load<G>(&mut self, graph: &mut G) -> u64
    where
        G: RenderGraph<Track = T>,
    {
        self.stop_at(graph, 0.0);
        self.is_track_loading = true;
        self.load_generation += 1;
        self.load_generation
    }

    /// Leave Loading without a result; the deck ends up empty
    pub(super) fn abort_load<G>(&mut self, graph: &mut G)
    where
        G: RenderGraph<Track = T>,
    {
        self.stop_at(graph, 0.0);
        self.is_track_loading = false;
        self.track = None;
        self.position_offset = 0.0;
    }

    /// Apply the outcome of the current load
    ///
    /// Success replaces the track and auto-plays from 0. Failure leaves the
    /// deck empty.
    pub(super) fn complete_load<G>(&mut self, graph: &mut G, result: Result<T, DecodeError>)
    where
        G: RenderGraph<Track = T>,
    {
        self.stop_at(graph, 0.0);
        self.is_track_loading = false;

        match result {
            Ok(track) => {
                log::info!(
                    "{}: loaded track ({:.2}s)",
                    self.id,
                    track.duration_seconds()
                );
                self.track = Some(track);
                self.position_offset = 0.0;
                self.start(graph);
            }
            Err(e) => {
                log::error!("{}: failed to load track: {}", self.id, e);
                self.track = None;
                self.position_offset = 0.0;
            }
        }
    }
}
