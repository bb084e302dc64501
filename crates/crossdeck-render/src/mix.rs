//! Offline mix renderer
//!
//! Drives the engine block by block: move the crossfader, render one block
//! of master output, tick the monitors, append the block to the WAV file.

use std::io::{Seek, Write};

use anyhow::{Context, Result};
use crossdeck_core::audio::OfflineGraph;
use crossdeck_core::engine::DeckEngine;
use crossdeck_core::services::{DeckEvent, EventKind};
use crossdeck_core::types::{DeckState, StereoBuffer};
use crossdeck_core::DeckId;

use crate::config::MixConfig;

/// Summary of a finished render
#[derive(Debug, Clone, PartialEq)]
pub struct RenderStats {
    pub frames: usize,
    pub blocks: usize,
    pub peak: f32,
    /// Decks whose track ran out during the mix
    pub finished: Vec<DeckId>,
}

/// WAV format of the rendered mix (stereo 32-bit float)
pub fn wav_spec(sample_rate: u32) -> hound::WavSpec {
    hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    }
}

/// Render `mix.seconds` of master output into `writer`
pub fn render_mix<W>(
    engine: &mut DeckEngine<OfflineGraph>,
    mix: &MixConfig,
    writer: &mut hound::WavWriter<W>,
) -> Result<RenderStats>
where
    W: Write + Seek,
{
    let sample_rate = engine.graph().sample_rate();
    let block_size = engine.config().block_size.max(1);
    let total_frames = (mix.seconds.max(0.0) * sample_rate as f64).round() as usize;

    let states = engine.subscribe(EventKind::StateChanged);
    let mut block = StereoBuffer::silence(block_size);
    let mut stats = RenderStats { frames: 0, blocks: 0, peak: 0.0, finished: Vec::new() };
    let progress_every = (sample_rate as usize * 5 / block_size).max(1);

    while stats.frames < total_frames {
        let len = block_size.min(total_frames - stats.frames);
        if block.len() != len {
            block.resize(len);
        }

        let time = stats.frames as f64 / sample_rate as f64;
        engine.set_crossfade(mix.crossfade_at(time));
        engine.graph_mut().render(&mut block);
        engine.tick();

        for sample in block.as_interleaved() {
            writer.write_sample(*sample).context("Failed to write WAV samples")?;
        }

        stats.frames += len;
        stats.blocks += 1;
        stats.peak = stats.peak.max(block.peak());

        for event in states.drain() {
            if let DeckEvent::StateChanged { deck: Some(deck) } = event {
                let ended = deck.state == DeckState::Stopped
                    && deck.has_track
                    && deck.position >= deck.duration;
                if ended && !stats.finished.contains(&deck.id) {
                    log::info!("{} ran out at {:.2}s into the mix", deck.id, time);
                    stats.finished.push(deck.id);
                }
            }
        }

        if stats.blocks % progress_every == 0 {
            log::info!(
                "Rendered {:.1}s / {:.1}s (crossfade {:.2})",
                stats.frames as f64 / sample_rate as f64,
                mix.seconds,
                engine.crossfade()
            );
        }
    }

    engine.unsubscribe(EventKind::StateChanged, states.id);
    Ok(stats)
}
