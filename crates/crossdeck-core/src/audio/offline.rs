//! Offline software render graph
//!
//! Mixes render sources through series gain chains into stereo buffers,
//! block by block, on the calling thread. The clock is sample-accurate:
//! it is the number of rendered frames divided by the sample rate, and it
//! stands still while the graph is suspended.
//!
//! Used by the `crossdeck-render` host to bounce a mix to disk, and by the
//! engine tests as a deterministic stand-in for a real output device.

use std::collections::HashMap;
use std::sync::Arc;

use super::backend::{AudioTrack, NodeId, RenderGraph, SourceId};
use super::decode::{PcmTrack, SymphoniaDecoder};
use super::error::{AudioError, AudioResult};
use crate::types::{StereoBuffer, StereoSample};

/// Block size used when advancing the clock without keeping the output
const ADVANCE_BLOCK: usize = 1024;

/// A gain stage with at most one downstream connection
#[derive(Debug, Clone)]
struct GainNode {
    gain: f32,
    output: Option<NodeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceState {
    Created,
    Playing,
}

/// A single-use playback head over a track
#[derive(Debug)]
struct Source {
    track: PcmTrack,
    output: NodeId,
    state: SourceState,
    /// Read position in track frames (fractional)
    cursor: f64,
    /// Playback-rate multiplier
    rate: f64,
}

impl Source {
    /// Linear-interpolated frame at the cursor, silence past the end
    #[inline]
    fn read(&self) -> StereoSample {
        let frames = self.track.frames();
        let index = self.cursor.floor() as usize;
        if self.cursor < 0.0 || index >= frames.len() {
            return StereoSample::silence();
        }
        let current = frames[index];
        let next = if index + 1 < frames.len() { frames[index + 1] } else { current };
        let frac = (self.cursor - index as f64) as f32;
        current * (1.0 - frac) + next * frac
    }
}

/// In-process render graph producing stereo blocks on demand
pub struct OfflineGraph {
    sample_rate: u32,
    frames_rendered: u64,
    suspended: bool,
    /// Node 0 is the destination
    nodes: Vec<GainNode>,
    sources: HashMap<SourceId, Source>,
    next_source: usize,
    decoder: Arc<SymphoniaDecoder>,
}

impl OfflineGraph {
    /// Create a running graph at the given output sample rate
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate: sample_rate.max(1),
            frames_rendered: 0,
            suspended: false,
            nodes: vec![GainNode { gain: 1.0, output: None }],
            sources: HashMap::new(),
            next_source: 0,
            decoder: Arc::new(SymphoniaDecoder::new()),
        }
    }

    /// Output sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Suspend the clock (rendering outputs silence until resumed)
    pub fn suspend(&mut self) {
        self.suspended = true;
    }

    /// Number of sources that have been started and not yet stopped
    pub fn playing_source_count(&self) -> usize {
        self.sources
            .values()
            .filter(|s| s.state == SourceState::Playing)
            .count()
    }

    /// Total sources alive (created or playing)
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Current playback rate of a live source
    pub fn playback_rate(&self, source: SourceId) -> Option<f64> {
        self.sources.get(&source).map(|s| s.rate)
    }

    /// Render one block into `out`, advancing the clock by `out.len()` frames
    pub fn render(&mut self, out: &mut StereoBuffer) {
        out.fill_silence();
        if self.suspended {
            return;
        }

        let graph_rate = self.sample_rate as f64;
        // Gains are block-rate: resolve each playing source's chain once
        let voices: Vec<(SourceId, f32, f64)> = self
            .sources
            .iter()
            .filter(|(_, s)| s.state == SourceState::Playing)
            .map(|(id, s)| {
                let step = s.rate * s.track.sample_rate() as f64 / graph_rate;
                (*id, self.chain_gain(s.output), step)
            })
            .collect();

        for (id, gain, step) in voices {
            let Some(source) = self.sources.get_mut(&id) else {
                continue;
            };
            for i in 0..out.len() {
                if gain != 0.0 {
                    out[i] += source.read() * gain;
                }
                source.cursor += step;
            }
        }

        self.frames_rendered += out.len() as u64;
    }

    /// Render and discard `seconds` worth of output
    pub fn advance(&mut self, seconds: f64) {
        let mut remaining = (seconds.max(0.0) * self.sample_rate as f64).round() as usize;
        let mut scratch = StereoBuffer::silence(remaining.min(ADVANCE_BLOCK));
        while remaining > 0 {
            let block = remaining.min(ADVANCE_BLOCK);
            if scratch.len() != block {
                scratch.resize(block);
            }
            self.render(&mut scratch);
            if self.suspended {
                break;
            }
            remaining -= block;
        }
    }

    /// Product of gains from `node` down to the destination (0 if unrouted)
    fn chain_gain(&self, node: NodeId) -> f32 {
        let destination = self.destination();
        let mut gain = 1.0;
        let mut current = node;
        // Each hop visits a distinct node on a well-formed chain
        for _ in 0..self.nodes.len() {
            let Some(stage) = self.nodes.get(current.0) else {
                return 0.0;
            };
            gain *= stage.gain;
            if current == destination {
                return gain;
            }
            match stage.output {
                Some(next) => current = next,
                None => return 0.0,
            }
        }
        0.0
    }

    fn node_mut(&mut self, node: NodeId) -> AudioResult<&mut GainNode> {
        self.nodes.get_mut(node.0).ok_or(AudioError::UnknownNode(node))
    }
}

impl RenderGraph for OfflineGraph {
    type Track = PcmTrack;
    type Decoder = SymphoniaDecoder;

    fn decoder(&self) -> Arc<SymphoniaDecoder> {
        Arc::clone(&self.decoder)
    }

    fn now(&self) -> f64 {
        self.frames_rendered as f64 / self.sample_rate as f64
    }

    fn is_suspended(&self) -> bool {
        self.suspended
    }

    fn resume(&mut self) -> AudioResult<()> {
        if self.suspended {
            log::debug!("Offline graph resumed at {:.3}s", self.now());
            self.suspended = false;
        }
        Ok(())
    }

    fn destination(&self) -> NodeId {
        NodeId(0)
    }

    fn create_gain(&mut self, initial: f32) -> NodeId {
        self.nodes.push(GainNode { gain: initial, output: None });
        NodeId(self.nodes.len() - 1)
    }

    fn set_gain(&mut self, node: NodeId, value: f32) -> AudioResult<()> {
        self.node_mut(node)?.gain = value;
        Ok(())
    }

    fn gain(&self, node: NodeId) -> AudioResult<f32> {
        self.nodes
            .get(node.0)
            .map(|n| n.gain)
            .ok_or(AudioError::UnknownNode(node))
    }

    fn connect(&mut self, from: NodeId, to: NodeId) -> AudioResult<()> {
        if from == to || from == self.destination() || to.0 >= self.nodes.len() {
            return Err(AudioError::InvalidConnection { from, to });
        }
        self.node_mut(from)?.output = Some(to);
        Ok(())
    }

    fn create_source(&mut self, track: &PcmTrack, output: NodeId) -> AudioResult<SourceId> {
        if output.0 >= self.nodes.len() {
            return Err(AudioError::UnknownNode(output));
        }
        let id = SourceId(self.next_source);
        self.next_source += 1;
        self.sources.insert(
            id,
            Source {
                track: track.clone(),
                output,
                state: SourceState::Created,
                cursor: 0.0,
                rate: 1.0,
            },
        );
        Ok(id)
    }

    fn start_source(&mut self, source: SourceId, offset: f64) -> AudioResult<()> {
        let entry = self
            .sources
            .get_mut(&source)
            .ok_or(AudioError::UnknownSource(source))?;
        if entry.state != SourceState::Created {
            return Err(AudioError::SourceAlreadyStarted(source));
        }
        let offset = offset.clamp(0.0, entry.track.duration_seconds());
        entry.cursor = offset * entry.track.sample_rate() as f64;
        entry.state = SourceState::Playing;
        Ok(())
    }

    fn set_playback_rate(&mut self, source: SourceId, rate: f64) -> AudioResult<()> {
        let entry = self
            .sources
            .get_mut(&source)
            .ok_or(AudioError::UnknownSource(source))?;
        entry.rate = rate;
        Ok(())
    }

    fn stop_source(&mut self, source: SourceId) -> AudioResult<()> {
        match self.sources.get(&source).map(|s| s.state) {
            None => Err(AudioError::UnknownSource(source)),
            Some(SourceState::Created) => Err(AudioError::SourceNotStarted(source)),
            Some(SourceState::Playing) => {
                self.sources.remove(&source);
                Ok(())
            }
        }
    }
}
