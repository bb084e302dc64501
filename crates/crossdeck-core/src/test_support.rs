//! Shared fixtures for unit tests

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use crate::audio::{
    AudioResult, DecodeError, NodeId, OfflineGraph, PcmTrack, RenderGraph, SourceId,
    SymphoniaDecoder, TrackDecoder,
};
use crate::config::EngineConfig;
use crate::engine::DeckEngine;
use crate::types::DeckId;

/// Graph rate used by engine tests; 1000 Hz keeps frame math readable
pub const TEST_RATE: u32 = 1000;

/// Encode a 16-bit sine WAV file entirely in memory
pub fn wav_bytes(sample_rate: u32, seconds: f64, channels: u16) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        let frames = (seconds * sample_rate as f64).round() as usize;
        for i in 0..frames {
            let t = i as f64 / sample_rate as f64;
            let value = (t * 110.0 * std::f64::consts::TAU).sin() * 0.5;
            let sample = (value * i16::MAX as f64) as i16;
            for _ in 0..channels {
                writer.write_sample(sample).unwrap();
            }
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

/// A two-deck engine on a 1000 Hz offline graph
pub fn test_engine() -> DeckEngine<OfflineGraph> {
    DeckEngine::new(OfflineGraph::new(TEST_RATE), EngineConfig::default()).unwrap()
}

/// Load a track of `seconds` onto `deck` and wait for it to land (autoplays)
pub fn load_and_wait(engine: &mut DeckEngine<OfflineGraph>, deck: DeckId, seconds: f64) {
    engine.load(deck, wav_bytes(TEST_RATE, seconds, 2));
    assert!(engine.wait_for_loads(Duration::from_secs(10)));
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}

/// Input that makes [`PanickingDecoder`] panic
pub const PANIC_BYTES: &[u8] = b"PANIC";

/// Decodes like [`SymphoniaDecoder`] but panics on [`PANIC_BYTES`]
#[derive(Debug, Default)]
pub struct PanickingDecoder {
    inner: SymphoniaDecoder,
}

impl TrackDecoder for PanickingDecoder {
    type Track = PcmTrack;

    fn decode(&self, bytes: &[u8]) -> Result<PcmTrack, DecodeError> {
        if bytes == PANIC_BYTES {
            panic!("corrupt frame");
        }
        self.inner.decode(bytes)
    }
}

/// An [`OfflineGraph`] whose loader uses [`PanickingDecoder`]
pub struct PanickingGraph {
    inner: OfflineGraph,
    decoder: Arc<PanickingDecoder>,
}

impl PanickingGraph {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            inner: OfflineGraph::new(sample_rate),
            decoder: Arc::new(PanickingDecoder::default()),
        }
    }
}

impl RenderGraph for PanickingGraph {
    type Track = PcmTrack;
    type Decoder = PanickingDecoder;

    fn decoder(&self) -> Arc<PanickingDecoder> {
        Arc::clone(&self.decoder)
    }

    fn now(&self) -> f64 {
        self.inner.now()
    }

    fn is_suspended(&self) -> bool {
        self.inner.is_suspended()
    }

    fn resume(&mut self) -> AudioResult<()> {
        self.inner.resume()
    }

    fn destination(&self) -> NodeId {
        self.inner.destination()
    }

    fn create_gain(&mut self, initial: f32) -> NodeId {
        self.inner.create_gain(initial)
    }

    fn set_gain(&mut self, node: NodeId, value: f32) -> AudioResult<()> {
        self.inner.set_gain(node, value)
    }

    fn gain(&self, node: NodeId) -> AudioResult<f32> {
        self.inner.gain(node)
    }

    fn connect(&mut self, from: NodeId, to: NodeId) -> AudioResult<()> {
        self.inner.connect(from, to)
    }

    fn create_source(&mut self, track: &PcmTrack, output: NodeId) -> AudioResult<SourceId> {
        self.inner.create_source(track, output)
    }

    fn start_source(&mut self, source: SourceId, offset: f64) -> AudioResult<()> {
        self.inner.start_source(source, offset)
    }

    fn set_playback_rate(&mut self, source: SourceId, rate: f64) -> AudioResult<()> {
        self.inner.set_playback_rate(source, rate)
    }

    fn stop_source(&mut self, source: SourceId) -> AudioResult<()> {
        self.inner.stop_source(source)
    }
}
