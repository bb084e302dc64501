//! In-memory track decoding (Symphonia)
//!
//! Tracks arrive as complete encoded files held in memory. They are decoded
//! in one pass into stereo f32 frames at their native sample rate; the render
//! graph resamples on playback.

use std::io::Cursor;
use std::sync::Arc;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::backend::{AudioTrack, TrackDecoder};
use super::error::DecodeError;
use crate::types::{StereoBuffer, StereoSample};

/// A decoded PCM track
///
/// Clones share the same sample data.
#[derive(Debug, Clone)]
pub struct PcmTrack {
    frames: Arc<StereoBuffer>,
    sample_rate: u32,
}

impl PcmTrack {
    /// Wrap decoded stereo frames
    pub fn new(frames: StereoBuffer, sample_rate: u32) -> Self {
        Self {
            frames: Arc::new(frames),
            sample_rate: sample_rate.max(1),
        }
    }

    /// A silent track of the given length
    pub fn silence(sample_rate: u32, seconds: f64) -> Self {
        let len = (seconds.max(0.0) * sample_rate as f64).round() as usize;
        Self::new(StereoBuffer::silence(len), sample_rate)
    }

    /// Native sample rate of the decoded data
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Decoded stereo frames
    pub fn frames(&self) -> &StereoBuffer {
        &self.frames
    }
}

impl AudioTrack for PcmTrack {
    fn duration_seconds(&self) -> f64 {
        self.frames.len() as f64 / self.sample_rate as f64
    }
}

/// Decoder backed by Symphonia's default codec and format registries
#[derive(Debug, Default, Clone, Copy)]
pub struct SymphoniaDecoder;

impl SymphoniaDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl TrackDecoder for SymphoniaDecoder {
    type Track = PcmTrack;

    fn decode(&self, bytes: &[u8]) -> Result<PcmTrack, DecodeError> {
        let (interleaved, sample_rate, channels) = decode_interleaved(bytes)?;
        let frames = to_stereo(&interleaved, channels);
        if frames.is_empty() {
            return Err(DecodeError::Empty);
        }

        log::debug!(
            "Decoded {} frames at {} Hz ({} source channels)",
            frames.len(),
            sample_rate,
            channels
        );
        Ok(PcmTrack::new(frames, sample_rate))
    }
}

/// Decode every packet of the first audio track to interleaved f32
fn decode_interleaved(bytes: &[u8]) -> Result<(Vec<f32>, u32, usize), DecodeError> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());

    let probed = symphonia::default::get_probe()
        .format(&Hint::new(), mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| DecodeError::Unsupported(e.to_string()))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(DecodeError::NoAudioTrack)?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or(DecodeError::MissingParameter("sample rate"))?;
    let mut channels = track
        .codec_params
        .channels
        .map(|c| c.count())
        .unwrap_or(2);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| DecodeError::Unsupported(e.to_string()))?;

    let mut samples: Vec<f32> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => {
                log::warn!("Error reading packet: {}", e);
                break;
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(e) => {
                log::warn!("Error decoding packet: {}", e);
                continue;
            }
        };

        if sample_buf.is_none() {
            let spec = *decoded.spec();
            channels = spec.channels.count();
            sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
        }

        if let Some(ref mut buf) = sample_buf {
            buf.copy_interleaved_ref(decoded);
            samples.extend_from_slice(buf.samples());
        }
    }

    Ok((samples, sample_rate, channels.max(1)))
}

/// Fold interleaved audio of any channel count into stereo frames
///
/// Mono is duplicated to both sides; channels beyond the first two are dropped.
fn to_stereo(interleaved: &[f32], channels: usize) -> StereoBuffer {
    let mut out = StereoBuffer::with_capacity(interleaved.len() / channels);
    for frame in interleaved.chunks_exact(channels) {
        let sample = match frame {
            [mono] => StereoSample::mono(*mono),
            [left, right, ..] => StereoSample::new(*left, *right),
            [] => StereoSample::silence(),
        };
        out.push(sample);
    }
    out
}
