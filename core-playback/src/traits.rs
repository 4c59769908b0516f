//! # Playback Traits
//!
//! Seams of the decode pipeline:
//!
//! - [`AudioDecoder`]: pulls PCM out of a demuxed, decoded stream. Runs on the
//!   pipeline's own thread, so it is synchronous.
//! - [`StreamOpener`]: turns a resolved media URL into a ready decoder. Also
//!   blocking; callers run it off the async executor.

use crate::config::StreamingConfig;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// Audio Format Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioCodec {
    Mp3,
    /// Advanced Audio Coding (usually MP4/M4A)
    Aac,
    Flac,
    Vorbis,
    /// Recognized, but there is no decoder for it.
    Opus,
    /// Uncompressed PCM (WAV and similar)
    Pcm,
    Alac,
    Unknown,
}

impl AudioCodec {
    pub fn is_lossless(&self) -> bool {
        matches!(self, AudioCodec::Flac | AudioCodec::Pcm | AudioCodec::Alac)
    }
}

/// Layout of the PCM a decoder produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFormat {
    /// Source codec (before decoding)
    pub codec: AudioCodec,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Interleaved channel count
    pub channels: u16,
}

impl AudioFormat {
    pub fn new(codec: AudioCodec, sample_rate: u32, channels: u16) -> Self {
        Self {
            codec,
            sample_rate,
            channels,
        }
    }

    /// Playback time represented by `samples` interleaved samples.
    pub fn duration_of(&self, samples: usize) -> Duration {
        if self.sample_rate == 0 || self.channels == 0 {
            return Duration::ZERO;
        }
        let frames = samples / self.channels as usize;
        Duration::from_secs_f64(frames as f64 / self.sample_rate as f64)
    }
}

// ============================================================================
// Decoder Trait
// ============================================================================

/// Source of interleaved `f32` PCM in `[-1.0, 1.0]`.
pub trait AudioDecoder: Send {
    /// Output layout. Fixed for the lifetime of the decoder.
    fn format(&self) -> &AudioFormat;

    /// Total stream duration, when the container declares it.
    fn duration(&self) -> Option<Duration>;

    /// Decodes the next packet.
    ///
    /// - `Ok(Some(samples))`: decoded audio; may be empty when a packet
    ///   produced no output, which is not end of stream
    /// - `Ok(None)`: end of stream
    /// - `Err(_)`: the stream cannot be decoded further
    fn next_chunk(&mut self) -> Result<Option<Vec<f32>>>;

    /// Repositions the demuxer near `position`. Returns the position decoding
    /// actually resumes from.
    fn seek(&mut self, position: Duration) -> Result<Duration>;
}

// ============================================================================
// Opener Trait
// ============================================================================

/// Opens a media URL and prepares a decoder for it.
///
/// Blocking: performs network I/O and container probing.
pub trait StreamOpener: Send + Sync {
    fn open(&self, url: &str, config: &StreamingConfig) -> Result<Box<dyn AudioDecoder>>;
}
