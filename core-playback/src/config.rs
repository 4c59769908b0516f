//! # Streaming Configuration

use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tuning for the decode pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamingConfig {
    /// Capacity of the PCM handoff buffer in frames (one frame = one sample
    /// per channel). The decoder blocks once this much audio is queued.
    ///
    /// Default: 2 seconds at 48 kHz.
    #[serde(default = "default_buffer_frames")]
    pub buffer_frames: usize,

    /// How long the audio device waits for samples before playing silence.
    ///
    /// Default: 20 ms.
    #[serde(default = "default_underrun_wait")]
    pub underrun_wait: Duration,

    /// Consecutive undecodable packets tolerated before the stream is
    /// declared corrupt.
    ///
    /// Default: 10.
    #[serde(default = "default_max_decode_errors")]
    pub max_consecutive_decode_errors: usize,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            buffer_frames: default_buffer_frames(),
            underrun_wait: default_underrun_wait(),
            max_consecutive_decode_errors: default_max_decode_errors(),
        }
    }
}

impl StreamingConfig {
    /// Smaller buffer, quicker reaction to seeks and stops.
    pub fn low_latency() -> Self {
        Self {
            buffer_frames: 12_000, // 0.25s at 48kHz
            underrun_wait: Duration::from_millis(5),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.buffer_frames == 0 {
            return Err(PlaybackError::InvalidConfig(
                "buffer_frames must be > 0".to_string(),
            ));
        }
        if self.underrun_wait.is_zero() {
            return Err(PlaybackError::InvalidConfig(
                "underrun_wait must be > 0".to_string(),
            ));
        }
        if self.max_consecutive_decode_errors == 0 {
            return Err(PlaybackError::InvalidConfig(
                "max_consecutive_decode_errors must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Buffer capacity in samples for a given channel count.
    pub fn buffer_samples(&self, channels: u16) -> usize {
        self.buffer_frames * channels.max(1) as usize
    }
}

fn default_buffer_frames() -> usize {
    96_000
}

fn default_underrun_wait() -> Duration {
    Duration::from_millis(20)
}

fn default_max_decode_errors() -> usize {
    10
}
