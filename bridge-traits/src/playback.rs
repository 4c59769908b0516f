//! Audio output bridge.
//!
//! The core produces decoded PCM through a [`PcmSource`]; the host turns it
//! into sound by implementing [`AudioOutput`]. Each call to
//! [`AudioOutput::open_sink`] yields an independent [`AudioSink`] that owns
//! the source until it is stopped or dropped.

use crate::error::Result;

/// Outcome of a single [`PcmSource::read`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcmRead {
    /// `n` interleaved samples were written to the front of the buffer.
    Samples(usize),
    /// Nothing was available within the source's wait budget. The caller
    /// should emit silence and try again.
    Underrun,
    /// The producer is done; no further samples will arrive.
    Finished,
}

/// Interleaved 32-bit float PCM, pulled by the audio device.
pub trait PcmSource: Send {
    fn channels(&self) -> u16;

    fn sample_rate(&self) -> u32;

    /// Fills `out` with up to `out.len()` samples.
    ///
    /// May block briefly while the producer catches up.
    fn read(&mut self, out: &mut [f32]) -> PcmRead;
}

/// Handle to one playing source on an output device.
///
/// Mutating calls take `&mut self`; callers share a sink behind their own
/// lock.
pub trait AudioSink: Send {
    fn play(&mut self);

    fn pause(&mut self);

    fn is_paused(&self) -> bool;

    /// Linear gain, `1.0` is unity.
    fn set_volume(&mut self, volume: f32);

    fn volume(&self) -> f32;

    /// Stops output and releases the source. Idempotent.
    fn stop(&mut self);

    /// True once the source reported [`PcmRead::Finished`] and every sample
    /// was played, or after [`AudioSink::stop`].
    fn is_finished(&self) -> bool;
}

/// An audio device able to play [`PcmSource`]s.
pub trait AudioOutput: Send + Sync {
    /// Binds `source` to a new sink. Playback starts immediately.
    fn open_sink(&self, source: Box<dyn PcmSource>) -> Result<Box<dyn AudioSink>>;
}
