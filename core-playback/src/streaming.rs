//! # Streaming Decode Pipeline
//!
//! Runs an [`AudioDecoder`] on a dedicated OS thread and hands its PCM to the
//! audio device through a bounded [`PcmBuffer`].
//!
//! ```text
//! ┌──────────────────────────────┐
//! │  decode thread (producer)    │  next_chunk → write (blocks when full)
//! └──────────────┬───────────────┘
//!                │ interleaved f32
//!                ▼
//! ┌──────────────────────────────┐
//! │          PcmBuffer           │
//! └──────────────┬───────────────┘
//!                │
//!                ▼
//! ┌──────────────────────────────┐
//! │  PcmReader (audio device)    │  read → Samples / Underrun / Finished
//! └──────────────────────────────┘
//! ```
//!
//! The thread is governed by a quit flag and the buffer only. [`close`]
//! raises the flag and closes the buffer, which wakes a blocked writer and
//! makes every later read report end of stream.
//!
//! [`close`]: StreamingPipeline::close

use crate::config::StreamingConfig;
use crate::error::{PlaybackError, Result};
use crate::ring_buffer::{PcmBuffer, ReadOutcome};
use crate::traits::{AudioDecoder, AudioFormat};
use bridge_traits::playback::{PcmRead, PcmSource};
use core_runtime::events::{DaemonEvent, EventBus};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// State shared between the pipeline handle and its decode thread.
#[derive(Default)]
struct Shared {
    quit: AtomicBool,
    finished: AtomicBool,
    progress_micros: AtomicU64,
    pending_seek: Mutex<Option<Duration>>,
}

impl Shared {
    fn set_progress(&self, position: Duration) {
        self.progress_micros
            .store(position.as_micros() as u64, Ordering::Release);
    }
}

/// Called on the decode thread when decoding stops with an error.
pub type FailureHook = Box<dyn FnOnce(&PlaybackError) + Send>;

pub struct StreamingPipeline {
    shared: Arc<Shared>,
    buffer: PcmBuffer,
    format: AudioFormat,
    duration: Option<Duration>,
    underrun_wait: Duration,
    source_taken: bool,
    thread: Option<JoinHandle<()>>,
}

impl StreamingPipeline {
    /// Starts decoding `decoder` on a new thread.
    pub fn spawn(
        decoder: Box<dyn AudioDecoder>,
        config: &StreamingConfig,
        event_bus: EventBus,
    ) -> Result<Self> {
        Self::spawn_with_failure_hook(decoder, config, event_bus, None)
    }

    /// Like [`spawn`](Self::spawn), and runs `on_failure` once if decoding
    /// ends with an error. Not called on end of stream or close.
    pub fn spawn_with_failure_hook(
        decoder: Box<dyn AudioDecoder>,
        config: &StreamingConfig,
        event_bus: EventBus,
        on_failure: Option<FailureHook>,
    ) -> Result<Self> {
        config.validate()?;

        let format = decoder.format().clone();
        let duration = decoder.duration();
        let buffer = PcmBuffer::new(config.buffer_samples(format.channels), format.channels);
        let shared = Arc::new(Shared::default());

        let thread = {
            let shared = Arc::clone(&shared);
            let buffer = buffer.clone();
            thread::Builder::new()
                .name("decode".to_string())
                .spawn(move || decode_loop(decoder, buffer, shared, event_bus, on_failure))
                .map_err(|e| PlaybackError::Internal(format!("Failed to spawn decode thread: {e}")))?
        };

        debug!(
            sample_rate = format.sample_rate,
            channels = format.channels,
            buffer_samples = buffer.capacity(),
            "Streaming pipeline started"
        );

        Ok(Self {
            shared,
            buffer,
            format,
            duration,
            underrun_wait: config.underrun_wait,
            source_taken: false,
            thread: Some(thread),
        })
    }

    /// The read side, for the audio device. Available once.
    pub fn take_source(&mut self) -> Option<Box<dyn PcmSource>> {
        if self.source_taken {
            return None;
        }
        self.source_taken = true;
        Some(Box::new(PcmReader {
            buffer: self.buffer.clone(),
            sample_rate: self.format.sample_rate,
            underrun_wait: self.underrun_wait,
        }))
    }

    /// Requests a seek. Queued audio is dropped immediately; the decode
    /// thread repositions before its next packet.
    pub fn seek(&self, position: Duration) {
        *self.shared.pending_seek.lock() = Some(position);
        self.buffer.clear();
    }

    /// Decode position: last seek target plus the audio decoded since.
    pub fn progress(&self) -> Duration {
        Duration::from_micros(self.shared.progress_micros.load(Ordering::Acquire))
    }

    pub fn format(&self) -> &AudioFormat {
        &self.format
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// True once the decode thread has stopped producing.
    pub fn is_finished(&self) -> bool {
        self.shared.finished.load(Ordering::Acquire)
    }

    /// Stops decoding and ends the PCM stream. Does not wait for the thread;
    /// it exits before its next packet.
    pub fn close(&mut self) {
        if !self.shared.quit.swap(true, Ordering::AcqRel) {
            debug!("Closing streaming pipeline");
        }
        self.buffer.close();
        self.thread.take();
    }

    /// Waits for the decode thread to exit.
    pub fn join(&mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Decode thread panicked");
            }
        }
    }
}

impl Drop for StreamingPipeline {
    fn drop(&mut self) {
        self.close();
    }
}

fn decode_loop(
    mut decoder: Box<dyn AudioDecoder>,
    buffer: PcmBuffer,
    shared: Arc<Shared>,
    event_bus: EventBus,
    on_failure: Option<FailureHook>,
) {
    let format = decoder.format().clone();
    let mut base = Duration::ZERO;
    let mut decoded_samples = 0usize;

    loop {
        if shared.quit.load(Ordering::Acquire) {
            debug!("Quit flag raised, leaving decode loop");
            break;
        }

        let seek = shared.pending_seek.lock().take();
        if let Some(target) = seek {
            buffer.clear();
            match decoder.seek(target) {
                Ok(actual) => {
                    info!(target = ?target, actual = ?actual, "Seeked");
                    base = actual;
                    decoded_samples = 0;
                    shared.set_progress(base);
                }
                Err(e) => {
                    warn!(error = %e, "Seek failed, continuing from current position");
                    event_bus.emit(DaemonEvent::error(e.kind(), &e)).ok();
                }
            }
        }

        match decoder.next_chunk() {
            // Happens transiently around seeks; not end of stream.
            Ok(Some(chunk)) if chunk.is_empty() => continue,
            Ok(Some(chunk)) => {
                if buffer.write(&chunk).is_err() {
                    debug!("PCM buffer closed, stopping decoder");
                    break;
                }
                decoded_samples += chunk.len();
                shared.set_progress(base + format.duration_of(decoded_samples));
            }
            Ok(None) => {
                debug!(position = ?(base + format.duration_of(decoded_samples)), "Stream ended");
                break;
            }
            Err(e) => {
                error!(error = %e, "Decoding stopped");
                event_bus.emit(DaemonEvent::error(e.kind(), &e)).ok();
                if let Some(on_failure) = on_failure {
                    on_failure(&e);
                }
                break;
            }
        }
    }

    buffer.finish();
    shared.finished.store(true, Ordering::Release);
}

/// Read side of a [`StreamingPipeline`]. Dropping it closes the buffer, which
/// stops the decode thread.
struct PcmReader {
    buffer: PcmBuffer,
    sample_rate: u32,
    underrun_wait: Duration,
}

impl PcmSource for PcmReader {
    fn channels(&self) -> u16 {
        self.buffer.channels()
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn read(&mut self, out: &mut [f32]) -> PcmRead {
        match self.buffer.read(out, self.underrun_wait) {
            ReadOutcome::Samples(n) => PcmRead::Samples(n),
            ReadOutcome::TimedOut => PcmRead::Underrun,
            ReadOutcome::Finished => PcmRead::Finished,
        }
    }
}

impl Drop for PcmReader {
    fn drop(&mut self) {
        self.buffer.close();
    }
}
