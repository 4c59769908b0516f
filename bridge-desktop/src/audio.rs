//! Audio output on the default device using `rodio`.
//!
//! The `OutputStream` is created on, and never leaves, a dedicated keep-alive
//! thread. Sinks are attached to its mixer, which can be shared freely.

use bridge_traits::{
    error::{BridgeError, Result},
    playback::{AudioOutput, AudioSink, PcmRead, PcmSource},
};
use rodio::mixer::Mixer;
use rodio::{OutputStreamBuilder, Sink, Source};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Samples requested from the PCM source per refill.
const REFILL_SAMPLES: usize = 4096;

pub struct RodioAudioOutput {
    mixer: Mixer,
    shutdown: Option<mpsc::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl RodioAudioOutput {
    /// Opens the system default output device.
    pub fn open_default() -> Result<Self> {
        let (ready_tx, ready_rx) = mpsc::channel::<std::result::Result<Mixer, String>>();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let thread = thread::Builder::new()
            .name("audio-output".to_string())
            .spawn(move || match OutputStreamBuilder::open_default_stream() {
                Ok(mut stream) => {
                    // rodio prints to stderr when the stream drops.
                    stream.log_on_drop(false);
                    if ready_tx.send(Ok(stream.mixer().clone())).is_ok() {
                        // Blocks until the output is dropped.
                        let _ = shutdown_rx.recv();
                    }
                    debug!("Audio output stream closed");
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e.to_string()));
                }
            })?;

        let mixer = ready_rx
            .recv()
            .map_err(|_| BridgeError::NotAvailable("Audio output thread exited".to_string()))?
            .map_err(|e| BridgeError::NotAvailable(format!("No audio output device: {e}")))?;

        info!("Opened default audio output device");
        Ok(Self {
            mixer,
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        })
    }
}

impl Drop for RodioAudioOutput {
    fn drop(&mut self) {
        self.shutdown.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Audio output thread panicked");
            }
        }
    }
}

impl AudioOutput for RodioAudioOutput {
    fn open_sink(&self, source: Box<dyn PcmSource>) -> Result<Box<dyn AudioSink>> {
        let sink = Sink::connect_new(&self.mixer);
        sink.append(PcmStreamSource::new(source));
        sink.play();
        Ok(Box::new(RodioSink { sink, stopped: false }))
    }
}

struct RodioSink {
    sink: Sink,
    stopped: bool,
}

impl AudioSink for RodioSink {
    fn play(&mut self) {
        self.sink.play();
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn is_paused(&self) -> bool {
        self.sink.is_paused()
    }

    fn set_volume(&mut self, volume: f32) {
        self.sink.set_volume(volume.max(0.0));
    }

    fn volume(&self) -> f32 {
        self.sink.volume()
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.sink.stop();
            self.stopped = true;
        }
    }

    fn is_finished(&self) -> bool {
        self.stopped || self.sink.empty()
    }
}

impl Drop for RodioSink {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Adapts a [`PcmSource`] to rodio's sample iterator.
///
/// Underruns are filled with one frame of silence so the channel layout
/// never shifts.
struct PcmStreamSource {
    inner: Box<dyn PcmSource>,
    buffer: Vec<f32>,
    cursor: usize,
    filled: usize,
    channels: u16,
    sample_rate: u32,
    finished: bool,
}

impl PcmStreamSource {
    fn new(inner: Box<dyn PcmSource>) -> Self {
        let channels = inner.channels().max(1);
        let sample_rate = inner.sample_rate();
        let frames = REFILL_SAMPLES / channels as usize;
        Self {
            inner,
            buffer: vec![0.0; frames.max(1) * channels as usize],
            cursor: 0,
            filled: 0,
            channels,
            sample_rate,
            finished: false,
        }
    }

    fn refill(&mut self) {
        self.cursor = 0;
        match self.inner.read(&mut self.buffer) {
            PcmRead::Samples(n) if n > 0 => self.filled = n,
            PcmRead::Samples(_) | PcmRead::Underrun => {
                let frame = self.channels as usize;
                self.buffer[..frame].fill(0.0);
                self.filled = frame;
            }
            PcmRead::Finished => {
                self.filled = 0;
                self.finished = true;
            }
        }
    }
}

impl Iterator for PcmStreamSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.cursor >= self.filled {
            if self.finished {
                return None;
            }
            self.refill();
            if self.finished {
                return None;
            }
        }
        let sample = self.buffer[self.cursor];
        self.cursor += 1;
        Some(sample)
    }
}

impl Source for PcmStreamSource {
    fn current_span_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> rodio::ChannelCount {
        self.channels
    }

    fn sample_rate(&self) -> rodio::SampleRate {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct ScriptedSource {
        channels: u16,
        script: VecDeque<Vec<f32>>,
        underruns_left: usize,
    }

    impl PcmSource for ScriptedSource {
        fn channels(&self) -> u16 {
            self.channels
        }

        fn sample_rate(&self) -> u32 {
            48_000
        }

        fn read(&mut self, out: &mut [f32]) -> PcmRead {
            if self.underruns_left > 0 {
                self.underruns_left -= 1;
                return PcmRead::Underrun;
            }
            match self.script.pop_front() {
                Some(chunk) => {
                    out[..chunk.len()].copy_from_slice(&chunk);
                    PcmRead::Samples(chunk.len())
                }
                None => PcmRead::Finished,
            }
        }
    }

    #[test]
    fn test_underrun_yields_one_silent_frame() {
        let source = ScriptedSource {
            channels: 2,
            script: VecDeque::from(vec![vec![0.5, -0.5]]),
            underruns_left: 1,
        };
        let samples: Vec<f32> = PcmStreamSource::new(Box::new(source)).collect();
        assert_eq!(samples, vec![0.0, 0.0, 0.5, -0.5]);
    }

    #[test]
    fn test_finishes_after_source_is_drained() {
        let source = ScriptedSource {
            channels: 1,
            script: VecDeque::from(vec![vec![0.1, 0.2], vec![0.3]]),
            underruns_left: 0,
        };
        let adapter = PcmStreamSource::new(Box::new(source));
        assert_eq!(adapter.channels(), 1);
        assert_eq!(adapter.sample_rate(), 48_000);
        let samples: Vec<f32> = adapter.collect();
        assert_eq!(samples, vec![0.1, 0.2, 0.3]);
    }
}
