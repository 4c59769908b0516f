//! # Playback Session
//!
//! A session is one track bound to one live pipeline. At most one exists at
//! a time; its owner must tear it down before installing the next.
//!
//! The audio sink lives apart from the session in [`SinkControl`], so
//! pause/resume/volume can be served from any thread without waiting on the
//! session's owner.

use crate::streaming::StreamingPipeline;
use bridge_traits::playback::AudioSink;
use core_library::models::Track;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;
use uuid::Uuid;

pub struct PlaybackSession {
    pub id: Uuid,
    pub track: Arc<Track>,
    pipeline: StreamingPipeline,
    started_at: Instant,
}

impl PlaybackSession {
    /// `id` is chosen by the caller so it can be handed to the pipeline's
    /// failure hook before the session exists.
    pub fn new(id: Uuid, track: Arc<Track>, pipeline: StreamingPipeline) -> Self {
        Self {
            id,
            track,
            pipeline,
            started_at: Instant::now(),
        }
    }

    pub fn pipeline(&self) -> &StreamingPipeline {
        &self.pipeline
    }

    /// Track duration as declared by the container, else from metadata.
    pub fn duration(&self) -> Duration {
        self.pipeline
            .duration()
            .unwrap_or_else(|| self.track.duration())
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Stops the sink and closes the pipeline.
    pub fn teardown(mut self, sink: &SinkControl) {
        sink.stop();
        self.pipeline.close();
        debug!(session = %self.id, track = %self.track.id, "Session torn down");
    }
}

#[derive(Default)]
struct SinkSlot {
    sink: Option<Box<dyn AudioSink>>,
    volume: Option<f32>,
}

/// Shared handle to the current audio sink.
///
/// Volume is remembered across sessions and applied to every installed sink.
#[derive(Clone, Default)]
pub struct SinkControl {
    slot: Arc<Mutex<SinkSlot>>,
}

impl SinkControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `sink`, replacing (and stopping) any previous one.
    pub fn install(&self, mut sink: Box<dyn AudioSink>) {
        let mut slot = self.slot.lock();
        if let Some(volume) = slot.volume {
            sink.set_volume(volume);
        }
        if let Some(mut previous) = slot.sink.replace(sink) {
            previous.stop();
        }
    }

    /// Stops and removes the current sink. Returns false if there was none.
    pub fn stop(&self) -> bool {
        match self.slot.lock().sink.take() {
            Some(mut sink) => {
                sink.stop();
                true
            }
            None => false,
        }
    }

    pub fn pause(&self) -> bool {
        self.with_sink(|sink| sink.pause())
    }

    pub fn resume(&self) -> bool {
        self.with_sink(|sink| sink.play())
    }

    /// Sets linear gain, clamped to `[0.0, 2.0]`.
    pub fn set_volume(&self, volume: f32) {
        let volume = if volume.is_finite() {
            volume.clamp(0.0, 2.0)
        } else {
            1.0
        };
        let mut slot = self.slot.lock();
        slot.volume = Some(volume);
        if let Some(sink) = slot.sink.as_mut() {
            sink.set_volume(volume);
        }
    }

    pub fn volume(&self) -> f32 {
        let slot = self.slot.lock();
        match (&slot.sink, slot.volume) {
            (Some(sink), _) => sink.volume(),
            (None, Some(volume)) => volume,
            (None, None) => 1.0,
        }
    }

    /// True while a sink is installed, not paused and not yet drained.
    pub fn is_playing(&self) -> bool {
        self.slot
            .lock()
            .sink
            .as_ref()
            .is_some_and(|sink| !sink.is_paused() && !sink.is_finished())
    }

    pub fn has_sink(&self) -> bool {
        self.slot.lock().sink.is_some()
    }

    fn with_sink(&self, f: impl FnOnce(&mut dyn AudioSink)) -> bool {
        match self.slot.lock().sink.as_mut() {
            Some(sink) => {
                f(sink.as_mut());
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;

    mock! {
        Sink {}
        impl AudioSink for Sink {
            fn play(&mut self);
            fn pause(&mut self);
            fn is_paused(&self) -> bool;
            fn set_volume(&mut self, volume: f32);
            fn volume(&self) -> f32;
            fn stop(&mut self);
            fn is_finished(&self) -> bool;
        }
    }

    #[test]
    fn test_controls_without_sink_are_noops() {
        let control = SinkControl::new();
        assert!(!control.pause());
        assert!(!control.resume());
        assert!(!control.stop());
        assert!(!control.is_playing());
        assert_eq!(control.volume(), 1.0);
    }

    #[test]
    fn test_install_applies_remembered_volume() {
        let control = SinkControl::new();
        control.set_volume(0.4);

        let mut sink = MockSink::new();
        sink.expect_set_volume()
            .withf(|v| (*v - 0.4).abs() < f32::EPSILON)
            .times(1)
            .return_const(());
        sink.expect_volume().return_const(0.4f32);
        control.install(Box::new(sink));

        assert!((control.volume() - 0.4).abs() < f32::EPSILON);
    }

    #[test]
    fn test_pause_resume_and_stop_reach_sink() {
        let control = SinkControl::new();

        let mut sink = MockSink::new();
        sink.expect_pause().times(1).return_const(());
        sink.expect_play().times(1).return_const(());
        sink.expect_stop().times(1).return_const(());
        sink.expect_is_paused().return_const(false);
        sink.expect_is_finished().return_const(false);
        control.install(Box::new(sink));

        assert!(control.is_playing());
        assert!(control.pause());
        assert!(control.resume());
        assert!(control.stop());
        assert!(!control.has_sink());
        assert!(!control.stop());
    }

    #[test]
    fn test_install_stops_previous_sink() {
        let control = SinkControl::new();

        let mut first = MockSink::new();
        first.expect_stop().times(1).return_const(());
        control.install(Box::new(first));

        let mut second = MockSink::new();
        second.expect_stop().times(1).return_const(());
        control.install(Box::new(second));

        control.stop();
    }

    #[test]
    fn test_volume_is_clamped() {
        let control = SinkControl::new();
        control.set_volume(5.0);
        assert_eq!(control.volume(), 2.0);
        control.set_volume(f32::NAN);
        assert_eq!(control.volume(), 1.0);
    }
}
