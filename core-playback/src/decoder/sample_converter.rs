//! # Sample Format Converter
//!
//! Normalizes Symphonia's decoded buffers (any sample type, planar layout)
//! to interleaved `f32` in `[-1.0, 1.0]`.

use symphonia::core::audio::{AudioBufferRef, SampleBuffer};

/// Reusable interleaving buffer. Grows when a packet decodes to more frames
/// than any before it.
#[derive(Default)]
pub struct SampleConverter {
    buffer: Option<SampleBuffer<f32>>,
}

impl SampleConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Converts `decoded` into owned interleaved samples.
    pub fn to_interleaved_f32(&mut self, decoded: AudioBufferRef<'_>) -> Vec<f32> {
        if decoded.frames() == 0 {
            return Vec::new();
        }

        let spec = *decoded.spec();
        let needed = decoded.capacity() * spec.channels.count();
        let reuse = self
            .buffer
            .as_ref()
            .is_some_and(|buffer| buffer.capacity() >= needed);
        if !reuse {
            self.buffer = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
        }

        match self.buffer.as_mut() {
            Some(buffer) => {
                buffer.copy_interleaved_ref(decoded);
                buffer.samples().to_vec()
            }
            None => Vec::new(),
        }
    }
}

/// Clamps samples to `[-1.0, 1.0]`. Returns how many were out of range.
pub fn clamp_samples(samples: &mut [f32]) -> usize {
    let mut clipped = 0;
    for sample in samples.iter_mut() {
        if !(-1.0..=1.0).contains(sample) {
            clipped += 1;
            *sample = sample.clamp(-1.0, 1.0);
        }
    }
    clipped
}

#[cfg(test)]
mod tests {
    use super::*;
    use symphonia::core::audio::{AsAudioBufferRef, AudioBuffer, Channels, Signal, SignalSpec};

    fn stereo_buffer(frames: usize) -> AudioBuffer<i16> {
        let spec = SignalSpec::new(44_100, Channels::FRONT_LEFT | Channels::FRONT_RIGHT);
        let mut buffer = AudioBuffer::<i16>::new(frames as u64, spec);
        buffer.render_reserved(Some(frames));
        for (i, sample) in buffer.chan_mut(0).iter_mut().enumerate() {
            *sample = (i as i16 + 1) * 1000;
        }
        for sample in buffer.chan_mut(1).iter_mut() {
            *sample = i16::MIN;
        }
        buffer
    }

    #[test]
    fn test_interleaves_and_normalizes() {
        let buffer = stereo_buffer(3);
        let mut converter = SampleConverter::new();

        let samples = converter.to_interleaved_f32(buffer.as_audio_buffer_ref());

        assert_eq!(samples.len(), 6);
        assert!(samples[0] > 0.0 && samples[0] < 0.1);
        assert_eq!(samples[1], -1.0);
        assert!(samples[2] > samples[0]);
        assert_eq!(samples[5], -1.0);
    }

    #[test]
    fn test_empty_packet_yields_no_samples() {
        let spec = SignalSpec::new(48_000, Channels::FRONT_LEFT);
        let buffer = AudioBuffer::<f32>::new(1024, spec);
        let mut converter = SampleConverter::new();

        assert!(converter
            .to_interleaved_f32(buffer.as_audio_buffer_ref())
            .is_empty());
    }

    #[test]
    fn test_clamp_samples() {
        let mut samples = vec![0.0, 1.5, -1.5, 0.5, -0.5];
        assert_eq!(clamp_samples(&mut samples), 2);
        assert_eq!(samples, vec![0.0, 1.0, -1.0, 0.5, -0.5]);
    }
}
