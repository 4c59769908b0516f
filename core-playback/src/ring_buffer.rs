//! # PCM Ring Buffer
//!
//! Bounded single-producer/single-consumer handoff between the decode thread
//! and the audio device.
//!
//! ## Design
//!
//! - **Capacity**: fixed at creation, rounded down to whole frames
//! - **Backpressure**: [`PcmBuffer::write`] blocks while the buffer is full;
//!   nothing is ever overwritten
//! - **Reads**: [`PcmBuffer::read`] waits up to a timeout, so the device can
//!   emit silence instead of stalling
//! - **End of stream**: [`PcmBuffer::finish`] lets the reader drain what is
//!   queued; [`PcmBuffer::close`] discards it and wakes both sides
//!
//! ## Usage
//!
//! ```rust
//! use core_playback::ring_buffer::{PcmBuffer, ReadOutcome};
//! use std::time::Duration;
//!
//! let buffer = PcmBuffer::new(48_000 * 2, 2);
//!
//! buffer.write(&[0.1, -0.1, 0.2, -0.2]).unwrap();
//! buffer.finish();
//!
//! let mut output = vec![0.0f32; 1024];
//! assert_eq!(buffer.read(&mut output, Duration::from_millis(5)), ReadOutcome::Samples(4));
//! assert_eq!(buffer.read(&mut output, Duration::from_millis(5)), ReadOutcome::Finished);
//! ```

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Returned by [`PcmBuffer::write`] once the buffer has been closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("PCM buffer closed")]
pub struct BufferClosed;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// `n` samples were copied to the front of the output slice.
    Samples(usize),
    /// Nothing arrived before the timeout.
    TimedOut,
    /// The writer finished and everything was read, or the buffer was closed.
    Finished,
}

#[derive(Clone)]
pub struct PcmBuffer {
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<State>,
    readable: Condvar,
    writable: Condvar,
    capacity: usize,
    channels: usize,
}

struct State {
    samples: Vec<f32>,
    read_pos: usize,
    len: usize,
    finished: bool,
    closed: bool,
}

impl PcmBuffer {
    /// Creates a buffer holding up to `capacity` samples of `channels`-channel
    /// interleaved audio.
    pub fn new(capacity: usize, channels: u16) -> Self {
        let channels = channels.max(1) as usize;
        let capacity = (capacity - capacity % channels).max(channels);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    samples: vec![0.0; capacity],
                    read_pos: 0,
                    len: 0,
                    finished: false,
                    closed: false,
                }),
                readable: Condvar::new(),
                writable: Condvar::new(),
                capacity,
                channels,
            }),
        }
    }

    /// Appends `samples`, blocking while the buffer is full.
    ///
    /// Samples are committed in whole frames. Fails as soon as the buffer is
    /// closed; anything not yet committed is dropped.
    pub fn write(&self, samples: &[f32]) -> Result<(), BufferClosed> {
        let inner = &*self.inner;
        let mut rest = samples;
        let mut state = inner.state.lock();

        while !rest.is_empty() {
            if state.closed {
                return Err(BufferClosed);
            }

            let free = inner.capacity - state.len;
            let free = free - free % inner.channels;
            if free == 0 {
                inner.writable.wait(&mut state);
                continue;
            }

            let n = free.min(rest.len());
            let start = (state.read_pos + state.len) % inner.capacity;
            for (i, &sample) in rest[..n].iter().enumerate() {
                state.samples[(start + i) % inner.capacity] = sample;
            }
            state.len += n;
            rest = &rest[n..];
            inner.readable.notify_one();
        }

        Ok(())
    }

    /// Copies queued samples into `output`, waiting up to `timeout` for data.
    pub fn read(&self, output: &mut [f32], timeout: Duration) -> ReadOutcome {
        if output.is_empty() {
            return ReadOutcome::Samples(0);
        }

        let inner = &*self.inner;
        let deadline = Instant::now() + timeout;
        let mut state = inner.state.lock();

        loop {
            if state.closed {
                return ReadOutcome::Finished;
            }
            if state.len > 0 {
                break;
            }
            if state.finished {
                return ReadOutcome::Finished;
            }
            if inner.readable.wait_until(&mut state, deadline).timed_out() && state.len == 0 {
                return if state.finished || state.closed {
                    ReadOutcome::Finished
                } else {
                    ReadOutcome::TimedOut
                };
            }
        }

        let mut n = state.len.min(output.len());
        if n >= inner.channels {
            n -= n % inner.channels;
        }
        for (i, slot) in output[..n].iter_mut().enumerate() {
            *slot = state.samples[(state.read_pos + i) % inner.capacity];
        }
        state.read_pos = (state.read_pos + n) % inner.capacity;
        state.len -= n;
        inner.writable.notify_one();

        ReadOutcome::Samples(n)
    }

    /// Drops every queued sample. Used when seeking.
    pub fn clear(&self) {
        let mut state = self.inner.state.lock();
        state.read_pos = 0;
        state.len = 0;
        self.inner.writable.notify_all();
    }

    /// Marks the end of the stream. Queued samples remain readable.
    pub fn finish(&self) {
        let mut state = self.inner.state.lock();
        state.finished = true;
        self.inner.readable.notify_all();
    }

    /// Discards queued samples and wakes both sides for good.
    pub fn close(&self) {
        let mut state = self.inner.state.lock();
        state.closed = true;
        state.len = 0;
        self.inner.readable.notify_all();
        self.inner.writable.notify_all();
    }

    /// Samples currently queued.
    pub fn available(&self) -> usize {
        self.inner.state.lock().len
    }

    /// Total capacity in samples.
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    pub fn channels(&self) -> u16 {
        self.inner.channels as u16
    }

    pub fn is_closed(&self) -> bool {
        self.inner.state.lock().closed
    }

    /// True once no further samples will ever be read.
    pub fn is_drained(&self) -> bool {
        let state = self.inner.state.lock();
        state.closed || (state.finished && state.len == 0)
    }
}
