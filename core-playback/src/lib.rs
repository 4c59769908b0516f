//! # Streaming Playback
//!
//! Turns a resolved media URL into audio on the output device.
//!
//! - [`StreamOpener`] connects to the URL and probes the container
//!   ([`HttpStreamOpener`] over HTTP range reads, decoding with Symphonia)
//! - [`StreamingPipeline`] decodes on its own thread into a bounded
//!   [`PcmBuffer`] and exposes the read side as a `PcmSource`
//! - [`PlaybackSession`] binds one track to one pipeline; [`SinkControl`]
//!   guards the audio sink playing it
//!
//! Everything in this crate is synchronous. Callers on an async runtime move
//! [`StreamOpener::open`] and [`StreamingPipeline::spawn`] to a blocking
//! context.

pub mod config;
pub mod decoder;
pub mod error;
pub mod opener;
pub mod ring_buffer;
pub mod session;
pub mod source;
pub mod streaming;
pub mod traits;

pub use config::StreamingConfig;
pub use decoder::SymphoniaDecoder;
pub use error::{PlaybackError, Result};
pub use opener::HttpStreamOpener;
pub use ring_buffer::{BufferClosed, PcmBuffer, ReadOutcome};
pub use session::{PlaybackSession, SinkControl};
pub use streaming::{FailureHook, StreamingPipeline};
pub use traits::{AudioCodec, AudioDecoder, AudioFormat, StreamOpener};
