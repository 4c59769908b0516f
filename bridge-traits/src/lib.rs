//! # Host Bridge Traits
//!
//! Capabilities the daemon needs from its host, expressed as traits so the
//! core crates stay testable and platform neutral.
//!
//! ## Traits
//!
//! - [`ProcessRunner`](process::ProcessRunner) - run the external resolver
//!   tool and capture its output
//! - [`StreamConnector`](stream::StreamConnector) - open a remote media URL
//!   as a seekable, blocking byte stream
//! - [`AudioOutput`](playback::AudioOutput) - bind a PCM source to an audio
//!   device and hand back a controllable [`AudioSink`](playback::AudioSink)
//!
//! Desktop implementations live in `bridge-desktop`.
//!
//! ## Error Handling
//!
//! Every trait reports failures as [`BridgeError`](error::BridgeError).
//! Implementations convert platform errors and keep the message actionable
//! (include the program name, URL host or device name).
//!
//! ## Thread Safety
//!
//! Bridges are shared across tasks and threads behind `Arc`, so every trait
//! object is `Send + Sync` except [`AudioSink`](playback::AudioSink), which
//! the core always guards with its own lock.

pub mod error;
pub mod playback;
pub mod process;
pub mod stream;

pub use error::BridgeError;

pub use playback::{AudioOutput, AudioSink, PcmRead, PcmSource};
pub use process::{ProcessOutput, ProcessRunner};
pub use stream::{RemoteByteStream, StreamConnector};
