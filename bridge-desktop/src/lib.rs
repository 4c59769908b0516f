//! # Desktop Bridge Implementations
//!
//! Default implementations of the bridge traits for desktop platforms
//! (macOS, Windows, Linux):
//! - `ProcessRunner` using `tokio::process`
//! - `StreamConnector` using blocking `reqwest` with HTTP range requests
//! - `AudioOutput` using `rodio` on the default output device
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{HttpStreamConnector, RodioAudioOutput, TokioProcessRunner};
//! use std::sync::Arc;
//!
//! let runner = Arc::new(TokioProcessRunner::new());
//! let connector = Arc::new(HttpStreamConnector::default());
//! let output = Arc::new(RodioAudioOutput::open_default()?);
//! ```

mod audio;
mod filesystem;
mod http;
mod process;

pub use audio::RodioAudioOutput;
pub use filesystem::default_cache_dir;
pub use http::{HttpByteStream, HttpStreamConnector};
pub use process::TokioProcessRunner;
