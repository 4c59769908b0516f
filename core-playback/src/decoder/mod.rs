//! # Audio Decoding
//!
//! Symphonia-backed decoding of remote media streams.
//!
//! ```text
//! RemoteByteStream → MediaSourceStream → FormatReader → Decoder → SampleConverter → f32 PCM
//! ```
//!
//! ## Supported Formats
//!
//! | Container | Codecs |
//! |-----------|--------|
//! | MP4/M4A | AAC, ALAC |
//! | WebM/MKV | Vorbis, FLAC (Opus is recognized but not decodable) |
//! | MP3 | MP3 |
//! | Ogg | Vorbis, FLAC |
//! | WAV | PCM |

pub mod format_detector;
pub mod sample_converter;
pub mod symphonia;

pub use self::symphonia::SymphoniaDecoder;
pub use format_detector::FormatDetector;
pub use sample_converter::SampleConverter;
