//! # Playback Error Types

use core_runtime::events::ErrorKind;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Request Errors
    // ========================================================================
    /// A session is installed; it must be stopped before another starts.
    #[error("A playback session is already active for track {0}")]
    SessionActive(String),

    #[error("Track {0} has no resolved stream URL")]
    MissingStreamUrl(String),

    #[error("Nothing is playing")]
    NothingPlaying,

    #[error("Queue is empty")]
    EmptyQueue,

    #[error("Request was cancelled")]
    Cancelled,

    // ========================================================================
    // Source Errors
    // ========================================================================
    /// Opening or reading the remote stream failed.
    #[error("Stream unavailable: {0}")]
    Network(String),

    // ========================================================================
    // Format/Codec Errors
    // ========================================================================
    #[error("Unsupported or invalid audio format: {0}")]
    InvalidFormat(String),

    #[error("No decodable audio track in stream")]
    NoAudioTrack,

    #[error("Unsupported codec: {0}")]
    UnsupportedCodec(String),

    #[error("Decoding error: {0}")]
    DecodingError(String),

    #[error("Seek to {0:?} failed: {1}")]
    SeekFailed(Duration, String),

    // ========================================================================
    // Output Errors
    // ========================================================================
    #[error("Audio device error: {0}")]
    AudioDevice(String),

    // ========================================================================
    // Generic Errors
    // ========================================================================
    #[error("Invalid streaming config: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlaybackError {
    /// Returns `true` if reopening the same stream may succeed.
    ///
    /// Container and codec failures are final for a given stream.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PlaybackError::Network(_) | PlaybackError::IoError(_) | PlaybackError::AudioDevice(_)
        )
    }

    /// Event classification for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PlaybackError::SessionActive(_)
            | PlaybackError::MissingStreamUrl(_)
            | PlaybackError::NothingPlaying
            | PlaybackError::EmptyQueue
            | PlaybackError::Cancelled
            | PlaybackError::InvalidConfig(_) => ErrorKind::InvalidRequest,
            PlaybackError::Network(_) | PlaybackError::IoError(_) => ErrorKind::Network,
            PlaybackError::InvalidFormat(_)
            | PlaybackError::NoAudioTrack
            | PlaybackError::UnsupportedCodec(_)
            | PlaybackError::DecodingError(_)
            | PlaybackError::SeekFailed(..)
            | PlaybackError::Internal(_) => ErrorKind::Decode,
            PlaybackError::AudioDevice(_) => ErrorKind::Output,
        }
    }
}

pub type Result<T> = std::result::Result<T, PlaybackError>;
