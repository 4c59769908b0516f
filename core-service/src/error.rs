use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    /// The actor has exited; no further commands are accepted.
    #[error("Player daemon is not running")]
    DaemonStopped,

    #[error("Player daemon task failed: {0}")]
    TaskFailed(String),

    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::RuntimeError),

    #[error("Bridge error: {0}")]
    Bridge(#[from] bridge_traits::BridgeError),

    #[error("Library error: {0}")]
    Library(#[from] core_library::LibraryError),

    #[error("Metadata error: {0}")]
    Metadata(#[from] core_metadata::MetadataError),

    #[error("Playback error: {0}")]
    Playback(#[from] core_playback::PlaybackError),
}

pub type Result<T> = std::result::Result<T, CoreError>;
