//! # playlistd
//!
//! Background player for remote playlists. Playlists are listed and tracks
//! resolved through an external media tool, audio is streamed over HTTP and
//! decoded on a dedicated thread, and every state change is published on an
//! event bus.
//!
//! This crate re-exports the pieces a host needs; the workspace crates can
//! also be used directly.

pub use core_library::cache::PlaylistCache;
pub use core_library::models::{Playlist, PlaylistId, Track, TrackId};
pub use core_metadata::{PlaylistFetchCoordinator, Resolver, ToolResolver};
pub use core_playback::{PlaybackError, StreamOpener, StreamingConfig};
pub use core_runtime::config::DaemonConfig;
pub use core_runtime::events::{DaemonEvent, ErrorKind, EventBus, TrackSnapshot};
pub use core_runtime::logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
pub use core_service::{Command, CoreError, DaemonDeps, PlayerDaemon, PlayerHandle, Result};

#[cfg(feature = "desktop-shims")]
pub use core_service::bootstrap;
