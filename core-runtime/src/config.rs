//! # Daemon Configuration
//!
//! Builder-based configuration for the playback daemon. Hosts construct a
//! [`DaemonConfig`] in code; reading it from a file is left to the host.
//!
//! `build()` validates eagerly so a bad value fails at startup instead of on
//! the first playback request.
//!
//! ```rust
//! use core_runtime::config::DaemonConfig;
//! use std::time::Duration;
//!
//! let config = DaemonConfig::builder()
//!     .cache_dir("/tmp/playlistd")
//!     .fetch_concurrency(4)
//!     .resolve_backoff(Duration::from_millis(500))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.resolve_attempts, 3);
//! assert_eq!(config.playlist_cache_dir(), std::path::Path::new("/tmp/playlistd/playlists"));
//! ```

use crate::error::{Result, RuntimeError};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_TOOL_PROGRAM: &str = "yt-dlp";
/// Prefers AAC in MP4, which the decoder handles natively.
pub const DEFAULT_AUDIO_FORMAT: &str = "bestaudio[ext=m4a]/bestaudio";
pub const DEFAULT_PLAYLIST_URL_PREFIX: &str = "https://www.youtube.com/playlist?list=";
pub const DEFAULT_FETCH_CONCURRENCY: usize = 3;
pub const DEFAULT_RESOLVE_ATTEMPTS: u32 = 3;
pub const DEFAULT_RESOLVE_BACKOFF: Duration = Duration::from_secs(2);
pub const DEFAULT_STREAM_OPEN_ATTEMPTS: u32 = 2;

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Root directory for daemon state; playlists live in `<cache_dir>/playlists`.
    pub cache_dir: PathBuf,
    /// External resolver executable.
    pub tool_program: String,
    /// Arguments appended to every tool invocation.
    pub tool_extra_args: Vec<String>,
    /// Format selector passed to the tool when resolving a media URL.
    pub audio_format: String,
    /// Prefix turning a playlist identifier into a URL the tool accepts.
    pub playlist_url_prefix: String,
    /// Maximum number of playlist fetches in flight.
    pub fetch_concurrency: usize,
    /// Attempts per media URL resolution.
    pub resolve_attempts: u32,
    /// Pause between failed resolution attempts.
    pub resolve_backoff: Duration,
    /// Attempts to open the decode pipeline for one play request.
    pub stream_open_attempts: u32,
    /// Broadcast buffer of the event bus.
    pub event_capacity: usize,
}

impl DaemonConfig {
    pub fn builder() -> DaemonConfigBuilder {
        DaemonConfigBuilder::default()
    }

    pub fn playlist_cache_dir(&self) -> PathBuf {
        self.cache_dir.join("playlists")
    }

    pub fn validate(&self) -> Result<()> {
        if self.cache_dir.as_os_str().is_empty() {
            return Err(RuntimeError::Config(
                "Cache directory cannot be empty".to_string(),
            ));
        }
        if self.tool_program.trim().is_empty() {
            return Err(RuntimeError::Config(
                "Resolver tool program cannot be empty".to_string(),
            ));
        }
        if self.audio_format.trim().is_empty() {
            return Err(RuntimeError::Config(
                "Audio format selector cannot be empty".to_string(),
            ));
        }
        if self.fetch_concurrency == 0 {
            return Err(RuntimeError::Config(
                "Fetch concurrency must be at least 1".to_string(),
            ));
        }
        if self.resolve_attempts == 0 || self.stream_open_attempts == 0 {
            return Err(RuntimeError::Config(
                "Retry attempt counts must be at least 1".to_string(),
            ));
        }
        if self.event_capacity == 0 {
            return Err(RuntimeError::Config(
                "Event capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct DaemonConfigBuilder {
    cache_dir: Option<PathBuf>,
    tool_program: Option<String>,
    tool_extra_args: Vec<String>,
    audio_format: Option<String>,
    playlist_url_prefix: Option<String>,
    fetch_concurrency: Option<usize>,
    resolve_attempts: Option<u32>,
    resolve_backoff: Option<Duration>,
    stream_open_attempts: Option<u32>,
    event_capacity: Option<usize>,
}

impl DaemonConfigBuilder {
    pub fn cache_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.cache_dir = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn tool_program(mut self, program: impl Into<String>) -> Self {
        self.tool_program = Some(program.into());
        self
    }

    pub fn tool_arg(mut self, arg: impl Into<String>) -> Self {
        self.tool_extra_args.push(arg.into());
        self
    }

    pub fn audio_format(mut self, selector: impl Into<String>) -> Self {
        self.audio_format = Some(selector.into());
        self
    }

    pub fn playlist_url_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.playlist_url_prefix = Some(prefix.into());
        self
    }

    pub fn fetch_concurrency(mut self, limit: usize) -> Self {
        self.fetch_concurrency = Some(limit);
        self
    }

    pub fn resolve_attempts(mut self, attempts: u32) -> Self {
        self.resolve_attempts = Some(attempts);
        self
    }

    pub fn resolve_backoff(mut self, backoff: Duration) -> Self {
        self.resolve_backoff = Some(backoff);
        self
    }

    pub fn stream_open_attempts(mut self, attempts: u32) -> Self {
        self.stream_open_attempts = Some(attempts);
        self
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = Some(capacity);
        self
    }

    pub fn build(self) -> Result<DaemonConfig> {
        let cache_dir = self.cache_dir.ok_or_else(|| {
            RuntimeError::Config(
                "Cache directory is required. Use .cache_dir() to set it.".to_string(),
            )
        })?;

        let config = DaemonConfig {
            cache_dir,
            tool_program: self
                .tool_program
                .unwrap_or_else(|| DEFAULT_TOOL_PROGRAM.to_string()),
            tool_extra_args: self.tool_extra_args,
            audio_format: self
                .audio_format
                .unwrap_or_else(|| DEFAULT_AUDIO_FORMAT.to_string()),
            playlist_url_prefix: self
                .playlist_url_prefix
                .unwrap_or_else(|| DEFAULT_PLAYLIST_URL_PREFIX.to_string()),
            fetch_concurrency: self.fetch_concurrency.unwrap_or(DEFAULT_FETCH_CONCURRENCY),
            resolve_attempts: self.resolve_attempts.unwrap_or(DEFAULT_RESOLVE_ATTEMPTS),
            resolve_backoff: self.resolve_backoff.unwrap_or(DEFAULT_RESOLVE_BACKOFF),
            stream_open_attempts: self
                .stream_open_attempts
                .unwrap_or(DEFAULT_STREAM_OPEN_ATTEMPTS),
            event_capacity: self.event_capacity.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
        };

        config.validate()?;
        Ok(config)
    }
}
