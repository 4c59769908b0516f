//! # Resolver
//!
//! Turns playlist identifiers into [`Playlist`]s and tracks into playable
//! media URLs by invoking an external command-line tool.
//!
//! Two invocations are used:
//!
//! ```text
//! <tool> --flat-playlist --dump-single-json <prefix><playlist id> --quiet --no-warnings
//! <tool> -f <format selector> -g <track locator> --quiet --no-warnings
//! ```
//!
//! Any configured extra arguments are appended to both. The tool is treated
//! as failed whenever it writes anything to stderr, in which case the stderr
//! text becomes the error message.

use crate::error::{MetadataError, Result};
use crate::tool_output::ToolPlaylist;
use async_trait::async_trait;
use bridge_traits::process::{ProcessOutput, ProcessRunner};
use core_library::models::{Playlist, PlaylistId, Track};
use core_runtime::config::DaemonConfig;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

const QUIET_ARGS: [&str; 2] = ["--quiet", "--no-warnings"];

/// Source of playlist listings and stream URLs.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Lists the tracks of a playlist. Returned tracks have no stream URL.
    async fn fetch_playlist(&self, id: &PlaylistId) -> Result<Playlist>;

    /// Resolves a track's locator into a direct media URL.
    async fn resolve_stream_url(&self, track: &Track) -> Result<String>;
}

/// Settings for [`ToolResolver`].
#[derive(Debug, Clone)]
pub struct ToolSettings {
    pub program: String,
    pub extra_args: Vec<String>,
    pub audio_format: String,
    pub playlist_url_prefix: String,
}

impl From<&DaemonConfig> for ToolSettings {
    fn from(config: &DaemonConfig) -> Self {
        Self {
            program: config.tool_program.clone(),
            extra_args: config.tool_extra_args.clone(),
            audio_format: config.audio_format.clone(),
            playlist_url_prefix: config.playlist_url_prefix.clone(),
        }
    }
}

/// [`Resolver`] backed by a yt-dlp compatible executable.
pub struct ToolResolver {
    runner: Arc<dyn ProcessRunner>,
    settings: ToolSettings,
}

impl ToolResolver {
    pub fn new(runner: Arc<dyn ProcessRunner>, settings: ToolSettings) -> Self {
        Self { runner, settings }
    }

    pub fn from_config(runner: Arc<dyn ProcessRunner>, config: &DaemonConfig) -> Self {
        Self::new(runner, ToolSettings::from(config))
    }

    pub fn settings(&self) -> &ToolSettings {
        &self.settings
    }

    pub(crate) fn playlist_args(&self, id: &PlaylistId) -> Vec<String> {
        let mut args = vec![
            "--flat-playlist".to_string(),
            "--dump-single-json".to_string(),
            format!("{}{}", self.settings.playlist_url_prefix, id),
        ];
        self.push_common_args(&mut args);
        args
    }

    pub(crate) fn stream_url_args(&self, track: &Track) -> Vec<String> {
        let mut args = vec![
            "-f".to_string(),
            self.settings.audio_format.clone(),
            "-g".to_string(),
            track.locator.clone(),
        ];
        self.push_common_args(&mut args);
        args
    }

    fn push_common_args(&self, args: &mut Vec<String>) {
        args.extend(QUIET_ARGS.iter().map(|arg| arg.to_string()));
        args.extend(self.settings.extra_args.iter().cloned());
    }

    async fn invoke(&self, args: &[String]) -> Result<ProcessOutput> {
        let program = &self.settings.program;
        let output = self.runner.run(program, args).await?;

        let stderr = output.stderr_text();
        if !stderr.is_empty() {
            warn!(program = %program, status = ?output.status, stderr = %stderr, "Tool reported an error");
            return Err(MetadataError::Tool {
                program: program.clone(),
                stderr,
            });
        }
        if !output.success() {
            return Err(MetadataError::ExitStatus {
                program: program.clone(),
                status: output.status,
            });
        }
        Ok(output)
    }
}

#[async_trait]
impl Resolver for ToolResolver {
    #[instrument(skip(self), fields(playlist_id = %id))]
    async fn fetch_playlist(&self, id: &PlaylistId) -> Result<Playlist> {
        if id.as_str().trim().is_empty() {
            return Err(MetadataError::InvalidMetadata(
                "Playlist id cannot be empty".to_string(),
            ));
        }

        let output = self.invoke(&self.playlist_args(id)).await?;
        let playlist = ToolPlaylist::parse(&output.stdout)?.into_playlist(id);

        debug!(title = %playlist.title, tracks = playlist.len(), "Fetched playlist");
        Ok(playlist)
    }

    #[instrument(skip(self, track), fields(track_id = %track.id))]
    async fn resolve_stream_url(&self, track: &Track) -> Result<String> {
        let output = self.invoke(&self.stream_url_args(track)).await?;

        // `-g` prints one URL per selected format; audio-only selectors give one.
        let url = output
            .stdout_text()
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string)
            .ok_or_else(|| MetadataError::EmptyUrl(track.id.to_string()))?;

        debug!("Resolved stream URL");
        Ok(url)
    }
}
