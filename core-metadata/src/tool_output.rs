//! JSON emitted by the resolution tool for `--flat-playlist --dump-single-json`.

use crate::error::Result;
use core_library::models::{Playlist, PlaylistId, Track};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Deserialize)]
pub(crate) struct ToolPlaylist {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub entries: Vec<ToolEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ToolEntry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    /// Seconds. Fractional for some extractors, absent for live entries.
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub channel_url: Option<String>,
    #[serde(default)]
    pub view_count: Option<u64>,
}

impl ToolPlaylist {
    pub(crate) fn parse(stdout: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(stdout)?)
    }

    /// Converts into the domain model under the requested identifier.
    ///
    /// Entries without an id or a usable locator are dropped.
    pub(crate) fn into_playlist(self, requested: &PlaylistId) -> Playlist {
        if let Some(id) = self.id.as_deref() {
            if id != requested.as_str() {
                debug!(requested = %requested, returned = id, "Tool reported a different playlist id");
            }
        }

        let channel = self.channel.or(self.uploader).unwrap_or_default();
        let mut tracks = Vec::with_capacity(self.entries.len());
        for entry in self.entries {
            if let Some(track) = entry.into_track() {
                tracks.push(Arc::new(track));
            }
        }

        let title = self
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| requested.to_string());

        Playlist {
            id: requested.clone(),
            title,
            channel,
            description: self.description.unwrap_or_default(),
            tracks,
        }
    }
}

impl ToolEntry {
    fn into_track(self) -> Option<Track> {
        let id = self.id.filter(|id| !id.trim().is_empty())?;
        let locator = self.url.filter(|url| !url.trim().is_empty())?;
        let duration_secs = self
            .duration
            .filter(|d| d.is_finite() && *d > 0.0)
            .map(|d| d.round() as u64)
            .unwrap_or(0);

        Some(Track::new(
            id,
            self.title.unwrap_or_default(),
            locator,
            self.uploader.or(self.channel).unwrap_or_default(),
            duration_secs,
        ))
    }
}
