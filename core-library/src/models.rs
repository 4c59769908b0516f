//! Domain models for playlists and tracks.

use crate::error::{LibraryError, Result};
use core_runtime::events::TrackSnapshot;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

// =============================================================================
// ID Types
// =============================================================================

/// Identifier assigned by the remote service (e.g. a video id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub String);

impl TrackId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaylistId(pub String);

impl PlaylistId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlaylistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlaylistId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

// =============================================================================
// Track
// =============================================================================

/// One playable item.
///
/// Every field except the stream URL is fixed at construction. The stream
/// URL is signed and short-lived, so it is never serialized and never part
/// of equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    /// Page URL handed to the resolver.
    pub locator: String,
    pub uploader: String,
    pub duration_secs: u64,
    #[serde(skip)]
    stream_url: OnceLock<String>,
}

impl Track {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        locator: impl Into<String>,
        uploader: impl Into<String>,
        duration_secs: u64,
    ) -> Self {
        Self {
            id: TrackId::new(id),
            title: title.into(),
            locator: locator.into(),
            uploader: uploader.into(),
            duration_secs,
            stream_url: OnceLock::new(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.id.as_str().trim().is_empty() {
            return Err(LibraryError::InvalidInput {
                field: "id".to_string(),
                message: "Track id cannot be empty".to_string(),
            });
        }
        if self.locator.trim().is_empty() {
            return Err(LibraryError::InvalidInput {
                field: "locator".to_string(),
                message: format!("Track {} has no source locator", self.id),
            });
        }
        Ok(())
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }

    pub fn stream_url(&self) -> Option<&str> {
        self.stream_url.get().map(String::as_str)
    }

    pub fn has_stream_url(&self) -> bool {
        self.stream_url().is_some_and(|url| !url.is_empty())
    }

    /// Records the resolved media URL. Fails if one was already recorded.
    pub fn set_stream_url(&self, url: impl Into<String>) -> Result<()> {
        self.stream_url
            .set(url.into())
            .map_err(|_| LibraryError::StreamUrlAlreadySet(self.id.to_string()))
    }

    pub fn snapshot(&self) -> TrackSnapshot {
        TrackSnapshot {
            id: self.id.to_string(),
            title: self.title.clone(),
            locator: self.locator.clone(),
            uploader: self.uploader.clone(),
            duration_secs: self.duration_secs,
            stream_url: self.stream_url().map(str::to_string),
        }
    }
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.title == other.title
            && self.locator == other.locator
            && self.uploader == other.uploader
            && self.duration_secs == other.duration_secs
    }
}

impl Eq for Track {}

// =============================================================================
// Playlist
// =============================================================================

/// Ordered, named collection of tracks. Order defines default playback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: PlaylistId,
    pub title: String,
    pub channel: String,
    #[serde(default)]
    pub description: String,
    pub tracks: Vec<Arc<Track>>,
}

impl Playlist {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        channel: impl Into<String>,
        tracks: Vec<Track>,
    ) -> Self {
        Self {
            id: PlaylistId::new(id),
            title: title.into(),
            channel: channel.into(),
            description: String::new(),
            tracks: tracks.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Sum of all track durations.
    pub fn total_duration(&self) -> Duration {
        self.tracks.iter().map(|track| track.duration()).sum()
    }

    pub fn find_track(&self, id: &TrackId) -> Option<&Arc<Track>> {
        self.tracks.iter().find(|track| &track.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: &str) -> Track {
        Track::new(
            id,
            format!("Song {id}"),
            format!("https://www.youtube.com/watch?v={id}"),
            "Some Channel",
            200,
        )
    }

    #[test]
    fn test_stream_url_is_set_once() {
        let t = track("a");
        assert!(!t.has_stream_url());

        t.set_stream_url("https://cdn.example/a").unwrap();
        assert_eq!(t.stream_url(), Some("https://cdn.example/a"));

        let err = t.set_stream_url("https://cdn.example/other").unwrap_err();
        assert!(matches!(err, LibraryError::StreamUrlAlreadySet(id) if id == "a"));
        assert_eq!(t.stream_url(), Some("https://cdn.example/a"));
    }

    #[test]
    fn test_url_resolution_visible_through_shared_reference() {
        let playlist = Playlist::new("PL1", "Mix", "Owner", vec![track("a"), track("b")]);
        let queued = Arc::clone(&playlist.tracks[1]);

        queued.set_stream_url("https://cdn.example/b").unwrap();

        assert_eq!(playlist.tracks[1].stream_url(), Some("https://cdn.example/b"));
    }

    #[test]
    fn test_equality_ignores_stream_url() {
        let resolved = track("a");
        resolved.set_stream_url("https://cdn.example/a").unwrap();
        assert_eq!(resolved, track("a"));
        assert_ne!(track("a"), track("b"));
    }

    #[test]
    fn test_validate_rejects_empty_id() {
        let t = Track::new("  ", "t", "https://x", "u", 1);
        assert!(matches!(
            t.validate(),
            Err(LibraryError::InvalidInput { field, .. }) if field == "id"
        ));
        assert!(track("ok").validate().is_ok());
    }

    #[test]
    fn test_snapshot_carries_url() {
        let t = track("a");
        assert_eq!(t.snapshot().stream_url, None);
        t.set_stream_url("https://cdn.example/a").unwrap();
        let snap = t.snapshot();
        assert_eq!(snap.id, "a");
        assert_eq!(snap.duration_secs, 200);
        assert_eq!(snap.stream_url.as_deref(), Some("https://cdn.example/a"));
    }

    #[test]
    fn test_playlist_helpers() {
        let playlist = Playlist::new("PL1", "Mix", "Owner", vec![track("a"), track("b")])
            .with_description("weekend");
        assert_eq!(playlist.len(), 2);
        assert_eq!(playlist.total_duration(), Duration::from_secs(400));
        assert_eq!(playlist.description, "weekend");
        assert!(playlist.find_track(&TrackId::new("b")).is_some());
        assert!(playlist.find_track(&TrackId::new("z")).is_none());
    }

    #[test]
    fn test_serialization_skips_stream_url() {
        let t = track("a");
        t.set_stream_url("https://cdn.example/a?sig=secret").unwrap();
        let json = serde_json::to_string(&t).unwrap();
        assert!(!json.contains("secret"));

        let back: Track = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
        assert_eq!(back.stream_url(), None);
    }
}
