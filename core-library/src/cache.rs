//! # Playlist Cache
//!
//! File-backed store of fetched playlists, one JSON document per playlist
//! identifier. The cache is an optimization only:
//!
//! - [`PlaylistCache::load`] reports a miss for absent, unreadable, corrupt or
//!   outdated entries
//! - [`PlaylistCache::save`] is best-effort and logs failures
//! - [`PlaylistCache::clear`] removes every entry and succeeds on an empty or
//!   missing directory
//!
//! Writes go to a temporary file first and are renamed into place, so a
//! reader never observes a half-written entry.

use crate::error::Result;
use crate::models::{Playlist, PlaylistId};
use chrono::{DateTime, Utc};
use core_async::{fs, sync::Mutex};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, warn};

const ENTRY_EXTENSION: &str = "json";
const TEMP_EXTENSION: &str = "tmp";
const ENTRY_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    version: u32,
    fetched_at: DateTime<Utc>,
    playlist: Playlist,
}

pub struct PlaylistCache {
    dir: PathBuf,
    // Serializes writers and `clear` so a rename never races a removal.
    write_lock: Mutex<()>,
}

impl PlaylistCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the entry for `id`.
    ///
    /// Identifiers made of `[A-Za-z0-9_-]` map to `<id>.json`; anything else
    /// is hashed so it cannot escape the cache directory.
    pub fn entry_path(&self, id: &PlaylistId) -> PathBuf {
        self.dir.join(format!("{}.{ENTRY_EXTENSION}", file_stem(id)))
    }

    /// Returns the cached playlist, or `None` on any kind of miss.
    #[instrument(skip(self), fields(playlist_id = %id))]
    pub async fn load(&self, id: &PlaylistId) -> Option<Playlist> {
        let path = self.entry_path(id);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Cache miss");
                return None;
            }
            Err(e) => {
                warn!(error = %e, path = %path.display(), "Failed to read cache entry");
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_slice(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, path = %path.display(), "Ignoring corrupt cache entry");
                return None;
            }
        };

        if entry.version != ENTRY_VERSION || entry.playlist.id != *id {
            warn!(
                version = entry.version,
                cached_id = %entry.playlist.id,
                "Ignoring mismatched cache entry"
            );
            return None;
        }

        debug!(
            tracks = entry.playlist.len(),
            fetched_at = %entry.fetched_at,
            "Cache hit"
        );
        Some(entry.playlist)
    }

    /// Stores `playlist`, logging instead of failing.
    pub async fn save(&self, playlist: &Playlist) {
        if let Err(e) = self.try_save(playlist).await {
            warn!(playlist_id = %playlist.id, error = %e, "Failed to write cache entry");
        }
    }

    /// Stores `playlist` and reports failures to the caller.
    #[instrument(skip(self, playlist), fields(playlist_id = %playlist.id))]
    pub async fn try_save(&self, playlist: &Playlist) -> Result<()> {
        let entry = CacheEntry {
            version: ENTRY_VERSION,
            fetched_at: Utc::now(),
            playlist: playlist.clone(),
        };
        let bytes = serde_json::to_vec_pretty(&entry)?;

        let path = self.entry_path(&playlist.id);
        let temp = path.with_extension(TEMP_EXTENSION);

        let _guard = self.write_lock.lock().await;
        fs::create_dir_all(&self.dir).await?;
        fs::write(&temp, &bytes).await?;
        fs::rename(&temp, &path).await?;

        debug!(bytes = bytes.len(), "Cache entry written");
        Ok(())
    }

    /// Removes every entry. Returns the number of entries removed.
    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    pub async fn clear(&self) -> Result<usize> {
        let _guard = self.write_lock.lock().await;

        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_entry = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == ENTRY_EXTENSION || ext == TEMP_EXTENSION);
            if !is_entry {
                continue;
            }

            match fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        debug!(removed, "Cache cleared");
        Ok(removed)
    }
}

fn file_stem(id: &PlaylistId) -> String {
    let raw = id.as_str();
    let safe = !raw.is_empty()
        && raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if safe {
        return raw.to_string();
    }

    let digest = Sha256::digest(raw.as_bytes());
    let hex: String = digest.iter().map(|byte| format!("{byte:02x}")).collect();
    format!("h-{hex}")
}
