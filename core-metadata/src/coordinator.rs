//! # Playlist Fetch Coordinator
//!
//! Fetches many playlists concurrently with a fixed upper bound on in-flight
//! fetches. Each playlist is read through the [`PlaylistCache`]: a hit skips
//! the tool entirely, a miss fetches and writes the result back.
//!
//! One playlist failing does not affect the others. Failures are published
//! as `Error` events and the playlist is left out of the result.

use crate::error::MetadataError;
use crate::resolver::Resolver;
use core_async::sync::Semaphore;
use core_async::task::{self, JoinHandle};
use core_library::cache::PlaylistCache;
use core_library::models::{Playlist, PlaylistId};
use core_runtime::events::{DaemonEvent, ErrorKind, EventBus};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

pub struct PlaylistFetchCoordinator {
    resolver: Arc<dyn Resolver>,
    cache: Arc<PlaylistCache>,
    event_bus: EventBus,
    max_concurrent: usize,
}

impl PlaylistFetchCoordinator {
    pub fn new(
        resolver: Arc<dyn Resolver>,
        cache: Arc<PlaylistCache>,
        event_bus: EventBus,
        max_concurrent: usize,
    ) -> Self {
        Self {
            resolver,
            cache,
            event_bus,
            max_concurrent: max_concurrent.max(1),
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Fetches every id and returns the successes in request order.
    ///
    /// Duplicate ids are fetched once. Returns only after every fetch has
    /// finished.
    #[instrument(skip(self, ids), fields(requested = ids.len(), limit = self.max_concurrent))]
    pub async fn fetch_all(&self, ids: Vec<PlaylistId>) -> Vec<Playlist> {
        let mut seen = HashSet::new();
        let ids: Vec<PlaylistId> = ids.into_iter().filter(|id| seen.insert(id.clone())).collect();

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut handles: Vec<(PlaylistId, JoinHandle<Option<Playlist>>)> =
            Vec::with_capacity(ids.len());

        for id in ids {
            let semaphore = Arc::clone(&semaphore);
            let resolver = Arc::clone(&self.resolver);
            let cache = Arc::clone(&self.cache);
            let event_bus = self.event_bus.clone();
            let task_id = id.clone();

            let handle = task::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return None,
                };
                match fetch_one(resolver.as_ref(), &cache, &task_id).await {
                    Ok(playlist) => Some(playlist),
                    Err(e) => {
                        warn!(playlist_id = %task_id, error = %e, "Playlist fetch failed");
                        event_bus
                            .emit(DaemonEvent::error(
                                ErrorKind::Resolution,
                                format!("Failed to fetch playlist {task_id}: {e}"),
                            ))
                            .ok();
                        None
                    }
                }
            });
            handles.push((id, handle));
        }

        let mut playlists = Vec::with_capacity(handles.len());
        for (id, handle) in handles {
            match handle.await {
                Ok(Some(playlist)) => playlists.push(playlist),
                Ok(None) => {}
                Err(e) => {
                    error!(playlist_id = %id, error = %e, "Playlist fetch task panicked");
                    self.event_bus
                        .emit(DaemonEvent::error(
                            ErrorKind::Resolution,
                            format!("Failed to fetch playlist {id}: task aborted"),
                        ))
                        .ok();
                }
            }
        }

        info!(fetched = playlists.len(), "Playlist fetch finished");
        playlists
    }
}

async fn fetch_one(
    resolver: &dyn Resolver,
    cache: &PlaylistCache,
    id: &PlaylistId,
) -> Result<Playlist, MetadataError> {
    if let Some(playlist) = cache.load(id).await {
        debug!(playlist_id = %id, "Serving playlist from cache");
        return Ok(playlist);
    }

    let playlist = resolver.fetch_playlist(id).await?;
    cache.save(&playlist).await;
    Ok(playlist)
}
