//! # Player Handle
//!
//! Cloneable client of the playback actor. Commands are queued without
//! waiting; queries await the actor's reply. Sink controls (pause, resume,
//! volume) bypass the actor and take effect immediately.

use crate::commands::Command;
use crate::daemon::RequestTokens;
use crate::error::{CoreError, Result};
use core_async::sync::{mpsc, oneshot};
use core_async::task::JoinHandle;
use core_library::cache::PlaylistCache;
use core_library::models::{Playlist, PlaylistId, Track};
use core_playback::SinkControl;
use core_runtime::events::{DaemonEvent, EventBus, Receiver};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

#[derive(Clone)]
pub struct PlayerHandle {
    commands: mpsc::UnboundedSender<Command>,
    event_bus: EventBus,
    sink: SinkControl,
    requests: RequestTokens,
    cache: Arc<PlaylistCache>,
    actor: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl PlayerHandle {
    pub(crate) fn new(
        commands: mpsc::UnboundedSender<Command>,
        event_bus: EventBus,
        sink: SinkControl,
        requests: RequestTokens,
        cache: Arc<PlaylistCache>,
        actor: JoinHandle<()>,
    ) -> Self {
        Self {
            commands,
            event_bus,
            sink,
            requests,
            cache,
            actor: Arc::new(Mutex::new(Some(actor))),
        }
    }

    /// Queues a raw command.
    pub fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| CoreError::DaemonStopped)
    }

    async fn query<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.send(command(reply))?;
        response.await.map_err(|_| CoreError::DaemonStopped)
    }

    // ========================================================================
    // Events
    // ========================================================================

    pub fn subscribe(&self) -> Receiver<DaemonEvent> {
        self.event_bus.subscribe()
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    // ========================================================================
    // Playback
    // ========================================================================

    /// Resolves the track's URL, stops whatever is playing and plays it.
    ///
    /// Supersedes any earlier `play_track` still in flight. If resolution
    /// fails the current session keeps playing.
    pub fn play_track(&self, track: Arc<Track>) -> Result<()> {
        let cancel = self.requests.begin();
        debug!(track_id = %track.id, "Requesting playback");
        self.send(Command::FetchStreamUrl {
            track: Arc::clone(&track),
            cancel: cancel.clone(),
        })?;
        self.send(Command::Stop {
            request: Some(cancel.clone()),
        })?;
        self.send(Command::PlayTrack { track, cancel })
    }

    /// Stops playback, replaces the queue with `playlist` and starts it.
    pub fn play_playlist(&self, playlist: &Playlist) -> Result<()> {
        self.stop()?;
        self.set_queue(playlist.tracks.clone())?;
        self.start_queue()
    }

    /// Stops playback and abandons any `play_track` still in flight.
    pub fn stop(&self) -> Result<()> {
        self.requests.cancel();
        self.send(Command::Stop { request: None })
    }

    pub fn set_queue(&self, tracks: Vec<Arc<Track>>) -> Result<()> {
        self.send(Command::SetQueue(tracks))
    }

    /// Plays the track at the queue position and advances it. Supersedes
    /// any earlier request still in flight.
    pub fn start_queue(&self) -> Result<()> {
        let cancel = self.requests.begin();
        self.send(Command::StartQueue { cancel })
    }

    /// Same as [`start_queue`](Self::start_queue).
    pub fn next(&self) -> Result<()> {
        self.start_queue()
    }

    pub fn set_queue_position(&self, track: Arc<Track>) -> Result<()> {
        self.send(Command::SetQueuePosition(track))
    }

    pub fn seek(&self, position: Duration) -> Result<()> {
        self.send(Command::Seek(position))
    }

    pub fn pause(&self) -> bool {
        self.sink.pause()
    }

    pub fn resume(&self) -> bool {
        self.sink.resume()
    }

    pub fn set_volume(&self, volume: f32) {
        self.sink.set_volume(volume);
    }

    pub fn volume(&self) -> f32 {
        self.sink.volume()
    }

    pub fn is_playing(&self) -> bool {
        self.sink.is_playing()
    }

    // ========================================================================
    // Playlists
    // ========================================================================

    /// Fetches and registers playlists in the background. Completion is
    /// always announced with a `PlaylistsRegistered` event, whose id list is
    /// empty when nothing could be fetched.
    pub fn register_playlists<I, S>(&self, ids: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids = ids.into_iter().map(PlaylistId::new).collect();
        self.send(Command::RegisterPlaylists(ids))
    }

    /// Deletes every cached playlist. Returns how many were removed.
    pub async fn clear_cache(&self) -> Result<usize> {
        Ok(self.cache.clear().await?)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub async fn queue(&self) -> Result<Vec<Arc<Track>>> {
        self.query(Command::GetQueue).await
    }

    pub async fn queue_position(&self) -> Result<usize> {
        self.query(Command::GetQueuePosition).await
    }

    pub async fn registered_playlists(&self) -> Result<Vec<Playlist>> {
        self.query(Command::GetRegisteredPlaylists).await
    }

    /// Fails with `PlaybackError::NothingPlaying` when idle.
    pub async fn current_track_duration(&self) -> Result<Duration> {
        Ok(self.query(Command::GetCurrentTrackDuration).await??)
    }

    pub async fn progress(&self) -> Result<Option<Duration>> {
        self.query(Command::GetProgress).await
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Stops playback, ends the actor and waits for it to exit.
    pub async fn shutdown(&self) -> Result<()> {
        self.requests.cancel();
        // Already gone is fine; the join below still completes.
        self.commands.send(Command::Shutdown).ok();

        let actor = self.actor.lock().take();
        if let Some(actor) = actor {
            if let Err(e) = actor.await {
                error!(error = %e, "Player daemon task failed");
                return Err(CoreError::TaskFailed(e.to_string()));
            }
        }
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }
}
