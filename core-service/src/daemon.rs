//! # Player Daemon
//!
//! The playback actor: a single task that owns the queue, the playlist
//! registry and the playback session, and handles [`Command`]s one at a time.
//!
//! ## Lifecycle
//!
//! [`PlayerDaemon::start`] spawns the actor on the ambient tokio runtime and
//! returns a [`PlayerHandle`]. The actor runs until it receives
//! [`Command::Shutdown`] or every handle is dropped, and always tears down
//! the session on the way out.
//!
//! ## Sessions
//!
//! At most one session exists at any time. `PlayTrack` refuses to start
//! while one is installed; the caller (or `play_track`) sends `Stop` first.
//! Opening a stream is blocking work and runs on the blocking pool; the
//! actor awaits it, so no other command interleaves with a half-open
//! session. A session whose decoding fails reports back with
//! [`Command::SessionFailed`] and is torn down.
//!
//! ## Supersession
//!
//! `play_track` and `start_queue` take a fresh cancellation token when they
//! are called, cancelling the previous request's token. Every step of a
//! request checks its token, so a newer request or a `stop` wins even while
//! older commands are still queued.

use crate::commands::Command;
use crate::handle::PlayerHandle;
use bridge_traits::playback::AudioOutput;
use core_async::sync::{mpsc, CancellationToken};
use core_async::task::{self, JoinHandle};
use core_library::cache::PlaylistCache;
use core_library::models::{Playlist, PlaylistId, Track};
use core_metadata::{
    resolve_with_retry, MetadataError, PlaylistFetchCoordinator, PlaylistRegistry, Resolver,
    RetryPolicy,
};
use core_playback::{
    FailureHook, PlaybackError, PlaybackSession, SinkControl, StreamOpener, StreamingConfig,
    StreamingPipeline,
};
use core_runtime::config::DaemonConfig;
use core_runtime::events::{DaemonEvent, ErrorKind, EventBus};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Host capabilities the daemon runs on.
#[derive(Clone)]
pub struct DaemonDeps {
    pub resolver: Arc<dyn Resolver>,
    pub opener: Arc<dyn StreamOpener>,
    pub output: Arc<dyn AudioOutput>,
    pub cache: Arc<PlaylistCache>,
    pub streaming: StreamingConfig,
}

impl DaemonDeps {
    pub fn new(
        resolver: Arc<dyn Resolver>,
        opener: Arc<dyn StreamOpener>,
        output: Arc<dyn AudioOutput>,
        cache: Arc<PlaylistCache>,
    ) -> Self {
        Self {
            resolver,
            opener,
            output,
            cache,
            streaming: StreamingConfig::default(),
        }
    }

    pub fn with_streaming_config(mut self, streaming: StreamingConfig) -> Self {
        self.streaming = streaming;
        self
    }
}

/// Cancellation token of the newest playback request.
///
/// Starting a request cancels the one before it, so stale resolve and open
/// steps abort without installing a session.
#[derive(Clone, Default)]
pub(crate) struct RequestTokens {
    current: Arc<Mutex<Option<CancellationToken>>>,
}

impl RequestTokens {
    pub(crate) fn begin(&self) -> CancellationToken {
        let token = CancellationToken::new();
        if let Some(previous) = self.current.lock().replace(token.clone()) {
            previous.cancel();
        }
        token
    }

    pub(crate) fn cancel(&self) {
        if let Some(previous) = self.current.lock().take() {
            previous.cancel();
        }
    }
}

pub struct PlayerDaemon;

impl PlayerDaemon {
    /// Spawns the actor. Must be called from within a tokio runtime.
    pub fn start(deps: DaemonDeps, config: DaemonConfig) -> PlayerHandle {
        let (sender, inbox) = mpsc::unbounded_channel();
        let event_bus = EventBus::new(config.event_capacity);
        let sink = SinkControl::new();
        let requests = RequestTokens::default();

        let coordinator = Arc::new(PlaylistFetchCoordinator::new(
            Arc::clone(&deps.resolver),
            Arc::clone(&deps.cache),
            event_bus.clone(),
            config.fetch_concurrency,
        ));

        let actor = PlayerActor {
            inbox,
            sender: sender.downgrade(),
            deps: deps.clone(),
            config,
            event_bus: event_bus.clone(),
            sink: sink.clone(),
            requests: requests.clone(),
            coordinator,
            registry: PlaylistRegistry::new(),
            queue: Vec::new(),
            position: 0,
            session: None,
        };

        let join: JoinHandle<()> = task::spawn(actor.run());
        info!("Player daemon started");

        PlayerHandle::new(sender, event_bus, sink, requests, deps.cache, join)
    }
}

struct PlayerActor {
    inbox: mpsc::UnboundedReceiver<Command>,
    /// Weak, so dropping every handle still ends the actor.
    sender: mpsc::WeakUnboundedSender<Command>,
    deps: DaemonDeps,
    config: DaemonConfig,
    event_bus: EventBus,
    sink: SinkControl,
    requests: RequestTokens,
    coordinator: Arc<PlaylistFetchCoordinator>,
    registry: PlaylistRegistry,
    queue: Vec<Arc<Track>>,
    position: usize,
    session: Option<PlaybackSession>,
}

impl PlayerActor {
    async fn run(mut self) {
        while let Some(command) = self.inbox.recv().await {
            debug!(command = command.name(), "Handling command");
            match command {
                Command::Stop { request } => self.handle_stop(request),
                Command::SetQueue(tracks) => self.handle_set_queue(tracks),
                Command::StartQueue { cancel } => self.handle_start_queue(cancel).await,
                Command::SetQueuePosition(track) => self.handle_set_queue_position(&track),
                Command::FetchStreamUrl { track, cancel } => {
                    self.handle_fetch_stream_url(track, cancel).await
                }
                Command::PlayTrack { track, cancel } => self.handle_play_track(track, cancel).await,
                Command::RegisterPlaylists(ids) => self.handle_register_playlists(ids),
                Command::PlaylistsFetched(playlists) => self.handle_playlists_fetched(playlists),
                Command::SessionFailed { session_id } => self.handle_session_failed(session_id),
                Command::Seek(position) => self.handle_seek(position),
                Command::GetQueue(reply) => {
                    reply.send(self.queue.clone()).ok();
                }
                Command::GetQueuePosition(reply) => {
                    reply.send(self.position).ok();
                }
                Command::GetRegisteredPlaylists(reply) => {
                    reply.send(self.registry.playlists().to_vec()).ok();
                }
                Command::GetCurrentTrackDuration(reply) => {
                    let duration = self
                        .session
                        .as_ref()
                        .map(PlaybackSession::duration)
                        .ok_or(PlaybackError::NothingPlaying);
                    reply.send(duration).ok();
                }
                Command::GetProgress(reply) => {
                    let progress = self.session.as_ref().map(|s| s.pipeline().progress());
                    reply.send(progress).ok();
                }
                Command::Shutdown => break,
            }
        }

        self.requests.cancel();
        self.teardown();
        info!("Player daemon stopped");
    }

    fn emit(&self, event: DaemonEvent) {
        // No subscribers is fine; observers are optional.
        self.event_bus.emit(event).ok();
    }

    fn emit_error(&self, kind: ErrorKind, message: impl std::fmt::Display) {
        self.emit(DaemonEvent::error(kind, message));
    }

    /// Removes the session. Returns the track that was playing.
    fn teardown(&mut self) -> Option<Arc<Track>> {
        let session = self.session.take()?;
        let track = Arc::clone(&session.track);
        session.teardown(&self.sink);
        Some(track)
    }

    fn handle_stop(&mut self, request: Option<CancellationToken>) {
        if request.as_ref().is_some_and(CancellationToken::is_cancelled) {
            debug!("Skipping stop of a superseded request");
            return;
        }
        if let Some(track) = self.teardown() {
            info!(track_id = %track.id, "Playback stopped");
            self.emit(DaemonEvent::info(format!("Stopped {}", track.title)));
        }
    }

    fn handle_set_queue(&mut self, tracks: Vec<Arc<Track>>) {
        debug!(len = tracks.len(), "Queue replaced");
        self.queue = tracks;
        self.position = 0;
    }

    async fn handle_start_queue(&mut self, cancel: CancellationToken) {
        if self.queue.is_empty() {
            warn!("Asked to start an empty queue");
            self.emit_error(ErrorKind::InvalidRequest, PlaybackError::EmptyQueue);
            return;
        }
        if cancel.is_cancelled() {
            debug!("Queue start superseded");
            return;
        }

        let index = self.position;
        let track = Arc::clone(&self.queue[index]);
        self.position = (index + 1) % self.queue.len();

        info!(index, track_id = %track.id, "Starting queue");
        self.emit(DaemonEvent::info(format!(
            "Playing track {index}: {} from queue",
            track.title
        )));

        self.handle_fetch_stream_url(Arc::clone(&track), cancel.clone())
            .await;
        self.handle_stop(Some(cancel.clone()));
        self.handle_play_track(track, cancel).await;
    }

    fn handle_set_queue_position(&mut self, track: &Arc<Track>) {
        let index = self
            .queue
            .iter()
            .position(|queued| Arc::ptr_eq(queued, track))
            .or_else(|| self.queue.iter().position(|queued| queued.id == track.id));

        match index {
            Some(index) => {
                debug!(index, track_id = %track.id, "Queue position moved");
                self.position = index;
            }
            None => debug!(track_id = %track.id, "Track not in queue, position unchanged"),
        }
    }

    #[instrument(skip(self, track, cancel), fields(track_id = %track.id))]
    async fn handle_fetch_stream_url(&mut self, track: Arc<Track>, cancel: CancellationToken) {
        if track.has_stream_url() {
            debug!("Stream URL already resolved");
            return;
        }
        if cancel.is_cancelled() {
            debug!("Request superseded before resolution");
            return;
        }

        let policy = RetryPolicy::new(self.config.resolve_attempts, self.config.resolve_backoff);
        let event_bus = self.event_bus.clone();
        let attempts = policy.max_attempts;
        let title = track.title.clone();

        let resolver = Arc::clone(&self.deps.resolver);
        let outcome = resolve_with_retry(
            resolver.as_ref(),
            &track,
            policy,
            &cancel,
            |attempt, err| {
                event_bus
                    .emit(DaemonEvent::error(
                        ErrorKind::Resolution,
                        format!(
                            "Failed to fetch stream URL for {title} (attempt {attempt}/{attempts}): {err}"
                        ),
                    ))
                    .ok();
            },
        )
        .await;

        match outcome {
            Ok(url) => {
                if let Err(e) = track.set_stream_url(url) {
                    // Resolved concurrently by another request; the first URL wins.
                    debug!(error = %e, "Stream URL already set");
                }
                info!("Stream URL resolved");
            }
            Err(MetadataError::Cancelled) => debug!("Resolution cancelled"),
            Err(e) => {
                warn!(error = %e, "Giving up on stream URL");
                // Ends the request: its queued Stop and PlayTrack are skipped.
                cancel.cancel();
            }
        }
    }

    #[instrument(skip(self, track, cancel), fields(track_id = %track.id))]
    async fn handle_play_track(&mut self, track: Arc<Track>, cancel: CancellationToken) {
        if cancel.is_cancelled() {
            debug!("Request superseded before playback");
            return;
        }

        let Some(url) = track.stream_url().filter(|url| !url.is_empty()) else {
            self.emit_error(
                ErrorKind::InvalidRequest,
                PlaybackError::MissingStreamUrl(track.id.to_string()),
            );
            return;
        };
        let url = url.to_string();

        if let Some(session) = &self.session {
            warn!(active = %session.track.id, "Refusing to layer a second session");
            self.emit_error(
                ErrorKind::InvalidRequest,
                PlaybackError::SessionActive(session.track.id.to_string()),
            );
            return;
        }

        let session_id = Uuid::new_v4();
        let opened = open_pipeline(
            Arc::clone(&self.deps.opener),
            self.deps.streaming.clone(),
            self.event_bus.clone(),
            self.config.stream_open_attempts,
            FailureNotice {
                actor: self.sender.clone(),
                session_id,
            },
            &track,
            &url,
            &cancel,
        )
        .await;
        let Some(mut pipeline) = opened else {
            return;
        };

        if cancel.is_cancelled() {
            debug!("Request superseded while opening stream");
            pipeline.close();
            return;
        }

        let Some(source) = pipeline.take_source() else {
            pipeline.close();
            self.emit_error(
                ErrorKind::Decode,
                PlaybackError::Internal("pipeline source already taken".to_string()),
            );
            return;
        };

        let sink = match self.deps.output.open_sink(source) {
            Ok(sink) => sink,
            Err(e) => {
                error!(error = %e, "Audio output rejected the stream");
                pipeline.close();
                self.emit_error(
                    ErrorKind::Output,
                    PlaybackError::AudioDevice(e.to_string()),
                );
                return;
            }
        };
        self.sink.install(sink);

        info!(title = %track.title, "Track started");
        self.emit(DaemonEvent::TrackStarted {
            track: track.snapshot(),
        });
        self.session = Some(PlaybackSession::new(session_id, track, pipeline));
    }

    fn handle_register_playlists(&self, ids: Vec<PlaylistId>) {
        let Some(sender) = self.sender.upgrade() else {
            return;
        };
        let coordinator = Arc::clone(&self.coordinator);
        info!(count = ids.len(), "Registering playlists");

        // The fetch runs outside the actor; results come back as a command.
        task::spawn(async move {
            let playlists = coordinator.fetch_all(ids).await;
            sender.send(Command::PlaylistsFetched(playlists)).ok();
        });
    }

    /// Always announces completion, with no ids when every fetch failed.
    fn handle_playlists_fetched(&mut self, playlists: Vec<Playlist>) {
        let merged = self.registry.merge(playlists);
        info!(
            merged = merged.len(),
            total = self.registry.len(),
            "Playlists registered"
        );
        self.emit(DaemonEvent::PlaylistsRegistered {
            playlist_ids: merged.iter().map(|id| id.to_string()).collect(),
        });
    }

    fn handle_session_failed(&mut self, session_id: Uuid) {
        if self.session.as_ref().map(|s| s.id) != Some(session_id) {
            debug!(session = %session_id, "Failure of a retired session ignored");
            return;
        }
        if let Some(track) = self.teardown() {
            warn!(track_id = %track.id, "Session ended by decode failure");
        }
    }

    fn handle_seek(&self, position: Duration) {
        match &self.session {
            Some(session) => {
                debug!(position = ?position, "Seeking");
                session.pipeline().seek(position);
            }
            None => self.emit_error(ErrorKind::InvalidRequest, PlaybackError::NothingPlaying),
        }
    }
}

/// Where a pipeline reports that decoding failed.
#[derive(Clone)]
struct FailureNotice {
    actor: mpsc::WeakUnboundedSender<Command>,
    session_id: Uuid,
}

impl FailureNotice {
    fn into_hook(self) -> FailureHook {
        Box::new(move |_error: &PlaybackError| {
            if let Some(actor) = self.actor.upgrade() {
                actor
                    .send(Command::SessionFailed {
                        session_id: self.session_id,
                    })
                    .ok();
            }
        })
    }
}

/// Opens the stream and starts decoding, retrying recoverable failures.
/// Every failed attempt is published.
///
/// Returns as soon as `cancel` fires. An open still running on the blocking
/// pool then finishes on its own and its pipeline is dropped, which closes it.
async fn open_pipeline(
    opener: Arc<dyn StreamOpener>,
    streaming: StreamingConfig,
    event_bus: EventBus,
    attempts: u32,
    notice: FailureNotice,
    track: &Track,
    url: &str,
    cancel: &CancellationToken,
) -> Option<StreamingPipeline> {
    let attempts = attempts.max(1);

    for attempt in 1..=attempts {
        if cancel.is_cancelled() {
            return None;
        }

        let opener = Arc::clone(&opener);
        let streaming = streaming.clone();
        let bus = event_bus.clone();
        let url = url.to_string();
        let hook = notice.clone().into_hook();

        // The decoder owns blocking network clients; create it and hand it
        // to its thread without touching the async executor.
        let opening = task::spawn_blocking(move || {
            let decoder = opener.open(&url, &streaming)?;
            StreamingPipeline::spawn_with_failure_hook(decoder, &streaming, bus, Some(hook))
        });
        let Some(joined) = cancel.run_until_cancelled(opening).await else {
            debug!("Request superseded while opening stream");
            return None;
        };
        let outcome = joined
            .unwrap_or_else(|e| Err(PlaybackError::Internal(format!("Stream open task failed: {e}"))));

        match outcome {
            Ok(pipeline) => return Some(pipeline),
            Err(e) => {
                warn!(attempt, attempts, error = %e, "Failed to open stream");
                event_bus
                    .emit(DaemonEvent::error(
                        e.kind(),
                        format!(
                            "Failed to open stream for {} (attempt {attempt}/{attempts}): {e}",
                            track.title
                        ),
                    ))
                    .ok();
                if !e.is_recoverable() {
                    return None;
                }
            }
        }
    }
    None
}
