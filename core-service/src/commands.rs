//! # Player Commands
//!
//! Everything the playback actor can be asked to do. Commands are handled
//! one at a time in submission order; queries carry a single-use reply
//! channel.

use core_async::sync::{oneshot, CancellationToken};
use core_library::models::{Playlist, PlaylistId, Track};
use core_playback::PlaybackError;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug)]
pub enum Command {
    /// Tears down the current session, if any.
    ///
    /// When `request` is set the stop belongs to a `play_track` request and
    /// is skipped once that request has been superseded.
    Stop { request: Option<CancellationToken> },

    /// Replaces the queue and rewinds it. Playback is not interrupted.
    SetQueue(Vec<Arc<Track>>),

    /// Plays the track at the queue position, then advances the position.
    ///
    /// Resolution, stop and playback all run under `cancel`; the command
    /// does nothing once a newer request has cancelled it.
    StartQueue { cancel: CancellationToken },

    /// Moves the queue position to `track`, matched by identity first and
    /// by id second. Unknown tracks are ignored.
    SetQueuePosition(Arc<Track>),

    /// Resolves the track's media URL unless it already has one.
    FetchStreamUrl {
        track: Arc<Track>,
        cancel: CancellationToken,
    },

    /// Opens the track's media URL and starts a new session.
    PlayTrack {
        track: Arc<Track>,
        cancel: CancellationToken,
    },

    /// Fetches playlists in the background and registers them.
    RegisterPlaylists(Vec<PlaylistId>),

    /// Merges fetched playlists into the registry. Sent by the daemon once a
    /// `RegisterPlaylists` fetch completes.
    PlaylistsFetched(Vec<Playlist>),

    /// Decoding of session `session_id` failed. Sent by the session's decode
    /// thread; ignored if that session is no longer current.
    SessionFailed { session_id: Uuid },

    /// Repositions the current session.
    Seek(Duration),

    GetQueue(oneshot::Sender<Vec<Arc<Track>>>),

    GetQueuePosition(oneshot::Sender<usize>),

    GetRegisteredPlaylists(oneshot::Sender<Vec<Playlist>>),

    GetCurrentTrackDuration(oneshot::Sender<Result<Duration, PlaybackError>>),

    /// Decode position of the current session, `None` when idle.
    GetProgress(oneshot::Sender<Option<Duration>>),

    /// Tears down the session and ends the actor.
    Shutdown,
}

impl Command {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Stop { .. } => "stop",
            Command::SetQueue(_) => "set_queue",
            Command::StartQueue { .. } => "start_queue",
            Command::SetQueuePosition(_) => "set_queue_position",
            Command::FetchStreamUrl { .. } => "fetch_stream_url",
            Command::PlayTrack { .. } => "play_track",
            Command::RegisterPlaylists(_) => "register_playlists",
            Command::PlaylistsFetched(_) => "playlists_fetched",
            Command::SessionFailed { .. } => "session_failed",
            Command::Seek(_) => "seek",
            Command::GetQueue(_) => "get_queue",
            Command::GetQueuePosition(_) => "get_queue_position",
            Command::GetRegisteredPlaylists(_) => "get_registered_playlists",
            Command::GetCurrentTrackDuration(_) => "get_current_track_duration",
            Command::GetProgress(_) => "get_progress",
            Command::Shutdown => "shutdown",
        }
    }
}
