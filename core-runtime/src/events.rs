//! # Event Bus
//!
//! One-directional notification channel from the daemon to its observers,
//! built on `tokio::sync::broadcast`.
//!
//! ```text
//! ┌──────────────┐   emit    ┌───────────┐  subscribe  ┌────────────┐
//! │ Player actor ├──────────>│           ├────────────>│ log writer │
//! └──────────────┘           │ EventBus  │             └────────────┘
//! ┌──────────────┐   emit    │(broadcast)│  subscribe  ┌────────────┐
//! │ Coordinator  ├──────────>│           ├────────────>│     UI     │
//! └──────────────┘           └───────────┘             └────────────┘
//! ```
//!
//! The core only ever writes to the bus. Emitting with no subscribers is not
//! an error worth reporting; producers call `emit(..).ok()`.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{DaemonEvent, EventBus};
//!
//! # core_async::runtime::block_on(async {
//! let bus = EventBus::new(16);
//! let mut rx = bus.subscribe();
//!
//! bus.emit(DaemonEvent::info("playback stopped")).ok();
//! assert_eq!(rx.recv().await.unwrap(), DaemonEvent::info("playback stopped"));
//! # });
//! ```
//!
//! ## Error Handling
//!
//! - `RecvError::Lagged(n)`: the subscriber fell behind and missed `n` events;
//!   it can keep receiving.
//! - `RecvError::Closed`: every sender is gone, the daemon has shut down.

use core_async::sync::broadcast;
use core_async::task::{self, JoinHandle};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, error, info, warn};

pub use core_async::sync::broadcast::error::{RecvError, SendError};
pub use core_async::sync::broadcast::Receiver;

pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

/// Now-playing information carried by [`DaemonEvent::TrackStarted`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackSnapshot {
    pub id: String,
    pub title: String,
    pub locator: String,
    pub uploader: String,
    pub duration_secs: u64,
    pub stream_url: Option<String>,
}

/// Failure class attached to [`DaemonEvent::Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// External tool failed, exited non-zero or printed unusable output.
    Resolution,
    /// The media stream could not be opened or read.
    Network,
    /// Container or codec failure inside the decode pipeline.
    Decode,
    /// The audio output device rejected the stream.
    Output,
    /// The command was rejected (empty queue, missing URL, session active).
    InvalidRequest,
    /// Playlist cache I/O.
    Cache,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum DaemonEvent {
    Info {
        message: String,
    },
    Error {
        kind: ErrorKind,
        message: String,
    },
    TrackStarted {
        track: TrackSnapshot,
    },
    PlaylistsRegistered {
        playlist_ids: Vec<String>,
    },
}

impl DaemonEvent {
    pub fn info(message: impl Into<String>) -> Self {
        DaemonEvent::Info {
            message: message.into(),
        }
    }

    pub fn error(kind: ErrorKind, message: impl fmt::Display) -> Self {
        DaemonEvent::Error {
            kind,
            message: message.to_string(),
        }
    }

    pub fn description(&self) -> &str {
        match self {
            DaemonEvent::Info { .. } => "Informational message",
            DaemonEvent::Error { .. } => "Daemon error",
            DaemonEvent::TrackStarted { .. } => "Track started",
            DaemonEvent::PlaylistsRegistered { .. } => "Playlists registered",
        }
    }

    pub fn severity(&self) -> EventSeverity {
        match self {
            DaemonEvent::Error { .. } => EventSeverity::Error,
            DaemonEvent::TrackStarted { .. } | DaemonEvent::Info { .. } => EventSeverity::Info,
            DaemonEvent::PlaylistsRegistered { .. } => EventSeverity::Debug,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, DaemonEvent::Error { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

/// Broadcast channel shared by every event producer.
///
/// Cloning is cheap; all clones publish into the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DaemonEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event. Fails only when nobody is subscribed.
    pub fn emit(&self, event: DaemonEvent) -> Result<usize, SendError<DaemonEvent>> {
        self.sender.send(event)
    }

    pub fn subscribe(&self) -> Receiver<DaemonEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

type EventFilter = Box<dyn Fn(&DaemonEvent) -> bool + Send + Sync>;

/// Receiver wrapper with an optional predicate.
pub struct EventStream {
    receiver: Receiver<DaemonEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<DaemonEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&DaemonEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    pub async fn recv(&mut self) -> Result<DaemonEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            match &self.filter {
                Some(filter) if !filter(&event) => continue,
                _ => return Ok(event),
            }
        }
    }

    /// Non-blocking receive. `None` means nothing is queued right now.
    pub fn try_recv(&mut self) -> Option<Result<DaemonEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => match &self.filter {
                    Some(filter) if !filter(&event) => continue,
                    _ => return Some(Ok(event)),
                },
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

/// Subscribes to `bus` and mirrors every event into `tracing`.
///
/// The task ends when the bus closes.
pub fn spawn_event_logger(bus: &EventBus) -> JoinHandle<()> {
    let mut receiver = bus.subscribe();
    task::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, "Event logger lagged behind the bus");
                }
                Err(RecvError::Closed) => break,
            }
        }
        debug!("Event bus closed, event logger exiting");
    })
}

fn log_event(event: &DaemonEvent) {
    match event {
        DaemonEvent::Info { message } => info!(target: "playlistd::events", "{message}"),
        DaemonEvent::Error { kind, message } => {
            error!(target: "playlistd::events", ?kind, "{message}")
        }
        DaemonEvent::TrackStarted { track } => info!(
            target: "playlistd::events",
            track_id = %track.id,
            duration_secs = track.duration_secs,
            "Now playing: {}",
            track.title
        ),
        DaemonEvent::PlaylistsRegistered { playlist_ids } => debug!(
            target: "playlistd::events",
            count = playlist_ids.len(),
            "Playlists registered"
        ),
    }
}
