//! Playback actor behaviour against in-memory bridges.

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::playback::{AudioOutput, AudioSink, PcmSource};
use core_async::time::{sleep, timeout, Duration};
use core_library::cache::PlaylistCache;
use core_library::models::{Playlist, PlaylistId, Track};
use core_metadata::{MetadataError, Resolver};
use core_playback::{
    AudioCodec, AudioDecoder, AudioFormat, PlaybackError, StreamOpener, StreamingConfig,
};
use core_runtime::config::DaemonConfig;
use core_runtime::events::{DaemonEvent, ErrorKind, Receiver};
use core_service::{Command, CoreError, DaemonDeps, PlayerDaemon, PlayerHandle};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

// ============================================================================
// Fakes
// ============================================================================

#[derive(Default)]
struct FakeResolver {
    fail_playlists: AtomicBool,
    fail_urls: AtomicBool,
    url_calls: AtomicUsize,
    fetches_active: AtomicUsize,
    fetches_peak: AtomicUsize,
}

#[async_trait]
impl Resolver for FakeResolver {
    async fn fetch_playlist(&self, id: &PlaylistId) -> core_metadata::Result<Playlist> {
        let now = self.fetches_active.fetch_add(1, Ordering::SeqCst) + 1;
        self.fetches_peak.fetch_max(now, Ordering::SeqCst);
        sleep(Duration::from_millis(30)).await;
        self.fetches_active.fetch_sub(1, Ordering::SeqCst);

        if self.fail_playlists.load(Ordering::SeqCst) {
            return Err(MetadataError::Tool {
                program: "yt-dlp".to_string(),
                stderr: format!("ERROR: playlist {id} does not exist"),
            });
        }

        Ok(Playlist::new(
            id.as_str(),
            format!("Playlist {id}"),
            "Channel",
            vec![
                Track::new(format!("{id}-1"), "First", "https://x/1", "Artist", 120),
                Track::new(format!("{id}-2"), "Second", "https://x/2", "Artist", 240),
            ],
        ))
    }

    async fn resolve_stream_url(&self, track: &Track) -> core_metadata::Result<String> {
        self.url_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_urls.load(Ordering::SeqCst) {
            return Err(MetadataError::Tool {
                program: "yt-dlp".to_string(),
                stderr: "ERROR: Video unavailable".to_string(),
            });
        }
        Ok(format!("https://cdn.example/{}", track.id))
    }
}

/// Endless quiet audio.
struct ToneDecoder {
    format: AudioFormat,
}

impl AudioDecoder for ToneDecoder {
    fn format(&self) -> &AudioFormat {
        &self.format
    }

    fn duration(&self) -> Option<Duration> {
        None
    }

    fn next_chunk(&mut self) -> core_playback::Result<Option<Vec<f32>>> {
        Ok(Some(vec![0.01; 960]))
    }

    fn seek(&mut self, position: Duration) -> core_playback::Result<Duration> {
        Ok(position)
    }
}

/// Opens fine, then fails on the first packet.
struct CorruptDecoder {
    format: AudioFormat,
}

impl AudioDecoder for CorruptDecoder {
    fn format(&self) -> &AudioFormat {
        &self.format
    }

    fn duration(&self) -> Option<Duration> {
        None
    }

    fn next_chunk(&mut self) -> core_playback::Result<Option<Vec<f32>>> {
        Err(PlaybackError::DecodingError("invalid frame header".to_string()))
    }

    fn seek(&mut self, position: Duration) -> core_playback::Result<Duration> {
        Ok(position)
    }
}

#[derive(Default)]
struct FakeOpener {
    opens: AtomicUsize,
    failures: Mutex<VecDeque<PlaybackError>>,
    corrupt: AtomicBool,
    open_delay: Mutex<Option<Duration>>,
}

impl FakeOpener {
    fn fail_next(&self, error: PlaybackError) {
        self.failures.lock().push_back(error);
    }
}

impl StreamOpener for FakeOpener {
    fn open(
        &self,
        _url: &str,
        _config: &StreamingConfig,
    ) -> core_playback::Result<Box<dyn AudioDecoder>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let delay = *self.open_delay.lock();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        if let Some(error) = self.failures.lock().pop_front() {
            return Err(error);
        }
        let format = AudioFormat::new(AudioCodec::Aac, 48_000, 2);
        if self.corrupt.load(Ordering::SeqCst) {
            return Ok(Box::new(CorruptDecoder { format }));
        }
        Ok(Box::new(ToneDecoder { format }))
    }
}

/// Counts live sinks so tests can observe how many sessions overlap.
#[derive(Default)]
struct FakeOutput {
    opened: AtomicUsize,
    active: Arc<AtomicUsize>,
    peak: AtomicUsize,
    stop_calls: Arc<AtomicUsize>,
}

impl AudioOutput for FakeOutput {
    fn open_sink(&self, source: Box<dyn PcmSource>) -> BridgeResult<Box<dyn AudioSink>> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        Ok(Box::new(FakeSink {
            source: Some(source),
            paused: false,
            volume: 1.0,
            active: Arc::clone(&self.active),
            stop_calls: Arc::clone(&self.stop_calls),
        }))
    }
}

struct FakeSink {
    source: Option<Box<dyn PcmSource>>,
    paused: bool,
    volume: f32,
    active: Arc<AtomicUsize>,
    stop_calls: Arc<AtomicUsize>,
}

impl AudioSink for FakeSink {
    fn play(&mut self) {
        self.paused = false;
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn stop(&mut self) {
        if self.source.take().is_some() {
            self.stop_calls.fetch_add(1, Ordering::SeqCst);
            self.active.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn is_finished(&self) -> bool {
        self.source.is_none()
    }
}

impl Drop for FakeSink {
    fn drop(&mut self) {
        if self.source.take().is_some() {
            self.active.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

// ============================================================================
// Harness
// ============================================================================

struct Harness {
    player: PlayerHandle,
    events: Receiver<DaemonEvent>,
    resolver: Arc<FakeResolver>,
    opener: Arc<FakeOpener>,
    output: Arc<FakeOutput>,
    _dir: TempDir,
}

impl Harness {
    fn start() -> Self {
        Self::start_with(|builder| builder)
    }

    fn start_with(
        configure: impl FnOnce(
            core_runtime::config::DaemonConfigBuilder,
        ) -> core_runtime::config::DaemonConfigBuilder,
    ) -> Self {
        let dir = TempDir::new().unwrap();
        let config: DaemonConfig = configure(
            DaemonConfig::builder()
                .cache_dir(dir.path())
                .resolve_backoff(Duration::from_millis(10)),
        )
        .build()
        .unwrap();

        let resolver = Arc::new(FakeResolver::default());
        let opener = Arc::new(FakeOpener::default());
        let output = Arc::new(FakeOutput::default());
        let cache = Arc::new(PlaylistCache::new(config.playlist_cache_dir()));

        let deps = DaemonDeps::new(resolver.clone(), opener.clone(), output.clone(), cache)
            .with_streaming_config(StreamingConfig::low_latency());
        let player = PlayerDaemon::start(deps, config);
        let events = player.subscribe();

        Self {
            player,
            events,
            resolver,
            opener,
            output,
            _dir: dir,
        }
    }

    /// Waits for the first event matching `predicate`.
    async fn wait_for(&mut self, predicate: impl Fn(&DaemonEvent) -> bool) -> DaemonEvent {
        let mut seen = self.events_until(predicate).await;
        seen.pop().expect("matching event")
    }

    /// Every event up to and including the first one matching `predicate`.
    async fn events_until(
        &mut self,
        predicate: impl Fn(&DaemonEvent) -> bool,
    ) -> Vec<DaemonEvent> {
        let events = &mut self.events;
        timeout(Duration::from_secs(5), async {
            let mut seen = Vec::new();
            loop {
                match events.recv().await {
                    Ok(event) => {
                        let done = predicate(&event);
                        seen.push(event);
                        if done {
                            return seen;
                        }
                    }
                    Err(e) => panic!("event stream failed: {e}"),
                }
            }
        })
        .await
        .expect("timed out waiting for event")
    }

    async fn wait_started(&mut self, id: &str) {
        let id = id.to_string();
        self.wait_for(move |event| {
            matches!(event, DaemonEvent::TrackStarted { track } if track.id == id)
        })
        .await;
    }

    /// Round-trips the actor so every earlier command has been handled, then
    /// returns the events published so far.
    async fn settle(&mut self) -> Vec<DaemonEvent> {
        self.player.queue().await.unwrap();
        let mut drained = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            drained.push(event);
        }
        drained
    }
}

/// Polls `condition` every 10ms for up to 5s.
async fn eventually<F, Fut>(mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..500 {
        if condition().await {
            return true;
        }
        sleep(Duration::from_millis(10)).await;
    }
    false
}

fn track(id: &str) -> Arc<Track> {
    Arc::new(Track::new(
        id,
        format!("Song {id}"),
        format!("https://www.youtube.com/watch?v={id}"),
        "Uploader",
        200,
    ))
}

fn errors(events: &[DaemonEvent]) -> Vec<(ErrorKind, String)> {
    events
        .iter()
        .filter_map(|event| match event {
            DaemonEvent::Error { kind, message } => Some((*kind, message.clone())),
            _ => None,
        })
        .collect()
}

fn started(events: &[DaemonEvent]) -> usize {
    events
        .iter()
        .filter(|event| matches!(event, DaemonEvent::TrackStarted { .. }))
        .count()
}

// ============================================================================
// Queue
// ============================================================================

#[core_async::test]
async fn test_start_queue_plays_first_track_and_advances() {
    let mut h = Harness::start();
    let tracks = vec![track("A"), track("B"), track("C")];

    h.player.set_queue(tracks.clone()).unwrap();
    h.player.start_queue().unwrap();
    h.wait_started("A").await;

    assert_eq!(h.player.queue_position().await.unwrap(), 1);
    assert_eq!(h.player.queue().await.unwrap(), tracks);
    assert_eq!(tracks[0].stream_url(), Some("https://cdn.example/A"));
    assert_eq!(h.output.active.load(Ordering::SeqCst), 1);
}

#[core_async::test]
async fn test_next_wraps_around_queue() {
    let mut h = Harness::start();
    h.player.set_queue(vec![track("A"), track("B")]).unwrap();

    h.player.next().unwrap();
    h.wait_started("A").await;
    h.player.next().unwrap();
    h.wait_started("B").await;
    assert_eq!(h.player.queue_position().await.unwrap(), 0);

    h.player.next().unwrap();
    h.wait_started("A").await;
    assert_eq!(h.player.queue_position().await.unwrap(), 1);
    assert_eq!(h.output.peak.load(Ordering::SeqCst), 1);
}

#[core_async::test]
async fn test_start_empty_queue_reports_one_error() {
    let mut h = Harness::start();

    h.player.start_queue().unwrap();
    let events = h.settle().await;

    let errors = errors(&events);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].0, ErrorKind::InvalidRequest);
    assert_eq!(started(&events), 0);
    assert_eq!(h.opener.opens.load(Ordering::SeqCst), 0);
    assert!(h.player.is_running());
}

#[core_async::test]
async fn test_set_queue_position_matches_identity_then_id() {
    let h = Harness::start();
    let tracks = vec![track("A"), track("B"), track("C")];
    h.player.set_queue(tracks.clone()).unwrap();

    h.player.set_queue_position(Arc::clone(&tracks[2])).unwrap();
    assert_eq!(h.player.queue_position().await.unwrap(), 2);

    // Different instance, same id.
    h.player.set_queue_position(track("B")).unwrap();
    assert_eq!(h.player.queue_position().await.unwrap(), 1);

    h.player.set_queue_position(track("Z")).unwrap();
    assert_eq!(h.player.queue_position().await.unwrap(), 1);
}

#[core_async::test]
async fn test_set_queue_does_not_interrupt_playback() {
    let mut h = Harness::start();
    h.player.play_track(track("A")).unwrap();
    h.wait_started("A").await;

    h.player.set_queue(vec![track("B")]).unwrap();
    assert_eq!(h.player.queue_position().await.unwrap(), 0);
    assert_eq!(h.output.active.load(Ordering::SeqCst), 1);
    assert!(h.player.current_track_duration().await.is_ok());
}

#[core_async::test]
async fn test_stop_cancels_queued_start() {
    let mut h = Harness::start();
    h.player.set_queue(vec![track("A"), track("B")]).unwrap();

    h.player.start_queue().unwrap();
    h.player.stop().unwrap();
    let mut events = h.settle().await;
    sleep(Duration::from_millis(100)).await;
    events.extend(h.settle().await);

    assert_eq!(started(&events), 0);
    assert!(errors(&events).is_empty());
    assert_eq!(h.resolver.url_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.output.opened.load(Ordering::SeqCst), 0);
    assert_eq!(h.player.queue_position().await.unwrap(), 0);
}

#[core_async::test]
async fn test_play_track_supersedes_queued_start() {
    let mut h = Harness::start();
    let queued = track("A");
    h.player.set_queue(vec![Arc::clone(&queued)]).unwrap();

    h.player.start_queue().unwrap();
    h.player.play_track(track("X")).unwrap();
    let events = h
        .events_until(|e| matches!(e, DaemonEvent::TrackStarted { .. }))
        .await;

    match events.last() {
        Some(DaemonEvent::TrackStarted { track }) => assert_eq!(track.id, "X"),
        other => panic!("unexpected event {other:?}"),
    }
    assert_eq!(queued.stream_url(), None);
    assert_eq!(h.output.opened.load(Ordering::SeqCst), 1);
    assert_eq!(h.player.queue_position().await.unwrap(), 0);
}

#[core_async::test]
async fn test_start_queue_supersedes_pending_play_track() {
    let mut h = Harness::start();
    h.player.set_queue(vec![track("A")]).unwrap();

    h.player.play_track(track("X")).unwrap();
    h.player.start_queue().unwrap();
    h.wait_started("A").await;
    let events = h.settle().await;

    assert_eq!(started(&events), 0);
    assert_eq!(h.output.opened.load(Ordering::SeqCst), 1);
}

// ============================================================================
// Stop
// ============================================================================

#[core_async::test]
async fn test_stop_without_session_is_silent() {
    let mut h = Harness::start();

    h.player.stop().unwrap();
    let events = h.settle().await;

    assert!(events.is_empty());
}

#[core_async::test]
async fn test_stop_twice_tears_down_once() {
    let mut h = Harness::start();
    h.player.play_track(track("A")).unwrap();
    h.wait_started("A").await;

    h.player.stop().unwrap();
    h.player.stop().unwrap();
    let events = h.settle().await;

    let infos = events
        .iter()
        .filter(|e| matches!(e, DaemonEvent::Info { message } if message.starts_with("Stopped")))
        .count();
    assert_eq!(infos, 1);
    assert_eq!(h.output.stop_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.output.active.load(Ordering::SeqCst), 0);
    assert!(matches!(
        h.player.current_track_duration().await,
        Err(CoreError::Playback(PlaybackError::NothingPlaying))
    ));
}

// ============================================================================
// PlayTrack
// ============================================================================

#[core_async::test]
async fn test_resolution_failure_reports_each_attempt() {
    let mut h = Harness::start();
    h.resolver.fail_urls.store(true, Ordering::SeqCst);
    let t = track("A");

    h.player.play_track(Arc::clone(&t)).unwrap();
    let events = h.settle().await;

    let errors = errors(&events);
    assert_eq!(errors.len(), 3);
    assert!(errors.iter().all(|(kind, _)| *kind == ErrorKind::Resolution));
    assert!(errors[2].1.contains("attempt 3/3"));
    assert_eq!(h.resolver.url_calls.load(Ordering::SeqCst), 3);
    assert_eq!(t.stream_url(), None);
    assert_eq!(started(&events), 0);
    assert_eq!(h.opener.opens.load(Ordering::SeqCst), 0);
    assert!(h.player.current_track_duration().await.is_err());
}

#[core_async::test]
async fn test_resolution_failure_keeps_current_session() {
    let mut h = Harness::start();
    h.player.play_track(track("A")).unwrap();
    h.wait_started("A").await;

    h.resolver.fail_urls.store(true, Ordering::SeqCst);
    h.player.play_track(track("B")).unwrap();
    h.settle().await;

    assert_eq!(h.output.active.load(Ordering::SeqCst), 1);
    assert_eq!(
        h.player.current_track_duration().await.unwrap(),
        Duration::from_secs(200)
    );
}

#[core_async::test]
async fn test_resolved_url_is_not_fetched_again() {
    let mut h = Harness::start();
    let t = track("A");
    t.set_stream_url("https://cdn.example/cached").unwrap();

    h.player.play_track(Arc::clone(&t)).unwrap();
    h.wait_started("A").await;

    assert_eq!(h.resolver.url_calls.load(Ordering::SeqCst), 0);
    assert_eq!(t.stream_url(), Some("https://cdn.example/cached"));
}

#[core_async::test]
async fn test_play_without_url_is_rejected() {
    let mut h = Harness::start();

    h.player
        .send(Command::PlayTrack {
            track: track("A"),
            cancel: Default::default(),
        })
        .unwrap();
    let events = h.settle().await;

    let errors = errors(&events);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].0, ErrorKind::InvalidRequest);
    assert!(errors[0].1.contains('A'));
    assert_eq!(h.opener.opens.load(Ordering::SeqCst), 0);
}

#[core_async::test]
async fn test_second_session_is_refused() {
    let mut h = Harness::start();
    let first = track("A");
    let second = track("B");
    first.set_stream_url("https://cdn.example/A").unwrap();
    second.set_stream_url("https://cdn.example/B").unwrap();

    for t in [&first, &second] {
        h.player
            .send(Command::PlayTrack {
                track: Arc::clone(t),
                cancel: Default::default(),
            })
            .unwrap();
    }
    let events = h.settle().await;

    assert_eq!(started(&events), 1);
    let errors = errors(&events);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].0, ErrorKind::InvalidRequest);
    assert!(errors[0].1.contains("already active"));
    assert_eq!(h.output.peak.load(Ordering::SeqCst), 1);
    assert!(h.player.is_running());
}

#[core_async::test]
async fn test_rapid_requests_never_overlap_sessions() {
    let mut h = Harness::start();

    for id in ["A", "B", "C", "D"] {
        h.player.play_track(track(id)).unwrap();
    }
    h.wait_started("D").await;
    let events = h.settle().await;

    assert!(errors(&events).is_empty());
    assert_eq!(h.output.peak.load(Ordering::SeqCst), 1);
    assert_eq!(h.output.active.load(Ordering::SeqCst), 1);
}

#[core_async::test]
async fn test_stream_open_is_retried() {
    let mut h = Harness::start();
    h.opener
        .fail_next(PlaybackError::Network("connection reset".to_string()));

    h.player.play_track(track("A")).unwrap();
    h.wait_started("A").await;
    let _ = h.settle().await;

    assert_eq!(h.opener.opens.load(Ordering::SeqCst), 2);
}

#[core_async::test]
async fn test_stream_open_gives_up_after_attempts() {
    let mut h = Harness::start_with(|b| b.stream_open_attempts(2));
    h.opener
        .fail_next(PlaybackError::Network("connection reset".to_string()));
    h.opener
        .fail_next(PlaybackError::Network("connection reset".to_string()));

    h.player.play_track(track("A")).unwrap();
    let events = h.settle().await;

    let errors = errors(&events);
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().all(|(kind, _)| *kind == ErrorKind::Network));
    assert_eq!(started(&events), 0);
    assert_eq!(h.output.opened.load(Ordering::SeqCst), 0);
}

#[core_async::test]
async fn test_unsupported_stream_is_not_retried() {
    let mut h = Harness::start();
    h.opener
        .fail_next(PlaybackError::UnsupportedCodec("Opus".to_string()));

    h.player.play_track(track("A")).unwrap();
    let events = h.settle().await;

    let errors = errors(&events);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].0, ErrorKind::Decode);
    assert_eq!(h.opener.opens.load(Ordering::SeqCst), 1);
}

#[core_async::test]
async fn test_stop_does_not_wait_for_stream_open() {
    let mut h = Harness::start();
    *h.opener.open_delay.lock() = Some(Duration::from_millis(800));

    h.player.play_track(track("A")).unwrap();
    let opener = Arc::clone(&h.opener);
    assert!(eventually(|| {
        let opener = Arc::clone(&opener);
        async move { opener.opens.load(Ordering::SeqCst) == 1 }
    })
    .await);

    h.player.stop().unwrap();
    let replied = timeout(Duration::from_millis(400), h.player.queue()).await;

    assert!(replied.is_ok());
    let events = h.settle().await;
    assert_eq!(started(&events), 0);
    assert_eq!(h.output.opened.load(Ordering::SeqCst), 0);
}

#[core_async::test]
async fn test_decode_failure_ends_session() {
    let mut h = Harness::start();
    h.opener.corrupt.store(true, Ordering::SeqCst);

    h.player.play_track(track("A")).unwrap();
    h.wait_started("A").await;

    let player = h.player.clone();
    assert!(eventually(|| {
        let player = player.clone();
        async move { player.current_track_duration().await.is_err() }
    })
    .await);
    assert_eq!(h.player.progress().await.unwrap(), None);
    assert_eq!(h.output.active.load(Ordering::SeqCst), 0);
    assert!(!h.player.is_playing());

    // The slot is free again.
    h.opener.corrupt.store(false, Ordering::SeqCst);
    let next = track("B");
    next.set_stream_url("https://cdn.example/B").unwrap();
    h.player
        .send(Command::PlayTrack {
            track: next,
            cancel: Default::default(),
        })
        .unwrap();
    h.wait_started("B").await;
    let events = h.settle().await;
    assert!(errors(&events)
        .iter()
        .all(|(kind, _)| *kind != ErrorKind::InvalidRequest));
}

// ============================================================================
// Sink controls, seek and duration
// ============================================================================

#[core_async::test]
async fn test_sink_controls_reach_live_sink() {
    let mut h = Harness::start();
    assert!(!h.player.pause());

    h.player.set_volume(0.5);
    h.player.play_track(track("A")).unwrap();
    h.wait_started("A").await;

    assert!((h.player.volume() - 0.5).abs() < f32::EPSILON);
    assert!(h.player.is_playing());
    assert!(h.player.pause());
    assert!(!h.player.is_playing());
    assert!(h.player.resume());
    assert!(h.player.is_playing());
}

#[core_async::test]
async fn test_seek_moves_progress() {
    let mut h = Harness::start();
    assert_eq!(h.player.progress().await.unwrap(), None);

    h.player.play_track(track("A")).unwrap();
    h.wait_started("A").await;

    h.player.seek(Duration::from_secs(60)).unwrap();
    let mut progress = Duration::ZERO;
    for _ in 0..100 {
        progress = h.player.progress().await.unwrap().unwrap_or_default();
        if progress >= Duration::from_secs(60) {
            break;
        }
        sleep(Duration::from_millis(10)).await;
    }
    assert!(progress >= Duration::from_secs(60));
}

#[core_async::test]
async fn test_seek_while_idle_is_rejected() {
    let mut h = Harness::start();

    h.player.seek(Duration::from_secs(5)).unwrap();
    let events = h.settle().await;

    assert_eq!(errors(&events).len(), 1);
}

// ============================================================================
// Playlists
// ============================================================================

#[core_async::test]
async fn test_register_playlists_is_bounded_and_merged() {
    let mut h = Harness::start();

    h.player
        .register_playlists(["PL1", "PL2", "PL3", "PL4"])
        .unwrap();
    let event = h
        .wait_for(|e| matches!(e, DaemonEvent::PlaylistsRegistered { .. }))
        .await;

    match event {
        DaemonEvent::PlaylistsRegistered { playlist_ids } => {
            assert_eq!(playlist_ids, vec!["PL1", "PL2", "PL3", "PL4"]);
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert_eq!(h.player.registered_playlists().await.unwrap().len(), 4);
    assert!(h.resolver.fetches_peak.load(Ordering::SeqCst) <= 3);
}

#[core_async::test]
async fn test_register_reports_completion_when_every_fetch_fails() {
    let mut h = Harness::start();
    h.resolver.fail_playlists.store(true, Ordering::SeqCst);

    h.player.register_playlists(["PL1", "PL2"]).unwrap();
    let events = h
        .events_until(|e| matches!(e, DaemonEvent::PlaylistsRegistered { .. }))
        .await;

    match events.last() {
        Some(DaemonEvent::PlaylistsRegistered { playlist_ids }) => {
            assert!(playlist_ids.is_empty())
        }
        other => panic!("unexpected event {other:?}"),
    }
    let errors = errors(&events);
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().all(|(kind, _)| *kind == ErrorKind::Resolution));
    assert!(h.player.registered_playlists().await.unwrap().is_empty());
}

#[core_async::test]
async fn test_play_playlist_starts_first_track() {
    let mut h = Harness::start();
    h.player.register_playlists(["PL1"]).unwrap();
    h.wait_for(|e| matches!(e, DaemonEvent::PlaylistsRegistered { .. }))
        .await;

    let playlists = h.player.registered_playlists().await.unwrap();
    h.player.play_playlist(&playlists[0]).unwrap();
    h.wait_started("PL1-1").await;

    assert_eq!(h.player.queue().await.unwrap().len(), 2);
    assert_eq!(h.player.queue_position().await.unwrap(), 1);
    assert_eq!(
        h.player.current_track_duration().await.unwrap(),
        Duration::from_secs(120)
    );
}

#[core_async::test]
async fn test_clear_cache_removes_fetched_playlists() {
    let mut h = Harness::start();
    h.player.register_playlists(["PL1", "PL2"]).unwrap();
    h.wait_for(|e| matches!(e, DaemonEvent::PlaylistsRegistered { .. }))
        .await;

    assert_eq!(h.player.clear_cache().await.unwrap(), 2);
    assert_eq!(h.player.clear_cache().await.unwrap(), 0);
}

// ============================================================================
// Lifecycle
// ============================================================================

#[core_async::test]
async fn test_shutdown_tears_down_and_rejects_commands() {
    let mut h = Harness::start();
    h.player.play_track(track("A")).unwrap();
    h.wait_started("A").await;

    h.player.shutdown().await.unwrap();

    assert_eq!(h.output.active.load(Ordering::SeqCst), 0);
    assert!(!h.player.is_running());
    assert!(matches!(h.player.stop(), Err(CoreError::DaemonStopped)));
    assert!(matches!(
        h.player.queue().await,
        Err(CoreError::DaemonStopped)
    ));
    h.player.shutdown().await.unwrap();
}
