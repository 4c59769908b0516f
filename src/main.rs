//! Registers the given playlists and plays the first one through once.
//!
//! ```text
//! playlistd PLAYLIST_ID [PLAYLIST_ID ...]
//! ```

use anyhow::{bail, Context};
use core_async::time::{sleep, Duration};
use core_runtime::events::RecvError;
use playlistd::{bootstrap, init_logging, DaemonEvent, LoggingConfig, PlaylistId};
use tracing::{info, warn};

#[core_async::main]
async fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default()).context("failed to initialize logging")?;

    let ids: Vec<String> = std::env::args().skip(1).collect();
    let Some(first) = ids.first().map(PlaylistId::new) else {
        bail!("usage: playlistd PLAYLIST_ID [PLAYLIST_ID ...]");
    };

    let config = bootstrap::default_config()?;
    let player = bootstrap::desktop(config).context("failed to start player")?;
    core_runtime::events::spawn_event_logger(player.event_bus());

    let mut events = player.subscribe();
    player.register_playlists(ids.clone())?;

    loop {
        match events.recv().await {
            Ok(DaemonEvent::PlaylistsRegistered { .. }) => break,
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "Event stream lagged"),
            Err(RecvError::Closed) => bail!("event stream closed"),
        }
    }

    let playlists = player.registered_playlists().await?;
    let Some(playlist) = playlists.iter().find(|p| p.id == first) else {
        bail!("playlist {first} could not be fetched");
    };
    info!(playlist_id = %playlist.id, tracks = playlist.len(), "Playing playlist");
    player.play_playlist(playlist)?;

    for _ in 0..playlist.len() {
        loop {
            match events.recv().await {
                Ok(DaemonEvent::TrackStarted { track }) => {
                    info!(track_id = %track.id, title = %track.title, "Now playing");
                    break;
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Event stream lagged"),
                Err(RecvError::Closed) => bail!("event stream closed"),
            }
        }
        // The sink reports not playing once the stream has drained.
        while player.is_playing() {
            sleep(Duration::from_millis(500)).await;
        }
        player.next()?;
    }

    player.shutdown().await?;
    Ok(())
}
