//! Wiring of the desktop bridges into a running daemon.

use crate::daemon::{DaemonDeps, PlayerDaemon};
use crate::error::Result;
use crate::handle::PlayerHandle;
use bridge_desktop::{default_cache_dir, HttpStreamConnector, RodioAudioOutput, TokioProcessRunner};
use core_library::cache::PlaylistCache;
use core_metadata::ToolResolver;
use core_playback::HttpStreamOpener;
use core_runtime::config::DaemonConfig;
use std::sync::Arc;
use tracing::info;

/// Configuration rooted at the platform cache directory.
pub fn default_config() -> Result<DaemonConfig> {
    Ok(DaemonConfig::builder().cache_dir(default_cache_dir()).build()?)
}

/// Starts a daemon that resolves with the configured tool, streams over
/// HTTP and plays on the default audio device.
///
/// Must be called from within a tokio runtime.
pub fn desktop(config: DaemonConfig) -> Result<PlayerHandle> {
    let runner = Arc::new(TokioProcessRunner::new());
    let resolver = Arc::new(ToolResolver::from_config(runner, &config));
    let opener = Arc::new(HttpStreamOpener::new(Arc::new(
        HttpStreamConnector::default(),
    )));
    let output = Arc::new(RodioAudioOutput::open_default()?);
    let cache = Arc::new(PlaylistCache::new(config.playlist_cache_dir()));

    info!(
        tool = %config.tool_program,
        cache_dir = %cache.dir().display(),
        "Starting desktop player daemon"
    );
    Ok(PlayerDaemon::start(
        DaemonDeps::new(resolver, opener, output, cache),
        config,
    ))
}
