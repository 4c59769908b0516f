//! # Player Service
//!
//! The playback actor and its client handle.
//!
//! ```rust,ignore
//! use core_service::bootstrap;
//!
//! #[core_async::main]
//! async fn main() -> core_service::Result<()> {
//!     let player = bootstrap::desktop(bootstrap::default_config()?)?;
//!     let mut events = player.subscribe();
//!
//!     player.register_playlists(["PLx0sYbCqOb8TBPRdmBHs5Iftvv9TPboYG"])?;
//!     while let Ok(event) = events.recv().await {
//!         println!("{event:?}");
//!     }
//!     player.shutdown().await
//! }
//! ```
//!
//! Hosts without the desktop bridges build a [`DaemonDeps`] from their own
//! implementations and call [`PlayerDaemon::start`].

#[cfg(feature = "desktop-shims")]
pub mod bootstrap;
pub mod commands;
pub mod daemon;
pub mod error;
pub mod handle;

pub use commands::Command;
pub use daemon::{DaemonDeps, PlayerDaemon};
pub use error::{CoreError, Result};
pub use handle::PlayerHandle;
