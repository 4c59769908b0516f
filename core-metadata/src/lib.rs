//! # Playlist Metadata
//!
//! Everything needed to turn playlist identifiers into playable tracks:
//!
//! - [`resolver`]: the [`Resolver`] trait and its external-tool implementation
//! - [`retry`]: cancellable stream URL resolution with fixed backoff
//! - [`coordinator`]: bounded-concurrency playlist fetching with caching
//! - [`registry`]: the in-memory set of registered playlists

pub mod coordinator;
pub mod error;
pub mod registry;
pub mod resolver;
pub mod retry;
mod tool_output;

pub use coordinator::PlaylistFetchCoordinator;
pub use error::{MetadataError, Result};
pub use registry::PlaylistRegistry;
pub use resolver::{Resolver, ToolResolver, ToolSettings};
pub use retry::{resolve_with_retry, RetryPolicy};
