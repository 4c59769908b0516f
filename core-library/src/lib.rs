//! # Library Module
//!
//! Playlist and track models shared by every other crate, plus the on-disk
//! playlist cache.
//!
//! ## Overview
//!
//! - [`Track`](models::Track): identifying metadata and a media URL that is
//!   resolved lazily, at most once per instance
//! - [`Playlist`](models::Playlist): ordered tracks shared through `Arc`, so a
//!   URL resolved through the queue is visible through the registry too
//! - [`PlaylistCache`](cache::PlaylistCache): one JSON file per playlist,
//!   advisory only

pub mod cache;
pub mod error;
pub mod models;

pub use cache::PlaylistCache;
pub use error::{LibraryError, Result};
pub use models::{Playlist, PlaylistId, Track, TrackId};
