//! # Core Runtime
//!
//! Shared runtime infrastructure for the playlistd crates:
//! - Logging and tracing bootstrap
//! - Daemon configuration
//! - The event bus that carries daemon notifications to observers
//!
//! Every other `core-*` crate depends on this one for its event and config
//! types, so it stays free of domain logic.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Result, RuntimeError};
