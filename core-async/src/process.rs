//! Async subprocess execution.
//!
//! Re-exports tokio's process types. `Command::output` captures stdout and
//! stderr without blocking the executor.

pub use std::process::{ExitStatus, Output, Stdio};
pub use tokio::process::{Child, Command};
