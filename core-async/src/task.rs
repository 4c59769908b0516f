//! Task spawning.
//!
//! `spawn` runs a future on the ambient tokio runtime; `spawn_blocking` moves
//! synchronous work (HTTP range reads, demuxer probing) onto the blocking
//! pool so it never stalls the executor.

pub use tokio::task::{spawn_blocking, yield_now, JoinError, JoinHandle, JoinSet};

/// Spawns a new asynchronous task.
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: std::future::Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::task::spawn(future)
}

pub type Result<T> = std::result::Result<T, JoinError>;
