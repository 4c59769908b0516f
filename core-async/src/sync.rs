//! Synchronization primitives.
//!
//! Async-aware channels and locks from `tokio::sync`, plus the
//! [`CancellationToken`] used to abort in-flight playback requests.
//!
//! ```rust
//! use core_async::sync::{CancellationToken, Semaphore};
//! use std::sync::Arc;
//!
//! async fn example() {
//!     let permits = Arc::new(Semaphore::new(3));
//!     let _permit = permits.clone().acquire_owned().await.unwrap();
//!
//!     let token = CancellationToken::new();
//!     token.cancel();
//!     assert!(token.is_cancelled());
//! }
//! ```

pub use tokio::sync::{
    broadcast, mpsc, oneshot, watch, Mutex, MutexGuard, Notify, OwnedSemaphorePermit, RwLock,
    RwLockReadGuard, RwLockWriteGuard, Semaphore, SemaphorePermit,
};

pub use tokio_util::sync::CancellationToken;
