//! Async facade for the playlistd workspace.
//!
//! Every `core-*` and `bridge-*` crate goes through this crate instead of
//! depending on tokio directly, so the executor choice lives in one place.
//!
//! # Modules
//!
//! - `runtime`: building runtimes and blocking on futures
//! - `task`: spawning async and blocking work
//! - `time`: sleep, timeout, instants
//! - `sync`: channels, locks, semaphores and cancellation tokens
//! - `fs`: async filesystem access
//! - `process`: async subprocess execution
//!
//! ```rust
//! use core_async::task;
//! use core_async::time::{sleep, Duration};
//!
//! async fn example() {
//!     let handle = task::spawn(async {
//!         sleep(Duration::from_millis(10)).await;
//!         42
//!     });
//!     assert_eq!(handle.await.unwrap(), 42);
//! }
//! ```

pub use core_async_macros::{main, test};

pub mod fs;
pub mod process;
pub mod runtime;
pub mod sync;
pub mod task;
pub mod time;

pub use task::spawn;
pub use time::{sleep, Duration, Instant};
