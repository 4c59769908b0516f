//! Runtime construction helpers.
//!
//! Downstream crates never build a tokio runtime by hand; entry points and
//! tests go through [`block_on`] (usually via `#[core_async::main]` or
//! `#[core_async::test]`).

pub use tokio::runtime::{Builder, Handle, Runtime};

/// Runs the provided future to completion on a fresh current-thread runtime.
///
/// # Panics
///
/// Panics if the runtime cannot be created (e.g. the process is out of file
/// descriptors). There is no executor to report the error through.
pub fn block_on<F>(future: F) -> F::Output
where
    F: std::future::Future,
{
    match Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime.block_on(future),
        Err(err) => panic!("core_async::runtime::block_on: failed to build runtime: {err}"),
    }
}

/// Returns a handle to the runtime driving the current task, if any.
pub fn current() -> Option<Handle> {
    Handle::try_current().ok()
}
