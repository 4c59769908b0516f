//! Cancellable retry loop for stream URL resolution.

use crate::error::{MetadataError, Result};
use crate::resolver::Resolver;
use core_async::sync::CancellationToken;
use core_async::time::{sleep, Duration};
use core_library::models::Track;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Fixed wait between attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }
}

/// Resolves `track`'s stream URL, retrying failures per `policy`.
///
/// `on_failure` runs once per failed attempt with the 1-based attempt
/// number. Non-retryable errors end the loop early. Cancellation is checked
/// while the tool runs and during backoff, and yields
/// [`MetadataError::Cancelled`] without invoking `on_failure`.
pub async fn resolve_with_retry<F>(
    resolver: &dyn Resolver,
    track: &Track,
    policy: RetryPolicy,
    cancel: &CancellationToken,
    mut on_failure: F,
) -> Result<String>
where
    F: FnMut(u32, &MetadataError),
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        let outcome = cancel
            .run_until_cancelled(resolver.resolve_stream_url(track))
            .await
            .ok_or(MetadataError::Cancelled)?;

        let err = match outcome {
            Ok(url) => {
                debug!(track_id = %track.id, attempt, "Stream URL resolved");
                return Ok(url);
            }
            Err(err) => err,
        };

        warn!(track_id = %track.id, attempt, error = %err, "Stream URL resolution failed");
        on_failure(attempt, &err);

        if attempt >= attempts || !err.is_retryable() {
            return Err(err);
        }
        attempt += 1;

        cancel
            .run_until_cancelled(sleep(policy.backoff))
            .await
            .ok_or(MetadataError::Cancelled)?;
    }
}
