//! Retry with exponential backoff for transient fetch failures.
//!
//! Retriable conditions are network-level errors and HTTP 429/5xx
//! ([`ScraperError::is_transient`]). Permanent failures (404, unrecognized
//! pages, bad URLs) are propagated immediately without retrying.
//!
//! Attempt count and next delay are explicit state threaded through the
//! loop, and the whole schedule aborts as soon as the cancellation token
//! fires — no retry is ever scheduled after shutdown begins.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;

use crate::error::ScraperError;

/// Executes `operation` up to `max_attempts` times total, sleeping
/// `backoff_base_ms * 2^(attempt-1)` plus up to 250ms of jitter between
/// attempts.
///
/// On a non-transient error the error is returned as-is. When the attempt
/// budget is spent on transient errors, the last one is wrapped in
/// [`ScraperError::TransientExhausted`].
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_attempts: u32,
    backoff_base_ms: u64,
    cancel: &CancellationToken,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0u32;

    loop {
        if cancel.is_cancelled() {
            return Err(ScraperError::Cancelled);
        }

        let result = tokio::select! {
            res = operation() => res,
            () = cancel.cancelled() => return Err(ScraperError::Cancelled),
        };

        let err = match result {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        attempt += 1;
        if !err.is_transient() {
            return Err(err);
        }
        if attempt >= max_attempts {
            return Err(err.into_exhausted(attempt));
        }

        // Exponential backoff: base * 2^(attempt-1), capped shift to avoid
        // overflow, plus uniform jitter so parallel tasks don't retry in
        // lockstep.
        let exp = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(16));
        let jitter = rand::rng().random_range(0..=250u64);
        let delay = Duration::from_millis(exp.saturating_add(jitter));
        tracing::warn!(
            attempt,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "transient fetch error, retrying after backoff"
        );

        tokio::select! {
            () = tokio::time::sleep(delay) => {}
            () = cancel.cancelled() => return Err(ScraperError::Cancelled),
        }
    }
}
