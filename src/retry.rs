//! Retry logic with per-attempt timeout and exponential backoff
//!
//! Each attempt receives its own [`CancellationToken`], which fires when the
//! attempt exceeds its time budget. Failed attempts are retried after
//! `delay * 2^i`, and once every attempt has failed the error of the last
//! attempt is returned unchanged.
//!
//! # Example
//!
//! ```no_run
//! use oh_no_again::config::RetryConfig;
//! use oh_no_again::error::Error;
//! use oh_no_again::hooks::NoopHooks;
//! use oh_no_again::retry::run_with_retry;
//!
//! # async fn example() -> Result<(), Error> {
//! let config = RetryConfig::default();
//! let body = run_with_retry(&config, &NoopHooks, |cancel| async move {
//!     tokio::select! {
//!         _ = cancel.cancelled() => Err(Error::Aborted),
//!         body = async { Ok::<_, Error>("pong".to_string()) } => body,
//!     }
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::{Error, Result};
use crate::hooks::{RetryHooks, fire};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Execute a cancellable async operation with timeout and exponential backoff
///
/// `operation` is called once per attempt with a fresh [`CancellationToken`].
/// The token is cancelled when the attempt exceeds `config.timeout` (the
/// attempt then fails with [`Error::Timeout`]) and in any case when the
/// attempt ends, so nothing bound to it outlives its attempt.
///
/// Hooks fire as follows: `on_success` once on success; `on_abort` for every
/// timed-out or cancelled attempt; `on_retry(error, i)` before each backoff
/// wait; `on_failure` once with the error that is returned.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] without calling `operation` when
/// `config.retries` is zero. Otherwise returns the error of the last attempt;
/// every failed attempt is retried regardless of its error kind.
pub async fn run_with_retry<T, F, Fut, H>(
    config: &RetryConfig,
    hooks: &H,
    mut operation: F,
) -> Result<T>
where
    F: FnMut(CancellationToken) -> Fut,
    Fut: Future<Output = Result<T>>,
    H: RetryHooks<T> + ?Sized,
{
    if config.retries == 0 {
        return Err(Error::InvalidArgument(
            "retries must be at least 1 to run with retry".to_string(),
        ));
    }

    let mut last_error = None;

    for attempt in 0..config.retries {
        match run_attempt(config.timeout, &mut operation).await {
            Ok(result) => {
                if attempt > 0 {
                    tracing::info!(attempts = attempt + 1, "Operation succeeded after retry");
                }
                fire("on_success", || hooks.on_success(&result));
                return Ok(result);
            }
            Err(e) => {
                if e.is_abort() {
                    fire("on_abort", || hooks.on_abort(&e));
                }

                if attempt + 1 < config.retries {
                    let delay = backoff_delay(config.delay, attempt);
                    let delay = if config.jitter { add_jitter(delay) } else { delay };

                    tracing::warn!(
                        error = %e,
                        attempt = attempt,
                        max_attempts = config.retries,
                        delay_ms = delay.as_millis(),
                        "Operation failed, retrying"
                    );

                    fire("on_retry", || hooks.on_retry(&e, attempt));
                    last_error = Some(e);
                    tokio::time::sleep(delay).await;
                } else {
                    last_error = Some(e);
                }
            }
        }
    }

    // retries > 0 and every iteration either returned or recorded an error
    let error = last_error.unwrap_or_else(|| Error::Other("no attempt was made".to_string()));
    tracing::error!(
        error = %error,
        attempts = config.retries,
        "Operation failed after all retry attempts exhausted"
    );
    fire("on_failure", || hooks.on_failure(&error));
    Err(error)
}

/// Run one attempt, racing it against the timeout
async fn run_attempt<T, F, Fut>(timeout: Duration, operation: &mut F) -> Result<T>
where
    F: FnMut(CancellationToken) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let token = CancellationToken::new();
    // Cancels the token however this attempt ends
    let _guard = token.clone().drop_guard();

    let attempt = operation(token.clone());

    tokio::select! {
        result = attempt => result,
        _ = tokio::time::sleep(timeout) => {
            token.cancel();
            Err(Error::Timeout(timeout))
        }
    }
}

/// Backoff to wait after the zero-based attempt `attempt` failed: `base * 2^attempt`
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
}

/// Add random jitter to a delay to prevent thundering herd
///
/// Jitter is uniformly distributed between 0% and 100% of the delay.
/// This means the actual delay will be between `delay` and `2 * delay`.
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    Duration::from_secs_f64(delay.as_secs_f64() * (1.0 + jitter_factor))
}
