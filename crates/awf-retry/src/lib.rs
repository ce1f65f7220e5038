// SPDX-License-Identifier: MIT OR Apache-2.0
//! Retry policy: error classification plus exponential backoff with
//! jitter (`spec.md` §4.7).

#![deny(unsafe_code)]
#![warn(missing_docs)]

use awf_error::{ErrorCode, WorkflowError};
use std::future::Future;
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, warn};

/// Backoff configuration (`spec.md` §4.7).
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum retry attempts after the initial one. `0` disables retries.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Ceiling applied to the computed backoff delay.
    pub max_delay: Duration,
    /// Exponential base (`initial_delay * backoff_base.powi(attempt)`).
    pub backoff_base: f64,
    /// Whether to apply full jitter to the computed delay.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 3, initial_delay: Duration::from_millis(200), max_delay: Duration::from_secs(10), backoff_base: 2.0, jitter: true }
    }
}

/// Record of one failed attempt, for audit/diagnostic purposes.
#[derive(Debug, Clone)]
pub struct RetryAttempt {
    /// Zero-indexed attempt number that failed.
    pub attempt: u32,
    /// The error it failed with.
    pub error: String,
    /// Backoff delay applied before the next attempt.
    pub delay: Duration,
}

/// Metadata accumulated across a [`retry`] call.
#[derive(Debug, Clone, Default)]
pub struct RetryMetadata {
    /// Total attempts made, including the final (successful or failing) one.
    pub total_attempts: u32,
    /// Every failed attempt prior to the final one.
    pub failed_attempts: Vec<RetryAttempt>,
    /// Wall-clock time spent across all attempts.
    pub total_duration: Duration,
}

/// Whether `err` is eligible for retry under `spec.md` §4.7's
/// classification: `Network`/`Timeout` unconditionally; `Api` only for
/// status `408`, `429`, or `5xx`. `RateLimit` is never retried by this
/// layer even though it shares a transient flavor with `Network`/`Timeout`.
#[must_use]
pub fn is_retryable(err: &WorkflowError) -> bool {
    match err.code {
        ErrorCode::Network | ErrorCode::Timeout => true,
        ErrorCode::Api => err
            .context
            .get("status")
            .and_then(|v| v.as_u64())
            .map(|status| status == 408 || status == 429 || (500..600).contains(&status))
            .unwrap_or(false),
        _ => false,
    }
}

/// Compute the backoff delay for a zero-indexed `attempt`, honoring an
/// explicit `retry_after` override (from an `Api(429)`'s `Retry-After`
/// signal) in place of the computed value.
#[must_use]
pub fn compute_delay(policy: &RetryPolicy, attempt: u32, retry_after: Option<Duration>) -> Duration {
    if let Some(retry_after) = retry_after {
        return retry_after.min(policy.max_delay);
    }

    let factor = policy.backoff_base.powi(attempt as i32);
    let nominal_ms = (policy.initial_delay.as_millis() as f64 * factor) as u64;
    let capped_ms = nominal_ms.min(policy.max_delay.as_millis() as u64);

    if !policy.jitter || capped_ms == 0 {
        return Duration::from_millis(capped_ms);
    }

    // Full jitter: uniform in [0, capped_ms]. A pseudo-random source drawn
    // from the clock is sufficient here — backoff jitter only needs to
    // avoid thundering-herd synchronization, not unpredictability.
    let nanos = SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap_or_default().subsec_nanos() as u64;
    let pseudo = nanos.wrapping_mul(attempt as u64 + 1);
    Duration::from_millis(pseudo % (capped_ms + 1))
}

fn retry_after_from(err: &WorkflowError) -> Option<Duration> {
    if err.code != ErrorCode::Api {
        return None;
    }
    if err.context.get("status").and_then(|v| v.as_u64()) != Some(429) {
        return None;
    }
    err.context.get("retryAfterMs").and_then(|v| v.as_u64()).map(Duration::from_millis)
}

/// Invoke `op` up to `policy.max_retries + 1` times, backing off between
/// retryable failures. `op` receives the zero-indexed attempt number.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<(T, RetryMetadata), WorkflowError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, WorkflowError>>,
{
    let start = Instant::now();
    let max_attempts = policy.max_retries + 1;
    let mut failed_attempts = Vec::new();

    for attempt in 0..max_attempts {
        match op(attempt).await {
            Ok(value) => {
                return Ok((
                    value,
                    RetryMetadata { total_attempts: attempt + 1, failed_attempts, total_duration: start.elapsed() },
                ))
            }
            Err(err) => {
                let is_last = attempt + 1 >= max_attempts;
                if !is_retryable(&err) {
                    debug!(target: "awf.retry", code = %err.code, "non-retryable error, giving up");
                    return Err(err);
                }
                if is_last {
                    warn!(target: "awf.retry", code = %err.code, attempt, "retries exhausted");
                    return Err(err);
                }

                let delay = compute_delay(policy, attempt, retry_after_from(&err));
                warn!(target: "awf.retry", code = %err.code, attempt, delay_ms = delay.as_millis() as u64, "retrying after backoff");
                failed_attempts.push(RetryAttempt { attempt, error: err.message.clone(), delay });
                tokio::time::sleep(delay).await;
            }
        }
    }

    unreachable!("loop always returns on success or the final attempt's failure")
}
