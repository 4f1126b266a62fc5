//! Retry loop: run an async operation until success or the policy says stop.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use super::policy::{RetryDecision, RetryPolicy};
use crate::error::{Classify, ErrorKind, ErrorRecord, Failure};

enum Outcome<T> {
    Done(T),
    Cancelled,
}

/// Runs `op` until it succeeds or the retry policy says to stop.
/// On retryable failure, sleeps for the jittered backoff then tries again.
/// The final failure is surfaced as its classified [`ErrorRecord`].
pub async fn execute<T, E, F, Fut>(policy: &RetryPolicy, op: F) -> Result<T, ErrorRecord>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Classify,
{
    match run(policy, None, op).await? {
        Outcome::Done(value) => Ok(value),
        // No token was supplied, so the loop cannot observe a cancellation.
        Outcome::Cancelled => Err(ErrorRecord::new(ErrorKind::Unknown, "retry loop cancelled")),
    }
}

/// Like [`execute`], but stops early once `token` is cancelled.
/// Returns `Ok(None)` when cancelled before an attempt succeeded.
pub async fn execute_cancellable<T, E, F, Fut>(
    policy: &RetryPolicy,
    token: &CancellationToken,
    op: F,
) -> Result<Option<T>, ErrorRecord>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Classify,
{
    match run(policy, Some(token), op).await? {
        Outcome::Done(value) => Ok(Some(value)),
        Outcome::Cancelled => Ok(None),
    }
}

async fn run<T, E, F, Fut>(
    policy: &RetryPolicy,
    token: Option<&CancellationToken>,
    mut op: F,
) -> Result<Outcome<T>, ErrorRecord>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Classify,
{
    let mut attempt = 0u32;
    loop {
        if token.is_some_and(|t| t.is_cancelled()) {
            tracing::debug!(attempt, "retry loop cancelled before attempt");
            return Ok(Outcome::Cancelled);
        }
        attempt += 1;

        let result = match policy.per_attempt_timeout {
            Some(limit) => match tokio::time::timeout(limit, op()).await {
                Ok(r) => r.map_err(|e| e.classify()),
                Err(_) => Err(Failure::AttemptTimedOut(limit).classify()),
            },
            None => op().await.map_err(|e| e.classify()),
        };

        let record = match result {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(attempts = attempt, "operation succeeded after retry");
                }
                return Ok(Outcome::Done(value));
            }
            Err(record) => record,
        };

        match policy.decide(attempt, &record) {
            RetryDecision::NoRetry => {
                tracing::debug!(
                    attempts = attempt,
                    kind = %record.kind(),
                    retryable = record.is_retryable(),
                    "giving up: {}",
                    record.message()
                );
                return Err(record);
            }
            RetryDecision::RetryAfter(delay) => {
                tracing::warn!(
                    attempt,
                    max_attempts = policy.effective_max_attempts(),
                    kind = %record.kind(),
                    delay_ms = delay.as_millis() as u64,
                    "attempt failed, retrying: {}",
                    record.message()
                );
                match token {
                    Some(token) => {
                        tokio::select! {
                            _ = tokio::time::sleep(delay) => {}
                            _ = token.cancelled() => {
                                tracing::debug!(attempt, "retry loop cancelled during backoff");
                                return Ok(Outcome::Cancelled);
                            }
                        }
                    }
                    None => tokio::time::sleep(delay).await,
                }
            }
        }
    }
}
