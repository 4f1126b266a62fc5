use rand::Rng;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{ErrorKind, ErrorRecord};

/// Upper bound of the random jitter, as a fraction of the backoff delay.
pub const JITTER_FRACTION: f64 = 0.1;

/// Caller-supplied veto on retrying a particular failure.
pub type RetryPredicate = Arc<dyn Fn(&ErrorRecord) -> bool + Send + Sync>;

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Stop and surface the failure.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Exponential backoff policy with caps and an optional retry predicate.
#[derive(Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first). Values below 1 act as 1.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub base_delay: Duration,
    /// Upper bound on the un-jittered delay.
    pub max_delay: Duration,
    /// Growth factor per attempt. Values below 1.0 act as 1.0.
    pub backoff_multiplier: f64,
    /// Deadline for each individual attempt.
    pub per_attempt_timeout: Option<Duration>,
    should_retry: Option<RetryPredicate>,
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .field("backoff_multiplier", &self.backoff_multiplier)
            .field("per_attempt_timeout", &self.per_attempt_timeout)
            .field("should_retry", &self.should_retry.is_some())
            .finish()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::api()
    }
}

impl RetryPolicy {
    pub fn new(
        max_attempts: u32,
        base_delay: Duration,
        max_delay: Duration,
        backoff_multiplier: f64,
    ) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay,
            backoff_multiplier,
            per_attempt_timeout: None,
            should_retry: None,
        }
    }

    /// Connectivity-bound operations: more attempts, longer base delay,
    /// retries only transport-level kinds.
    pub fn network() -> Self {
        Self::new(5, Duration::from_secs(2), Duration::from_secs(30), 2.0)
            .with_attempt_timeout(Duration::from_secs(30))
            .retry_on(&[
                ErrorKind::Network,
                ErrorKind::NoInternet,
                ErrorKind::Timeout,
                ErrorKind::ServerError,
            ])
    }

    /// Calls to an API: fewer attempts, shorter base delay.
    pub fn api() -> Self {
        Self::new(3, Duration::from_secs(1), Duration::from_secs(10), 2.0)
            .with_attempt_timeout(Duration::from_secs(20))
            .retry_on(&[ErrorKind::Api, ErrorKind::ServerError, ErrorKind::Timeout])
    }

    /// Writes that must land: most attempts, longest cap, any retryable kind.
    pub fn critical() -> Self {
        Self::new(8, Duration::from_secs(1), Duration::from_secs(120), 2.0)
            .with_attempt_timeout(Duration::from_secs(30))
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.per_attempt_timeout = Some(timeout);
        self
    }

    pub fn without_attempt_timeout(mut self) -> Self {
        self.per_attempt_timeout = None;
        self
    }

    pub fn with_should_retry<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&ErrorRecord) -> bool + Send + Sync + 'static,
    {
        self.should_retry = Some(Arc::new(predicate));
        self
    }

    /// Restrict retries to the listed kinds (still subject to the record's own verdict).
    pub fn retry_on(self, kinds: &'static [ErrorKind]) -> Self {
        self.with_should_retry(move |e| kinds.contains(&e.kind()))
    }

    /// Drop any predicate so every retryable record is retried.
    pub fn retry_any(mut self) -> Self {
        self.should_retry = None;
        self
    }

    pub fn effective_max_attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Un-jittered delay after `attempt` failed attempts (1-based):
    /// `min(max_delay, base_delay * multiplier^(attempt-1))`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let multiplier = if self.backoff_multiplier.is_finite() {
            self.backoff_multiplier.max(1.0)
        } else {
            1.0
        };
        let exp = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let raw = self.base_delay.as_secs_f64() * multiplier.powi(exp);
        let cap = self.max_delay.as_secs_f64();
        if !raw.is_finite() || raw >= cap {
            self.max_delay
        } else {
            Duration::from_secs_f64(raw)
        }
    }

    /// Whether a failed attempt may be followed by another, ignoring the attempt budget.
    pub fn permits(&self, record: &ErrorRecord) -> bool {
        if !record.is_retryable() {
            return false;
        }
        match &self.should_retry {
            Some(predicate) => predicate(record),
            None => true,
        }
    }

    /// Decide what to do after attempt number `attempt` (1-based) failed with `record`.
    pub fn decide(&self, attempt: u32, record: &ErrorRecord) -> RetryDecision {
        let unit: f64 = rand::thread_rng().gen_range(0.0..1.0);
        self.decide_with_jitter(attempt, record, unit)
    }

    /// Same as [`decide`](Self::decide) with the jitter draw supplied (`unit` in `[0, 1]`).
    ///
    /// The cap is applied before jitter, so the returned delay lies in
    /// `[backoff, backoff * (1 + JITTER_FRACTION)]`.
    pub fn decide_with_jitter(&self, attempt: u32, record: &ErrorRecord, unit: f64) -> RetryDecision {
        if attempt >= self.effective_max_attempts() || !self.permits(record) {
            return RetryDecision::NoRetry;
        }
        let delay = self.backoff_delay(attempt);
        let unit = if unit.is_finite() { unit.clamp(0.0, 1.0) } else { 0.0 };
        let jitter = delay.mul_f64(JITTER_FRACTION * unit);
        RetryDecision::RetryAfter(delay + jitter)
    }
}

/// The three named policies used by the request layer.
#[derive(Debug, Clone)]
pub struct RetryPresets {
    pub network: RetryPolicy,
    pub api: RetryPolicy,
    pub critical: RetryPolicy,
}

impl Default for RetryPresets {
    fn default() -> Self {
        Self {
            network: RetryPolicy::network(),
            api: RetryPolicy::api(),
            critical: RetryPolicy::critical(),
        }
    }
}
