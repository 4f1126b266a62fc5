//! Retry and backoff.
//!
//! Policies decide, per classified failure, whether another attempt is worth
//! making and how long to wait first; the run loop applies a policy to any
//! async operation.

mod policy;
mod run;

pub use policy::{RetryDecision, RetryPolicy, RetryPredicate, RetryPresets, JITTER_FRACTION};
pub use run::{execute, execute_cancellable};
