//! Multi-account action execution.
//!
//! This module provides:
//! - [`ActionRunner`]: bounded-concurrency fan-out of one action over accounts
//! - [`RetryPolicy`] and [`classify_action_error`]: backoff for transient failures
//! - [`RateLimiter`]: per-account pacing with `Retry-After` support

mod engine;
mod rate_limiter;
mod retry;

pub use engine::{
    AccountOutcome, Action, ActionOutput, ActionRunner, DEFAULT_CONCURRENCY, RunReport,
    RunStats, RunnerError,
};
pub use rate_limiter::{RateLimiter, parse_retry_after};
pub use retry::{
    DEFAULT_MAX_RETRIES, FailureType, RetryDecision, RetryPolicy, classify_action_error,
    classify_error,
};
