//! Retry decisions for failed platform actions.
//!
//! Each [`ActionError`] is classified into a [`FailureType`]; the
//! [`RetryPolicy`] then decides whether another attempt is worthwhile and
//! how long to wait before it.
//!
//! Comments are not idempotent on the platform side (a comment posted twice
//! is two comments). For them [`classify_action_error`] only retries failures
//! where the request provably never took effect: a refused or timed-out
//! connection, HTTP 408, or HTTP 429. Likes, follows and scrapes converge on
//! the same state and use the full [`classify_error`] table.
//!
//! # Example
//!
//! ```
//! use socialctl_core::platform::ActionError;
//! use socialctl_core::runner::{RetryDecision, RetryPolicy, classify_error};
//!
//! let policy = RetryPolicy::default();
//! let error = ActionError::from_status("https://www.instagram.com/web/likes/1/like/", 503, None);
//!
//! match policy.should_retry(classify_error(&error), 1) {
//!     RetryDecision::Retry { delay, attempt } => println!("retry #{attempt} in {delay:?}"),
//!     RetryDecision::DoNotRetry { reason } => println!("giving up: {reason}"),
//! }
//! ```

use std::time::Duration;

use rand::Rng;
use tracing::{debug, instrument};

use super::engine::Action;
use crate::platform::ActionError;

/// Default maximum attempts per action, including the first.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(32);
const DEFAULT_BACKOFF_MULTIPLIER: f32 = 2.0;
const MAX_JITTER: Duration = Duration::from_millis(500);

/// Retry classification of a failed action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// May succeed on another attempt (timeouts, 5xx, dropped connections).
    Transient,
    /// Will fail the same way again (bad target, missing user, refusal).
    Permanent,
    /// The session cookies are not accepted; a fresh cookie is needed.
    NeedsAuth,
    /// The platform asked this session to slow down.
    RateLimited,
    /// The request may already have taken effect and the action is not
    /// safe to repeat.
    MaybeApplied,
}

/// Outcome of [`RetryPolicy::should_retry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Try again after `delay`.
    Retry {
        /// Wait before the next attempt.
        delay: Duration,
        /// Number of the next attempt (1-indexed).
        attempt: u32,
    },
    /// Stop.
    DoNotRetry {
        /// Why no further attempt is made.
        reason: String,
    },
}

/// Exponential backoff with jitter.
///
/// `delay = min(base_delay * multiplier^(attempt - 1), max_delay) + jitter`
///
/// With defaults: 3 attempts, delays of roughly 1s then 2s.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    backoff_multiplier: f32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy. `max_attempts` is clamped to at least 1.
    #[must_use]
    pub fn new(
        max_attempts: u32,
        base_delay: Duration,
        max_delay: Duration,
        backoff_multiplier: f32,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
            backoff_multiplier,
        }
    }

    /// Default backoff with a custom attempt limit.
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Maximum attempts including the first.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Decides whether to retry after attempt number `attempt` failed.
    #[instrument(skip(self), fields(max_attempts = self.max_attempts))]
    pub fn should_retry(&self, failure_type: FailureType, attempt: u32) -> RetryDecision {
        match failure_type {
            FailureType::Permanent => {
                return RetryDecision::DoNotRetry {
                    reason: "permanent failure - retry would not help".to_string(),
                };
            }
            FailureType::NeedsAuth => {
                return RetryDecision::DoNotRetry {
                    reason: "session rejected - refresh the auth cookie".to_string(),
                };
            }
            FailureType::MaybeApplied => {
                return RetryDecision::DoNotRetry {
                    reason: "request may have been applied - not repeating a non-idempotent action"
                        .to_string(),
                };
            }
            FailureType::Transient | FailureType::RateLimited => {}
        }

        if attempt >= self.max_attempts {
            debug!(attempt, max = self.max_attempts, "max attempts reached");
            return RetryDecision::DoNotRetry {
                reason: format!("max attempts ({}) exhausted", self.max_attempts),
            };
        }

        let delay = self.calculate_delay(attempt);
        debug!(
            attempt,
            next_attempt = attempt + 1,
            delay_ms = delay.as_millis(),
            "will retry"
        );
        RetryDecision::Retry {
            delay,
            attempt: attempt + 1,
        }
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn calculate_delay(&self, attempt: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as f64;
        let exponent = f64::from(attempt.saturating_sub(1));
        let delay_ms = base_ms * f64::from(self.backoff_multiplier).powf(exponent);
        let capped_ms = delay_ms.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped_ms as u64) + jitter()
    }
}

#[allow(clippy::cast_possible_truncation)]
fn jitter() -> Duration {
    let jitter_ms = rand::thread_rng().gen_range(0..=MAX_JITTER.as_millis() as u64);
    Duration::from_millis(jitter_ms)
}

/// Classifies an action error for retry decisions.
///
/// | Error                       | Type          |
/// |-----------------------------|---------------|
/// | `InvalidTarget`, `NotFound` | `Permanent`   |
/// | `Rejected`                  | `Permanent`   |
/// | `MalformedResponse`         | `Permanent`   |
/// | `ClientBuild`, `Aborted`    | `Permanent`   |
/// | `Unauthorized`              | `NeedsAuth`   |
/// | `RateLimited`               | `RateLimited` |
/// | `Timeout`                   | `Transient`   |
/// | `Transport` (TLS)           | `Permanent`   |
/// | `Transport` (other)         | `Transient`   |
/// | `HttpStatus` 408, 5xx       | `Transient`   |
/// | `HttpStatus` other          | `Permanent`   |
#[instrument(level = "debug", skip(error), fields(kind = error.kind().as_str()))]
pub fn classify_error(error: &ActionError) -> FailureType {
    match error {
        ActionError::InvalidTarget { .. }
        | ActionError::NotFound { .. }
        | ActionError::Rejected { .. }
        | ActionError::MalformedResponse { .. }
        | ActionError::ClientBuild { .. }
        | ActionError::Aborted { .. } => FailureType::Permanent,
        ActionError::Unauthorized { .. } => FailureType::NeedsAuth,
        ActionError::RateLimited { .. } => FailureType::RateLimited,
        ActionError::Timeout { .. } => FailureType::Transient,
        ActionError::Transport { source, .. } => {
            if is_tls_error(source) {
                FailureType::Permanent
            } else {
                FailureType::Transient
            }
        }
        ActionError::HttpStatus { status, .. } => classify_http_status(*status),
    }
}

/// Classifies an action error, refusing to repeat non-idempotent actions
/// unless the failed request provably never took effect.
///
/// For [`Action::Comment`], `Timeout`, non-connect `Transport` failures and
/// 5xx become [`FailureType::MaybeApplied`]. Every other action uses
/// [`classify_error`] unchanged.
#[must_use]
pub fn classify_action_error(action: &Action, error: &ActionError) -> FailureType {
    let failure_type = classify_error(error);
    if failure_type != FailureType::Transient
        || action.is_idempotent()
        || never_took_effect(error)
    {
        return failure_type;
    }
    debug!(action = action.name(), "not repeating a request that may have been applied");
    FailureType::MaybeApplied
}

fn never_took_effect(error: &ActionError) -> bool {
    error.is_connect_failure() || matches!(error, ActionError::HttpStatus { status: 408, .. })
}

fn classify_http_status(status: u16) -> FailureType {
    match status {
        408 | 500..=599 => FailureType::Transient,
        _ => FailureType::Permanent,
    }
}

fn is_tls_error(error: &reqwest::Error) -> bool {
    let text = error.to_string().to_lowercase();
    ["certificate", "tls", "ssl", "handshake"]
        .iter()
        .any(|needle| text.contains(needle))
}
