//! Concurrent execution of one action across many accounts.
//!
//! The [`ActionRunner`] spawns one task per account, bounded by a semaphore,
//! and drives each through pacing, the platform call, and retries. Individual
//! failures never abort the batch; they are reported per account in the
//! returned [`RunReport`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use socialctl_core::auth::Account;
//! use socialctl_core::platform::ClientSettings;
//! use socialctl_core::runner::{Action, ActionRunner, RateLimiter, RetryPolicy};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let limiter = Arc::new(RateLimiter::new(Duration::from_millis(750)));
//! let runner = ActionRunner::new(4, RetryPolicy::default(), limiter)?;
//! let accounts = vec![Account::new("account-1", "csrftoken=a; sessionid=b")];
//! let report = runner
//!     .run(&ClientSettings::default(), &accounts, &Action::Follow { username: "janedoe".into() })
//!     .await;
//! println!("{} ok, {} failed", report.stats.completed(), report.stats.failed());
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{Instrument, debug, info, info_span, instrument, warn};

use super::rate_limiter::{RateLimiter, parse_retry_after};
use super::retry::{FailureType, RetryDecision, RetryPolicy, classify_action_error};
use crate::auth::Account;
use crate::platform::{ActionError, ClientSettings, FollowReceipt, PlatformSession, ProfileInfo};
use crate::shortcode::MediaId;

const MIN_CONCURRENCY: usize = 1;
const MAX_CONCURRENCY: usize = 100;

/// Default number of accounts acting at once.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Errors constructing or driving the runner.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Concurrency outside `1..=100`.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The rejected value.
        value: usize,
    },
}

/// A platform action to perform under every selected account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Follow a user.
    Follow {
        /// Target username, with or without `@`.
        username: String,
    },
    /// Like a post.
    Like {
        /// Post URL or bare short code.
        post: String,
    },
    /// Comment on a post.
    Comment {
        /// Post URL or bare short code.
        post: String,
        /// Comment text.
        text: String,
    },
    /// Fetch a user's public profile.
    Scrape {
        /// Target username.
        username: String,
    },
}

impl Action {
    /// Short name used in logs and summaries.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Follow { .. } => "follow",
            Self::Like { .. } => "like",
            Self::Comment { .. } => "comment",
            Self::Scrape { .. } => "scrape",
        }
    }

    /// Whether repeating the action converges on the same platform state.
    ///
    /// Liking or following twice is harmless; commenting twice posts two
    /// comments.
    #[must_use]
    pub fn is_idempotent(&self) -> bool {
        !matches!(self, Self::Comment { .. })
    }

    /// The username or post the action targets.
    #[must_use]
    pub fn target(&self) -> &str {
        match self {
            Self::Follow { username } | Self::Scrape { username } => username,
            Self::Like { post } | Self::Comment { post, .. } => post,
        }
    }

    async fn perform(&self, session: &PlatformSession) -> Result<ActionOutput, ActionError> {
        match self {
            Self::Follow { username } => session.follow(username).await.map(ActionOutput::Followed),
            Self::Like { post } => session.like(post).await.map(ActionOutput::Liked),
            Self::Comment { post, text } => {
                session.comment(post, text).await.map(ActionOutput::Commented)
            }
            Self::Scrape { username } => session
                .scrape_profile(username)
                .await
                .map(|profile| ActionOutput::Profile(Box::new(profile))),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name(), self.target())
    }
}

/// What a successful action produced.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ActionOutput {
    /// Follow accepted.
    Followed(FollowReceipt),
    /// Like accepted for this media id.
    Liked(MediaId),
    /// Comment accepted for this media id.
    Commented(MediaId),
    /// Scraped profile.
    Profile(Box<ProfileInfo>),
}

/// Result for one account.
#[derive(Debug)]
pub struct AccountOutcome {
    /// Account label.
    pub account: String,
    /// Display identifier from the account's cookie, or `unknown`.
    pub display_identifier: String,
    /// Attempts made, including the first.
    pub attempts: u32,
    /// Output or final error.
    pub result: Result<ActionOutput, ActionError>,
}

impl AccountOutcome {
    /// Whether the action succeeded for this account.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Counters for one run, updated from concurrent tasks.
#[derive(Debug, Default)]
pub struct RunStats {
    completed: AtomicUsize,
    failed: AtomicUsize,
    retried: AtomicUsize,
}

impl RunStats {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accounts whose action succeeded.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Accounts whose action failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    /// Completed plus failed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.completed() + self.failed()
    }

    /// Retry attempts made across all accounts.
    #[must_use]
    pub fn retried(&self) -> usize {
        self.retried.load(Ordering::SeqCst)
    }

    fn increment_completed(&self) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    fn increment_failed(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }

    fn increment_retried(&self) {
        self.retried.fetch_add(1, Ordering::SeqCst);
    }

    fn snapshot(&self) -> Self {
        Self {
            completed: AtomicUsize::new(self.completed()),
            failed: AtomicUsize::new(self.failed()),
            retried: AtomicUsize::new(self.retried()),
        }
    }
}

/// Everything a run produced, in account order.
#[derive(Debug)]
pub struct RunReport {
    /// One outcome per account, in the order accounts were given.
    pub outcomes: Vec<AccountOutcome>,
    /// Aggregate counters.
    pub stats: RunStats,
}

impl RunReport {
    /// True when at least one account ran and none failed.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        !self.outcomes.is_empty() && self.stats.failed() == 0
    }
}

/// Runs an action under many accounts with bounded concurrency.
#[derive(Debug)]
pub struct ActionRunner {
    semaphore: Arc<Semaphore>,
    concurrency: usize,
    retry_policy: RetryPolicy,
    rate_limiter: Arc<RateLimiter>,
}

impl ActionRunner {
    /// Creates a runner.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::InvalidConcurrency`] unless `1 <= concurrency <= 100`.
    #[instrument(level = "debug", skip(retry_policy, rate_limiter))]
    pub fn new(
        concurrency: usize,
        retry_policy: RetryPolicy,
        rate_limiter: Arc<RateLimiter>,
    ) -> Result<Self, RunnerError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&concurrency) {
            return Err(RunnerError::InvalidConcurrency { value: concurrency });
        }
        debug!(
            concurrency,
            max_retries = retry_policy.max_attempts(),
            rate_limit_ms = rate_limiter.default_delay().as_millis(),
            "creating action runner"
        );
        Ok(Self {
            semaphore: Arc::new(Semaphore::new(concurrency)),
            concurrency,
            retry_policy,
            rate_limiter,
        })
    }

    /// Configured concurrency.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Configured retry policy.
    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Performs `action` once per account and collects every outcome.
    pub async fn run(
        &self,
        settings: &ClientSettings,
        accounts: &[Account],
        action: &Action,
    ) -> RunReport {
        self.run_observed(settings, accounts, action, Arc::new(RunStats::new()))
            .await
    }

    /// Like [`run`](Self::run), updating `stats` live so a caller can show progress.
    #[instrument(skip(self, settings, accounts, stats), fields(action = action.name(), target = action.target(), accounts = accounts.len()))]
    pub async fn run_observed(
        &self,
        settings: &ClientSettings,
        accounts: &[Account],
        action: &Action,
        stats: Arc<RunStats>,
    ) -> RunReport {
        let mut handles = Vec::with_capacity(accounts.len());

        info!("starting run");

        for account in accounts {
            let semaphore = Arc::clone(&self.semaphore);
            let settings = settings.clone();
            let account = account.clone();
            let action = action.clone();
            let policy = self.retry_policy.clone();
            let limiter = Arc::clone(&self.rate_limiter);
            let stats = Arc::clone(&stats);
            let span = info_span!("account", label = %account.label());

            handles.push(tokio::spawn(
                async move {
                    // The semaphore is never closed, so acquire only fails if it is.
                    let outcome = if let Ok(_permit) = semaphore.acquire_owned().await {
                        run_for_account(&settings, &account, &action, &policy, &limiter, &stats)
                            .await
                    } else {
                        warn!("concurrency limiter closed");
                        aborted_outcome(&account, "concurrency limiter closed")
                    };
                    if outcome.is_success() {
                        stats.increment_completed();
                    } else {
                        stats.increment_failed();
                    }
                    outcome
                }
                .instrument(span),
            ));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (account, handle) in accounts.iter().zip(handles) {
            outcomes.push(collect_outcome(account, handle.await, &stats));
        }

        info!(
            completed = stats.completed(),
            failed = stats.failed(),
            retried = stats.retried(),
            "run complete"
        );

        RunReport {
            outcomes,
            stats: stats.snapshot(),
        }
    }
}

/// Turns a finished account task into its outcome; a panicked or cancelled
/// task still yields a failed outcome under the account's label.
fn collect_outcome(
    account: &Account,
    joined: Result<AccountOutcome, tokio::task::JoinError>,
    stats: &RunStats,
) -> AccountOutcome {
    joined.unwrap_or_else(|error| {
        warn!(label = %account.label(), error = %error, "account task panicked");
        stats.increment_failed();
        aborted_outcome(account, &error.to_string())
    })
}

fn aborted_outcome(account: &Account, reason: &str) -> AccountOutcome {
    AccountOutcome {
        account: account.label().to_string(),
        display_identifier: account.display_identifier(),
        attempts: 0,
        result: Err(ActionError::Aborted {
            reason: reason.to_string(),
        }),
    }
}

async fn run_for_account(
    settings: &ClientSettings,
    account: &Account,
    action: &Action,
    policy: &RetryPolicy,
    limiter: &RateLimiter,
    stats: &RunStats,
) -> AccountOutcome {
    let credentials = account.credentials();
    let display_identifier = credentials.display_identifier_or_unknown().to_string();

    let (result, attempts) = match PlatformSession::new(settings, &credentials) {
        Ok(session) => {
            perform_with_retry(&session, account.label(), action, policy, limiter, stats).await
        }
        Err(error) => (Err(error), 1),
    };

    match &result {
        Ok(_) => info!(user = %display_identifier, attempts, "action succeeded"),
        Err(error) => warn!(
            user = %display_identifier,
            attempts,
            kind = error.kind().as_str(),
            error = %error,
            "action failed"
        ),
    }

    AccountOutcome {
        account: account.label().to_string(),
        display_identifier,
        attempts,
        result,
    }
}

async fn perform_with_retry(
    session: &PlatformSession,
    label: &str,
    action: &Action,
    policy: &RetryPolicy,
    limiter: &RateLimiter,
    stats: &RunStats,
) -> (Result<ActionOutput, ActionError>, u32) {
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        limiter.acquire(label).await;

        let error = match action.perform(session).await {
            Ok(output) => return (Ok(output), attempt),
            Err(error) => error,
        };

        let failure_type = classify_action_error(action, &error);
        let retry_after = if failure_type == FailureType::RateLimited {
            retry_after_delay(&error, label, limiter).await
        } else {
            None
        };

        match policy.should_retry(failure_type, attempt) {
            RetryDecision::Retry {
                delay: backoff,
                attempt: next_attempt,
            } => {
                // A recorded Retry-After is enforced by the limiter on the next acquire.
                let delay = if retry_after.is_some() {
                    Duration::ZERO
                } else {
                    backoff
                };
                info!(
                    attempt = next_attempt,
                    max_attempts = policy.max_attempts(),
                    delay_ms = delay.as_millis(),
                    using_retry_after = retry_after.is_some(),
                    error = %error,
                    "retrying action"
                );
                stats.increment_retried();
                tokio::time::sleep(delay).await;
            }
            RetryDecision::DoNotRetry { reason } => {
                debug!(%reason, "not retrying action");
                return (Err(error), attempt);
            }
        }
    }
}

async fn retry_after_delay(
    error: &ActionError,
    label: &str,
    limiter: &RateLimiter,
) -> Option<Duration> {
    let header = error.retry_after()?;
    let delay = parse_retry_after(header)?;
    limiter.record_rate_limit(label, delay).await;
    debug!(retry_after = %header, delay_ms = delay.as_millis(), "using Retry-After delay");
    Some(delay)
}
