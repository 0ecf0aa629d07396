//! Per-account request pacing.
//!
//! Every account talks to the same origin, so pacing is keyed by account
//! label rather than by host: two sessions never slow each other down, but
//! consecutive requests made under one session are spaced at least
//! `default_delay` apart. A 429 with `Retry-After` pushes that account's next
//! slot further out.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use socialctl_core::runner::RateLimiter;
//!
//! # async fn example() {
//! let limiter = RateLimiter::new(Duration::from_millis(750));
//! limiter.acquire("account-1").await; // immediate
//! limiter.acquire("account-2").await; // immediate, different account
//! limiter.acquire("account-1").await; // waits ~750ms
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

/// Cumulative wait per account after which a warning is logged.
const CUMULATIVE_DELAY_WARNING_THRESHOLD: Duration = Duration::from_secs(30);

/// Upper bound applied to server-supplied `Retry-After` values.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(3600);

/// Per-account rate limiter, shared across tasks behind an `Arc`.
#[derive(Debug)]
pub struct RateLimiter {
    default_delay: Duration,
    disabled: bool,
    // Arc so the DashMap shard guard can be dropped before awaiting the slot.
    accounts: DashMap<String, Arc<AccountSlot>>,
}

#[derive(Debug, Default)]
struct SlotTiming {
    /// `None` until the first request, which is never delayed.
    last_request: Option<Instant>,
    /// Earliest instant the next request may start, set by a 429.
    cooldown_until: Option<Instant>,
}

#[derive(Debug, Default)]
struct AccountSlot {
    timing: Mutex<SlotTiming>,
    cumulative_delay_ms: AtomicU64,
}

impl AccountSlot {
    #[allow(clippy::cast_possible_truncation)]
    fn add_cumulative_delay(&self, delay: Duration) -> Duration {
        let delay_ms = delay.as_millis() as u64;
        let total = self
            .cumulative_delay_ms
            .fetch_add(delay_ms, Ordering::SeqCst)
            + delay_ms;
        Duration::from_millis(total)
    }
}

impl RateLimiter {
    /// Creates a limiter spacing requests of one account by `default_delay`.
    #[must_use]
    #[instrument(skip_all, fields(delay_ms = default_delay.as_millis()))]
    pub fn new(default_delay: Duration) -> Self {
        debug!("creating rate limiter");
        Self {
            default_delay,
            disabled: default_delay.is_zero(),
            accounts: DashMap::new(),
        }
    }

    /// A limiter that never waits (`--rate-limit 0`).
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            default_delay: Duration::ZERO,
            disabled: true,
            accounts: DashMap::new(),
        }
    }

    /// Whether pacing is off.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Minimum spacing between two requests of one account.
    #[must_use]
    pub fn default_delay(&self) -> Duration {
        self.default_delay
    }

    /// Waits until `account` may issue its next request, then claims the slot.
    ///
    /// Server cooldowns recorded with [`record_rate_limit`](Self::record_rate_limit)
    /// are honored even when the limiter is disabled.
    #[instrument(skip(self))]
    pub async fn acquire(&self, account: &str) {
        let slot = self.slot(account);
        let mut timing = slot.timing.lock().await;
        let now = Instant::now();

        let mut ready_at = timing.cooldown_until.take().unwrap_or(now);
        if !self.disabled
            && let Some(last) = timing.last_request
        {
            ready_at = ready_at.max(last + self.default_delay);
        }

        if ready_at > now {
            let delay = ready_at - now;
            let cumulative = slot.add_cumulative_delay(delay);
            debug!(
                delay_ms = delay.as_millis(),
                cumulative_ms = cumulative.as_millis(),
                "pacing request"
            );
            if cumulative >= CUMULATIVE_DELAY_WARNING_THRESHOLD {
                warn!(
                    cumulative_delay_secs = cumulative.as_secs(),
                    "excessive rate limiting for this account - consider fewer actions per run"
                );
            }
            tokio::time::sleep(delay).await;
        }

        timing.last_request = Some(Instant::now());
    }

    /// Records a server-mandated cooldown for `account`.
    #[instrument(skip(self), fields(delay_ms = delay.as_millis()))]
    pub async fn record_rate_limit(&self, account: &str, delay: Duration) {
        let slot = self.slot(account);
        let until = Instant::now() + delay.min(MAX_RETRY_AFTER);
        let mut timing = slot.timing.lock().await;
        timing.cooldown_until = Some(timing.cooldown_until.map_or(until, |c| c.max(until)));
        debug!("recorded server rate limit");
    }

    fn slot(&self, account: &str) -> Arc<AccountSlot> {
        self.accounts
            .entry(account.to_string())
            .or_insert_with(|| Arc::new(AccountSlot::default()))
            .clone()
    }
}

/// Parses a `Retry-After` value: integer seconds or an HTTP-date.
///
/// Negative or unparseable values yield `None`; a past date yields zero;
/// anything above one hour is capped.
///
/// ```
/// use std::time::Duration;
/// use socialctl_core::runner::parse_retry_after;
///
/// assert_eq!(parse_retry_after("120"), Some(Duration::from_secs(120)));
/// assert_eq!(parse_retry_after("soon"), None);
/// ```
#[must_use]
pub fn parse_retry_after(header_value: &str) -> Option<Duration> {
    let header_value = header_value.trim();

    if let Ok(seconds) = header_value.parse::<i64>() {
        let seconds = u64::try_from(seconds).ok()?;
        return Some(Duration::from_secs(seconds).min(MAX_RETRY_AFTER));
    }

    let date = httpdate::parse_http_date(header_value).ok()?;
    let delay = date
        .duration_since(std::time::SystemTime::now())
        .unwrap_or(Duration::ZERO);
    if delay > MAX_RETRY_AFTER {
        warn!(delay_secs = delay.as_secs(), "Retry-After date capped at 1 hour");
    }
    Some(delay.min(MAX_RETRY_AFTER))
}
