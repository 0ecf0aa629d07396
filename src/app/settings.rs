//! Merges CLI flags with the config file into runtime settings.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use socialctl_core::auth::{Account, AccountSet};
use socialctl_core::platform::{
    ClientSettings, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_READ_TIMEOUT_SECS,
};
use socialctl_core::runner::{
    ActionRunner, DEFAULT_CONCURRENCY, DEFAULT_MAX_RETRIES, RateLimiter, RetryPolicy,
};
use socialctl_core::user_agent::resolve_user_agent;
use tracing::debug;

use crate::app_config::FileConfig;
use crate::cli::SessionArgs;

/// Default per-account spacing between requests, in milliseconds.
pub(crate) const DEFAULT_RATE_LIMIT_MS: u64 = 1000;

/// Effective values after CLI > config file > built-in defaults.
#[derive(Debug, Clone)]
pub(crate) struct EffectiveSettings {
    pub(crate) client: ClientSettings,
    pub(crate) concurrency: usize,
    pub(crate) max_retries: u32,
    pub(crate) rate_limit_ms: u64,
    pub(crate) cookies_file: Option<PathBuf>,
}

impl EffectiveSettings {
    pub(crate) fn resolve(args: &SessionArgs, file: &FileConfig) -> Self {
        let mut client = ClientSettings::new()
            .with_user_agent(resolve_user_agent(file.user_agent.as_deref()))
            .with_timeouts(
                Duration::from_secs(
                    file.connect_timeout_secs.unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
                ),
                Duration::from_secs(file.read_timeout_secs.unwrap_or(DEFAULT_READ_TIMEOUT_SECS)),
            );
        if let Some(app_id) = &file.app_id {
            client = client.with_app_id(app_id.clone());
        }
        if let Some(base_url) = args.base_url.clone().or_else(|| file.base_url.clone()) {
            client = client.with_base_url(base_url);
        }

        // Config-file cookies only apply when no account source was given on the CLI.
        let cookies_file = args.cookies_file.clone().or_else(|| {
            if args.cookies.is_empty() {
                file.cookies_file.clone()
            } else {
                None
            }
        });

        Self {
            client,
            concurrency: args
                .concurrency
                .or(file.concurrency)
                .map_or(DEFAULT_CONCURRENCY, usize::from),
            max_retries: args
                .max_retries
                .or(file.max_retries)
                .map_or(DEFAULT_MAX_RETRIES, u32::from),
            rate_limit_ms: args
                .rate_limit
                .or(file.rate_limit)
                .unwrap_or(DEFAULT_RATE_LIMIT_MS),
            cookies_file,
        }
    }

    /// Builds the runner these settings describe.
    pub(crate) fn build_runner(&self) -> Result<ActionRunner> {
        let rate_limiter = if self.rate_limit_ms == 0 {
            debug!("rate limiting disabled");
            Arc::new(RateLimiter::disabled())
        } else {
            debug!(rate_limit_ms = self.rate_limit_ms, "rate limiting enabled");
            Arc::new(RateLimiter::new(Duration::from_millis(self.rate_limit_ms)))
        };
        let policy = RetryPolicy::with_max_attempts(self.max_retries);
        Ok(ActionRunner::new(self.concurrency, policy, rate_limiter)?)
    }
}

/// Registers every cookie source and applies `--account` selectors.
pub(crate) fn load_accounts(
    args: &SessionArgs,
    settings: &EffectiveSettings,
) -> Result<Vec<Account>> {
    let set = register_accounts(args, settings)?;
    Ok(set.select(&args.accounts)?)
}

/// Registers every cookie source without selecting.
pub(crate) fn register_accounts(
    args: &SessionArgs,
    settings: &EffectiveSettings,
) -> Result<AccountSet> {
    let mut set = AccountSet::new();
    for raw in &args.cookies {
        set.register(raw);
    }
    if let Some(path) = &settings.cookies_file {
        set.register_from_path(path)
            .with_context(|| format!("Failed to load accounts from '{}'", path.display()))?;
    }
    Ok(set)
}
