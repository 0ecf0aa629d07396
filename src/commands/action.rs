//! Follow, like, comment and scrape handlers.

use std::io::IsTerminal;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use anyhow::{Context, Result};
use socialctl_core::auth::Account;
use socialctl_core::runner::{AccountOutcome, Action, ActionOutput, RunStats};
use tracing::info;

use crate::app::exit_handler::{ProcessExit, determine_exit_outcome};
use crate::app::progress::spawn_progress_ui;
use crate::app::settings::EffectiveSettings;
use crate::app::terminal;

/// Runs `action` under `accounts` and prints one line per account.
///
/// `scrape` only needs one session, so it runs under the first account and
/// prints the profile as JSON.
pub async fn run_action_command(
    action: Action,
    accounts: &[Account],
    settings: &EffectiveSettings,
    quiet: bool,
) -> Result<ProcessExit> {
    let accounts = match action {
        Action::Scrape { .. } => &accounts[..accounts.len().min(1)],
        _ => accounts,
    };
    let runner = settings.build_runner()?;

    let stats = Arc::new(RunStats::new());
    let use_spinner = terminal::should_use_spinner(
        std::io::stderr().is_terminal(),
        quiet,
        terminal::is_dumb_terminal(),
    );
    let (spinner, stop) =
        spawn_progress_ui(use_spinner, Arc::clone(&stats), action.to_string(), accounts.len());

    let report = runner
        .run_observed(&settings.client, accounts, &action, stats)
        .await;

    stop.store(true, Ordering::SeqCst);
    if let Some(handle) = spinner {
        let _ = handle.await;
    }

    for outcome in &report.outcomes {
        println!("{}", render_outcome(outcome)?);
    }

    info!(
        action = action.name(),
        completed = report.stats.completed(),
        failed = report.stats.failed(),
        retried = report.stats.retried(),
        "run summary"
    );

    Ok(determine_exit_outcome(
        report.stats.completed(),
        report.stats.failed(),
    ))
}

fn render_outcome(outcome: &AccountOutcome) -> Result<String> {
    let who = format!("{} ({})", outcome.account, outcome.display_identifier);
    let line = match &outcome.result {
        Ok(ActionOutput::Followed(receipt)) => {
            format!("ok    {who}  followed {} (user id {})", receipt.username, receipt.user_id)
        }
        Ok(ActionOutput::Liked(media_id)) => format!("ok    {who}  liked media {media_id}"),
        Ok(ActionOutput::Commented(media_id)) => {
            format!("ok    {who}  commented on media {media_id}")
        }
        Ok(ActionOutput::Profile(profile)) => {
            serde_json::to_string_pretty(profile).context("Failed to serialize profile")?
        }
        Err(error) => format!("fail  {who}  {}: {error}", error.kind().as_str()),
    };
    Ok(line)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use socialctl_core::platform::{ActionError, FollowReceipt};
    use socialctl_core::shortcode::MediaId;

    fn outcome(result: Result<ActionOutput, ActionError>) -> AccountOutcome {
        AccountOutcome {
            account: "account-1".to_string(),
            display_identifier: "alice".to_string(),
            attempts: 1,
            result,
        }
    }

    #[test]
    fn test_render_success_lines() {
        let line = render_outcome(&outcome(Ok(ActionOutput::Followed(FollowReceipt {
            username: "janedoe".to_string(),
            user_id: "42".to_string(),
        }))))
        .unwrap();
        assert_eq!(line, "ok    account-1 (alice)  followed janedoe (user id 42)");

        let line = render_outcome(&outcome(Ok(ActionOutput::Liked(MediaId::new(64))))).unwrap();
        assert_eq!(line, "ok    account-1 (alice)  liked media 64");
    }

    #[test]
    fn test_render_failure_line_has_kind() {
        let line = render_outcome(&outcome(Err(ActionError::from_status(
            "https://x/",
            404,
            None,
        ))))
        .unwrap();
        assert!(line.starts_with("fail  account-1 (alice)  not_found: "), "got: {line}");
    }
}
