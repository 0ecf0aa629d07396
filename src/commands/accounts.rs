//! `socialctl accounts`: list registered accounts.

use anyhow::Result;
use socialctl_core::auth::AccountSet;

use crate::app::exit_handler::ProcessExit;

/// Prints one `<label>\t<display identifier>` line per account.
///
/// Cookie values are never printed.
pub fn run_accounts_command(set: &AccountSet, selectors: &[String]) -> Result<ProcessExit> {
    for account in set.select(selectors)? {
        println!("{}\t{}", account.label(), account.display_identifier());
    }
    Ok(ProcessExit::Success)
}
