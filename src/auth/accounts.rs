//! Registered platform accounts.
//!
//! An account is nothing more than a labelled raw cookie string. The raw
//! string is the stored form; credentials and the display identifier are
//! derived from it each time they are needed.

use std::fmt;
use std::io::BufRead;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use super::credential::CredentialSet;

/// Prefix for generated account labels (`account-1`, `account-2`, ...).
const LABEL_PREFIX: &str = "account-";

/// Errors raised while registering or selecting accounts.
#[derive(Debug, Error)]
pub enum AccountError {
    /// Reading a cookie file failed.
    #[error("failed to read cookie file '{path}': {source}")]
    Io {
        /// Path that failed to read (`-` for stdin).
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// No usable cookie string was supplied.
    #[error("no accounts registered\n  Suggestion: pass --cookie '<cookie string>' or --cookies-file <path>")]
    NoAccounts,

    /// A selector matched no registered account.
    #[error("no registered account matches '{selector}'")]
    UnknownAccount {
        /// The label or display identifier that was requested.
        selector: String,
    },
}

impl AccountError {
    /// Creates an I/O error for the given source path.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// One registered session, identified by a generated label.
#[derive(Clone)]
pub struct Account {
    label: String,
    raw_cookie: String,
}

impl Account {
    /// Registers a raw cookie string under `label`.
    #[must_use]
    pub fn new(label: impl Into<String>, raw_cookie: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            raw_cookie: raw_cookie.into(),
        }
    }

    /// The account label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The raw cookie string as supplied. Sensitive.
    #[must_use]
    pub fn raw_cookie(&self) -> &str {
        &self.raw_cookie
    }

    /// Parses the stored cookie string into a fresh credential set.
    #[must_use]
    pub fn credentials(&self) -> CredentialSet {
        CredentialSet::parse(&self.raw_cookie)
    }

    /// The session owner's display identifier, or `"unknown"`.
    #[must_use]
    pub fn display_identifier(&self) -> String {
        self.credentials().display_identifier_or_unknown().to_string()
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("label", &self.label)
            .field("raw_cookie", &"[REDACTED]")
            .finish()
    }
}

/// The accounts available to one invocation.
#[derive(Debug, Clone, Default)]
pub struct AccountSet {
    accounts: Vec<Account>,
}

impl AccountSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a cookie string and returns its label.
    ///
    /// Blank strings are ignored and return `None`.
    pub fn register(&mut self, raw_cookie: &str) -> Option<&str> {
        let raw_cookie = raw_cookie.trim();
        if raw_cookie.is_empty() {
            return None;
        }
        let label = format!("{LABEL_PREFIX}{}", self.accounts.len() + 1);
        let account = Account::new(label, raw_cookie);
        if account.credentials().is_empty() {
            warn!(
                label = %account.label(),
                "cookie string contains no key=value pairs; requests will be unauthenticated"
            );
        }
        debug!(label = %account.label(), "registered account");
        self.accounts.push(account);
        self.accounts.last().map(Account::label)
    }

    /// Registers one cookie string per line from `reader`.
    ///
    /// Blank lines and lines starting with `#` are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::Io`] when reading fails.
    #[instrument(level = "debug", skip(self, reader))]
    pub fn register_from_reader(
        &mut self,
        source: &str,
        reader: impl BufRead,
    ) -> Result<usize, AccountError> {
        let mut added = 0;
        for line in reader.lines() {
            let line = line.map_err(|error| AccountError::io(source, error))?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if self.register(line).is_some() {
                added += 1;
            }
        }
        info!(source, added, "registered accounts from cookie file");
        Ok(added)
    }

    /// Registers one cookie string per line from a file (`-` reads stdin).
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::Io`] when the file cannot be opened or read.
    pub fn register_from_path(&mut self, path: &Path) -> Result<usize, AccountError> {
        let display = path.display().to_string();
        if display == "-" {
            let stdin = std::io::stdin();
            return self.register_from_reader(&display, stdin.lock());
        }
        let file = std::fs::File::open(path).map_err(|error| AccountError::io(&display, error))?;
        self.register_from_reader(&display, std::io::BufReader::new(file))
    }

    /// Number of registered accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// All registered accounts in registration order.
    #[must_use]
    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    /// Finds an account by label or by display identifier.
    #[must_use]
    pub fn find(&self, selector: &str) -> Option<&Account> {
        self.accounts
            .iter()
            .find(|account| account.label() == selector)
            .or_else(|| {
                self.accounts.iter().find(|account| {
                    account.credentials().display_identifier() == Some(selector)
                })
            })
    }

    /// Narrows the set to the selected accounts, keeping their labels.
    ///
    /// An empty selector list selects every account.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::NoAccounts`] when the set is empty, or
    /// [`AccountError::UnknownAccount`] for a selector that matches nothing.
    pub fn select(&self, selectors: &[String]) -> Result<Vec<Account>, AccountError> {
        if self.accounts.is_empty() {
            return Err(AccountError::NoAccounts);
        }
        if selectors.is_empty() {
            return Ok(self.accounts.clone());
        }

        let mut selected: Vec<Account> = Vec::with_capacity(selectors.len());
        for selector in selectors {
            let account = self
                .find(selector)
                .ok_or_else(|| AccountError::UnknownAccount {
                    selector: selector.clone(),
                })?;
            if !selected.iter().any(|a| a.label() == account.label()) {
                selected.push(account.clone());
            }
        }
        Ok(selected)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_register_assigns_sequential_labels() {
        let mut set = AccountSet::new();
        assert_eq!(set.register("ds_user=alice; sessionid=1"), Some("account-1"));
        assert_eq!(set.register("ds_user=bob; sessionid=2"), Some("account-2"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_register_ignores_blank_input() {
        let mut set = AccountSet::new();
        assert_eq!(set.register("   "), None);
        assert!(set.is_empty());
    }

    #[test]
    fn test_register_from_reader_skips_comments_and_blank_lines() {
        let input = "\
# exported sessions
ds_user=alice; sessionid=1

ds_user=bob; sessionid=2
";
        let mut set = AccountSet::new();
        let added = set
            .register_from_reader("test", Cursor::new(input.as_bytes()))
            .unwrap();
        assert_eq!(added, 2);
        assert_eq!(set.accounts()[0].display_identifier(), "alice");
        assert_eq!(set.accounts()[1].display_identifier(), "bob");
    }

    #[test]
    fn test_account_display_identifier_unknown() {
        let account = Account::new("account-1", "sessionid=1");
        assert_eq!(account.display_identifier(), "unknown");
    }

    #[test]
    fn test_find_by_label_or_display_identifier() {
        let mut set = AccountSet::new();
        set.register("ds_user=alice; sessionid=1");
        set.register("ds_user=bob; sessionid=2");

        assert_eq!(set.find("account-2").unwrap().display_identifier(), "bob");
        assert_eq!(set.find("alice").unwrap().label(), "account-1");
        assert!(set.find("carol").is_none());
    }

    #[test]
    fn test_select_empty_selectors_returns_all() {
        let mut set = AccountSet::new();
        set.register("ds_user=alice");
        set.register("ds_user=bob");
        assert_eq!(set.select(&[]).unwrap().len(), 2);
    }

    #[test]
    fn test_select_deduplicates() {
        let mut set = AccountSet::new();
        set.register("ds_user=alice");
        set.register("ds_user=bob");
        let selected = set
            .select(&["alice".to_string(), "account-1".to_string()])
            .unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].label(), "account-1");
    }

    #[test]
    fn test_select_unknown_selector_fails() {
        let mut set = AccountSet::new();
        set.register("ds_user=alice");
        let err = set.select(&["carol".to_string()]).unwrap_err();
        assert!(matches!(err, AccountError::UnknownAccount { .. }));
        assert!(err.to_string().contains("carol"));
    }

    #[test]
    fn test_select_on_empty_set_fails_with_no_accounts() {
        let set = AccountSet::new();
        let err = set.select(&[]).unwrap_err();
        assert!(matches!(err, AccountError::NoAccounts));
    }

    #[test]
    fn test_account_debug_redacts_cookie() {
        let account = Account::new("account-1", "sessionid=supersecret");
        let debug = format!("{account:?}");
        assert!(debug.contains("account-1"));
        assert!(!debug.contains("supersecret"));
    }
}
