//! Session credentials and account registration.
//!
//! This module parses the raw cookie strings users paste from a logged-in
//! browser session, loads them into a reqwest cookie jar for the platform
//! origin, and keeps the set of accounts registered for one invocation.

mod accounts;
mod credential;
mod jar;

pub use accounts::{Account, AccountError, AccountSet};
pub use credential::{
    CSRF_TOKEN_KEY, CredentialSet, DISPLAY_IDENTIFIER_KEY, FRAGMENT_DELIMITER,
    UNKNOWN_DISPLAY_IDENTIFIER, legacy_display_identifier, parse_cookie_string,
};
pub use jar::load_credentials_into_jar;
