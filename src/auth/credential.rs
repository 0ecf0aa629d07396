//! Session cookie string parser.
//!
//! Converts the raw `"; "`-delimited cookie string a browser shows for a
//! logged-in platform session into an ordered set of key/value pairs, and
//! derives the display identifier (the `ds_user` cookie) from it.

use std::fmt;

use tracing::{debug, instrument};

/// Delimiter between cookie fragments in a raw cookie string.
pub const FRAGMENT_DELIMITER: &str = "; ";

/// Cookie key carrying the platform username of the session owner.
pub const DISPLAY_IDENTIFIER_KEY: &str = "ds_user";

/// Cookie key carrying the anti-forgery token echoed in `X-CSRFToken`.
pub const CSRF_TOKEN_KEY: &str = "csrftoken";

/// Sentinel returned when a credential set carries no display identifier.
pub const UNKNOWN_DISPLAY_IDENTIFIER: &str = "unknown";

/// An ordered, de-duplicated set of session cookies.
///
/// Values are credentials and are redacted in `Debug` output.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CredentialSet {
    entries: Vec<(String, String)>,
}

impl CredentialSet {
    /// Parses a raw cookie string.
    ///
    /// The input is split on `"; "`, then each fragment on its first `=`
    /// (values may contain `=`). Keys and values are trimmed. Fragments
    /// without `=` or with an empty key are dropped. When a key repeats, the
    /// last value wins and the key keeps its first position.
    ///
    /// Never fails: empty or degenerate input yields an empty set.
    #[must_use]
    #[instrument(level = "debug", skip(raw), fields(raw_len = raw.len()))]
    pub fn parse(raw: &str) -> Self {
        let mut set = Self::default();
        let mut dropped = 0_usize;

        for fragment in raw.split(FRAGMENT_DELIMITER) {
            let Some((key, value)) = fragment.split_once('=') else {
                if !fragment.trim().is_empty() {
                    dropped += 1;
                }
                continue;
            };

            let key = key.trim();
            if key.is_empty() {
                dropped += 1;
                continue;
            }

            set.insert(key, value.trim());
        }

        debug!(cookies = set.len(), dropped, "parsed cookie string");
        set
    }

    fn insert(&mut self, key: &str, value: &str) {
        if let Some(existing) = self.entries.iter_mut().find(|(k, _)| k == key) {
            existing.1 = value.to_string();
        } else {
            self.entries.push((key.to_string(), value.to_string()));
        }
    }

    /// Returns the value for `key`, if present.
    ///
    /// Cookie values are sensitive; avoid logging the return value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns whether `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no cookie was parsed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(key, value)` pairs in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Iterates over keys in first-seen order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// The CSRF token the platform expects echoed in a request header.
    #[must_use]
    pub fn csrf_token(&self) -> Option<&str> {
        self.get(CSRF_TOKEN_KEY).filter(|token| !token.is_empty())
    }

    /// The session owner's display identifier, by exact `ds_user` key lookup.
    #[must_use]
    pub fn display_identifier(&self) -> Option<&str> {
        self.get(DISPLAY_IDENTIFIER_KEY)
            .filter(|value| !value.is_empty())
    }

    /// Like [`display_identifier`](Self::display_identifier), falling back to
    /// [`UNKNOWN_DISPLAY_IDENTIFIER`].
    #[must_use]
    pub fn display_identifier_or_unknown(&self) -> &str {
        self.display_identifier()
            .unwrap_or(UNKNOWN_DISPLAY_IDENTIFIER)
    }

    /// Serializes the set back into `"; "`-joined `key=value` form.
    #[must_use]
    pub fn to_cookie_string(&self) -> String {
        self.entries
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(FRAGMENT_DELIMITER)
    }
}

impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, _)| (k, "[REDACTED]")))
            .finish()
    }
}

/// Parses a raw cookie string. Shorthand for [`CredentialSet::parse`].
#[must_use]
pub fn parse_cookie_string(raw: &str) -> CredentialSet {
    CredentialSet::parse(raw)
}

/// Scans the raw cookie string the way older account records were read.
///
/// Splits on `;` alone, picks the first fragment that contains the substring
/// `ds_user=` anywhere (including inside another cookie's value) and returns
/// the trimmed text after its first `=`. Prefer
/// [`CredentialSet::display_identifier`]; this exists for records that must
/// render exactly as before.
#[must_use]
pub fn legacy_display_identifier(raw: &str) -> Option<String> {
    let needle = format!("{DISPLAY_IDENTIFIER_KEY}=");
    raw.split(';')
        .find(|fragment| fragment.contains(&needle))
        .and_then(|fragment| fragment.trim().split_once('='))
        .map(|(_, rest)| rest.trim().to_string())
}
