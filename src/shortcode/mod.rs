//! Short code to media identifier decoding.
//!
//! Content URLs carry a short code (`/p/<code>/`) that is a base-64 numeral
//! over a URL-safe alphabet. The platform's write endpoints address content
//! by the decoded integer instead.
//!
//! # Example
//!
//! ```
//! use socialctl_core::shortcode::decode;
//!
//! assert_eq!(decode("BA").unwrap().as_u128(), 64);
//! assert!(decode("!").is_err());
//! ```

mod error;
mod post_url;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::instrument;

pub use error::ShortcodeError;
pub use post_url::{extract_shortcode, media_id_from_target};

/// The 64 symbols of the short code alphabet, in digit-value order.
pub const ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Numeral base of the short code encoding.
const BASE: u128 = 64;

/// Longest short code whose every value is guaranteed to fit a `u128`.
pub const MAX_GUARANTEED_LENGTH: usize = 21;

/// Canonical numeric identifier of a piece of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MediaId(u128);

impl MediaId {
    /// Wraps a raw identifier.
    #[must_use]
    pub const fn new(value: u128) -> Self {
        Self(value)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn as_u128(self) -> u128 {
        self.0
    }
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MediaId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u128>().map(Self)
    }
}

impl From<u128> for MediaId {
    fn from(value: u128) -> Self {
        Self(value)
    }
}

// JSON numbers lose precision above 2^53, so the id travels as a string.
impl Serialize for MediaId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MediaId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Digit value of one alphabet symbol.
fn digit_value(symbol: char) -> Option<u128> {
    match symbol {
        'A'..='Z' => Some(u128::from(symbol) - u128::from('A')),
        'a'..='z' => Some(u128::from(symbol) - u128::from('a') + 26),
        '0'..='9' => Some(u128::from(symbol) - u128::from('0') + 52),
        '-' => Some(62),
        '_' => Some(63),
        _ => None,
    }
}

/// Decodes a short code into its media identifier.
///
/// The code is read most significant symbol first:
/// `acc = acc * 64 + value(symbol)`.
///
/// # Errors
///
/// - [`ShortcodeError::Empty`] for an empty code
/// - [`ShortcodeError::InvalidSymbol`] for a symbol outside [`ALPHABET`]
/// - [`ShortcodeError::Overflow`] when the value does not fit 128 bits
///   (never for codes of [`MAX_GUARANTEED_LENGTH`] symbols or fewer)
#[instrument(level = "trace")]
pub fn decode(code: &str) -> Result<MediaId, ShortcodeError> {
    if code.is_empty() {
        return Err(ShortcodeError::Empty);
    }

    let mut acc: u128 = 0;
    for (position, symbol) in code.chars().enumerate() {
        let value = digit_value(symbol)
            .ok_or_else(|| ShortcodeError::invalid_symbol(code, symbol, position))?;
        acc = acc
            .checked_mul(BASE)
            .and_then(|shifted| shifted.checked_add(value))
            .ok_or_else(|| ShortcodeError::overflow(code))?;
    }

    Ok(MediaId(acc))
}
