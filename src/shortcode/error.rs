//! Error types for short code decoding and extraction.

use thiserror::Error;

/// Errors raised while turning a post reference into a media identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShortcodeError {
    /// The short code is empty.
    #[error("short code is empty")]
    Empty,

    /// A character outside the 64-symbol alphabet was found.
    #[error("invalid symbol '{symbol}' at position {position} in short code '{code}'")]
    InvalidSymbol {
        /// The full short code.
        code: String,
        /// The offending character.
        symbol: char,
        /// Zero-based character position.
        position: usize,
    },

    /// The decoded value does not fit the identifier width.
    #[error("short code '{code}' ({length} symbols) decodes past the 128-bit identifier range")]
    Overflow {
        /// The full short code.
        code: String,
        /// Number of symbols in the code.
        length: usize,
    },

    /// The input is neither a bare short code nor a post URL containing one.
    #[error("'{target}' is not a post URL\n  Suggestion: use a link like https://www.instagram.com/p/<code>/")]
    NotAPostUrl {
        /// The rejected input.
        target: String,
    },
}

impl ShortcodeError {
    /// Creates an `InvalidSymbol` error.
    #[must_use]
    pub fn invalid_symbol(code: &str, symbol: char, position: usize) -> Self {
        Self::InvalidSymbol {
            code: code.to_string(),
            symbol,
            position,
        }
    }

    /// Creates an `Overflow` error.
    #[must_use]
    pub fn overflow(code: &str) -> Self {
        Self::Overflow {
            code: code.to_string(),
            length: code.chars().count(),
        }
    }

    /// Creates a `NotAPostUrl` error.
    #[must_use]
    pub fn not_a_post_url(target: &str) -> Self {
        Self::NotAPostUrl {
            target: target.to_string(),
        }
    }
}
