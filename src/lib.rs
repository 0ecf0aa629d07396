//! Socialctl Core Library
//!
//! Drives follow, like, comment and profile-scrape actions against the
//! Instagram web endpoints under one or more browser session cookies.
//!
//! # Architecture
//!
//! - [`auth`] - Cookie-string parsing, cookie jars and account registration
//! - [`shortcode`] - Post short code extraction and decoding to media ids
//! - [`platform`] - HTTP client and the individual platform actions
//! - [`runner`] - Concurrent, rate-limited, retrying execution across accounts
//! - [`user_agent`] - User-Agent resolution

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod platform;
pub mod runner;
pub mod shortcode;
pub mod user_agent;

// Re-export commonly used types
pub use auth::{Account, AccountError, AccountSet, CredentialSet, parse_cookie_string};
pub use platform::{ActionError, ClientSettings, FailureKind, PlatformSession, ProfileInfo};
pub use runner::{
    Action, ActionOutput, ActionRunner, DEFAULT_CONCURRENCY, DEFAULT_MAX_RETRIES, RateLimiter,
    RetryPolicy, RunReport,
};
pub use shortcode::{MediaId, ShortcodeError, decode};
