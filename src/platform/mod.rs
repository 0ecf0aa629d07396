//! Authenticated platform actions.
//!
//! This module provides:
//! - HTTP client construction with a per-session cookie jar
//! - Follow, like, comment and profile scraping
//! - Typed action errors with a flat [`FailureKind`] classification
//!
//! # Example
//!
//! ```no_run
//! use socialctl_core::platform::{ClientSettings, like};
//!
//! # async fn example() -> Result<(), socialctl_core::platform::ActionError> {
//! let settings = ClientSettings::default();
//! let media_id = like(
//!     &settings,
//!     "https://www.instagram.com/p/CuQ9x2LNhRE/",
//!     "csrftoken=abc; sessionid=xyz; ds_user=jane",
//! )
//! .await?;
//! println!("liked {media_id}");
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod profile;
mod session;

pub use client::{
    ClientSettings, DEFAULT_APP_ID, DEFAULT_BASE_URL, DEFAULT_CONNECT_TIMEOUT_SECS,
    DEFAULT_READ_TIMEOUT_SECS, build_platform_client,
};
pub use error::{ActionError, FailureKind};
pub use profile::{EdgeCount, ProfileInfo};
pub use session::{
    FollowReceipt, PlatformSession, comment, follow, like, normalize_username, scrape_profile,
};
