//! Error types for platform actions.
//!
//! Every outbound call reports a typed failure instead of a bare `false`, so
//! callers can tell a rejected session from a rate limit, a missing target,
//! or a network fault.

use thiserror::Error;

use crate::shortcode::ShortcodeError;

/// Flat classification of an [`ActionError`], for reporting and exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The username or post reference could not be used.
    InvalidTarget,
    /// The session cookies were rejected.
    Unauthorized,
    /// The platform is throttling this session.
    RateLimited,
    /// The target user or post does not exist.
    NotFound,
    /// The platform answered but refused the action.
    Rejected,
    /// Any other non-success HTTP status.
    HttpStatus,
    /// The request timed out.
    Timeout,
    /// Connection-level failure.
    Transport,
    /// A success response whose body was not what the endpoint returns.
    MalformedResponse,
    /// The HTTP client could not be constructed.
    ClientBuild,
    /// The account's task ended before producing a result.
    Aborted,
}

impl FailureKind {
    /// Stable label for log fields and summaries.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidTarget => "invalid_target",
            Self::Unauthorized => "unauthorized",
            Self::RateLimited => "rate_limited",
            Self::NotFound => "not_found",
            Self::Rejected => "rejected",
            Self::HttpStatus => "http_status",
            Self::Timeout => "timeout",
            Self::Transport => "transport",
            Self::MalformedResponse => "malformed_response",
            Self::ClientBuild => "client_build",
            Self::Aborted => "aborted",
        }
    }
}

/// Errors that can occur while performing a platform action.
#[derive(Debug, Error)]
pub enum ActionError {
    /// The username or post reference is unusable.
    #[error("invalid target '{target}': {reason}")]
    InvalidTarget {
        /// The rejected input.
        target: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The platform rejected the session (401/403, or a redirect to login).
    #[error(
        "[AUTH] session rejected (HTTP {status}) requesting {url}\n  Suggestion: export a fresh cookie string from a logged-in browser"
    )]
    Unauthorized {
        /// The endpoint that rejected the session.
        url: String,
        /// HTTP status, or 0 when detected from a login redirect.
        status: u16,
    },

    /// The platform is rate limiting this session (HTTP 429).
    #[error("rate limited (HTTP 429) requesting {url}")]
    RateLimited {
        /// The endpoint that returned 429.
        url: String,
        /// Raw `Retry-After` header value, if present.
        retry_after: Option<String>,
    },

    /// The target does not exist (HTTP 404 or an empty profile payload).
    #[error("not found: {url}")]
    NotFound {
        /// The endpoint that reported the missing target.
        url: String,
    },

    /// The platform returned success status with a `"status": "fail"` body.
    #[error("platform refused the action at {url}: {message}")]
    Rejected {
        /// The endpoint that refused.
        url: String,
        /// The platform's message, or a placeholder when none was sent.
        message: String,
    },

    /// Any other non-success HTTP status.
    #[error("HTTP {status} requesting {url}")]
    HttpStatus {
        /// The endpoint that failed.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The request was sent but no complete response arrived in time.
    #[error("timeout requesting {url}")]
    Timeout {
        /// The endpoint that timed out.
        url: String,
    },

    /// Connection-level failure (DNS, refused connection, connect timeout,
    /// TLS, body read).
    #[error("network error requesting {url}: {source}")]
    Transport {
        /// The endpoint being requested.
        url: String,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },

    /// A success response with an unexpected body.
    #[error("unexpected response from {url}: {reason}")]
    MalformedResponse {
        /// The endpoint that answered.
        url: String,
        /// What was wrong with the body.
        reason: String,
    },

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {reason}")]
    ClientBuild {
        /// Builder failure description.
        reason: String,
    },

    /// The account's task panicked or was cancelled.
    #[error("action aborted: {reason}")]
    Aborted {
        /// What stopped the task.
        reason: String,
    },
}

impl ActionError {
    /// Creates an invalid-target error.
    pub fn invalid_target(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTarget {
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Maps a transport-level reqwest error, separating timeouts.
    ///
    /// A timeout while connecting stays `Transport` so callers can tell that
    /// the request was never sent.
    pub fn from_reqwest(url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() && !source.is_connect() {
            Self::Timeout { url }
        } else {
            Self::Transport { url, source }
        }
    }

    /// Maps a non-success HTTP status to the matching variant.
    ///
    /// | Status   | Variant        |
    /// |----------|----------------|
    /// | 401, 403 | `Unauthorized` |
    /// | 404, 410 | `NotFound`     |
    /// | 429      | `RateLimited`  |
    /// | other    | `HttpStatus`   |
    pub fn from_status(url: impl Into<String>, status: u16, retry_after: Option<String>) -> Self {
        let url = url.into();
        match status {
            401 | 403 => Self::Unauthorized { url, status },
            404 | 410 => Self::NotFound { url },
            429 => Self::RateLimited { url, retry_after },
            _ => Self::HttpStatus { url, status },
        }
    }

    /// Creates a malformed-response error.
    pub fn malformed(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates a client-build error.
    pub fn client_build(reason: impl Into<String>) -> Self {
        Self::ClientBuild {
            reason: reason.into(),
        }
    }

    /// Returns the flat failure classification.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidTarget { .. } => FailureKind::InvalidTarget,
            Self::Unauthorized { .. } => FailureKind::Unauthorized,
            Self::RateLimited { .. } => FailureKind::RateLimited,
            Self::NotFound { .. } => FailureKind::NotFound,
            Self::Rejected { .. } => FailureKind::Rejected,
            Self::HttpStatus { .. } => FailureKind::HttpStatus,
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::Transport { .. } => FailureKind::Transport,
            Self::MalformedResponse { .. } => FailureKind::MalformedResponse,
            Self::ClientBuild { .. } => FailureKind::ClientBuild,
            Self::Aborted { .. } => FailureKind::Aborted,
        }
    }

    /// True when the connection was never established, so nothing reached
    /// the platform.
    #[must_use]
    pub fn is_connect_failure(&self) -> bool {
        matches!(self, Self::Transport { source, .. } if source.is_connect())
    }

    /// The raw `Retry-After` value carried by a rate-limit error.
    #[must_use]
    pub fn retry_after(&self) -> Option<&str> {
        match self {
            Self::RateLimited { retry_after, .. } => retry_after.as_deref(),
            _ => None,
        }
    }
}

impl From<ShortcodeError> for ActionError {
    fn from(error: ShortcodeError) -> Self {
        let target = match &error {
            ShortcodeError::InvalidSymbol { code, .. } | ShortcodeError::Overflow { code, .. } => {
                code.clone()
            }
            ShortcodeError::NotAPostUrl { target } => target.clone(),
            ShortcodeError::Empty => String::new(),
        };
        Self::invalid_target(target, error.to_string())
    }
}
