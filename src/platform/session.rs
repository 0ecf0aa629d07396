//! Platform actions performed under one session.
//!
//! A [`PlatformSession`] binds a credential set to an HTTP client. Its
//! operations map one-to-one onto the web endpoints:
//!
//! | Operation        | Requests                                                       |
//! |------------------|----------------------------------------------------------------|
//! | `scrape_profile` | `GET api/v1/users/web_profile_info/?username=<u>`              |
//! | `follow`         | profile lookup, then `POST api/v1/friendships/create/<id>/`    |
//! | `like`           | `POST web/likes/<media_id>/like/`                              |
//! | `comment`        | `POST web/comments/<media_id>/add/` with `comment_text=<text>` |

use reqwest::header::{CONTENT_TYPE, REFERER, RETRY_AFTER};
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::client::{ClientSettings, build_platform_client};
use super::profile::{ProfileEnvelope, ProfileInfo};
use super::ActionError;
use crate::auth::{CredentialSet, load_credentials_into_jar};
use crate::shortcode::{MediaId, media_id_from_target};

/// Header carrying the anti-forgery token.
const CSRF_HEADER: &str = "X-CSRFToken";

/// Header carrying the web application id.
const APP_ID_HEADER: &str = "X-IG-App-ID";

/// Longest username the platform allows.
const MAX_USERNAME_LENGTH: usize = 30;

/// Path fragments of the login page unauthenticated requests redirect to.
const LOGIN_PATTERNS: &[&str] = &["/accounts/login", "/challenge/"];

/// Result of a successful follow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FollowReceipt {
    /// The username that was followed.
    pub username: String,
    /// Its numeric user id.
    pub user_id: String,
}

/// An HTTP client bound to one set of session cookies.
#[derive(Clone)]
pub struct PlatformSession {
    client: Client,
    settings: ClientSettings,
    csrf_token: Option<String>,
}

impl std::fmt::Debug for PlatformSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformSession")
            .field("base_url", &self.settings.base_url().as_str())
            .field("csrf_token", &self.csrf_token.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl PlatformSession {
    /// Creates a session sending `credentials` to the configured origin.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::ClientBuild`] when the HTTP client cannot be built.
    #[instrument(level = "debug", skip_all, fields(base_url = %settings.base_url(), cookies = credentials.len()))]
    pub fn new(settings: &ClientSettings, credentials: &CredentialSet) -> Result<Self, ActionError> {
        let jar = load_credentials_into_jar(credentials, settings.base_url());
        let client = build_platform_client(settings, jar)?;
        if credentials.csrf_token().is_none() {
            debug!("no csrftoken cookie; write requests will omit X-CSRFToken");
        }
        Ok(Self {
            client,
            settings: settings.clone(),
            csrf_token: credentials.csrf_token().map(str::to_string),
        })
    }

    /// Creates a session from a raw cookie string.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::ClientBuild`] when the HTTP client cannot be built.
    pub fn from_raw_cookie(settings: &ClientSettings, raw_cookie: &str) -> Result<Self, ActionError> {
        Self::new(settings, &CredentialSet::parse(raw_cookie))
    }

    /// Settings this session was built with.
    #[must_use]
    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Fetches public profile information for `username`.
    ///
    /// # Errors
    ///
    /// [`ActionError::NotFound`] when the user does not exist, plus the
    /// transport and status failures every request can produce.
    #[instrument(skip(self), fields(username = %username))]
    pub async fn scrape_profile(&self, username: &str) -> Result<ProfileInfo, ActionError> {
        let username = normalize_username(username)?;
        let url = self.profile_url(&username)?;

        let request = self
            .client
            .get(url.clone())
            .header(APP_ID_HEADER, self.settings.app_id());
        let response = send(request, &url).await?;
        let body = read_body(&url, response).await?;

        let envelope: ProfileEnvelope = serde_json::from_str(&body)
            .map_err(|error| ActionError::malformed(url.as_str(), error.to_string()))?;
        let profile = envelope.data.user.ok_or_else(|| ActionError::NotFound {
            url: url.to_string(),
        })?;

        info!(
            user_id = %profile.id,
            followers = ?profile.follower_count(),
            "scraped profile"
        );
        Ok(profile)
    }

    /// Follows `username`.
    ///
    /// # Errors
    ///
    /// Any error from the profile lookup, or from the follow request itself.
    #[instrument(skip(self), fields(username = %username))]
    pub async fn follow(&self, username: &str) -> Result<FollowReceipt, ActionError> {
        let username = normalize_username(username)?;
        let referer = self.settings.endpoint(&format!("{username}/"))?;

        let profile_url = self.profile_url(&username)?;
        let request = self
            .client
            .get(profile_url.clone())
            .header(APP_ID_HEADER, self.settings.app_id())
            .header(REFERER, referer.as_str());
        let request = self.with_csrf(request);
        let response = send(request, &profile_url).await?;
        let body = read_body(&profile_url, response).await?;
        let user_id = extract_user_id(&profile_url, &body)?;
        debug!(user_id = %user_id, "resolved user id");

        let follow_url = self
            .settings
            .endpoint(&format!("api/v1/friendships/create/{user_id}/"))?;
        let request = self
            .client
            .post(follow_url.clone())
            .header(APP_ID_HEADER, self.settings.app_id())
            .header(REFERER, referer.as_str());
        let request = self.with_csrf(request);
        let response = send(request, &follow_url).await?;
        ensure_not_refused(&follow_url, response).await?;

        info!(user_id = %user_id, "followed user");
        Ok(FollowReceipt { username, user_id })
    }

    /// Likes the post referenced by `post` (a post URL or bare short code).
    ///
    /// # Errors
    ///
    /// [`ActionError::InvalidTarget`] when no short code can be decoded,
    /// plus request failures.
    #[instrument(skip(self), fields(post = %post))]
    pub async fn like(&self, post: &str) -> Result<MediaId, ActionError> {
        let media_id = media_id_from_target(post)?;
        let url = self.settings.endpoint(&format!("web/likes/{media_id}/like/"))?;

        let request = self.with_csrf(self.client.post(url.clone()));
        let response = send(request, &url).await?;
        ensure_not_refused(&url, response).await?;

        info!(media_id = %media_id, "liked post");
        Ok(media_id)
    }

    /// Comments `text` on the post referenced by `post`.
    ///
    /// # Errors
    ///
    /// [`ActionError::InvalidTarget`] for an undecodable post or blank text,
    /// plus request failures.
    #[instrument(skip(self, text), fields(post = %post, text_len = text.len()))]
    pub async fn comment(&self, post: &str, text: &str) -> Result<MediaId, ActionError> {
        if text.trim().is_empty() {
            return Err(ActionError::invalid_target(post, "comment text is empty"));
        }
        let media_id = media_id_from_target(post)?;
        let url = self
            .settings
            .endpoint(&format!("web/comments/{media_id}/add/"))?;

        let body = format!("comment_text={}", urlencoding::encode(text));
        let request = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body);
        let request = self.with_csrf(request);
        let response = send(request, &url).await?;
        ensure_not_refused(&url, response).await?;

        info!(media_id = %media_id, "commented on post");
        Ok(media_id)
    }

    fn profile_url(&self, username: &str) -> Result<Url, ActionError> {
        let mut url = self.settings.endpoint("api/v1/users/web_profile_info/")?;
        url.query_pairs_mut().append_pair("username", username);
        Ok(url)
    }

    fn with_csrf(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.csrf_token {
            Some(token) => request.header(CSRF_HEADER, token.as_str()),
            None => request,
        }
    }
}

/// Sends a request and turns every non-success outcome into a typed error.
async fn send(request: RequestBuilder, url: &Url) -> Result<Response, ActionError> {
    let response = request
        .send()
        .await
        .map_err(|error| ActionError::from_reqwest(url.as_str(), error))?;

    if is_login_redirect(response.url()) {
        warn!(final_url = %response.url(), "request redirected to login page");
        return Err(ActionError::Unauthorized {
            url: url.to_string(),
            status: 0,
        });
    }

    let status = response.status();
    if status.is_success() {
        debug!(status = status.as_u16(), "request succeeded");
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    warn!(status = status.as_u16(), retry_after = ?retry_after, "request failed");
    Err(ActionError::from_status(url.as_str(), status.as_u16(), retry_after))
}

/// Validates a username and strips a leading `@`.
///
/// # Errors
///
/// Returns [`ActionError::InvalidTarget`] for empty or over-long names, or
/// names with characters other than ASCII letters, digits, `.` and `_`.
pub fn normalize_username(raw: &str) -> Result<String, ActionError> {
    let username = raw.trim().trim_start_matches('@');
    if username.is_empty() {
        return Err(ActionError::invalid_target(raw, "username is empty"));
    }
    if username.len() > MAX_USERNAME_LENGTH {
        return Err(ActionError::invalid_target(
            raw,
            format!("username longer than {MAX_USERNAME_LENGTH} characters"),
        ));
    }
    if let Some(bad) = username
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_')))
    {
        return Err(ActionError::invalid_target(
            raw,
            format!("username contains '{bad}'"),
        ));
    }
    Ok(username.to_string())
}

fn is_login_redirect(final_url: &Url) -> bool {
    let path = final_url.path().to_ascii_lowercase();
    LOGIN_PATTERNS.iter().any(|pattern| path.contains(pattern))
}

async fn read_body(url: &Url, response: Response) -> Result<String, ActionError> {
    response
        .text()
        .await
        .map_err(|error| ActionError::from_reqwest(url.as_str(), error))
}

/// Reads `data.user.id` out of a profile payload.
fn extract_user_id(url: &Url, body: &str) -> Result<String, ActionError> {
    let envelope: ProfileEnvelope = serde_json::from_str(body)
        .map_err(|error| ActionError::malformed(url.as_str(), error.to_string()))?;
    envelope
        .data
        .user
        .map(|user| user.id)
        .ok_or_else(|| ActionError::NotFound {
            url: url.to_string(),
        })
}

/// Write endpoints can answer 200 with `{"status": "fail", ...}`.
async fn ensure_not_refused(url: &Url, response: Response) -> Result<(), ActionError> {
    let body = read_body(url, response).await?;
    let Ok(Value::Object(payload)) = serde_json::from_str::<Value>(&body) else {
        return Ok(());
    };
    if payload.get("status").and_then(Value::as_str) != Some("fail") {
        return Ok(());
    }

    let message = payload
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("no message")
        .to_string();
    if matches!(message.as_str(), "login_required" | "checkpoint_required") {
        return Err(ActionError::Unauthorized {
            url: url.to_string(),
            status: 200,
        });
    }
    Err(ActionError::Rejected {
        url: url.to_string(),
        message,
    })
}

/// Follows `target_username` under the session in `raw_cookie`.
///
/// # Errors
///
/// See [`PlatformSession::follow`].
pub async fn follow(
    settings: &ClientSettings,
    target_username: &str,
    raw_cookie: &str,
) -> Result<FollowReceipt, ActionError> {
    PlatformSession::from_raw_cookie(settings, raw_cookie)?
        .follow(target_username)
        .await
}

/// Likes the post at `post_url` under the session in `raw_cookie`.
///
/// # Errors
///
/// See [`PlatformSession::like`].
pub async fn like(
    settings: &ClientSettings,
    post_url: &str,
    raw_cookie: &str,
) -> Result<MediaId, ActionError> {
    PlatformSession::from_raw_cookie(settings, raw_cookie)?
        .like(post_url)
        .await
}

/// Comments `text` on the post at `post_url` under the session in `raw_cookie`.
///
/// # Errors
///
/// See [`PlatformSession::comment`].
pub async fn comment(
    settings: &ClientSettings,
    post_url: &str,
    text: &str,
    raw_cookie: &str,
) -> Result<MediaId, ActionError> {
    PlatformSession::from_raw_cookie(settings, raw_cookie)?
        .comment(post_url, text)
        .await
}

/// Fetches the profile of `username` under the session in `raw_cookie`.
///
/// # Errors
///
/// See [`PlatformSession::scrape_profile`].
pub async fn scrape_profile(
    settings: &ClientSettings,
    username: &str,
    raw_cookie: &str,
) -> Result<ProfileInfo, ActionError> {
    PlatformSession::from_raw_cookie(settings, raw_cookie)?
        .scrape_profile(username)
        .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::platform::FailureKind;

    #[test]
    fn test_normalize_username_strips_at_and_whitespace() {
        assert_eq!(normalize_username(" @jane.doe_ ").unwrap(), "jane.doe_");
    }

    #[test]
    fn test_normalize_username_rejects_bad_input() {
        for raw in ["", "@", "jane doe", "jane/../x", "jane?x=1", &"a".repeat(31)] {
            let err = normalize_username(raw).unwrap_err();
            assert_eq!(err.kind(), FailureKind::InvalidTarget, "input {raw:?}");
        }
    }

    #[test]
    fn test_is_login_redirect() {
        let login = Url::parse("https://www.instagram.com/accounts/login/?next=/x").unwrap();
        let challenge = Url::parse("https://www.instagram.com/challenge/abc/").unwrap();
        let normal = Url::parse("https://www.instagram.com/api/v1/users/web_profile_info/").unwrap();
        assert!(is_login_redirect(&login));
        assert!(is_login_redirect(&challenge));
        assert!(!is_login_redirect(&normal));
    }

    #[test]
    fn test_extract_user_id() {
        let url = Url::parse("https://www.instagram.com/api/").unwrap();
        let id = extract_user_id(&url, r#"{"data":{"user":{"id":"123","username":"x"}}}"#).unwrap();
        assert_eq!(id, "123");

        let err = extract_user_id(&url, r#"{"data":{"user":null}}"#).unwrap_err();
        assert_eq!(err.kind(), FailureKind::NotFound);

        let err = extract_user_id(&url, "<html>").unwrap_err();
        assert_eq!(err.kind(), FailureKind::MalformedResponse);
    }

    #[test]
    fn test_session_debug_does_not_expose_cookie_values() {
        let settings = ClientSettings::default();
        let session =
            PlatformSession::from_raw_cookie(&settings, "csrftoken=tok; sessionid=secret").unwrap();
        let debug = format!("{session:?}");
        assert!(!debug.contains("secret"), "got: {debug}");
    }

    #[test]
    fn test_blank_comment_rejected_without_request() {
        let settings = ClientSettings::default();
        let session = PlatformSession::from_raw_cookie(&settings, "sessionid=s").unwrap();
        let result = tokio_test::block_on(session.comment("BA", " \n\t"));
        assert_eq!(result.unwrap_err().kind(), FailureKind::InvalidTarget);
    }
}
