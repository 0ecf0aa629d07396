//! HTTP client construction for platform sessions.
//!
//! Centralizes the networking defaults every session shares: base URL,
//! timeouts, user-agent, compression, proxy compatibility and the cookie jar.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::{Client, ClientBuilder, Proxy};
use tracing::warn;
use url::Url;

use super::ActionError;
use crate::user_agent::DEFAULT_USER_AGENT;

/// Production web origin.
pub const DEFAULT_BASE_URL: &str = "https://www.instagram.com/";

/// Web application id the profile endpoints expect in `X-IG-App-ID`.
pub const DEFAULT_APP_ID: &str = "936619743392459";

/// Default connect timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default whole-request timeout in seconds.
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 30;

/// Settings shared by every session created in one run.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    base_url: Url,
    user_agent: String,
    app_id: String,
    connect_timeout: Duration,
    read_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            app_id: DEFAULT_APP_ID.to_string(),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(DEFAULT_READ_TIMEOUT_SECS),
        }
    }
}

impl ClientSettings {
    /// Settings pointing at the production origin.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the origin. A trailing `/` is added so endpoint paths join
    /// below the given path instead of replacing its last segment.
    #[must_use]
    pub fn with_base_url(mut self, mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        base_url.set_query(None);
        base_url.set_fragment(None);
        self.base_url = base_url;
        self
    }

    /// Overrides the User-Agent header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Overrides the `X-IG-App-ID` header value.
    #[must_use]
    pub fn with_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = app_id.into();
        self
    }

    /// Overrides connect and whole-request timeouts.
    #[must_use]
    pub fn with_timeouts(mut self, connect_timeout: Duration, read_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self.read_timeout = read_timeout;
        self
    }

    /// The origin every endpoint is joined onto.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The User-Agent header value.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// The `X-IG-App-ID` header value.
    #[must_use]
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Connect timeout.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Whole-request timeout.
    #[must_use]
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Joins a relative endpoint path onto the base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::InvalidTarget`] when the path cannot be joined.
    pub fn endpoint(&self, path: &str) -> Result<Url, ActionError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|error| ActionError::invalid_target(path, error.to_string()))
    }
}

#[allow(clippy::expect_used)]
fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid")
}

/// Builds a client carrying `cookie_jar` and the shared settings.
///
/// # Errors
///
/// Returns [`ActionError::ClientBuild`] when construction fails.
pub fn build_platform_client(
    settings: &ClientSettings,
    cookie_jar: Arc<Jar>,
) -> Result<Client, ActionError> {
    match try_build_client(settings, Arc::clone(&cookie_jar), false) {
        Ok(client) => Ok(client),
        Err(BuildClientFailure::Panic) => {
            // Some sandboxed environments panic when reading system proxy
            // settings; retry with env-proxy lookup only.
            warn!(
                "HTTP client builder panicked loading system proxy settings; using env-proxy fallback"
            );
            match try_build_client(settings, cookie_jar, true) {
                Ok(client) => Ok(client),
                Err(BuildClientFailure::Panic) => Err(ActionError::client_build(
                    "client construction panicked while applying env-proxy fallback",
                )),
                Err(BuildClientFailure::Build(error)) => {
                    Err(ActionError::client_build(error.to_string()))
                }
            }
        }
        Err(BuildClientFailure::Build(error)) => Err(ActionError::client_build(error.to_string())),
    }
}

enum BuildClientFailure {
    Panic,
    Build(reqwest::Error),
}

fn try_build_client(
    settings: &ClientSettings,
    cookie_jar: Arc<Jar>,
    disable_system_proxy_lookup: bool,
) -> Result<Client, BuildClientFailure> {
    catch_unwind(AssertUnwindSafe(move || {
        let mut builder = base_builder(settings, cookie_jar);
        if disable_system_proxy_lookup {
            builder = apply_env_proxy_fallback(builder.no_proxy());
        }
        builder.build().map_err(BuildClientFailure::Build)
    }))
    .map_err(|_| BuildClientFailure::Panic)?
}

fn base_builder(settings: &ClientSettings, cookie_jar: Arc<Jar>) -> ClientBuilder {
    Client::builder()
        .connect_timeout(settings.connect_timeout)
        .timeout(settings.read_timeout)
        .user_agent(settings.user_agent.clone())
        .gzip(true)
        .cookie_provider(cookie_jar)
}

fn apply_env_proxy_fallback(mut builder: ClientBuilder) -> ClientBuilder {
    if let Some(proxy) = env_proxy_for_scheme("https")
        && let Ok(resolved) = Proxy::https(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    if let Some(proxy) = env_proxy_for_scheme("http")
        && let Ok(resolved) = Proxy::http(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    builder
}

fn env_proxy_for_scheme(scheme: &str) -> Option<String> {
    let names: &[&str] = match scheme {
        "https" => &["HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"],
        "http" => &["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"],
        _ => return None,
    };
    names.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}
