//! User-Agent strings for platform requests.
//!
//! The platform's web endpoints reject requests that do not look like they
//! come from a browser, so the default is a minimal browser token rather than
//! a tool identifier.

/// Default User-Agent sent with every platform request.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0";

/// Full desktop browser User-Agent, for operators who need one.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Resolves the configured User-Agent, falling back to [`DEFAULT_USER_AGENT`]
/// for missing or blank overrides. The keyword `browser` selects
/// [`BROWSER_USER_AGENT`].
#[must_use]
pub fn resolve_user_agent(configured: Option<&str>) -> String {
    match configured.map(str::trim) {
        Some("") | None => DEFAULT_USER_AGENT.to_string(),
        Some("browser") => BROWSER_USER_AGENT.to_string(),
        Some(value) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_user_agent_defaults() {
        assert_eq!(resolve_user_agent(None), DEFAULT_USER_AGENT);
        assert_eq!(resolve_user_agent(Some("   ")), DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_resolve_user_agent_browser_keyword() {
        assert_eq!(resolve_user_agent(Some("browser")), BROWSER_USER_AGENT);
        assert!(BROWSER_USER_AGENT.starts_with("Mozilla/5.0 ("));
    }

    #[test]
    fn test_resolve_user_agent_custom_value_trimmed() {
        assert_eq!(resolve_user_agent(Some(" custom/1.0 ")), "custom/1.0");
    }
}
