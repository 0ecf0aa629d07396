//! Short code extraction from post links.

use tracing::debug;
use url::Url;

use super::{MediaId, ShortcodeError, decode};

/// Path segments that precede a short code in content links.
const CONTENT_SEGMENTS: &[&str] = &["p", "reel", "tv"];

/// Extracts the short code from a post reference.
///
/// Accepts:
/// - absolute links such as `https://www.instagram.com/p/<code>/?igsh=...`
///   (also `/reel/<code>/` and `/tv/<code>/`)
/// - scheme-less links such as `instagram.com/p/<code>`
/// - path-only references such as `/p/<code>/`
/// - a bare short code (no `/`)
///
/// Query strings and fragments are ignored. The returned code is not
/// validated against the alphabet; [`decode`] does that.
///
/// # Errors
///
/// Returns [`ShortcodeError::NotAPostUrl`] when no short code segment is
/// present, or [`ShortcodeError::Empty`] for blank input.
pub fn extract_shortcode(target: &str) -> Result<String, ShortcodeError> {
    let target = target.trim();
    if target.is_empty() {
        return Err(ShortcodeError::Empty);
    }

    if !target.contains('/') {
        return Ok(target.to_string());
    }

    // A path-only reference has no host; prefixing a scheme would turn
    // its first segment into one.
    let parsed = if target.starts_with('/') {
        None
    } else {
        Url::parse(target)
            .or_else(|_| Url::parse(&format!("https://{target}")))
            .ok()
    };
    let segments: Vec<String> = match parsed {
        Some(url) => url
            .path_segments()
            .map(|segments| segments.map(str::to_string).collect())
            .unwrap_or_default(),
        None => strip_query_and_fragment(target)
            .split('/')
            .map(str::to_string)
            .collect(),
    };

    let code = segments
        .windows(2)
        .find(|pair| CONTENT_SEGMENTS.contains(&pair[0].as_str()) && !pair[1].is_empty())
        .map(|pair| pair[1].clone())
        .ok_or_else(|| ShortcodeError::not_a_post_url(target))?;

    debug!(target = %target, code = %code, "extracted short code");
    Ok(code)
}

/// Extracts the short code from `target` and decodes it.
///
/// # Errors
///
/// Any [`ShortcodeError`] from extraction or decoding.
pub fn media_id_from_target(target: &str) -> Result<MediaId, ShortcodeError> {
    let code = extract_shortcode(target)?;
    decode(&code)
}

fn strip_query_and_fragment(target: &str) -> &str {
    let end = target.find(['?', '#']).unwrap_or(target.len());
    &target[..end]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_from_canonical_post_url() {
        assert_eq!(
            extract_shortcode("https://www.instagram.com/p/CuQ9x2LNhRE/").unwrap(),
            "CuQ9x2LNhRE"
        );
    }

    #[test]
    fn test_extract_without_trailing_slash() {
        assert_eq!(
            extract_shortcode("https://www.instagram.com/p/CuQ9x2LNhRE").unwrap(),
            "CuQ9x2LNhRE"
        );
    }

    #[test]
    fn test_extract_ignores_query_string() {
        assert_eq!(
            extract_shortcode("https://www.instagram.com/p/CuQ9x2LNhRE/?igsh=MWx0bnd4&img_index=1")
                .unwrap(),
            "CuQ9x2LNhRE"
        );
    }

    #[test]
    fn test_extract_from_user_scoped_post_url() {
        assert_eq!(
            extract_shortcode("https://www.instagram.com/janedoe/p/CuQ9x2LNhRE/").unwrap(),
            "CuQ9x2LNhRE"
        );
    }

    #[test]
    fn test_extract_from_reel_and_tv() {
        assert_eq!(
            extract_shortcode("https://www.instagram.com/reel/Bz/").unwrap(),
            "Bz"
        );
        assert_eq!(
            extract_shortcode("https://www.instagram.com/tv/BA/").unwrap(),
            "BA"
        );
    }

    #[test]
    fn test_extract_scheme_less_link() {
        assert_eq!(
            extract_shortcode("instagram.com/p/CuQ9x2LNhRE").unwrap(),
            "CuQ9x2LNhRE"
        );
    }

    #[test]
    fn test_extract_bare_code() {
        assert_eq!(extract_shortcode("  CuQ9x2LNhRE ").unwrap(), "CuQ9x2LNhRE");
    }

    #[test]
    fn test_extract_rejects_profile_url() {
        let err = extract_shortcode("https://www.instagram.com/janedoe/").unwrap_err();
        assert!(matches!(err, ShortcodeError::NotAPostUrl { .. }));
    }

    #[test]
    fn test_extract_rejects_empty_code_segment() {
        let err = extract_shortcode("https://www.instagram.com/p/").unwrap_err();
        assert!(matches!(err, ShortcodeError::NotAPostUrl { .. }));
    }

    #[test]
    fn test_extract_rejects_blank_input() {
        assert_eq!(extract_shortcode("   ").unwrap_err(), ShortcodeError::Empty);
    }

    #[test]
    fn test_media_id_from_target_decodes() {
        let id = media_id_from_target("https://www.instagram.com/p/BA/").unwrap();
        assert_eq!(id.as_u128(), 64);
    }

    #[test]
    fn test_media_id_from_target_surfaces_invalid_symbol() {
        let err = media_id_from_target("https://www.instagram.com/p/B!A/").unwrap_err();
        assert!(matches!(err, ShortcodeError::InvalidSymbol { symbol: '!', .. }));
    }

    #[test]
    fn test_strip_query_and_fragment() {
        assert_eq!(strip_query_and_fragment("a/p/B?x=1"), "a/p/B");
        assert_eq!(strip_query_and_fragment("a/p/B#frag"), "a/p/B");
        assert_eq!(strip_query_and_fragment("a/p/B"), "a/p/B");
    }

    #[test]
    fn test_extract_from_path_only_reference() {
        assert_eq!(extract_shortcode("/p/BA/").unwrap(), "BA");
        assert_eq!(extract_shortcode("/reel/CuQ9x2LNhRE?igsh=x").unwrap(), "CuQ9x2LNhRE");
        assert_eq!(media_id_from_target("/p/BA/").unwrap(), MediaId::new(64));
        assert!(matches!(
            extract_shortcode("/janedoe/"),
            Err(ShortcodeError::NotAPostUrl { .. })
        ));
    }
}
