//! Loads a parsed credential set into a reqwest cookie jar.
//!
//! Every cookie is added host-only for the platform origin, so the client
//! attaches the whole session to each request it makes against that origin
//! and to nothing else.

use std::sync::Arc;

use reqwest::cookie::Jar;
use tracing::{debug, instrument, warn};
use url::Url;

use super::CredentialSet;

/// Builds a jar holding every cookie of `credentials`, scoped to `origin`.
///
/// # Returns
///
/// An `Arc<Jar>` suitable for `reqwest::ClientBuilder::cookie_provider()`.
#[instrument(level = "debug", skip(credentials), fields(origin = %origin))]
pub fn load_credentials_into_jar(credentials: &CredentialSet, origin: &Url) -> Arc<Jar> {
    let jar = Arc::new(Jar::default());
    let path_origin = origin_root(origin);

    for (name, value) in credentials.iter() {
        if !is_cookie_name_safe(name) {
            warn!(name = %name, "skipping cookie with characters not allowed in a name");
            continue;
        }
        if !is_cookie_value_safe(value) {
            warn!(name = %name, "skipping cookie whose value would split the Set-Cookie string");
            continue;
        }
        jar.add_cookie_str(&build_set_cookie_string(name, value), &path_origin);
        debug!(name = %name, "loaded cookie into jar");
    }

    jar
}

/// Builds a `Set-Cookie` header string scoped to the whole origin.
fn build_set_cookie_string(name: &str, value: &str) -> String {
    format!("{name}={value}; Path=/")
}

/// Strips path, query and fragment so cookies apply to every endpoint.
fn origin_root(origin: &Url) -> Url {
    let mut root = origin.clone();
    root.set_path("/");
    root.set_query(None);
    root.set_fragment(None);
    root
}

fn is_cookie_name_safe(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_graphic() && !matches!(c, ';' | ',' | '='))
}

// A `;` would end the cookie early and leak the rest in as attributes.
fn is_cookie_value_safe(value: &str) -> bool {
    !value.chars().any(|c| matches!(c, ';' | '\r' | '\n'))
}
