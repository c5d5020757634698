//! URL helper functions
//!
//! Resolves embed `src` values, playlist entries and origins against the
//! page they were found on.

use url::Url;

use crate::error::{ResolveError, Result};

/// Resolves an embed `src` attribute against the page it was found on
///
/// # Arguments
/// * `page_url` - Absolute URL of the page containing the element
/// * `src` - Raw attribute value
///
/// # Returns
/// Absolute URL string
///
/// Rules:
/// - a value with a scheme is used verbatim
/// - `//host/...` takes the page's scheme
/// - `/path` replaces the page's path on the same host
/// - anything else is appended to the page URL as a path segment
///
/// # Example
/// ```
/// use vixcloud_core::url::resolve_embed_src;
/// let url = resolve_embed_src("https://site.example/title/1", "//vixcloud.co/embed/9").unwrap();
/// assert_eq!(url, "https://vixcloud.co/embed/9");
/// ```
pub fn resolve_embed_src(page_url: &str, src: &str) -> Result<String> {
    let src = src.trim();
    if src.is_empty() {
        return Err(ResolveError::InvalidUrl("empty src".to_string()));
    }

    if has_scheme(src) {
        return Ok(src.to_string());
    }

    let page = Url::parse(page_url).map_err(|e| ResolveError::InvalidUrl(format!("{page_url}: {e}")))?;

    if let Some(rest) = src.strip_prefix("//") {
        return Ok(format!("{}://{}", page.scheme(), rest));
    }

    if src.starts_with('/') {
        return Ok(format!("{}{}", page.origin().ascii_serialization(), src));
    }

    let mut base = page;
    base.set_query(None);
    base.set_fragment(None);
    Ok(format!("{}/{}", base.as_str().trim_end_matches('/'), src))
}

/// Resolves a playlist entry against the manifest that listed it
///
/// Relative entries are resolved against the manifest's own directory,
/// dropping the manifest's query string.
pub fn join_playlist_uri(manifest_url: &str, uri: &str) -> Result<String> {
    let base =
        Url::parse(manifest_url).map_err(|e| ResolveError::InvalidUrl(format!("{manifest_url}: {e}")))?;
    base.join(uri.trim())
        .map(String::from)
        .map_err(|e| ResolveError::InvalidUrl(format!("{uri}: {e}")))
}

/// Returns `scheme://host[:port]` for an absolute URL
///
/// # Example
/// ```
/// use vixcloud_core::url::origin_of;
/// assert_eq!(origin_of("https://vixcloud.co/embed/9?x=1"), Some("https://vixcloud.co".to_string()));
/// assert_eq!(origin_of("not a url"), None);
/// ```
pub fn origin_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    if !is_http(&parsed) {
        return None;
    }
    Some(parsed.origin().ascii_serialization())
}

/// Whether the URL parses as an absolute `http`/`https` URL
pub fn is_http_url(url: &str) -> bool {
    Url::parse(url).map(|u| is_http(&u)).unwrap_or(false)
}

/// Undoes JavaScript `\/` escaping in string literals
pub fn unescape_js_slashes(value: &str) -> String {
    value.replace("\\/", "/")
}

fn is_http(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

/// A scheme is a letter followed by letters, digits, `+`, `-` or `.`, then `:`
fn has_scheme(value: &str) -> bool {
    let Some((scheme, _)) = value.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
