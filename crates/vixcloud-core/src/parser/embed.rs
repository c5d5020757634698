//! Player embed parsing
//!
//! Locates the player iframe on a catalog page and gathers the script text
//! of the player page.

use scraper::{Html, Selector};
use tracing::debug;

use crate::error::{ResolveError, Result};
use crate::url::{is_http_url, resolve_embed_src};

/// Finds the player embed on a page and returns its absolute URL
///
/// Only the first `<iframe>` is considered. Pages without any iframe may
/// mount the player through a `<video-player embed_url="...">` element
/// instead, in which case the first such element is used.
///
/// # Arguments
/// * `html` - Raw HTML of the page
/// * `page_url` - Absolute URL the page was fetched from
///
/// # Errors
/// Returns `MissingIframe` if there is no embed element, or the first one
/// has a blank or non-http source
pub fn locate_embed(html: &str, page_url: &str) -> Result<String> {
    let document = Html::parse_document(html);
    let missing = || ResolveError::MissingIframe(page_url.to_string());

    let candidates = [("iframe", "src"), ("video-player", "embed_url")];
    for (tag, attr) in candidates {
        let Ok(selector) = Selector::parse(tag) else {
            continue;
        };
        let Some(element) = document.select(&selector).next() else {
            continue;
        };

        let raw = element.value().attr(attr).unwrap_or_default();
        if raw.trim().is_empty() {
            debug!(tag, "First embed element has no source");
            return Err(missing());
        }

        return match resolve_embed_src(page_url, raw) {
            Ok(url) if is_http_url(&url) => Ok(url),
            Ok(url) => {
                debug!(url = %url, "First embed is not http(s)");
                Err(missing())
            }
            Err(e) => {
                debug!(error = %e, src = raw, "First embed is unresolvable");
                Err(missing())
            }
        };
    }

    Err(missing())
}

/// Concatenates the text of every `<script>` element, newline-joined
///
/// Source order is preserved. Nothing is executed.
pub fn collect_scripts(html: &str) -> String {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("script") else {
        return String::new();
    };

    document
        .select(&selector)
        .map(|script| script.text().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}
