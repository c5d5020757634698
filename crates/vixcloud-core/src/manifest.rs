//! Signed manifest URL assembly

use crate::types::ManifestDescriptor;

/// Stray query fragment the player templating leaves in base URLs
const STRAY_QUERY: &str = "?b";

/// Builds the signed master playlist URL from a recovered descriptor
///
/// Order matters: the stray `?b` fragment is repaired first, then
/// `token`/`expires` are appended, then the `h=1` quality flag.
///
/// # Example
/// ```
/// use vixcloud_core::{build_manifest_url, ManifestDescriptor};
/// let descriptor = ManifestDescriptor {
///     base_url: "https://x/pl?b:1".to_string(),
///     token: "abc".to_string(),
///     expires: "999".to_string(),
///     allows_high_def: true,
/// };
/// assert_eq!(
///     build_manifest_url(&descriptor),
///     "https://x/pl?b=1&token=abc&expires=999&h=1"
/// );
/// ```
pub fn build_manifest_url(descriptor: &ManifestDescriptor) -> String {
    let base = descriptor.base_url.trim();
    let params = format!(
        "token={}&expires={}",
        descriptor.token, descriptor.expires
    );

    let mut url = if base.contains(STRAY_QUERY) {
        format!("{}&{}", repair_stray_query(base), params)
    } else if base.contains('?') {
        format!("{}&{}", base.trim_end_matches('&'), params)
    } else {
        format!("{}?{}", base, params)
    };

    if descriptor.allows_high_def {
        url.push_str("&h=1");
    }

    url
}

/// Rewrites `?b:1` or a bare trailing `?b` into `?b=1`
fn repair_stray_query(base: &str) -> String {
    if base.contains("?b:1") {
        return base.replacen("?b:1", "?b=1", 1);
    }

    if let Some(pos) = base.find(STRAY_QUERY) {
        let rest = &base[pos + STRAY_QUERY.len()..];
        if rest.is_empty() || rest.starts_with('&') {
            return format!("{}?b=1{}", &base[..pos], rest);
        }
    }

    base.to_string()
}
