//! Stream link packaging
//!
//! Turns a resolved manifest into the [`StreamLink`] values handed to the
//! caller's sink.

use std::collections::BTreeMap;

use crate::config::ResolverConfig;
use crate::types::{PageReference, StreamLink};
use crate::url::origin_of;

/// URLs produced by one successful pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedManifest {
    /// Player page the script was read from
    pub embed_url: String,
    /// Signed master playlist URL
    pub master_url: String,
    /// Selected rendition URL, or the master URL when no selection happened
    pub stream_url: String,
}

/// Builds the links for a resolved manifest
///
/// The primary link points at the selected stream. When a rendition was
/// selected and `emit_master_fallback` is set, a second link points at the
/// master playlist.
pub fn build_links(
    config: &ResolverConfig,
    page: &PageReference,
    resolved: &ResolvedManifest,
) -> Vec<StreamLink> {
    let referer = playback_referer(config, page);

    let mut extra_headers = BTreeMap::new();
    if let Some(origin) = origin_of(&referer) {
        extra_headers.insert("Origin".to_string(), origin);
    }

    let mut links = vec![StreamLink {
        source_label: config.source_label.clone(),
        display_name: config.display_name.clone(),
        url: resolved.stream_url.clone(),
        is_manifest: true,
        referer_header: referer.clone(),
        extra_headers: extra_headers.clone(),
    }];

    if config.emit_master_fallback && resolved.stream_url != resolved.master_url {
        links.push(StreamLink {
            source_label: config.fallback_source_label.clone(),
            display_name: config.fallback_display_name.clone(),
            url: resolved.master_url.clone(),
            is_manifest: true,
            referer_header: referer,
            extra_headers,
        });
    }

    links
}

/// Page referer, then the canonical origin, then the page itself
fn playback_referer(config: &ResolverConfig, page: &PageReference) -> String {
    if let Some(referer) = page.referer.as_deref().filter(|r| !r.trim().is_empty()) {
        return referer.to_string();
    }
    if let Some(origin) = &config.canonical_origin {
        return format!("{}/", origin.trim_end_matches('/'));
    }
    page.url.clone()
}
