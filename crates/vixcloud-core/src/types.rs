//! Core data types for the manifest resolver

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A page believed to embed a player iframe
///
/// Created per resolution request and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageReference {
    /// Absolute page URL
    pub url: String,

    /// Referer used for outbound requests and attached to emitted links
    pub referer: Option<String>,
}

impl PageReference {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            referer: None,
        }
    }

    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }
}

/// Fields recovered from the signed-manifest object
///
/// `token` and `expires` are opaque and copied verbatim from the script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestDescriptor {
    /// Manifest base URL (absolute once the resolver has seen it)
    pub base_url: String,

    /// Signing token
    pub token: String,

    /// Token expiry, usually a unix timestamp
    pub expires: String,

    /// Whether the player page advertises full-HD playback
    pub allows_high_def: bool,
}

/// One quality variant listed in a master playlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenditionEntry {
    /// Horizontal resolution in pixels
    pub width_px: u64,

    /// Absolute child playlist URL
    pub url: String,
}

/// A playable stream handed to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamLink {
    /// Extractor name shown as the link's source (e.g. "VixCloud")
    pub source_label: String,

    /// Human-readable link name
    pub display_name: String,

    /// Playable URL
    pub url: String,

    /// `true` if `url` points at an HLS playlist
    pub is_manifest: bool,

    /// Referer the player must send
    pub referer_header: String,

    /// Additional headers required for playback (e.g. `Origin`)
    pub extra_headers: BTreeMap<String, String>,
}

/// A subtitle file descriptor
///
/// The manifest resolver never produces these; the type exists so the
/// sink-based entry point has the same shape as sibling extractors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleFile {
    /// Language label
    pub lang: String,

    /// Subtitle file URL
    pub url: String,
}
