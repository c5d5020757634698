//! Resolver configuration
//!
//! Passed by value into each resolution; request headers are derived from
//! it per call and never stored.

use serde::Deserialize;

use crate::error::{ResolveError, Result};

/// Configuration for [`ManifestResolver`](crate::ManifestResolver)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Assignment that holds the signed-manifest object
    pub marker: String,
    /// Top-level boolean assignment advertising full-HD playback
    pub hd_flag: String,
    /// Origin used as playback referer when the page has none
    pub canonical_origin: Option<String>,
    /// Source label of the primary link
    pub source_label: String,
    /// Display name of the primary link
    pub display_name: String,
    /// Source label of the master-playlist fallback link
    pub fallback_source_label: String,
    /// Display name of the master-playlist fallback link
    pub fallback_display_name: String,
    /// Download the master playlist and pick the widest rendition
    pub select_rendition: bool,
    /// Also emit the master playlist when a rendition was selected
    pub emit_master_fallback: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            marker: "masterPlaylist".to_string(),
            hd_flag: "canPlayFHD".to_string(),
            canonical_origin: None,
            source_label: "VixCloud".to_string(),
            display_name: "Streaming Community - 1080p".to_string(),
            fallback_source_label: "VixCloud-Direct".to_string(),
            fallback_display_name: "SC - Direct Video".to_string(),
            select_rendition: true,
            emit_master_fallback: true,
        }
    }
}

impl ResolverConfig {
    /// Checks the values a resolution cannot run without
    ///
    /// # Errors
    /// Returns `InvalidConfig` for a blank marker, flag or source label,
    /// or a canonical origin that is not an http(s) URL
    pub fn validate(&self) -> Result<()> {
        if self.marker.trim().is_empty() {
            return Err(ResolveError::InvalidConfig("marker cannot be empty".to_string()));
        }
        if self.hd_flag.trim().is_empty() {
            return Err(ResolveError::InvalidConfig("hd_flag cannot be empty".to_string()));
        }
        if self.source_label.trim().is_empty() {
            return Err(ResolveError::InvalidConfig(
                "source_label cannot be empty".to_string(),
            ));
        }
        if let Some(origin) = &self.canonical_origin
            && !crate::url::is_http_url(origin)
        {
            return Err(ResolveError::InvalidConfig(format!(
                "canonical_origin is not an http(s) URL: {origin}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ResolverConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.marker, "masterPlaylist");
        assert_eq!(config.hd_flag, "canPlayFHD");
        assert!(config.select_rendition);
        assert_eq!(config.display_name, "Streaming Community - 1080p");
        assert_eq!(config.fallback_display_name, "SC - Direct Video");
    }

    #[test]
    fn test_config_from_json_uses_defaults() {
        let config: ResolverConfig = serde_json::from_str(
            r#"{"canonical_origin": "https://vixcloud.co", "select_rendition": false}"#,
        )
        .expect("Deserialization should succeed");
        assert_eq!(config.canonical_origin.as_deref(), Some("https://vixcloud.co"));
        assert!(!config.select_rendition);
        assert_eq!(config.marker, "masterPlaylist");
    }

    #[test]
    fn test_blank_marker_rejected() {
        let config = ResolverConfig {
            marker: "  ".to_string(),
            ..ResolverConfig::default()
        };
        assert!(matches!(config.validate(), Err(ResolveError::InvalidConfig(_))));
    }

    #[test]
    fn test_bad_origin_rejected() {
        let config = ResolverConfig {
            canonical_origin: Some("vixcloud.co".to_string()),
            ..ResolverConfig::default()
        };
        assert!(matches!(config.validate(), Err(ResolveError::InvalidConfig(_))));
    }
}
