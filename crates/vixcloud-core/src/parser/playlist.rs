//! Master playlist parsing
//!
//! Reads the rendition table of an HLS master playlist and picks the
//! widest variant.

use m3u8_rs::Playlist;
use regex::Regex;
use tracing::debug;

use crate::error::{ResolveError, Result};
use crate::types::RenditionEntry;
use crate::url::join_playlist_uri;

/// Parses the rendition table of a master playlist
///
/// Only variants carrying a `RESOLUTION` attribute are returned;
/// I-frame-only variants are skipped. Relative URIs are resolved against
/// `manifest_url`. A leading BOM or blank lines are tolerated, and when
/// the strict parser yields nothing the `#EXT-X-STREAM-INF` lines are
/// scanned directly, so variants without `BANDWIDTH` still count.
///
/// # Errors
/// Returns `RenditionParseFailure` if the content is not a playlist, is a
/// media playlist, or lists no resolvable variant
pub fn parse_renditions(content: &str, manifest_url: &str) -> Result<Vec<RenditionEntry>> {
    let content = content.trim_start_matches('\u{feff}').trim_start();

    let parsed = match m3u8_rs::parse_playlist_res(content.as_bytes()) {
        Ok(Playlist::MasterPlaylist(master)) => master
            .variants
            .into_iter()
            .filter(|variant| !variant.is_i_frame)
            .filter_map(|variant| {
                let resolution = variant.resolution?;
                rendition(manifest_url, resolution.width, &variant.uri)
            })
            .collect(),
        Ok(Playlist::MediaPlaylist(_)) => {
            return Err(ResolveError::RenditionParseFailure(format!(
                "{manifest_url}: media playlist has no renditions"
            )));
        }
        Err(_) => Vec::new(),
    };
    if !parsed.is_empty() {
        return Ok(parsed);
    }

    let scanned = scan_stream_inf(content, manifest_url);
    if !scanned.is_empty() {
        debug!(count = scanned.len(), "Recovered renditions by line scan");
        return Ok(scanned);
    }

    let reason = if content.starts_with("#EXTM3U") {
        "no variant with a resolution"
    } else {
        "not an HLS playlist"
    };
    Err(ResolveError::RenditionParseFailure(format!("{manifest_url}: {reason}")))
}

/// Reads `RESOLUTION=WxH` off each stream-inf line and the URI on the
/// next non-comment line
fn scan_stream_inf(content: &str, manifest_url: &str) -> Vec<RenditionEntry> {
    let Ok(resolution) = Regex::new(r"RESOLUTION=(\d+)x\d+") else {
        return Vec::new();
    };

    let mut entries = Vec::new();
    let mut lines = content.lines().map(str::trim);

    while let Some(line) = lines.next() {
        if !line.starts_with("#EXT-X-STREAM-INF") {
            continue;
        }
        let Some(width) = resolution
            .captures(line)
            .and_then(|caps| caps[1].parse::<u64>().ok())
        else {
            continue;
        };
        let Some(uri) = lines.find(|l| !l.is_empty() && !l.starts_with('#')) else {
            break;
        };
        entries.extend(rendition(manifest_url, width, uri));
    }

    entries
}

fn rendition(manifest_url: &str, width_px: u64, uri: &str) -> Option<RenditionEntry> {
    match join_playlist_uri(manifest_url, uri) {
        Ok(url) => Some(RenditionEntry { width_px, url }),
        Err(e) => {
            debug!(error = %e, uri = %uri, "Skipping unresolvable variant");
            None
        }
    }
}

/// Entry with the largest width
pub fn best_rendition(entries: &[RenditionEntry]) -> Option<&RenditionEntry> {
    entries.iter().max_by_key(|entry| entry.width_px)
}

/// Returns the widest rendition's URL, or `manifest_url` when the
/// content has no usable rendition table
pub fn select_rendition_url(content: &str, manifest_url: &str) -> String {
    match parse_renditions(content, manifest_url) {
        Ok(entries) => best_rendition(&entries)
            .map(|entry| {
                debug!(width = entry.width_px, url = %entry.url, "Selected rendition");
                entry.url.clone()
            })
            .unwrap_or_else(|| manifest_url.to_string()),
        Err(e) => {
            debug!(error = %e, "Keeping master playlist");
            manifest_url.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MASTER_URL: &str = "https://vixcloud.co/playlist/271?b=1&token=abc&expires=999&h=1";

    const MASTER: &str = "#EXTM3U
#EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID=\"audio\",NAME=\"Italian\",LANGUAGE=\"ita\",DEFAULT=YES,AUTOSELECT=YES,URI=\"audio/ita.m3u8\"
#EXT-X-STREAM-INF:BANDWIDTH=1200000,CODECS=\"avc1.640028,mp4a.40.2\",RESOLUTION=640x360,AUDIO=\"audio\"
360p/index.m3u8?token=a
#EXT-X-STREAM-INF:BANDWIDTH=2150000,CODECS=\"avc1.640028,mp4a.40.2\",RESOLUTION=1920x1080,AUDIO=\"audio\"
https://cdn.vixcloud.co/271/1080p/index.m3u8?token=c
#EXT-X-STREAM-INF:BANDWIDTH=1800000,CODECS=\"avc1.640028,mp4a.40.2\",RESOLUTION=1280x720,AUDIO=\"audio\"
/playlist/271/720p.m3u8?token=b
";

    #[test]
    fn test_parse_renditions() {
        let entries = parse_renditions(MASTER, MASTER_URL).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].width_px, 640);
        assert_eq!(
            entries[0].url,
            "https://vixcloud.co/playlist/360p/index.m3u8?token=a"
        );
        assert_eq!(entries[2].url, "https://vixcloud.co/playlist/271/720p.m3u8?token=b");
    }

    #[test]
    fn test_select_widest_rendition() {
        assert_eq!(
            select_rendition_url(MASTER, MASTER_URL),
            "https://cdn.vixcloud.co/271/1080p/index.m3u8?token=c"
        );
    }

    #[test]
    fn test_skips_variants_without_resolution() {
        let content = "#EXTM3U
#EXT-X-STREAM-INF:BANDWIDTH=64000,CODECS=\"mp4a.40.2\"
audio-only.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=800000,RESOLUTION=854x480
480p.m3u8
";
        let entries = parse_renditions(content, MASTER_URL).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].width_px, 854);
    }

    #[test]
    fn test_skips_i_frame_variants() {
        let content = "#EXTM3U
#EXT-X-I-FRAME-STREAM-INF:BANDWIDTH=90000,RESOLUTION=3840x2160,URI=\"iframes.m3u8\"
#EXT-X-STREAM-INF:BANDWIDTH=800000,RESOLUTION=1280x720
720p.m3u8
";
        assert_eq!(
            select_rendition_url(content, MASTER_URL),
            "https://vixcloud.co/playlist/720p.m3u8"
        );
    }

    #[test]
    fn test_media_playlist_keeps_url() {
        let content = "#EXTM3U
#EXT-X-VERSION:3
#EXT-X-TARGETDURATION:4
#EXTINF:4.0,
seg0.ts
#EXT-X-ENDLIST
";
        assert!(matches!(
            parse_renditions(content, MASTER_URL),
            Err(ResolveError::RenditionParseFailure(_))
        ));
        assert_eq!(select_rendition_url(content, MASTER_URL), MASTER_URL);
    }

    #[test]
    fn test_garbage_keeps_url() {
        let content = "<html><body>403 Forbidden</body></html>";
        assert_eq!(select_rendition_url(content, MASTER_URL), MASTER_URL);
    }

    #[test]
    fn test_master_without_resolutions_keeps_url() {
        let content = "#EXTM3U
#EXT-X-STREAM-INF:BANDWIDTH=800000
stream.m3u8
";
        assert_eq!(select_rendition_url(content, MASTER_URL), MASTER_URL);
    }

    #[test]
    fn test_master_without_bandwidth() {
        let content = "#EXTM3U
#EXT-X-STREAM-INF:RESOLUTION=640x360
a.m3u8
#EXT-X-STREAM-INF:RESOLUTION=1280x720
b.m3u8
#EXT-X-STREAM-INF:RESOLUTION=1920x1080
c.m3u8
";
        let entries = parse_renditions(content, MASTER_URL).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(
            select_rendition_url(content, MASTER_URL),
            "https://vixcloud.co/playlist/c.m3u8"
        );
    }

    #[test]
    fn test_master_with_leading_newline_and_bom() {
        let content = format!("\u{feff}\n{MASTER}");
        assert_eq!(
            select_rendition_url(&content, MASTER_URL),
            "https://cdn.vixcloud.co/271/1080p/index.m3u8?token=c"
        );
    }

    #[test]
    fn test_line_scan_skips_comments_before_uri() {
        let content = "\n#EXTM3U
#EXT-X-STREAM-INF:RESOLUTION=1920x1080
# generated
1080p.m3u8
";
        let entries = parse_renditions(content, MASTER_URL).unwrap();
        assert_eq!(entries[0].width_px, 1920);
        assert_eq!(entries[0].url, "https://vixcloud.co/playlist/1080p.m3u8");
    }

    #[test]
    fn test_best_rendition_empty() {
        assert!(best_rendition(&[]).is_none());
    }
}
