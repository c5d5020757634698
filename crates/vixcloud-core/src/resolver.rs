//! Embedded-manifest resolver
//!
//! Provides the high-level API combining the page fetcher with the
//! parsers: page → player iframe → script object → signed master
//! playlist → best rendition → stream links.

use futures::future::join_all;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, ORIGIN, REFERER};
use tracing::{debug, info, warn};

use crate::client::{ClientConfig, HttpFetcher, PageFetcher};
use crate::config::ResolverConfig;
use crate::error::{ResolveError, Result};
use crate::link::{ResolvedManifest, build_links};
use crate::manifest::build_manifest_url;
use crate::parser::{FieldRecoverer, FieldStrategy, collect_scripts, locate_embed, select_rendition_url};
use crate::types::{PageReference, StreamLink, SubtitleFile};
use crate::url::{is_http_url, origin_of, resolve_embed_src};

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_ANY: &str = "*/*";

/// Resolves player pages into signed HLS stream links
///
/// Holds no per-resolution state: every call builds its own request
/// headers, so one resolver can serve concurrent resolutions.
pub struct ManifestResolver<F: PageFetcher = HttpFetcher> {
    fetcher: F,
    config: ResolverConfig,
    recoverer: FieldRecoverer,
}

impl ManifestResolver<HttpFetcher> {
    /// Create a resolver with the bundled HTTP fetcher and default configuration
    ///
    /// # Errors
    /// Returns error if HTTP client initialization fails
    pub fn new() -> Result<Self> {
        Self::with_config(&ClientConfig::default(), ResolverConfig::default())
    }

    /// Create a resolver with the bundled HTTP fetcher and custom configuration
    ///
    /// # Errors
    /// Returns `InvalidConfig` if either configuration is unusable
    pub fn with_config(client: &ClientConfig, config: ResolverConfig) -> Result<Self> {
        Self::with_fetcher(HttpFetcher::with_config(client)?, config)
    }
}

impl<F: PageFetcher> ManifestResolver<F> {
    /// Create a resolver on top of a host-supplied fetcher
    ///
    /// # Errors
    /// Returns `InvalidConfig` if `config` fails validation
    pub fn with_fetcher(fetcher: F, config: ResolverConfig) -> Result<Self> {
        config.validate()?;
        let recoverer = FieldRecoverer::new(&config.marker, &config.hd_flag)?;
        Ok(Self {
            fetcher,
            config,
            recoverer,
        })
    }

    /// Append a field strategy after the built-in structural and regex ones
    pub fn with_strategy(mut self, strategy: Box<dyn FieldStrategy>) -> Self {
        self.recoverer = self.recoverer.with_strategy(strategy);
        self
    }

    /// Active configuration
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Runs the pipeline starting from a page that embeds the player
    ///
    /// # Errors
    /// - `InvalidUrl` if the page URL is not http(s)
    /// - `NetworkFailure` if the page or player page cannot be fetched
    /// - `MissingIframe` if the page embeds no player
    /// - `ScriptNotFound` / `MalformedObject` if the manifest object
    ///   cannot be read
    pub async fn resolve_manifest(&self, page: &PageReference) -> Result<ResolvedManifest> {
        if !is_http_url(&page.url) {
            return Err(ResolveError::InvalidUrl(page.url.clone()));
        }

        let fetched = self
            .fetcher
            .get(&page.url, request_headers(page.referer.as_deref(), ACCEPT_HTML))
            .await?;

        let embed_url = locate_embed(&fetched.body, &fetched.url)?;
        debug!(page = %page.url, embed = %embed_url, "Located player embed");

        self.resolve_embed_manifest(&embed_url, Some(&page.url)).await
    }

    /// Runs the pipeline starting from the player page itself
    ///
    /// # Arguments
    /// * `embed_url` - Absolute URL of the player page
    /// * `referer` - Page the player is embedded in, sent as `Referer`
    pub async fn resolve_embed_manifest(
        &self,
        embed_url: &str,
        referer: Option<&str>,
    ) -> Result<ResolvedManifest> {
        if !is_http_url(embed_url) {
            return Err(ResolveError::InvalidUrl(embed_url.to_string()));
        }

        let player = self
            .fetcher
            .get(embed_url, request_headers(referer, ACCEPT_HTML))
            .await?;

        let buffer = collect_scripts(&player.body);
        let mut descriptor = self.recoverer.recover(&buffer)?;
        descriptor.base_url = resolve_embed_src(&player.url, &descriptor.base_url)?;

        let master_url = build_manifest_url(&descriptor);
        debug!(
            embed = %embed_url,
            master = %master_url,
            high_def = descriptor.allows_high_def,
            "Built master playlist URL"
        );

        let stream_url = if self.config.select_rendition {
            self.select_rendition(&master_url, &player.url).await
        } else {
            master_url.clone()
        };

        Ok(ResolvedManifest {
            embed_url: player.url,
            master_url,
            stream_url,
        })
    }

    /// Runs the pipeline and returns the links instead of emitting them
    pub async fn resolve_links(&self, page: &PageReference) -> Result<Vec<StreamLink>> {
        let resolved = self.resolve_manifest(page).await?;
        Ok(build_links(&self.config, page, &resolved))
    }

    /// Resolves a page and hands every link to `link_sink`
    ///
    /// Failures are logged with the page URL and stage and end the
    /// resolution without emitting anything. `subtitle_sink` is never
    /// called; it keeps the signature aligned with other extractors.
    /// Dropping the returned future cancels the in-flight request and
    /// emits nothing.
    pub async fn resolve<S, L>(&self, page: &PageReference, _subtitle_sink: S, mut link_sink: L)
    where
        S: FnMut(SubtitleFile),
        L: FnMut(StreamLink),
    {
        match self.resolve_links(page).await {
            Ok(links) => emit(&page.url, links, &mut link_sink),
            Err(e) => log_failure(&page.url, &e),
        }
    }

    /// Like [`resolve`](Self::resolve), starting from the player page
    pub async fn resolve_embed<S, L>(
        &self,
        embed_url: &str,
        referer: Option<&str>,
        _subtitle_sink: S,
        mut link_sink: L,
    ) where
        S: FnMut(SubtitleFile),
        L: FnMut(StreamLink),
    {
        let page = PageReference {
            url: embed_url.to_string(),
            referer: referer.map(str::to_string),
        };
        match self.resolve_embed_manifest(embed_url, referer).await {
            Ok(resolved) => emit(
                embed_url,
                build_links(&self.config, &page, &resolved),
                &mut link_sink,
            ),
            Err(e) => log_failure(embed_url, &e),
        }
    }

    /// Resolves candidate mirror pages concurrently
    ///
    /// Links are emitted in input order once every mirror has finished.
    /// A failing mirror is logged and skipped.
    ///
    /// # Returns
    /// Number of pages that produced links
    pub async fn resolve_all<S, L>(
        &self,
        pages: &[PageReference],
        _subtitle_sink: S,
        mut link_sink: L,
    ) -> usize
    where
        S: FnMut(SubtitleFile),
        L: FnMut(StreamLink),
    {
        let outcomes = join_all(pages.iter().map(|page| self.resolve_links(page))).await;

        let mut resolved = 0;
        for (page, outcome) in pages.iter().zip(outcomes) {
            match outcome {
                Ok(links) => {
                    resolved += 1;
                    emit(&page.url, links, &mut link_sink);
                }
                Err(e) => log_failure(&page.url, &e),
            }
        }
        resolved
    }

    /// Best-effort rendition selection; any failure keeps the master URL
    async fn select_rendition(&self, master_url: &str, embed_url: &str) -> String {
        let mut headers = request_headers(Some(embed_url), ACCEPT_ANY);
        if let Some(origin) = origin_of(embed_url)
            && let Ok(value) = HeaderValue::from_str(&origin)
        {
            headers.insert(ORIGIN, value);
        }

        match self.fetcher.get(master_url, headers).await {
            Ok(playlist) => select_rendition_url(&playlist.body, master_url),
            Err(e) => {
                debug!(error = %e, master = %master_url, "Master playlist unavailable; keeping it as is");
                master_url.to_string()
            }
        }
    }
}

/// Fresh headers for one request
fn request_headers(referer: Option<&str>, accept: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(accept));

    if let Some(referer) = referer {
        match HeaderValue::from_str(referer) {
            Ok(value) => {
                headers.insert(REFERER, value);
            }
            Err(e) => debug!(error = %e, "Invalid referer; skipping"),
        }
    }

    headers
}

fn emit(url: &str, links: Vec<StreamLink>, sink: &mut impl FnMut(StreamLink)) {
    info!(url, links = links.len(), "Resolved stream");
    links.into_iter().for_each(sink);
}

fn log_failure(url: &str, error: &ResolveError) {
    warn!(url, stage = error.stage(), error = %error, "Resolution failed");
}
