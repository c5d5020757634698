//! VixCloud Manifest Resolver Core Library
//!
//! Turns a catalog page that embeds a VixCloud-style player into a signed,
//! playable HLS link.
//!
//! # Overview
//!
//! The player page ships its signed manifest as a JavaScript object literal
//! (not JSON) inside a `<script>` tag. This crate provides:
//! - Iframe location and script collection for player pages
//! - Balanced-brace extraction of the manifest object
//! - Field recovery through a structural → regex strategy chain
//! - Signed master playlist URL assembly
//! - Best-rendition selection from the master playlist
//!
//! # Example
//!
//! ```no_run
//! use vixcloud_core::{ManifestResolver, PageReference, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let resolver = ManifestResolver::new()?;
//!     let page = PageReference::new("https://streamingcommunity.example/it/iframe/271")
//!         .with_referer("https://streamingcommunity.example/");
//!
//!     resolver
//!         .resolve(&page, |_subtitle| {}, |link| {
//!             println!("{}: {}", link.display_name, link.url);
//!         })
//!         .await;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Signed URLs
//!
//! Master playlist URLs carry `token` and `expires` parameters and stop
//! working once the expiry passes. Do not cache them long-term.

mod client;
mod config;
mod error;
mod link;
mod manifest;
pub mod parser;
mod resolver;
mod types;
pub mod url;

// Re-export client types
pub use client::{ClientConfig, DEFAULT_USER_AGENT, FetchedPage, HttpFetcher, PageFetcher};

// Re-export configuration
pub use config::ResolverConfig;

// Re-export error types
pub use error::{ResolveError, Result};

// Re-export pipeline stages
pub use link::{ResolvedManifest, build_links};
pub use manifest::build_manifest_url;
pub use parser::{
    FieldRecoverer, FieldStrategy, RecoveredFields, RegexStrategy, StructuralStrategy,
    collect_scripts, extract_object, locate_embed, parse_renditions, select_rendition_url,
};

// Re-export main resolver API
pub use resolver::ManifestResolver;

// Re-export data types
pub use types::{ManifestDescriptor, PageReference, RenditionEntry, StreamLink, SubtitleFile};
