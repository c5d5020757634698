//! Error types for the manifest resolver
//!
//! Every variant except [`ResolveError::InvalidConfig`] describes site-layout
//! drift or a transport problem local to one resolution attempt.

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Error type for all resolver operations
///
/// Implements Display for human-readable messages and Serialize
/// so a host can forward it across an IPC boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// Fetch did not complete or returned a non-success status
    #[error("Network failure for {url}: {reason}")]
    NetworkFailure { url: String, reason: String },

    /// No player iframe on the page
    #[error("No iframe found in {0}")]
    MissingIframe(String),

    /// No script on the player page contains the expected marker
    #[error("Script not found: {0}")]
    ScriptNotFound(String),

    /// Marker found but the object never balances, or no field strategy succeeded
    #[error("Malformed object: {0}")]
    MalformedObject(String),

    /// Manifest fetched but no usable variant table
    #[error("Rendition parse failure: {0}")]
    RenditionParseFailure(String),

    /// Invalid URL format
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Caller handed in an unusable configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ResolveError {
    /// Pipeline stage the error was raised in, used as a log field
    pub fn stage(&self) -> &'static str {
        match self {
            Self::NetworkFailure { .. } => "fetch",
            Self::MissingIframe(_) => "iframe",
            Self::ScriptNotFound(_) => "script",
            Self::MalformedObject(_) => "object",
            Self::RenditionParseFailure(_) => "rendition",
            Self::InvalidUrl(_) => "url",
            Self::InvalidConfig(_) => "config",
        }
    }

    /// Whether the failure is expected drift rather than a contract violation
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InvalidConfig(_))
    }

    pub(crate) fn network(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::NetworkFailure {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

impl Serialize for ResolveError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Result type alias for resolver operations
pub type Result<T> = std::result::Result<T, ResolveError>;
