//! Common types shared across the Precis crates.
//!
//! This crate holds the domain vocabulary of the summarization pipeline, the
//! typed message contracts exchanged between the popup, the relay and the page,
//! the error taxonomy, and the logging initializer. It stays dependency-light
//! so every other crate can depend on it.
//!
//! # Overview
//!
//! - [`RequestKind`] and [`ContentSource`]: what to summarize and how to get it
//! - [`Credential`]: the user-supplied API key
//! - [`ExtractedPayload`]: what the extractor hands to the summarizer
//! - [`protocol`]: page and relay message contracts
//! - [`PrecisError`] and [`Result`]: shared error handling
//! - [`observability`]: centralised tracing/logging initialisation
//!
//! # Examples
//!
//! ```rust
//! use precis_common::{ContentSource, RequestKind};
//!
//! let kind = RequestKind::VideoTranscript;
//! assert_eq!(kind.action(), "getVideoTranscript");
//! assert_eq!(ContentSource::default(), ContentSource::DomText);
//! ```
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub mod observability;
pub mod protocol;

/// What the user asked to summarize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestKind {
    #[serde(rename = "getPageContent")]
    PageContent,
    #[serde(rename = "getVideoTranscript")]
    VideoTranscript,
}

impl RequestKind {
    /// Wire name used in page messages.
    pub fn action(&self) -> &'static str {
        match self {
            RequestKind::PageContent => "getPageContent",
            RequestKind::VideoTranscript => "getVideoTranscript",
        }
    }

    /// Short human label, used in logs and the popup.
    pub fn label(&self) -> &'static str {
        match self {
            RequestKind::PageContent => "page",
            RequestKind::VideoTranscript => "video",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Pipeline flavor: where the summarized material comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentSource {
    /// Rendered page text, transcript scraped from the transcript panel.
    #[default]
    DomText,
    /// Rendered page text, transcript fetched from the caption track.
    CaptionFetch,
    /// No extraction; the model fetches the URL itself through search.
    DirectUrl,
}

/// The user-supplied API key.
///
/// Opaque and never validated locally; `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Material produced by the extractor, consumed once by the summarizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractedPayload {
    Text(String),
    Url(String),
}

/// Correlates the log lines of one summarize request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Failures of the summarization pipeline.
///
/// Every variant carries a human-readable message that is shown to the user
/// as-is, so `Display` prints the message and nothing else.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PrecisError {
    /// The API key is missing or the configuration is unusable.
    #[error("{0}")]
    Configuration(String),

    /// The active page cannot be summarized (restricted or wrong site).
    #[error("{0}")]
    Navigation(String),

    /// The page yielded no usable content.
    #[error("{0}")]
    Extraction(String),

    /// An HTTP call or a message channel failed.
    #[error("{0}")]
    Transport(String),

    /// The API answered but the envelope lacked the expected answer.
    #[error("{0}")]
    ResponseShape(String),
}

impl PrecisError {
    /// Stable category name for structured logs.
    pub fn category(&self) -> &'static str {
        match self {
            PrecisError::Configuration(_) => "configuration",
            PrecisError::Navigation(_) => "navigation",
            PrecisError::Extraction(_) => "extraction",
            PrecisError::Transport(_) => "transport",
            PrecisError::ResponseShape(_) => "response_shape",
        }
    }
}

/// Convenient alias for results that use [`PrecisError`].
pub type Result<T> = std::result::Result<T, PrecisError>;
