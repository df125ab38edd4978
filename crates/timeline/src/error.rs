//! Error types for crawling and persistence.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for timeline operations.
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Errors that can stop a crawl run or a storage operation.
///
/// Data-shape problems inside a page are not errors; they surface as
/// [`crate::twitter::Diagnostic`] values and the affected entry is skipped.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream answered with a non-success status
    #[error("Upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Upstream signalled throttling (HTTP 429)
    #[error("Rate limited by upstream")]
    RateLimited,

    /// Body could not be decoded into JSON by any codec
    #[error("Unrecoverable page payload: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Another writer holds the corpus lock
    #[error("Corpus is locked by another writer: {}", .0.display())]
    Locked(PathBuf),

    /// The run was cancelled
    #[error("Crawl cancelled")]
    Cancelled,
}

impl CrawlError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether this error is the upstream throttling signal.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited)
    }
}
