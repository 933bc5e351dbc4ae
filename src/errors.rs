//! Error types for each layer of the pipeline.
//!
//! Extraction failures are values, not control flow: the primary path returns
//! [`FetchError`], the rendering path returns [`RenderError`], and the
//! orchestrator decides what to do next by matching on them.

use std::time::Duration;
use thiserror::Error;

/// Failure of the fast, non-rendering download and parse.
///
/// Always recoverable: the orchestrator falls back to rendering.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("HTTP status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Failure of the headless-browser path. Terminal for the URL.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("browser launch failed: {0}")]
    Launch(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("navigation timed out after {0:?}")]
    Timeout(Duration),

    #[error("failed to capture rendered HTML: {0}")]
    Capture(String),

    #[error("rendered page has neither title nor text")]
    Empty,
}

/// Failures of the URL source, result sink and error log.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("result sink unavailable: {0}")]
    SinkUnavailable(String),

    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result of a single-URL scrape request.
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("extraction failed: {0}")]
    Extraction(String),
}
