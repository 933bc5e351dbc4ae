//! Page extractors.
//!
//! Two extractors share one structural parser ([`parse`]):
//!
//! | Extractor | Module | Transport | Scripts |
//! |-----------|--------|-----------|---------|
//! | Primary | [`primary`] | `reqwest` GET | not executed |
//! | Rendering | [`rendered`] | headless Chromium via `chromiumoxide` | executed |
//!
//! The orchestrator only sees the [`Fetcher`] and [`Renderer`] traits, so
//! tests can substitute canned implementations.

pub mod parse;
pub mod primary;
pub mod rendered;

use crate::errors::{FetchError, RenderError};
use crate::models::ParsedDocument;

/// Fast path: download and parse without executing page scripts.
pub trait Fetcher {
    /// Download `url` and parse it.
    ///
    /// Any network, status, or timeout problem comes back as a
    /// [`FetchError`]; the caller is expected to fall back to rendering.
    async fn fetch_and_parse(&self, url: &str) -> Result<ParsedDocument, FetchError>;
}

/// Slow path: render in a real browser, then parse the resulting DOM.
pub trait Renderer {
    /// Render `url` and parse the captured HTML.
    ///
    /// A [`RenderError`] is terminal for the URL.
    async fn render_and_parse(&self, url: &str) -> Result<ParsedDocument, RenderError>;
}
