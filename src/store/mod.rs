//! Interfaces to the persistent store, plus a JSON-file implementation.
//!
//! The pipeline consumes three collaborators:
//!
//! - [`UrlSource`]: yields the pending URLs, once per run
//! - [`ResultSink`]: durably records one success or failure per URL
//! - [`ErrorLog`]: best-effort operational record of store-level failures
//!
//! The store is an ordinary value built once in `main` and borrowed by the
//! pipeline; there is no process-wide client handle.
//!
//! # Submodules
//!
//! - [`json`]: directory-backed store (`sites.json` in, JSON lines out)

pub mod json;

use crate::errors::StoreError;
use crate::models::{ArticleRecord, FailureRecord};

pub use json::JsonStore;

/// Source of candidate URLs.
pub trait UrlSource {
    /// Every pending URL, in store order. Entries without a link are
    /// skipped; duplicates are kept.
    async fn list_pending(&self) -> Result<Vec<String>, StoreError>;
}

/// Destination for terminal outcomes.
///
/// Writes are append-only and carry no uniqueness constraint, so calling
/// either method twice for the same URL stores two entries.
pub trait ResultSink {
    /// Fails with [`StoreError::SinkUnavailable`] when nothing can be written.
    async fn ensure_available(&self) -> Result<(), StoreError>;

    async fn record_success(&self, record: &ArticleRecord) -> Result<(), StoreError>;

    async fn record_failure(&self, record: &FailureRecord) -> Result<(), StoreError>;
}

/// Operational error log. Failures to log are swallowed by implementations.
pub trait ErrorLog {
    async fn record_error(&self, message: &str, context: &str);
}
