//! Directory-backed store.
//!
//! # Layout
//!
//! ```text
//! store_dir/
//! ├── sites.json       # input: [{"link": "https://..."}, "https://...", ...]
//! ├── articles.jsonl   # one ArticleRecord per line
//! ├── failures.jsonl   # one FailureRecord per line, reasons joined
//! └── errors.jsonl     # store-level errors: {"message", "context", "at"}
//! ```
//!
//! Every record is appended and flushed to disk before the call returns.

use super::{ErrorLog, ResultSink, UrlSource};
use crate::errors::StoreError;
use crate::models::{ArticleRecord, FailureRecord};
use crate::utils::ensure_writable_dir;
use chrono::Utc;
use serde::Serialize;
use serde_json::{Value, json};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, instrument, warn};

pub const SITES_FILE: &str = "sites.json";
pub const ARTICLES_FILE: &str = "articles.jsonl";
pub const FAILURES_FILE: &str = "failures.jsonl";
pub const ERRORS_FILE: &str = "errors.jsonl";

#[derive(Debug, Clone)]
pub struct JsonStore {
    root: PathBuf,
}

impl JsonStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn append_line<T: Serialize>(&self, file: &str, value: &T) -> Result<(), StoreError> {
        let mut line = serde_json::to_string(value)?;
        line.push('\n');

        let path = self.root.join(file);
        let mut handle = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        handle.write_all(line.as_bytes()).await?;
        handle.sync_data().await?;
        debug!(path = %path.display(), bytes = line.len(), "Appended record");
        Ok(())
    }
}

/// A site entry's URL: the `link` field of an object, or a bare string.
fn link_of(entry: &Value) -> Option<String> {
    let link = match entry {
        Value::String(s) => s.as_str(),
        Value::Object(map) => map.get("link")?.as_str()?,
        _ => return None,
    };
    let link = link.trim();
    (!link.is_empty()).then(|| link.to_string())
}

impl UrlSource for JsonStore {
    #[instrument(level = "info", skip_all, fields(root = %self.root.display()))]
    async fn list_pending(&self) -> Result<Vec<String>, StoreError> {
        let path = self.root.join(SITES_FILE);
        let raw = match fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(path = %path.display(), "No sites file; nothing pending");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let entries: Vec<Value> = serde_json::from_str(&raw)?;
        let total = entries.len();
        let urls: Vec<String> = entries.iter().filter_map(link_of).collect();
        if urls.len() < total {
            warn!(skipped = total - urls.len(), "Skipped site entries without a link");
        }
        info!(count = urls.len(), "Loaded pending URLs");
        Ok(urls)
    }
}

impl ResultSink for JsonStore {
    async fn ensure_available(&self) -> Result<(), StoreError> {
        ensure_writable_dir(&self.root).await.map_err(|e| {
            StoreError::SinkUnavailable(format!("{}: {e}", self.root.display()))
        })
    }

    async fn record_success(&self, record: &ArticleRecord) -> Result<(), StoreError> {
        self.append_line(ARTICLES_FILE, record).await
    }

    async fn record_failure(&self, record: &FailureRecord) -> Result<(), StoreError> {
        self.append_line(FAILURES_FILE, record).await
    }
}

impl ErrorLog for JsonStore {
    async fn record_error(&self, message: &str, context: &str) {
        let entry = json!({
            "message": message,
            "context": context,
            "at": Utc::now().to_rfc3339(),
        });
        if let Err(e) = self.append_line(ERRORS_FILE, &entry).await {
            error!(error = %e, %message, %context, "Failed to write error log entry");
        }
    }
}
