//! Small helpers shared across the pipeline: URL host extraction, text
//! normalization, log truncation, panic descriptions, and a writability probe
//! for the store directory.

use std::any::Any;
use std::io;
use std::path::Path;
use tokio::fs;
use tracing::{debug, instrument};

/// Host segment of a URL, as written in the input.
///
/// Case and any port are kept verbatim, including a port equal to the scheme
/// default. Credentials before an `@` are dropped.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(domain_of("https://lite.cnn.com/2025/05/06/x").unwrap(), "lite.cnn.com");
/// assert_eq!(domain_of("http://localhost:8080/a").unwrap(), "localhost:8080");
/// assert_eq!(domain_of("http://News.A.Test:80/a").unwrap(), "News.A.Test:80");
/// ```
pub fn domain_of(url: &str) -> Result<String, url::ParseError> {
    let parsed = url::Url::parse(url)?;
    let host = parsed.host_str().ok_or(url::ParseError::EmptyHost)?;

    let written = url
        .trim()
        .split_once("//")
        .and_then(|(_, rest)| rest.split(['/', '?', '#']).next())
        .map(|authority| authority.rsplit_once('@').map_or(authority, |(_, h)| h))
        .filter(|authority| !authority.is_empty());

    Ok(match (written, parsed.port()) {
        (Some(authority), _) => authority.to_string(),
        (None, Some(port)) => format!("{host}:{port}"),
        (None, None) => host.to_string(),
    })
}

/// Collapse every run of whitespace to one space and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate a string for logging.
///
/// Cuts at a character boundary at or below `max` bytes and appends the
/// number of bytes dropped.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Describe a panic payload caught with `catch_unwind`.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then writes and removes a probe file.
///
/// # Errors
///
/// Returns the underlying I/O error when the directory cannot be created or
/// the probe cannot be written (permissions, read-only filesystem, a regular
/// file in the way).
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path).await?;
    let probe = path.join("..__probe_write__");
    fs::write(&probe, b"").await?;
    let _ = fs::remove_file(&probe).await;
    debug!("Directory is writable");
    Ok(())
}
