//! Primary extractor: plain HTTP download followed by a structural parse.
//!
//! No JavaScript runs on this path. Pages that build their content in the
//! browser usually come back thin and fail the quality gate, which sends
//! them to the rendering extractor.

use super::Fetcher;
use super::parse::parse_document;
use crate::config::HarvestConfig;
use crate::errors::FetchError;
use crate::models::ParsedDocument;
use reqwest::{Client, redirect::Policy};
use std::time::Instant;
use tracing::{info, instrument};
use url::Url;

/// HTTP client shared by every primary fetch in a run.
#[derive(Debug, Clone)]
pub struct PrimaryExtractor {
    http: Client,
}

impl PrimaryExtractor {
    pub fn new(config: &HarvestConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .redirect(Policy::limited(config.max_redirects))
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self { http })
    }
}

/// Only `http` and `https` URLs are fetched.
fn checked_url(url: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(url)?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(FetchError::UnsupportedScheme(other.to_string())),
    }
}

impl Fetcher for PrimaryExtractor {
    #[instrument(level = "info", skip_all, fields(%url))]
    async fn fetch_and_parse(&self, url: &str) -> Result<ParsedDocument, FetchError> {
        let target = checked_url(url)?;
        let t0 = Instant::now();

        let response = self.http.get(target).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let body = response.text().await?;

        info!(
            status = status.as_u16(),
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Downloaded page"
        );
        Ok(parse_document(url, &body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_url_accepts_http_and_https() {
        assert!(checked_url("http://a.test/1").is_ok());
        assert!(checked_url("https://a.test/1").is_ok());
    }

    #[test]
    fn test_checked_url_rejects_other_schemes() {
        assert!(matches!(
            checked_url("ftp://a.test/file"),
            Err(FetchError::UnsupportedScheme(s)) if s == "ftp"
        ));
        assert!(matches!(
            checked_url("not a url"),
            Err(FetchError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_url_fails_before_any_request() {
        let extractor = PrimaryExtractor::new(&HarvestConfig::default()).unwrap();
        let err = extractor.fetch_and_parse("file:///etc/hosts").await.unwrap_err();
        assert!(matches!(err, FetchError::UnsupportedScheme(_)));
    }
}
