//! Data models for parsed pages and the two terminal outcomes of a URL.
//!
//! - [`ParsedDocument`]: what the structural parser pulls out of a page
//! - [`ArticleRecord`]: a successful extraction, ready for the result sink
//! - [`FailureRecord`]: every reason a URL could not be extracted
//! - [`Outcome`]: exactly one of the two records per processed URL
//!
//! Records are write-once. The pipeline builds them, hands them to the sink,
//! and never reads them back.

use crate::utils::domain_of;
use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// Separator used when a failure's reasons are flattened for storage.
pub const REASON_SEPARATOR: &str = "; ";

/// Structured fields extracted from a single HTML page.
///
/// Produced by both the primary and the rendering extractor, since both feed
/// their markup through the same parser.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedDocument {
    /// Article headline.
    pub title: String,
    /// Full body text, paragraphs separated by blank lines.
    pub text: String,
    /// Author names in first-seen order, without duplicates.
    pub authors: Vec<String>,
    /// Absolute URL of the lead image.
    pub top_image: Option<String>,
    /// The raw markup the fields were parsed from.
    pub html: String,
    /// Publish date from structured metadata only (never guessed).
    pub publish_date: Option<PublishDate>,
}

/// A publish timestamp, with or without a UTC offset.
///
/// Metadata such as `article:published_time` usually carries an offset;
/// date-only metadata and recovered dates do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishDate {
    Zoned(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
}

impl PublishDate {
    /// ISO-8601 rendering: `2023-06-15T00:00:00` or `2023-06-15T10:00:00+02:00`.
    pub fn to_iso8601(&self) -> String {
        match self {
            PublishDate::Zoned(dt) => dt.format("%Y-%m-%dT%H:%M:%S%:z").to_string(),
            PublishDate::Naive(dt) => dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
        }
    }
}

/// Which extractor produced an [`ArticleRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    /// Plain HTTP download, no scripts executed.
    Primary,
    /// Headless-browser render.
    Rendered,
}

/// A successfully extracted article.
///
/// Records built from the primary path have passed the quality gate. Records
/// from the rendering path only guarantee that title or text is non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub title: String,
    pub text: String,
    pub authors: Vec<String>,
    /// ISO-8601 publish timestamp, if one was found or recovered.
    pub publish_date: Option<String>,
    pub top_image: Option<String>,
    /// The URL exactly as it came from the URL source.
    pub url: String,
    /// Host segment of `url`, including the port when one is given.
    pub domain: String,
    pub extraction_method: ExtractionMethod,
    pub extracted_at: DateTime<Utc>,
}

impl ArticleRecord {
    /// Build a record from a parsed page.
    ///
    /// `publish_date` is passed separately so the caller can substitute a
    /// recovered date when the structured one is missing.
    ///
    /// # Errors
    ///
    /// Fails when no host can be taken from `url`.
    pub fn from_document(
        doc: ParsedDocument,
        url: &str,
        method: ExtractionMethod,
        publish_date: Option<PublishDate>,
    ) -> Result<Self, url::ParseError> {
        Ok(Self {
            domain: domain_of(url)?,
            title: doc.title,
            text: doc.text,
            authors: doc.authors,
            publish_date: publish_date.map(|d| d.to_iso8601()),
            top_image: doc.top_image,
            url: url.to_string(),
            extraction_method: method,
            extracted_at: Utc::now(),
        })
    }
}

/// Why a URL produced no article.
///
/// Reasons stay ordered and separate in memory; the sink stores them joined
/// with [`REASON_SEPARATOR`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureRecord {
    pub url: String,
    #[serde(serialize_with = "join_reasons")]
    pub reason: Vec<String>,
    pub failed_at: DateTime<Utc>,
}

impl FailureRecord {
    pub fn new(url: &str, reason: Vec<String>) -> Self {
        Self {
            url: url.to_string(),
            reason,
            failed_at: Utc::now(),
        }
    }

    /// The reasons as a single human-readable string.
    pub fn joined_reason(&self) -> String {
        self.reason.join(REASON_SEPARATOR)
    }
}

fn join_reasons<S: Serializer>(reason: &[String], s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&reason.join(REASON_SEPARATOR))
}

/// Terminal outcome of processing one URL.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(ArticleRecord),
    Failure(FailureRecord),
}

impl Outcome {
    pub fn url(&self) -> &str {
        match self {
            Outcome::Success(r) => &r.url,
            Outcome::Failure(f) => &f.url,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_doc() -> ParsedDocument {
        ParsedDocument {
            title: "Harbor reopens".to_string(),
            text: "Body".to_string(),
            authors: vec!["Ana Lima".to_string()],
            top_image: Some("https://a.test/lead.jpg".to_string()),
            html: "<p>Body</p>".to_string(),
            publish_date: None,
        }
    }

    #[test]
    fn test_naive_publish_date_iso() {
        let d = NaiveDate::from_ymd_opt(2023, 6, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(PublishDate::Naive(d).to_iso8601(), "2023-06-15T00:00:00");
    }

    #[test]
    fn test_zoned_publish_date_iso() {
        let d = DateTime::parse_from_rfc3339("2023-06-15T10:30:00+02:00").unwrap();
        assert_eq!(
            PublishDate::Zoned(d).to_iso8601(),
            "2023-06-15T10:30:00+02:00"
        );
    }

    #[test]
    fn test_record_from_document_sets_domain_and_method() {
        let record = ArticleRecord::from_document(
            sample_doc(),
            "https://news.a.test:8080/2023/story",
            ExtractionMethod::Rendered,
            None,
        )
        .unwrap();

        assert_eq!(record.domain, "news.a.test:8080");
        assert_eq!(record.url, "https://news.a.test:8080/2023/story");
        assert_eq!(record.extraction_method, ExtractionMethod::Rendered);
        assert_eq!(record.publish_date, None);
        assert_eq!(record.authors, vec!["Ana Lima".to_string()]);
    }

    #[test]
    fn test_record_from_document_rejects_hostless_url() {
        let result = ArticleRecord::from_document(
            sample_doc(),
            "not a url",
            ExtractionMethod::Primary,
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_extraction_method_serializes_lowercase() {
        let json = serde_json::to_string(&ExtractionMethod::Primary).unwrap();
        assert_eq!(json, "\"primary\"");
    }

    #[test]
    fn test_failure_record_serializes_joined_reason() {
        let failure = FailureRecord::new(
            "http://b.test/2",
            vec!["Title is missing".to_string(), "render failed".to_string()],
        );
        let value: serde_json::Value = serde_json::to_value(&failure).unwrap();
        assert_eq!(value["url"], "http://b.test/2");
        assert_eq!(value["reason"], "Title is missing; render failed");
        assert_eq!(failure.joined_reason(), "Title is missing; render failed");
    }

    #[test]
    fn test_outcome_url() {
        let failure = Outcome::Failure(FailureRecord::new("http://b.test/2", vec![]));
        assert_eq!(failure.url(), "http://b.test/2");
        assert!(!failure.is_success());
    }
}
