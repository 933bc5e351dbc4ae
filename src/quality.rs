//! Heuristic acceptance check for primary-path extractions.
//!
//! A page passes only when it has a title, at least [`MIN_TEXT_CHARS`]
//! characters of body text, non-empty markup, and some real text inside an
//! `<article>` or `<p>` element. The last check rejects pages whose "text" is
//! navigation boilerplate with no article-shaped markup.

use crate::models::ParsedDocument;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

/// Minimum body length, counted in characters (not bytes).
pub const MIN_TEXT_CHARS: usize = 300;

static STRUCTURAL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("article, p").expect("static selector"));

/// `true` when the document meets every acceptance condition.
pub fn is_acceptable(doc: &ParsedDocument) -> bool {
    failure_reasons(doc).is_empty()
}

/// One human-readable reason per unmet condition.
///
/// Not short-circuited: a page missing everything reports all four reasons,
/// always in the order title, length, markup, structure.
pub fn failure_reasons(doc: &ParsedDocument) -> Vec<String> {
    let mut reasons = Vec::new();

    if doc.title.trim().is_empty() {
        reasons.push("Title is missing".to_string());
    }

    let chars = doc.text.chars().count();
    if chars < MIN_TEXT_CHARS {
        reasons.push(format!(
            "Text too short ({chars} characters, minimum {MIN_TEXT_CHARS})"
        ));
    }

    if doc.html.trim().is_empty() {
        reasons.push("HTML content is empty".to_string());
    }

    if !has_significant_text(&doc.html) {
        reasons.push("No significant text inside <article> or <p> elements".to_string());
    }

    reasons
}

/// Does any `<article>` or `<p>` hold a non-whitespace text node?
pub fn has_significant_text(html: &str) -> bool {
    if html.trim().is_empty() {
        return false;
    }
    let document = Html::parse_document(html);
    document
        .select(&STRUCTURAL)
        .any(|el| el.text().any(|t| !t.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn good_doc() -> ParsedDocument {
        let body = "Residents gathered at the harbor on Monday. ".repeat(10);
        ParsedDocument {
            title: "Harbor reopens after storm".to_string(),
            text: body.clone(),
            html: format!("<html><body><article><p>{body}</p></article></body></html>"),
            ..Default::default()
        }
    }

    #[test]
    fn test_good_document_is_accepted() {
        let doc = good_doc();
        assert!(doc.text.chars().count() >= MIN_TEXT_CHARS);
        assert!(is_acceptable(&doc));
        assert!(failure_reasons(&doc).is_empty());
    }

    #[test]
    fn test_missing_title_only() {
        let doc = ParsedDocument {
            title: "   ".to_string(),
            ..good_doc()
        };
        assert_eq!(failure_reasons(&doc), vec!["Title is missing".to_string()]);
        assert!(!is_acceptable(&doc));
    }

    #[test]
    fn test_length_boundary() {
        let mut doc = good_doc();
        doc.text = "x".repeat(MIN_TEXT_CHARS - 1);
        assert_eq!(
            failure_reasons(&doc),
            vec!["Text too short (299 characters, minimum 300)".to_string()]
        );

        doc.text = "x".repeat(MIN_TEXT_CHARS);
        assert!(is_acceptable(&doc));
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        let mut doc = good_doc();
        // 150 two-byte characters: 300 bytes but only 150 characters.
        doc.text = "é".repeat(150);
        assert_eq!(failure_reasons(&doc).len(), 1);
    }

    #[test]
    fn test_boilerplate_without_article_markup_is_rejected() {
        let mut doc = good_doc();
        doc.html = format!(
            "<html><body><nav><ul><li>{}</li></ul></nav><p>   </p></body></html>",
            "Home News Sports ".repeat(30)
        );
        assert_eq!(
            failure_reasons(&doc),
            vec!["No significant text inside <article> or <p> elements".to_string()]
        );
    }

    #[test]
    fn test_article_without_paragraphs_counts_as_structure() {
        assert!(has_significant_text(
            "<html><body><article><div>Story text</div></article></body></html>"
        ));
    }

    #[test]
    fn test_all_reasons_reported_in_order() {
        let doc = ParsedDocument::default();
        let reasons = failure_reasons(&doc);
        assert_eq!(reasons.len(), 4);
        assert_eq!(reasons[0], "Title is missing");
        assert!(reasons[1].starts_with("Text too short (0 characters"));
        assert_eq!(reasons[2], "HTML content is empty");
        assert!(reasons[3].starts_with("No significant text"));
    }
}
