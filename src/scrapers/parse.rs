//! Structural HTML parser shared by the primary and rendering extractors.
//!
//! Pulls the headline, body paragraphs, bylines, lead image, and structured
//! publish date out of a page. Sources are tried in a fixed priority order:
//! OpenGraph and other `<meta>` tags first, JSON-LD next, then plain markup.
//! Parsing never fails; missing fields come back empty.

use crate::models::{ParsedDocument, PublishDate};
use crate::utils::collapse_whitespace;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use itertools::Itertools;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

static TITLE_META: Lazy<Selector> = Lazy::new(|| selector(r#"meta[property="og:title"]"#));
static TITLE: Lazy<Selector> = Lazy::new(|| selector("title"));
static H1: Lazy<Selector> = Lazy::new(|| selector("h1"));
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| selector("p"));
static JSON_LD: Lazy<Selector> = Lazy::new(|| selector(r#"script[type="application/ld+json"]"#));
static TIME: Lazy<Selector> = Lazy::new(|| selector("time[datetime]"));
static IMAGE_LINK: Lazy<Selector> = Lazy::new(|| selector(r#"link[rel="image_src"]"#));

/// Body containers, most specific first.
static CONTAINERS: Lazy<Vec<Selector>> = Lazy::new(|| {
    ["article", r#"[itemprop="articleBody"]"#, "main", "body"]
        .into_iter()
        .map(selector)
        .collect()
});

static AUTHOR_META: Lazy<Vec<Selector>> = Lazy::new(|| {
    [r#"meta[name="author"]"#, r#"meta[property="article:author"]"#]
        .into_iter()
        .map(selector)
        .collect()
});

static AUTHOR_MARKUP: Lazy<Vec<Selector>> = Lazy::new(|| {
    [r#"[rel="author"]"#, r#"[itemprop="author"]"#]
        .into_iter()
        .map(selector)
        .collect()
});

static IMAGE_META: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        r#"meta[property="og:image"]"#,
        r#"meta[name="twitter:image"]"#,
        r#"meta[property="twitter:image"]"#,
    ]
    .into_iter()
    .map(selector)
    .collect()
});

static DATE_META: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        r#"meta[property="article:published_time"]"#,
        r#"meta[property="og:published_time"]"#,
        r#"meta[name="pubdate"]"#,
        r#"meta[name="publishdate"]"#,
        r#"meta[name="date"]"#,
        r#"meta[itemprop="datePublished"]"#,
    ]
    .into_iter()
    .map(selector)
    .collect()
});

/// Parse a page fetched from `url`.
///
/// `url` is only used to resolve a relative lead-image path.
#[instrument(level = "debug", skip_all, fields(%url, bytes = html.len()))]
pub fn parse_document(url: &str, html: &str) -> ParsedDocument {
    let document = Html::parse_document(html);
    let json_ld = collect_json_ld(&document);

    let doc = ParsedDocument {
        title: extract_title(&document),
        text: extract_text(&document),
        authors: extract_authors(&document, &json_ld),
        top_image: extract_top_image(&document, url),
        html: html.to_string(),
        publish_date: extract_publish_date(&document, &json_ld),
    };
    debug!(
        title_chars = doc.title.chars().count(),
        text_chars = doc.text.chars().count(),
        authors = doc.authors.len(),
        has_date = doc.publish_date.is_some(),
        "Parsed document"
    );
    doc
}

fn element_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<String>())
}

fn first_meta(document: &Html, sel: &Selector) -> Option<String> {
    document
        .select(sel)
        .filter_map(|el| el.value().attr("content"))
        .map(str::trim)
        .find(|c| !c.is_empty())
        .map(str::to_string)
}

fn extract_title(document: &Html) -> String {
    first_meta(document, &TITLE_META)
        .map(|t| collapse_whitespace(&t))
        .or_else(|| {
            [&*TITLE, &*H1].into_iter().find_map(|sel| {
                document
                    .select(sel)
                    .map(element_text)
                    .find(|t| !t.is_empty())
            })
        })
        .unwrap_or_default()
}

/// Paragraph text of the richest element matching the first container
/// selector that yields any paragraphs.
fn extract_text(document: &Html) -> String {
    for container in CONTAINERS.iter() {
        let best = document
            .select(container)
            .map(|el| {
                el.select(&PARAGRAPH)
                    .map(element_text)
                    .filter(|p| !p.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|paras| !paras.is_empty())
            .max_by_key(|paras| paras.iter().map(|p| p.chars().count()).sum::<usize>());

        if let Some(paras) = best {
            return paras.join("\n\n");
        }
    }
    String::new()
}

fn clean_author(raw: &str) -> Option<String> {
    let name = collapse_whitespace(raw);
    let name = name
        .strip_prefix("By ")
        .or_else(|| name.strip_prefix("by "))
        .unwrap_or(name.as_str())
        .trim();
    if name.is_empty() || name.starts_with("http://") || name.starts_with("https://") {
        return None;
    }
    Some(name.to_string())
}

fn extract_authors(document: &Html, json_ld: &[Value]) -> Vec<String> {
    let from_meta = AUTHOR_META
        .iter()
        .flat_map(|sel| document.select(sel))
        .filter_map(|el| el.value().attr("content").map(str::to_string));

    let from_markup = AUTHOR_MARKUP
        .iter()
        .flat_map(|sel| document.select(sel))
        .map(|el| el.value().attr("content").map(str::to_string).unwrap_or_else(|| element_text(el)));

    let from_ld = json_ld
        .iter()
        .filter_map(|obj| obj.get("author"))
        .flat_map(ld_names);

    from_meta
        .chain(from_markup)
        .chain(from_ld)
        .filter_map(|raw| clean_author(&raw))
        .unique()
        .collect()
}

fn ld_names(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Object(map) => map
            .get("name")
            .and_then(Value::as_str)
            .map(|s| vec![s.to_string()])
            .unwrap_or_default(),
        Value::Array(items) => items.iter().flat_map(ld_names).collect(),
        _ => Vec::new(),
    }
}

fn extract_top_image(document: &Html, url: &str) -> Option<String> {
    let raw = IMAGE_META
        .iter()
        .find_map(|sel| first_meta(document, sel))
        .or_else(|| {
            document
                .select(&IMAGE_LINK)
                .filter_map(|el| el.value().attr("href"))
                .map(str::trim)
                .find(|h| !h.is_empty())
                .map(str::to_string)
        })?;

    match Url::parse(url).and_then(|base| base.join(&raw)) {
        Ok(resolved) => Some(resolved.to_string()),
        Err(_) => Url::parse(&raw).ok().map(|u| u.to_string()),
    }
}

fn extract_publish_date(document: &Html, json_ld: &[Value]) -> Option<PublishDate> {
    let from_meta = DATE_META.iter().filter_map(|sel| first_meta(document, sel));
    let from_ld = json_ld
        .iter()
        .filter_map(|obj| obj.get("datePublished").and_then(Value::as_str))
        .map(str::to_string);
    let from_time = document
        .select(&TIME)
        .filter_map(|el| el.value().attr("datetime").map(str::to_string));

    from_meta
        .chain(from_ld)
        .chain(from_time)
        .find_map(|raw| parse_date_value(raw.trim()))
}

/// Parse a structured date value: RFC 3339, a zoned or naive
/// `YYYY-MM-DDTHH:MM:SS`, or a bare `YYYY-MM-DD`.
pub fn parse_date_value(raw: &str) -> Option<PublishDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(PublishDate::Zoned(dt));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(PublishDate::Zoned(dt));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(PublishDate::Naive(dt));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(PublishDate::Naive)
}

/// Every JSON-LD object on the page, with arrays and `@graph` flattened.
fn collect_json_ld(document: &Html) -> Vec<Value> {
    let mut out = Vec::new();
    for script in document.select(&JSON_LD) {
        let raw = script.text().collect::<String>();
        match serde_json::from_str::<Value>(&raw) {
            Ok(value) => flatten_ld(value, &mut out),
            Err(e) => debug!(error = %e, "Skipping malformed JSON-LD block"),
        }
    }
    out
}

fn flatten_ld(value: Value, out: &mut Vec<Value>) {
    match value {
        Value::Array(items) => items.into_iter().for_each(|v| flatten_ld(v, out)),
        Value::Object(mut map) => {
            if let Some(graph) = map.remove("@graph") {
                flatten_ld(graph, out);
            }
            out.push(Value::Object(map));
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STORY: &str = r#"
<html>
<head>
  <title>Harbor reopens | Coastal Times</title>
  <meta property="og:title" content="Harbor reopens after storm">
  <meta name="author" content="By Ana Lima">
  <meta property="og:image" content="/img/harbor.jpg">
  <meta property="article:published_time" content="2023-06-15T10:30:00+02:00">
  <script type="application/ld+json">
    {"@context":"https://schema.org","@graph":[
      {"@type":"NewsArticle","author":[{"@type":"Person","name":"Ana Lima"},{"@type":"Person","name":"Rui Costa"}]}
    ]}
  </script>
</head>
<body>
  <nav><p>Home</p></nav>
  <article>
    <h1>Harbor reopens</h1>
    <p>The harbor   reopened on Monday.</p>
    <p>   </p>
    <p>Fishing boats returned by noon.</p>
  </article>
  <footer><p>Copyright</p></footer>
</body>
</html>"#;

    #[test]
    fn test_parse_full_story() {
        let doc = parse_document("https://coastal.test/news/harbor", STORY);

        assert_eq!(doc.title, "Harbor reopens after storm");
        assert_eq!(
            doc.text,
            "The harbor reopened on Monday.\n\nFishing boats returned by noon."
        );
        assert_eq!(doc.authors, vec!["Ana Lima".to_string(), "Rui Costa".to_string()]);
        assert_eq!(
            doc.top_image.as_deref(),
            Some("https://coastal.test/img/harbor.jpg")
        );
        assert_eq!(
            doc.publish_date.map(|d| d.to_iso8601()).as_deref(),
            Some("2023-06-15T10:30:00+02:00")
        );
        assert_eq!(doc.html, STORY);
    }

    #[test]
    fn test_title_falls_back_to_title_then_h1() {
        let doc = parse_document("https://a.test/", "<html><head><title> Plain  title </title></head></html>");
        assert_eq!(doc.title, "Plain title");

        let doc = parse_document("https://a.test/", "<html><body><h1>Only heading</h1></body></html>");
        assert_eq!(doc.title, "Only heading");
    }

    #[test]
    fn test_text_falls_back_to_body_paragraphs() {
        let html = "<html><body><div><p>First.</p></div><p>Second.</p></body></html>";
        let doc = parse_document("https://a.test/", html);
        assert_eq!(doc.text, "First.\n\nSecond.");
    }

    #[test]
    fn test_text_prefers_richest_article() {
        let html = "<html><body>\
            <article><p>Short teaser.</p></article>\
            <article><p>The main story has a much longer paragraph.</p><p>And more.</p></article>\
            </body></html>";
        let doc = parse_document("https://a.test/", html);
        assert_eq!(doc.text, "The main story has a much longer paragraph.\n\nAnd more.");
    }

    #[test]
    fn test_empty_page_parses_to_empty_fields() {
        let doc = parse_document("https://a.test/", "");
        assert!(doc.title.is_empty());
        assert!(doc.text.is_empty());
        assert!(doc.authors.is_empty());
        assert!(doc.top_image.is_none());
        assert!(doc.publish_date.is_none());
    }

    #[test]
    fn test_author_markup_and_url_values() {
        let html = r#"<html><head>
            <meta property="article:author" content="https://facebook.test/someone">
            </head><body>
            <span itemprop="author"><span itemprop="name">by  Maria   Souza</span></span>
            <a rel="author" href="/staff/maria">Maria Souza</a>
            </body></html>"#;
        let doc = parse_document("https://a.test/", html);
        assert_eq!(doc.authors, vec!["Maria Souza".to_string()]);
    }

    #[test]
    fn test_date_from_time_element() {
        let html = r#"<html><body><time datetime="2022-11-03">Nov 3</time></body></html>"#;
        let doc = parse_document("https://a.test/", html);
        assert_eq!(
            doc.publish_date.map(|d| d.to_iso8601()).as_deref(),
            Some("2022-11-03T00:00:00")
        );
    }

    #[test]
    fn test_date_from_json_ld_when_meta_missing() {
        let html = r#"<html><head><script type="application/ld+json">
            {"@type":"NewsArticle","datePublished":"2021-04-09T08:00:00Z"}
            </script></head></html>"#;
        let doc = parse_document("https://a.test/", html);
        assert_eq!(
            doc.publish_date.map(|d| d.to_iso8601()).as_deref(),
            Some("2021-04-09T08:00:00+00:00")
        );
    }

    #[test]
    fn test_unparseable_date_metadata_is_ignored() {
        let html = r#"<html><head><meta name="date" content="yesterday"></head></html>"#;
        assert!(parse_document("https://a.test/", html).publish_date.is_none());
    }

    #[test]
    fn test_parse_date_value_formats() {
        assert!(matches!(parse_date_value("2023-06-15T10:00:00+0200"), Some(PublishDate::Zoned(_))));
        assert!(matches!(parse_date_value("2023-06-15T10:00:00"), Some(PublishDate::Naive(_))));
        assert!(matches!(parse_date_value("2023-06-15"), Some(PublishDate::Naive(_))));
        assert!(parse_date_value("15/06/2023").is_none());
    }
}
