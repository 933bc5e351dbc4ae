//! Best-effort publish-date recovery from raw markup.
//!
//! Used only when the page carries no structured publish date. Three
//! patterns are tried in a fixed order; for each one only the first match is
//! considered, and it must parse as `YYYY-MM-DD`.
//!
//! The `DD/MM/YYYY` and `Month D, YYYY` patterns are recognized but their
//! matches are not reformatted before parsing, so they never yield a date.

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, trace};

/// The only format a matched string is parsed with.
pub const RECOVERY_FORMAT: &str = "%Y-%m-%d";

static DATE_PATTERNS: Lazy<[Regex; 3]> = Lazy::new(|| {
    [
        Regex::new(r"(\d{4}-\d{2}-\d{2})").expect("static regex"),
        Regex::new(r"(\d{2}/\d{2}/\d{4})").expect("static regex"),
        Regex::new(r"(\w+\s\d{1,2},\s\d{4})").expect("static regex"),
    ]
});

/// Recover a publish date from raw HTML, at midnight.
pub fn recover_date(raw_html: &str) -> Option<NaiveDateTime> {
    for pattern in DATE_PATTERNS.iter() {
        let Some(found) = pattern.captures(raw_html).and_then(|c| c.get(1)) else {
            continue;
        };
        match NaiveDate::parse_from_str(found.as_str(), RECOVERY_FORMAT) {
            Ok(date) => {
                debug!(matched = found.as_str(), "Recovered publish date from markup");
                return date.and_hms_opt(0, 0, 0);
            }
            Err(e) => {
                trace!(matched = found.as_str(), error = %e, "Date candidate did not parse");
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_date_is_recovered_at_midnight() {
        let html = r#"<span class="stamp">Posted 2023-06-15 by staff</span>"#;
        let date = recover_date(html).unwrap();
        assert_eq!(
            date.format("%Y-%m-%dT%H:%M:%S").to_string(),
            "2023-06-15T00:00:00"
        );
    }

    #[test]
    fn test_day_month_year_is_not_recovered() {
        assert_eq!(recover_date("<p>Published 15/06/2023</p>"), None);
    }

    #[test]
    fn test_month_name_is_not_recovered() {
        assert_eq!(recover_date("<p>Published June 15, 2023</p>"), None);
    }

    #[test]
    fn test_first_iso_match_only() {
        // The first ISO-looking match is invalid; later ones are not tried.
        let html = "<p>ref 2023-13-45</p><time>2023-06-15</time>";
        assert_eq!(recover_date(html), None);
    }

    #[test]
    fn test_iso_wins_over_earlier_slash_date() {
        let html = "<p>15/06/2023</p><p>2021-01-02</p>";
        let date = recover_date(html).unwrap();
        assert_eq!(date.date(), NaiveDate::from_ymd_opt(2021, 1, 2).unwrap());
    }

    #[test]
    fn test_no_candidates() {
        assert_eq!(recover_date("<p>No dates here.</p>"), None);
        assert_eq!(recover_date(""), None);
    }
}
