//! Signing date extraction.

use chrono::NaiveDate;

use super::patterns::{DATE_TOKEN, ORDINAL_SUFFIX, SIGNED_DATE_MARKER, SIGNED_MARKER};
use super::{marker_windows, FieldRule, RuleMatch};

/// How far past a marker a date may appear, in bytes.
const WINDOW: usize = 160;

const DATE_FORMATS: [&str; 12] = [
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%d.%m.%Y",
    "%d-%m-%Y",
    "%d/%m/%y",
    "%m/%d/%y",
    "%d.%m.%y",
    "%d-%m-%y",
    "%d %b %Y",
    "%b %d %Y",
    "%d %B %Y",
];

/// Finds a date-shaped token near a "signed" context marker.
///
/// Labelled markers ("Signed on", "Signed date") are tried before a bare
/// "signed"; within each tier the first valid date in document order wins.
/// The matched text is kept verbatim, time suffix included.
pub struct SignedDateRule;

impl SignedDateRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SignedDateRule {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldRule for SignedDateRule {
    fn find_all(&self, text: &str) -> Vec<RuleMatch> {
        let mut results: Vec<RuleMatch> = Vec::new();

        for marker in [&*SIGNED_DATE_MARKER, &*SIGNED_MARKER] {
            for (offset, window) in marker_windows(marker, text, WINDOW) {
                let found = DATE_TOKEN
                    .captures_iter(window)
                    .find(|caps| parse_signed_date(&caps[1]).is_some());

                if let Some(caps) = found {
                    let whole = &caps[0];
                    let start = offset + caps.get(0).map(|m| m.start()).unwrap_or(0);
                    // Skip if already found
                    if results.iter().any(|r| r.position.0 == start) {
                        continue;
                    }
                    results.push(RuleMatch::new(whole.trim(), start, start + whole.len()));
                }
            }
        }

        results
    }
}

/// Parse a date-shaped token, returning `None` for impossible dates.
pub fn parse_signed_date(token: &str) -> Option<NaiveDate> {
    let normalized = ORDINAL_SUFFIX.replace_all(token, "$1");
    let normalized = normalized
        .replace([',', '\t'], " ")
        .split_whitespace()
        .map(|part| part.trim_end_matches('.'))
        .collect::<Vec<_>>()
        .join(" ");

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&normalized, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_signed_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 5, 8).unwrap();

        assert_eq!(parse_signed_date("2025-05-08"), Some(expected));
        assert_eq!(parse_signed_date("08 May 2025"), Some(expected));
        assert_eq!(parse_signed_date("8th May, 2025"), Some(expected));
        assert_eq!(parse_signed_date("May 8, 2025"), Some(expected));
        assert_eq!(parse_signed_date("08.05.2025"), Some(expected));
        assert_eq!(parse_signed_date("8 September 2025"), NaiveDate::from_ymd_opt(2025, 9, 8));
        assert_eq!(parse_signed_date("31/02/2025"), None);
    }

    #[test]
    fn test_labelled_date() {
        let rule = SignedDateRule::new();
        let text = "Signed by: Jane Doe\nSent by: John Smith\nIP: 192.168.1.1\nSigned Date: 2024-01-15";

        assert_eq!(rule.find(text).unwrap().value, "2024-01-15");
    }

    #[test]
    fn test_date_with_time_suffix() {
        let rule = SignedDateRule::new();
        let text = "Accepted and Signed on\n08 May 2025 14:32\nIP Address from signature location\n203.0.113.7";

        assert_eq!(rule.find(text).unwrap().value, "08 May 2025 14:32");
    }

    #[test]
    fn test_labelled_marker_beats_earlier_bare_marker() {
        let rule = SignedDateRule::new();
        let text = "Signed by Jane Doe\nCreated 01/02/2025\nSigned on 2025-03-04";

        assert_eq!(rule.find(text).unwrap().value, "2025-03-04");
    }

    #[test]
    fn test_bare_marker_used_when_no_label() {
        let rule = SignedDateRule::new();
        let text = "Document signed\n4 March 2025";

        assert_eq!(rule.find(text).unwrap().value, "4 March 2025");
    }

    #[test]
    fn test_no_date_near_marker() {
        let rule = SignedDateRule::new();

        assert!(rule.find("Signed by Jane Doe").is_none());
        assert!(rule.find("Created 2025-01-01").is_none());
    }

    #[test]
    fn test_ip_is_not_a_date() {
        let rule = SignedDateRule::new();
        assert!(rule.find("Signed from 192.168.1.1").is_none());
    }
}
