//! Deterministic field rules used by the pattern strategy.

pub mod dates;
pub mod labels;
pub mod network;
pub mod patterns;

pub use dates::{parse_signed_date, SignedDateRule};
pub use labels::LabelRule;
pub use network::IpAddressRule;

use regex::Regex;

/// A rule that locates one field in certificate text.
pub trait FieldRule {
    /// Every match, most trusted first and then in document order.
    fn find_all(&self, text: &str) -> Vec<RuleMatch>;

    /// The match the field resolves to.
    fn find(&self, text: &str) -> Option<RuleMatch> {
        self.find_all(text).into_iter().next()
    }
}

/// A value located in source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    /// Extracted value, trimmed.
    pub value: String,
    /// Byte offsets in the searched text.
    pub position: (usize, usize),
}

impl RuleMatch {
    pub fn new(value: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            value: value.into(),
            position: (start, end),
        }
    }
}

/// Text following each `marker` match, at most `width` bytes long, in
/// document order. Returned offsets are where each window starts.
pub(crate) fn marker_windows<'t>(
    marker: &Regex,
    text: &'t str,
    width: usize,
) -> Vec<(usize, &'t str)> {
    marker
        .find_iter(text)
        .map(|m| {
            let start = m.end();
            let mut end = (start + width).min(text.len());
            while !text.is_char_boundary(end) {
                end -= 1;
            }
            (start, &text[start..end])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_windows_stay_on_char_boundaries() {
        let marker = Regex::new("IP").unwrap();
        let text = "IP żółw IP";

        let windows = marker_windows(&marker, text, 3);
        assert_eq!(windows, vec![(2, " ż"), (text.len(), "")]);
    }
}
