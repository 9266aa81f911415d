//! Name values that follow a label such as "Signed by" or "Sent by".

use regex::Regex;

use super::patterns::{LABEL_BOUNDARY, LABEL_VALUE, SENT_BY, SIGNED_BY};
use super::{FieldRule, RuleMatch};

/// Longest value accepted as a name.
const MAX_NAME_CHARS: usize = 120;

/// Captures the value next to a label: same line after an optional colon,
/// or the following line when the label stands alone.
pub struct LabelRule {
    pattern: &'static Regex,
}

impl LabelRule {
    /// "Signed by" / "Accepted and Signed by".
    pub fn signed_by() -> Self {
        Self {
            pattern: &SIGNED_BY,
        }
    }

    /// "Sent by".
    pub fn sent_by() -> Self {
        Self { pattern: &SENT_BY }
    }
}

impl FieldRule for LabelRule {
    fn find_all(&self, text: &str) -> Vec<RuleMatch> {
        self.pattern
            .captures_iter(text)
            .filter_map(|caps| {
                let value = caps.get(1)?;
                let cleaned = clean_name(value.as_str())?;
                Some(RuleMatch::new(cleaned, value.start(), value.end()))
            })
            .collect()
    }
}

/// Trim a captured name, cut it at the next label and reject label-only values.
pub fn clean_name(raw: &str) -> Option<String> {
    let cut = match LABEL_BOUNDARY.find(raw) {
        Some(m) => &raw[..m.start()],
        None => raw,
    };

    let name = cut
        .trim()
        .trim_matches(|c: char| matches!(c, ':' | ',' | ';' | '-' | '|' | '.'))
        .trim();

    if name.is_empty() || LABEL_VALUE.is_match(name) || name.chars().count() > MAX_NAME_CHARS {
        return None;
    }

    Some(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_on_same_line() {
        let rule = LabelRule::signed_by();
        assert_eq!(rule.find("Signed by: Jane Doe").unwrap().value, "Jane Doe");
    }

    #[test]
    fn test_value_on_next_line() {
        let rule = LabelRule::signed_by();
        let text = "Accepted and Signed by\nKaty Sully\nAccepted and Signed on\n08 May 2025";
        assert_eq!(rule.find(text).unwrap().value, "Katy Sully");
    }

    #[test]
    fn test_value_cut_at_next_label() {
        let rule = LabelRule::signed_by();
        let text = "Signed by: Jane Doe Sent by: John Smith";
        assert_eq!(rule.find(text).unwrap().value, "Jane Doe");

        let text = "Signed by Jane Doe on 08 May 2025";
        assert_eq!(rule.find(text).unwrap().value, "Jane Doe");
    }

    #[test]
    fn test_label_only_value_is_skipped() {
        let rule = LabelRule::signed_by();
        let text = "Signed by\nSigned on\n08 May 2025\nSigned by: Jane Doe";
        assert_eq!(rule.find(text).unwrap().value, "Jane Doe");
    }

    #[test]
    fn test_sent_by_does_not_match_signed_by() {
        let rule = LabelRule::sent_by();
        assert!(rule.find("Signed by: Jane Doe").is_none());
        assert_eq!(rule.find("Sent by Alex Reed").unwrap().value, "Alex Reed");
    }

    #[test]
    fn test_first_occurrence_wins() {
        let rule = LabelRule::sent_by();
        let text = "Sent by Alex Reed\nSent by Sam Hill";
        let all = rule.find_all(text);
        assert_eq!(all.len(), 2);
        assert_eq!(rule.find(text).unwrap().value, "Alex Reed");
    }
}
