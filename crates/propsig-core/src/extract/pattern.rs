//! Rule-based extraction: the strategy that always answers.

use tracing::debug;

use super::rules::{FieldRule, IpAddressRule, LabelRule, SignedDateRule};
use super::ExtractionStrategy;
use crate::error::ExtractionUnavailable;
use crate::models::record::ExtractedFields;
use crate::page::RawPageContent;

/// Extracts the four fields with deterministic pattern rules.
///
/// Each field is resolved independently; a rule that finds nothing leaves
/// its field empty without affecting the others.
pub struct PatternStrategy {
    signed_by: LabelRule,
    signed_date: SignedDateRule,
    ip_address: IpAddressRule,
    sent_by: LabelRule,
}

impl PatternStrategy {
    pub fn new() -> Self {
        Self {
            signed_by: LabelRule::signed_by(),
            signed_date: SignedDateRule::new(),
            ip_address: IpAddressRule::new(),
            sent_by: LabelRule::sent_by(),
        }
    }

    /// Run every rule against the content.
    pub fn extract_fields(&self, content: &RawPageContent) -> ExtractedFields {
        let text = content.text();

        let hint = content.sent_by_hint();
        let sent_by = if hint.is_empty() {
            first(&self.sent_by, &text)
        } else {
            hint
        };

        let fields = ExtractedFields {
            signed_by: first(&self.signed_by, &text),
            signed_date: first(&self.signed_date, &text),
            ip_address: first(&self.ip_address, &text),
            sent_by,
        };

        debug!(
            "Pattern rules found {}/4 fields in {} chars of text",
            fields.found_count(),
            text.len()
        );

        fields
    }
}

impl Default for PatternStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractionStrategy for PatternStrategy {
    fn name(&self) -> &'static str {
        "pattern"
    }

    fn extract(&self, content: &RawPageContent) -> Result<ExtractedFields, ExtractionUnavailable> {
        Ok(self.extract_fields(content))
    }
}

fn first(rule: &impl FieldRule, text: &str) -> String {
    rule.find(text).map(|m| m.value).unwrap_or_default()
}
