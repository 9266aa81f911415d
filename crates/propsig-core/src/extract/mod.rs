//! Signature field extraction strategies.

pub mod backend;
mod pattern;
pub mod rules;
mod semantic;

pub use backend::{ChatBackend, ChatRequest, OpenAiBackend};
pub use pattern::PatternStrategy;
pub use semantic::{parse_fields, SemanticStrategy};

use crate::error::ExtractionUnavailable;
use crate::models::record::ExtractedFields;
use crate::page::RawPageContent;

/// Trait for signature field extraction strategies.
pub trait ExtractionStrategy {
    /// Short name used in logs and summaries.
    fn name(&self) -> &'static str;

    /// Extract the four fields from one page's content.
    ///
    /// A field that is simply absent is an empty string in an `Ok` result;
    /// `Err` means the strategy could not run at all.
    fn extract(&self, content: &RawPageContent) -> Result<ExtractedFields, ExtractionUnavailable>;
}

impl<S: ExtractionStrategy + ?Sized> ExtractionStrategy for Box<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn extract(&self, content: &RawPageContent) -> Result<ExtractedFields, ExtractionUnavailable> {
        (**self).extract(content)
    }
}
