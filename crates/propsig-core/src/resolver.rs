//! Per-document resolution: fetch, try the primary strategy, fall back.

use std::fmt;

use tracing::{debug, warn};

use crate::error::{ExtractionUnavailable, FetchError};
use crate::extract::{ExtractionStrategy, PatternStrategy};
use crate::models::record::ExtractedFields;
use crate::page::{PageFetcher, RawPageContent};

/// Which path produced a document's fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractionSource {
    /// The primary strategy answered.
    Semantic,
    /// The primary strategy was unavailable; pattern rules answered.
    Pattern,
    /// The page could not be fetched; fields are empty.
    Unresolved,
}

impl fmt::Display for ExtractionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionSource::Semantic => write!(f, "semantic"),
            ExtractionSource::Pattern => write!(f, "pattern"),
            ExtractionSource::Unresolved => write!(f, "unresolved"),
        }
    }
}

/// Outcome of resolving one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The extracted fields; all empty when unresolved.
    pub fields: ExtractedFields,
    /// Path that produced them.
    pub source: ExtractionSource,
    /// Why the page could not be fetched, when it could not.
    pub fetch_error: Option<FetchError>,
    /// Why the primary strategy was skipped, when it was.
    pub primary_error: Option<ExtractionUnavailable>,
}

impl Resolution {
    fn unresolved(err: FetchError) -> Self {
        Self {
            fields: ExtractedFields::empty(),
            source: ExtractionSource::Unresolved,
            fetch_error: Some(err),
            primary_error: None,
        }
    }
}

/// Resolution state machine.
///
/// `Fetching → PrimaryAttempt → Done`, or
/// `Fetching → PrimaryAttempt → FallbackAttempt → Done`, or
/// `Fetching → Done` when the page cannot be loaded.
enum ResolveState<'u> {
    Fetching { url: &'u str },
    PrimaryAttempt { content: RawPageContent, attempt: u32 },
    FallbackAttempt { content: RawPageContent, reason: ExtractionUnavailable },
    Done(Resolution),
}

impl ResolveState<'_> {
    fn label(&self) -> &'static str {
        match self {
            ResolveState::Fetching { .. } => "FETCHING",
            ResolveState::PrimaryAttempt { .. } => "PRIMARY_ATTEMPT",
            ResolveState::FallbackAttempt { .. } => "FALLBACK_ATTEMPT",
            ResolveState::Done(_) => "DONE",
        }
    }
}

/// Resolves the four fields of one document, degrading from the primary
/// strategy to pattern rules when the primary is unavailable.
pub struct DocumentFieldResolver {
    primary: Box<dyn ExtractionStrategy>,
    fallback: PatternStrategy,
    primary_attempts: u32,
}

impl DocumentFieldResolver {
    /// Create a resolver over `primary`, falling back to [`PatternStrategy`].
    pub fn new(primary: impl ExtractionStrategy + 'static) -> Self {
        Self {
            primary: Box::new(primary),
            fallback: PatternStrategy::new(),
            primary_attempts: 1,
        }
    }

    /// Attempts at the primary strategy before falling back (minimum 1).
    pub fn with_primary_attempts(mut self, attempts: u32) -> Self {
        self.primary_attempts = attempts.max(1);
        self
    }

    /// Fetch and resolve one document.
    pub fn resolve(&self, document_url: &str, fetcher: &dyn PageFetcher) -> ExtractedFields {
        self.resolve_traced(document_url, fetcher).fields
    }

    /// Fetch and resolve one document, reporting which path was taken.
    pub fn resolve_traced(&self, document_url: &str, fetcher: &dyn PageFetcher) -> Resolution {
        self.drive(ResolveState::Fetching { url: document_url }, Some(fetcher))
    }

    /// Resolve content that has already been fetched.
    pub fn resolve_content(&self, content: RawPageContent) -> Resolution {
        self.drive(ResolveState::PrimaryAttempt { content, attempt: 1 }, None)
    }

    fn drive(&self, mut state: ResolveState<'_>, fetcher: Option<&dyn PageFetcher>) -> Resolution {
        loop {
            debug!("Resolver state {}", state.label());

            state = match state {
                ResolveState::Fetching { url } => {
                    let fetched = match fetcher {
                        Some(fetcher) => fetcher.fetch(url),
                        None => Err(FetchError::Navigation("no page fetcher".to_string())),
                    };
                    match fetched {
                        Ok(content) => ResolveState::PrimaryAttempt { content, attempt: 1 },
                        Err(err) => {
                            warn!("Failed to fetch {}: {}", url, err);
                            ResolveState::Done(Resolution::unresolved(err))
                        }
                    }
                }
                ResolveState::PrimaryAttempt { content, attempt } => {
                    match self.primary.extract(&content) {
                        Ok(fields) => ResolveState::Done(Resolution {
                            fields,
                            source: ExtractionSource::Semantic,
                            fetch_error: None,
                            primary_error: None,
                        }),
                        Err(reason) if attempt < self.primary_attempts => {
                            debug!(
                                "{} strategy attempt {} failed: {}",
                                self.primary.name(),
                                attempt,
                                reason
                            );
                            ResolveState::PrimaryAttempt {
                                content,
                                attempt: attempt + 1,
                            }
                        }
                        Err(reason) => {
                            warn!(
                                "{} strategy unavailable ({}), using pattern rules",
                                self.primary.name(),
                                reason
                            );
                            ResolveState::FallbackAttempt { content, reason }
                        }
                    }
                }
                ResolveState::FallbackAttempt { content, reason } => {
                    ResolveState::Done(Resolution {
                        fields: self.fallback.extract_fields(&content),
                        source: ExtractionSource::Pattern,
                        fetch_error: None,
                        primary_error: Some(reason),
                    })
                }
                ResolveState::Done(resolution) => return resolution,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use std::rc::Rc;

    const FRAGMENT: &str = "<div>Signed by: Jane Doe</div><div>Sent by: John Smith</div>\
                            <div>IP: 192.168.1.1</div><div>Signed Date: 2024-01-15</div>";

    struct Unavailable {
        calls: Rc<Cell<u32>>,
    }

    impl ExtractionStrategy for Unavailable {
        fn name(&self) -> &'static str {
            "unavailable"
        }

        fn extract(&self, _: &RawPageContent) -> Result<ExtractedFields, ExtractionUnavailable> {
            self.calls.set(self.calls.get() + 1);
            Err(ExtractionUnavailable::MissingCredential)
        }
    }

    struct Fixed(ExtractedFields);

    impl ExtractionStrategy for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn extract(&self, _: &RawPageContent) -> Result<ExtractedFields, ExtractionUnavailable> {
            Ok(self.0.clone())
        }
    }

    struct StaticPage(&'static str);

    impl PageFetcher for StaticPage {
        fn fetch(&self, _: &str) -> Result<RawPageContent, FetchError> {
            Ok(RawPageContent::from_page_html(self.0))
        }
    }

    struct TimingOut;

    impl PageFetcher for TimingOut {
        fn fetch(&self, url: &str) -> Result<RawPageContent, FetchError> {
            Err(FetchError::Timeout(url.to_string()))
        }
    }

    fn unavailable() -> (Unavailable, Rc<Cell<u32>>) {
        let calls = Rc::new(Cell::new(0));
        (Unavailable { calls: calls.clone() }, calls)
    }

    #[test]
    fn test_primary_result_is_used() {
        let expected = ExtractedFields {
            signed_by: "From Primary".into(),
            ..ExtractedFields::default()
        };
        let resolver = DocumentFieldResolver::new(Fixed(expected.clone()));

        let resolution = resolver.resolve_traced("https://x/view?id=1", &StaticPage(FRAGMENT));
        assert_eq!(resolution.source, ExtractionSource::Semantic);
        assert_eq!(resolution.fields, expected);
    }

    #[test]
    fn test_unavailable_primary_degrades_to_pattern_rules() {
        let (primary, calls) = unavailable();
        let resolver = DocumentFieldResolver::new(primary);

        let resolution = resolver.resolve_traced("https://x/view?id=1", &StaticPage(FRAGMENT));
        let direct = PatternStrategy::new().extract_fields(&RawPageContent::from_page_html(FRAGMENT));

        assert_eq!(resolution.source, ExtractionSource::Pattern);
        assert_eq!(resolution.primary_error, Some(ExtractionUnavailable::MissingCredential));
        assert_eq!(resolution.fields, direct);
        assert_eq!(resolution.fields.signed_by, "Jane Doe");
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_unavailable_primary_matches_pattern_rules_for_any_content() {
        let certificate_page = r#"
            <div class="timeline-block"><div class="timeline-title">Sent by Alex Reed</div></div>
            <div class="timeline-contentblock-certificate">
              <div>Accepted and Signed by</div><div>Katy Sully</div>
              <div>Accepted and Signed on</div><div>08 May 2025 14:32</div>
              <div>IP Address from signature location</div><div>203.0.113.7</div>
            </div>"#;

        let contents = vec![
            RawPageContent::from_page_html(certificate_page),
            RawPageContent::from_page_html("<html><body><p>Signed by: Jane Doe</p><p>IP: 10.1.2.3</p></body></html>"),
            RawPageContent::from_page_html("<html><body><h1>Proposal</h1></body></html>"),
            RawPageContent::default(),
            RawPageContent::from_fragment(r#"<div class="timeline-title">Sent by John Smith</div>"#),
            RawPageContent::from_fragment(FRAGMENT),
        ];

        let (primary, calls) = unavailable();
        let resolver = DocumentFieldResolver::new(primary);
        let pattern = PatternStrategy::new();

        for content in contents {
            let expected = pattern.extract_fields(&content);
            let resolution = resolver.resolve_content(content);

            assert_eq!(resolution.source, ExtractionSource::Pattern);
            assert_eq!(resolution.fields, expected);
        }
        assert_eq!(calls.get(), 6);
    }

    #[test]
    fn test_empty_page_without_credential_is_pattern() {
        let primary = crate::extract::SemanticStrategy::from_config(
            &crate::models::config::SemanticConfig::default(),
            None,
        )
        .unwrap();
        let resolver = DocumentFieldResolver::new(primary);

        let resolution = resolver.resolve_content(RawPageContent::default());
        assert_eq!(resolution.source, ExtractionSource::Pattern);
        assert_eq!(resolution.primary_error, Some(ExtractionUnavailable::MissingCredential));
        assert!(resolution.fields.is_empty());
    }

    #[test]
    fn test_fetch_failure_is_terminal_and_empty() {
        let (primary, calls) = unavailable();
        let resolver = DocumentFieldResolver::new(primary);

        let resolution = resolver.resolve_traced("https://x/view?id=1", &TimingOut);

        assert_eq!(resolution.source, ExtractionSource::Unresolved);
        assert!(resolution.fields.is_empty());
        assert_eq!(
            resolution.fetch_error,
            Some(FetchError::Timeout("https://x/view?id=1".into()))
        );
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_primary_attempts_are_bounded() {
        let (primary, calls) = unavailable();
        let resolver = DocumentFieldResolver::new(primary).with_primary_attempts(3);

        let resolution = resolver.resolve_content(RawPageContent::from_fragment(FRAGMENT));

        assert_eq!(resolution.source, ExtractionSource::Pattern);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let (primary, _) = unavailable();
        let resolver = DocumentFieldResolver::new(primary);
        let page = StaticPage(FRAGMENT);

        let first = resolver.resolve("https://x/view?id=1", &page);
        let second = resolver.resolve("https://x/view?id=1", &page);
        assert_eq!(first, second);
    }
}
