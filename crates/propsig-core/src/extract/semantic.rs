//! Semantic extraction through a chat completion service.

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::backend::{ChatBackend, ChatRequest, OpenAiBackend};
use super::ExtractionStrategy;
use crate::error::ExtractionUnavailable;
use crate::models::config::SemanticConfig;
use crate::models::record::ExtractedFields;
use crate::page::RawPageContent;

const SYSTEM_PROMPT: &str =
    "You are a data extraction assistant. Extract structured data from HTML and answer with JSON only.";

const INSTRUCTION: &str = r#"The HTML below is the signing certificate and activity timeline of a proposal document.

Return a JSON object with exactly these keys:
  "Signed by"   - the person who accepted and signed the document
  "Signed date" - when the document was signed, as written in the page
  "IP address"  - the IP address recorded for the signature
  "Sent by"     - the person who sent the document

Use an empty string for any value that is not present. Do not invent values."#;

/// Values services use for "nothing here" that mean the empty string.
const PLACEHOLDERS: [&str; 6] = ["not found", "n/a", "na", "none", "unknown", "null"];

/// Extracts the four fields by asking a chat completion service.
///
/// Makes exactly one request per call and never retries; any transport,
/// credential or parsing problem is reported as [`ExtractionUnavailable`].
pub struct SemanticStrategy<B = OpenAiBackend> {
    backend: B,
    model: String,
    max_tokens: u32,
    max_fragment_chars: usize,
}

impl SemanticStrategy<OpenAiBackend> {
    /// Strategy backed by the configured OpenAI-compatible service.
    pub fn from_config(
        config: &SemanticConfig,
        api_key: Option<String>,
    ) -> Result<Self, ExtractionUnavailable> {
        if api_key.is_none() {
            warn!(
                "{} not set, semantic extraction disabled; pattern rules will be used",
                config.api_key_env
            );
        }
        Ok(Self::with_backend(OpenAiBackend::new(config, api_key)?, config))
    }
}

impl<B: ChatBackend> SemanticStrategy<B> {
    /// Strategy over any chat backend.
    pub fn with_backend(backend: B, config: &SemanticConfig) -> Self {
        Self {
            backend,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            max_fragment_chars: config.max_fragment_chars,
        }
    }

    /// Build the request for one page. Only the certificate and timeline
    /// blocks are sent, cut to the configured character ceiling.
    pub fn build_request(&self, content: &RawPageContent) -> ChatRequest {
        let (fragment, truncated) = content.bounded_fragment(self.max_fragment_chars);
        if truncated {
            warn!(
                "Page fragment exceeds {} chars, truncating before semantic extraction",
                self.max_fragment_chars
            );
        }

        let mut user = String::from(INSTRUCTION);
        let hint = content.sent_by_hint();
        if !hint.is_empty() {
            user.push_str(&format!(
                "\n\nThe timeline already names the sender as \"{}\"; keep that value for \"Sent by\".",
                hint
            ));
        }
        user.push_str("\n\nHTML:\n");
        user.push_str(&fragment);

        ChatRequest {
            model: self.model.clone(),
            system: SYSTEM_PROMPT.to_string(),
            user,
            max_tokens: self.max_tokens,
        }
    }
}

impl<B: ChatBackend> ExtractionStrategy for SemanticStrategy<B> {
    fn name(&self) -> &'static str {
        "semantic"
    }

    fn extract(&self, content: &RawPageContent) -> Result<ExtractedFields, ExtractionUnavailable> {
        if !self.backend.has_credential() {
            return Err(ExtractionUnavailable::MissingCredential);
        }
        if content.is_empty() {
            debug!("Empty page content, skipping semantic request");
            return Ok(ExtractedFields::empty());
        }

        let request = self.build_request(content);
        let reply = self.backend.complete(&request)?;
        info!("Semantic extraction response received");

        let mut fields = parse_fields(&reply)?;

        let hint = content.sent_by_hint();
        if !hint.is_empty() {
            fields.sent_by = hint;
        }

        Ok(fields)
    }
}

/// Map a service reply onto the four fields.
///
/// Accepts the reply wrapped in a Markdown code fence, matches keys loosely
/// (`Signed by`, `signed_by`, `signedBy` are the same key) and turns missing
/// keys, nulls and "not found" placeholders into empty strings. Anything that
/// is not a JSON object is malformed.
pub fn parse_fields(reply: &str) -> Result<ExtractedFields, ExtractionUnavailable> {
    let body = strip_code_fence(reply);

    let value: Value = serde_json::from_str(body)
        .map_err(|e| ExtractionUnavailable::Malformed(format!("invalid JSON: {}", e)))?;

    let object = value
        .as_object()
        .ok_or_else(|| ExtractionUnavailable::Malformed("reply is not a JSON object".to_string()))?;

    Ok(ExtractedFields {
        signed_by: lookup(object, &["signedby", "signer", "signername"]),
        signed_date: lookup(object, &["signeddate", "signedon", "datesigned", "signaturedate"]),
        ip_address: lookup(object, &["ipaddress", "ip", "signerip"]),
        sent_by: lookup(object, &["sentby", "sender", "sendername"]),
    })
}

fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    match trimmed.strip_prefix("```") {
        Some(rest) => {
            let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphabetic());
            rest.strip_suffix("```").unwrap_or(rest).trim()
        }
        None => trimmed,
    }
}

fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

fn lookup(object: &Map<String, Value>, aliases: &[&str]) -> String {
    object
        .iter()
        .find(|(k, _)| aliases.contains(&normalize_key(k).as_str()))
        .map(|(_, v)| value_to_field(v))
        .unwrap_or_default()
}

fn value_to_field(value: &Value) -> String {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    };

    if PLACEHOLDERS.contains(&text.to_lowercase().as_str()) {
        String::new()
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    /// Backend that replays a canned reply and records requests.
    struct Canned {
        reply: Result<String, ExtractionUnavailable>,
        requests: RefCell<Vec<ChatRequest>>,
    }

    impl Canned {
        fn ok(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                requests: RefCell::new(Vec::new()),
            }
        }

        fn err(err: ExtractionUnavailable) -> Self {
            Self {
                reply: Err(err),
                requests: RefCell::new(Vec::new()),
            }
        }
    }

    impl ChatBackend for Canned {
        fn complete(&self, request: &ChatRequest) -> Result<String, ExtractionUnavailable> {
            self.requests.borrow_mut().push(request.clone());
            self.reply.clone()
        }
    }

    fn content() -> RawPageContent {
        RawPageContent::from_fragment("<div>Accepted and Signed by</div><div>Katy Sully</div>")
    }

    #[test]
    fn test_parse_exact_keys() {
        let fields = parse_fields(
            r#"{"Signed by": "Katy Sully", "Signed date": "08 May 2025", "IP address": "203.0.113.7", "Sent by": "Alex Reed"}"#,
        )
        .unwrap();

        assert_eq!(
            fields,
            ExtractedFields {
                signed_by: "Katy Sully".into(),
                signed_date: "08 May 2025".into(),
                ip_address: "203.0.113.7".into(),
                sent_by: "Alex Reed".into(),
            }
        );
    }

    #[test]
    fn test_parse_is_permissive() {
        let reply = "```json\n{\"signed_by\": \" Jane Doe \", \"signedDate\": null, \"ip\": \"Not found\", \"extra\": 1}\n```";
        let fields = parse_fields(reply).unwrap();

        assert_eq!(fields.signed_by, "Jane Doe");
        assert_eq!(fields.signed_date, "");
        assert_eq!(fields.ip_address, "");
        assert_eq!(fields.sent_by, "");
    }

    #[test]
    fn test_parse_rejects_non_objects() {
        assert!(matches!(parse_fields("Sorry, I can't."), Err(ExtractionUnavailable::Malformed(_))));
        assert!(matches!(parse_fields("[1, 2]"), Err(ExtractionUnavailable::Malformed(_))));
    }

    #[test]
    fn test_extract_sends_fragment_and_hint() {
        let backend = Canned::ok(r#"{"Signed by": "Katy Sully", "Sent by": "Someone Else"}"#);
        let strategy = SemanticStrategy::with_backend(&backend, &SemanticConfig::default());

        let content = RawPageContent {
            timeline_html: r#"<div class="timeline-block"><div class="timeline-title">Sent by Alex Reed</div></div>"#.into(),
            sent_by_titles: vec!["Sent by Alex Reed".into()],
            ..content()
        };

        let fields = strategy.extract(&content).unwrap();
        assert_eq!(fields.signed_by, "Katy Sully");
        assert_eq!(fields.sent_by, "Alex Reed");

        let requests = backend.requests.borrow();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "gpt-4o-mini");
        assert!(requests[0].user.contains("Katy Sully"));
        assert!(requests[0].user.contains("\"Alex Reed\""));
    }

    #[test]
    fn test_fragment_is_truncated() {
        let backend = Canned::ok("{}");
        let config = SemanticConfig {
            max_fragment_chars: 10,
            ..SemanticConfig::default()
        };
        let strategy = SemanticStrategy::with_backend(&backend, &config);

        let request = strategy.build_request(&content());
        assert!(request.user.ends_with("HTML:\n<div>Accep"));
    }

    #[test]
    fn test_backend_failure_is_unavailable() {
        let backend = Canned::err(ExtractionUnavailable::Http("connection refused".into()));
        let strategy = SemanticStrategy::with_backend(&backend, &SemanticConfig::default());

        assert_eq!(
            strategy.extract(&content()),
            Err(ExtractionUnavailable::Http("connection refused".into()))
        );
    }

    #[test]
    fn test_empty_content_skips_request() {
        let backend = Canned::ok("not json");
        let strategy = SemanticStrategy::with_backend(&backend, &SemanticConfig::default());

        assert_eq!(strategy.extract(&RawPageContent::default()), Ok(ExtractedFields::empty()));
        assert!(backend.requests.borrow().is_empty());
    }

    #[test]
    fn test_missing_credential() {
        let strategy = SemanticStrategy::from_config(&SemanticConfig::default(), None).unwrap();
        assert_eq!(
            strategy.extract(&content()),
            Err(ExtractionUnavailable::MissingCredential)
        );
        // Empty pages are not answered without a credential either.
        assert_eq!(
            strategy.extract(&RawPageContent::default()),
            Err(ExtractionUnavailable::MissingCredential)
        );
    }
}
