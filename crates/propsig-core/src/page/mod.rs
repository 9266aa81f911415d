//! Document page content and the capability that loads it.

mod fetch;

pub use fetch::{DirectoryPageFetcher, HttpPageFetcher, PageFetcher};

use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::debug;

lazy_static! {
    static ref CERTIFICATE: Selector =
        Selector::parse(".timeline-contentblock-certificate").unwrap();
    static ref TIMELINE_BLOCK: Selector = Selector::parse(".timeline-block").unwrap();
    static ref TIMELINE_TITLE: Selector = Selector::parse(".timeline-title").unwrap();
}

const SENT_BY_LABEL: &str = "Sent by";

const SKIP_TAGS: [&str; 4] = ["script", "style", "noscript", "template"];

const BLOCK_TAGS: [&str; 18] = [
    "address", "article", "br", "dd", "div", "dl", "dt", "footer", "h1", "h2", "h3", "h4",
    "header", "li", "p", "section", "td", "tr",
];

/// The HTML fragments of one document page that carry signature data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPageContent {
    /// Outer HTML of the signing certificate block.
    pub certificate_html: String,
    /// Outer HTML of every timeline block, in document order.
    pub timeline_html: String,
    /// Text of timeline titles that name the sender.
    pub sent_by_titles: Vec<String>,
}

impl RawPageContent {
    /// Slice a full document page down to the certificate and timeline blocks.
    ///
    /// When neither block exists the whole page becomes the certificate
    /// fragment so pattern rules still see its text.
    pub fn from_page_html(html: &str) -> Self {
        let document = Html::parse_document(html);

        let mut certificate_html = document
            .select(&CERTIFICATE)
            .next()
            .map(|el| el.html())
            .unwrap_or_default();

        let timeline_html: String = document
            .select(&TIMELINE_BLOCK)
            .map(|el| el.html())
            .collect();

        let sent_by_titles = sent_by_titles(&document);

        if certificate_html.is_empty() && timeline_html.is_empty() {
            debug!("No certificate or timeline blocks, keeping whole page");
            certificate_html = document.root_element().html();
        }

        Self {
            certificate_html,
            timeline_html,
            sent_by_titles,
        }
    }

    /// Wrap an already isolated fragment.
    pub fn from_fragment(fragment: impl Into<String>) -> Self {
        let certificate_html = fragment.into();
        let sent_by_titles = sent_by_titles(&Html::parse_fragment(&certificate_html));
        Self {
            certificate_html,
            timeline_html: String::new(),
            sent_by_titles,
        }
    }

    /// Certificate and timeline HTML, concatenated.
    pub fn fragment(&self) -> String {
        let mut out = String::with_capacity(self.certificate_html.len() + self.timeline_html.len());
        out.push_str(&self.certificate_html);
        out.push_str(&self.timeline_html);
        out
    }

    /// The concatenated fragment cut to at most `max_chars` characters.
    ///
    /// Returns the fragment and whether it was cut.
    pub fn bounded_fragment(&self, max_chars: usize) -> (String, bool) {
        let fragment = self.fragment();
        match fragment.char_indices().nth(max_chars) {
            Some((byte_idx, _)) => (fragment[..byte_idx].to_string(), true),
            None => (fragment, false),
        }
    }

    /// Plain text of the fragment, one block element per line.
    pub fn text(&self) -> String {
        let fragment = Html::parse_fragment(&self.fragment());
        let mut raw = String::new();
        push_text(fragment.root_element(), &mut raw);

        raw.lines()
            .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Sender named by the first "Sent by" timeline title, or empty.
    pub fn sent_by_hint(&self) -> String {
        self.sent_by_titles
            .iter()
            .find_map(|title| {
                let idx = title.find(SENT_BY_LABEL)?;
                let rest = title[idx + SENT_BY_LABEL.len()..]
                    .trim_start_matches([':', ' '])
                    .trim();
                (!rest.is_empty()).then(|| rest.to_string())
            })
            .unwrap_or_default()
    }

    /// True when nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.certificate_html.trim().is_empty() && self.timeline_html.trim().is_empty()
    }
}

fn sent_by_titles(document: &Html) -> Vec<String> {
    document
        .select(&TIMELINE_TITLE)
        .map(|el| el.text().collect::<Vec<_>>().join(" "))
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|t| t.contains(SENT_BY_LABEL))
        .collect()
}

fn push_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let tag = el.name();
                if SKIP_TAGS.contains(&tag) {
                    continue;
                }
                let block = BLOCK_TAGS.contains(&tag);
                if block {
                    out.push('\n');
                }
                if let Some(child_el) = ElementRef::wrap(child) {
                    push_text(child_el, out);
                }
                if block {
                    out.push('\n');
                } else {
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
}
