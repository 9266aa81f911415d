//! Common regex patterns for signature certificate extraction.
//!
//! All patterns run against the plain text produced by
//! [`RawPageContent::text`](crate::page::RawPageContent::text), where every
//! block element sits on its own line and runs of whitespace are single spaces.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Labels whose value follows on the same line or the next one
    pub static ref SIGNED_BY: Regex = Regex::new(
        r"(?i)\bsigned\s+by\b[ \t]*[:\-]?[ \t]*\n?[ \t]*([^\n]+)"
    ).unwrap();

    pub static ref SENT_BY: Regex = Regex::new(
        r"(?i)\bsent\s+by\b[ \t]*[:\-]?[ \t]*\n?[ \t]*([^\n]+)"
    ).unwrap();

    // Where one label's value runs into the next label on the same line
    pub static ref LABEL_BOUNDARY: Regex = Regex::new(
        r"(?i)\b(?:(?:accepted\s+and\s+)?(?:signed|sent)\s+(?:by|on|date)\b|ip(?:\s+address)?\s*:|date\s*:|on\s+\d)"
    ).unwrap();

    // A captured value that is itself a label
    pub static ref LABEL_VALUE: Regex = Regex::new(
        r"(?i)^(?:accepted\b|signed\b|sent\b|ip\b|ip\s+address\b|date\b|signature\b)"
    ).unwrap();

    // Date context markers, most specific first
    pub static ref SIGNED_DATE_MARKER: Regex = Regex::new(
        r"(?i)\bsigned\s+(?:on|date)\b|\bdate\s+(?:of\s+)?sign(?:ed|ing|ature)\b"
    ).unwrap();

    pub static ref SIGNED_MARKER: Regex = Regex::new(
        r"(?i)\bsign(?:ed|ature)\b"
    ).unwrap();

    // Date-shaped tokens; group 1 is the date, the whole match adds a time
    pub static ref DATE_TOKEN: Regex = Regex::new(concat!(
        r"(?i)\b(",
        r"\d{4}-\d{1,2}-\d{1,2}",
        r"|\d{1,2}[./\-]\d{1,2}[./\-](?:\d{4}|\d{2})",
        r"|\d{1,2}(?:st|nd|rd|th)?[ \t]+(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?,?[ \t]+\d{4}",
        r"|(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?[ \t]+\d{1,2}(?:st|nd|rd|th)?,?[ \t]+\d{4}",
        r")\b",
        r"(?:,?[ \t]+(?:at[ \t]+)?\d{1,2}:\d{2}(?::\d{2})?(?:[ \t]*[ap]m\b)?(?:[ \t]+(?:utc|gmt)(?:[+\-]\d{1,2}(?::?\d{2})?)?)?)?",
    )).unwrap();

    pub static ref ORDINAL_SUFFIX: Regex = Regex::new(
        r"(?i)(\d)(?:st|nd|rd|th)\b"
    ).unwrap();

    // Network address context markers
    pub static ref IP_MARKER: Regex = Regex::new(
        r"(?i)\bip\b|\bsignature\b|\bcertificate\b"
    ).unwrap();

    pub static ref IPV4: Regex = Regex::new(
        r"\b(?:\d{1,3}\.){3}\d{1,3}\b"
    ).unwrap();

    pub static ref IPV6: Regex = Regex::new(
        r"(?i)(?:[0-9a-f]{0,4}:){2,7}(?:[0-9a-f]{1,4}|(?:\d{1,3}\.){3}\d{1,3})?"
    ).unwrap();
}
