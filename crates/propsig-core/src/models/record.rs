//! Records flowing through a batch: descriptors in, enriched records out.

use serde::{Deserialize, Serialize};

use super::config::ColumnNames;

/// Output column names for the extracted fields, in output order.
pub const EXTRACTED_COLUMNS: [&str; 4] = [
    "Extracted Signed by",
    "Extracted Signed date",
    "Extracted IP address",
    "Extracted Sent by",
];

/// One input row describing a proposal document.
///
/// The well-known columns are lifted into typed fields; `columns` keeps every
/// source column in source order and is what flows into the output record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DocumentDescriptor {
    /// Client company name.
    pub company: String,
    /// Document page URL.
    pub document_url: String,
    /// Proposal value as written in the source.
    pub value: String,
    /// Creation date as written in the source.
    pub date_created: String,
    /// Signing date as written in the source.
    pub signed_on: String,
    /// Signer as written in the source.
    pub signed_by: String,
    /// All source columns, in source order.
    pub columns: Vec<(String, String)>,
}

impl DocumentDescriptor {
    /// Build a descriptor from ordered `(header, value)` pairs.
    pub fn from_columns<I, K, V>(columns: I, names: &ColumnNames) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let columns: Vec<(String, String)> = columns
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let lookup = |name: &str| {
            columns
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.trim().to_string())
                .unwrap_or_default()
        };

        Self {
            company: lookup(&names.company),
            document_url: lookup(&names.document_url),
            value: lookup(&names.value),
            date_created: lookup(&names.date_created),
            signed_on: lookup(&names.signed_on),
            signed_by: lookup(&names.signed_by),
            columns,
        }
    }

    /// Look up a source column by header.
    pub fn get(&self, header: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(k, _)| k == header)
            .map(|(_, v)| v.as_str())
    }
}

/// The four signature fields pulled out of a document page.
///
/// Every field is always present; "not found" is the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExtractedFields {
    #[serde(rename = "Signed by")]
    pub signed_by: String,
    #[serde(rename = "Signed date")]
    pub signed_date: String,
    #[serde(rename = "IP address")]
    pub ip_address: String,
    #[serde(rename = "Sent by")]
    pub sent_by: String,
}

impl ExtractedFields {
    /// All four fields empty.
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when nothing was found at all.
    pub fn is_empty(&self) -> bool {
        self.signed_by.is_empty()
            && self.signed_date.is_empty()
            && self.ip_address.is_empty()
            && self.sent_by.is_empty()
    }

    /// Number of non-empty fields.
    pub fn found_count(&self) -> usize {
        [
            &self.signed_by,
            &self.signed_date,
            &self.ip_address,
            &self.sent_by,
        ]
        .iter()
        .filter(|v| !v.is_empty())
        .count()
    }

    /// Values paired with their namespaced output column names.
    pub fn namespaced(&self) -> [(&'static str, &str); 4] {
        [
            (EXTRACTED_COLUMNS[0], self.signed_by.as_str()),
            (EXTRACTED_COLUMNS[1], self.signed_date.as_str()),
            (EXTRACTED_COLUMNS[2], self.ip_address.as_str()),
            (EXTRACTED_COLUMNS[3], self.sent_by.as_str()),
        ]
    }
}

/// A descriptor merged with its extracted fields. Terminal and immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichedRecord {
    columns: Vec<(String, String)>,
}

impl EnrichedRecord {
    /// Merge the descriptor's columns with the namespaced extracted fields.
    ///
    /// A source column that already carries an extracted column's name is
    /// replaced, so the extracted columns always come last and appear once.
    pub fn merge(descriptor: &DocumentDescriptor, fields: &ExtractedFields) -> Self {
        let mut columns: Vec<(String, String)> = descriptor
            .columns
            .iter()
            .filter(|(k, _)| !EXTRACTED_COLUMNS.contains(&k.as_str()))
            .cloned()
            .collect();

        columns.extend(
            fields
                .namespaced()
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string())),
        );

        Self { columns }
    }

    /// Output header for records merged from `descriptor`; the extracted
    /// columns alone when there is no descriptor to take columns from.
    pub fn header_for(descriptor: Option<&DocumentDescriptor>) -> Vec<String> {
        match descriptor {
            Some(d) => Self::merge(d, &ExtractedFields::empty())
                .headers()
                .map(str::to_string)
                .collect(),
            None => EXTRACTED_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Column headers in output order.
    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(k, _)| k.as_str())
    }

    /// Column values in output order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(_, v)| v.as_str())
    }

    /// Look up a column by header.
    pub fn get(&self, header: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(k, _)| k == header)
            .map(|(_, v)| v.as_str())
    }

    /// The extracted part of the record.
    pub fn extracted(&self) -> ExtractedFields {
        let field = |i: usize| self.get(EXTRACTED_COLUMNS[i]).unwrap_or_default().to_string();
        ExtractedFields {
            signed_by: field(0),
            signed_date: field(1),
            ip_address: field(2),
            sent_by: field(3),
        }
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn descriptor() -> DocumentDescriptor {
        DocumentDescriptor::from_columns(
            [
                ("Company", "BHA Strategy"),
                ("Document type", " https://betterproposals.io/2/proposals/view?id=2366358 "),
                ("Value", "$33,200.00"),
                ("Date Created", "18 Mar 2025"),
                ("Signed On", "08 May 2025"),
                ("Signed by", "Katy Sully"),
            ],
            &ColumnNames::default(),
        )
    }

    #[test]
    fn test_descriptor_typed_fields() {
        let d = descriptor();
        assert_eq!(d.company, "BHA Strategy");
        assert_eq!(
            d.document_url,
            "https://betterproposals.io/2/proposals/view?id=2366358"
        );
        assert_eq!(d.signed_on, "08 May 2025");
        assert_eq!(d.get("Value"), Some("$33,200.00"));
        assert_eq!(d.get("Missing"), None);
    }

    #[test]
    fn test_merge_appends_extracted_columns() {
        let fields = ExtractedFields {
            signed_by: "Katy Sully".into(),
            signed_date: "08 May 2025".into(),
            ip_address: "10.0.0.1".into(),
            sent_by: "Alex Reed".into(),
        };
        let record = EnrichedRecord::merge(&descriptor(), &fields);

        let headers: Vec<&str> = record.headers().collect();
        assert_eq!(
            headers,
            vec![
                "Company",
                "Document type",
                "Value",
                "Date Created",
                "Signed On",
                "Signed by",
                "Extracted Signed by",
                "Extracted Signed date",
                "Extracted IP address",
                "Extracted Sent by",
            ]
        );
        // Source columns pass through untouched, whitespace included.
        assert_eq!(
            record.get("Document type"),
            Some(" https://betterproposals.io/2/proposals/view?id=2366358 ")
        );
        assert_eq!(record.extracted(), fields);
    }

    #[test]
    fn test_merge_replaces_colliding_columns() {
        let d = DocumentDescriptor::from_columns(
            [("Company", "A"), ("Extracted Sent by", "stale")],
            &ColumnNames::default(),
        );
        let record = EnrichedRecord::merge(&d, &ExtractedFields::empty());

        assert_eq!(record.len(), 5);
        assert_eq!(record.get("Extracted Sent by"), Some(""));
    }

    #[test]
    fn test_found_count() {
        let mut fields = ExtractedFields::empty();
        assert!(fields.is_empty());
        fields.ip_address = "::1".into();
        assert_eq!(fields.found_count(), 1);
        assert!(!fields.is_empty());
    }
}
