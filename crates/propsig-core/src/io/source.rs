//! Descriptor source: CSV files and published Google Sheets.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info};

use crate::error::SourceError;
use crate::models::config::ColumnNames;
use crate::models::record::DocumentDescriptor;

lazy_static! {
    static ref SHEET_ID: Regex = Regex::new(r"/spreadsheets/d/([a-zA-Z0-9\-_]+)").unwrap();
    static ref SHEET_GID: Regex = Regex::new(r"[#?&]gid=(\d+)").unwrap();
}

/// Read descriptors from CSV with a header row, one per data row.
///
/// Rows shorter than the header are padded with empty values. Rows with
/// nothing in them are kept; the batch reports them as invalid descriptors.
pub fn read_descriptors<R: Read>(
    reader: R,
    names: &ColumnNames,
) -> Result<Vec<DocumentDescriptor>, SourceError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
    if !headers.iter().any(|h| h == &names.document_url) {
        return Err(SourceError::MissingColumn(names.document_url.clone()));
    }

    let mut descriptors = Vec::new();
    for row in rdr.records() {
        let row = row?;
        let columns = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), row.get(i).unwrap_or_default().to_string()));
        descriptors.push(DocumentDescriptor::from_columns(columns, names));
    }

    debug!("Read {} descriptors", descriptors.len());
    Ok(descriptors)
}

/// Load descriptors from a local CSV path or an `http(s)` URL.
///
/// Google Sheets links are rewritten to their CSV export.
pub fn load_descriptors(
    location: &str,
    names: &ColumnNames,
) -> Result<Vec<DocumentDescriptor>, SourceError> {
    let descriptors = if location.starts_with("http://") || location.starts_with("https://") {
        let url = sheet_export_url(location)?;
        info!("Downloading sheet from {}", url);

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        let body = client.get(&url).send()?.error_for_status()?.bytes()?;
        read_descriptors(body.as_ref(), names)?
    } else {
        read_descriptors(File::open(Path::new(location))?, names)?
    };

    info!("Successfully read sheet with {} rows", descriptors.len());
    Ok(descriptors)
}

/// CSV export URL for a sheet link. Non-Google URLs are returned unchanged.
pub fn sheet_export_url(url: &str) -> Result<String, SourceError> {
    if !url.contains("docs.google.com/spreadsheets") || url.contains("format=csv") {
        return Ok(url.to_string());
    }

    let id = SHEET_ID
        .captures(url)
        .map(|c| c[1].to_string())
        .ok_or_else(|| SourceError::SheetUrl(url.to_string()))?;

    let mut export = format!(
        "https://docs.google.com/spreadsheets/d/{}/export?format=csv",
        id
    );
    if let Some(gid) = SHEET_GID.captures(url) {
        export.push_str("&gid=");
        export.push_str(&gid[1]);
    }

    Ok(export)
}
