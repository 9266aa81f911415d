//! Record sink: enriched records to CSV.

use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::error::SinkError;
use crate::models::record::EnrichedRecord;

/// Write records as CSV under `header`. Every record must carry exactly
/// these columns; an empty batch still writes the header.
pub fn write_records<W: Write>(
    writer: W,
    header: &[String],
    records: &[EnrichedRecord],
) -> Result<(), SinkError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(header)?;

    for (index, record) in records.iter().enumerate() {
        if !record.headers().eq(header.iter().map(String::as_str)) {
            return Err(SinkError::ColumnMismatch { index });
        }
        wtr.write_record(record.values())?;
    }

    wtr.flush()?;
    Ok(())
}

/// Write records to a CSV file, creating parent directories as needed.
pub fn save_records(
    path: &Path,
    header: &[String],
    records: &[EnrichedRecord],
) -> Result<(), SinkError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = std::fs::File::create(path)?;
    write_records(file, header, records)?;
    info!("Results saved to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::ColumnNames;
    use crate::models::record::{DocumentDescriptor, ExtractedFields, EXTRACTED_COLUMNS};

    fn descriptor(company: &str) -> DocumentDescriptor {
        DocumentDescriptor::from_columns(
            [("Company", company), ("Document type", "https://x/view?id=1")],
            &ColumnNames::default(),
        )
    }

    fn record(company: &str, signer: &str) -> EnrichedRecord {
        let fields = ExtractedFields {
            signed_by: signer.to_string(),
            ..ExtractedFields::default()
        };
        EnrichedRecord::merge(&descriptor(company), &fields)
    }

    fn header() -> Vec<String> {
        EnrichedRecord::header_for(Some(&descriptor("")))
    }

    #[test]
    fn test_write_records() {
        let mut out = Vec::new();
        write_records(&mut out, &header(), &[record("A, Inc.", "Jane Doe"), record("B", "")])
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "Company,Document type,Extracted Signed by,Extracted Signed date,Extracted IP address,Extracted Sent by"
        );
        assert_eq!(lines[1], "\"A, Inc.\",https://x/view?id=1,Jane Doe,,,");
        assert_eq!(lines[2], "B,https://x/view?id=1,,,,");
    }

    #[test]
    fn test_column_mismatch() {
        let other = EnrichedRecord::merge(
            &DocumentDescriptor::from_columns([("Client", "C")], &ColumnNames::default()),
            &ExtractedFields::empty(),
        );

        let err = write_records(Vec::new(), &header(), &[record("A", ""), other]).unwrap_err();
        assert!(matches!(err, SinkError::ColumnMismatch { index: 1 }));
    }

    #[test]
    fn test_save_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("proposal.csv");

        save_records(&path, &header(), &[record("A", "Jane Doe")]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("Jane Doe"));
    }

    #[test]
    fn test_empty_batch_keeps_source_columns() {
        let mut out = Vec::new();
        write_records(&mut out, &header(), &[]).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap().trim_end(),
            format!("Company,Document type,{}", EXTRACTED_COLUMNS.join(","))
        );
    }

    #[test]
    fn test_no_descriptor_writes_extracted_columns() {
        let mut out = Vec::new();
        write_records(&mut out, &EnrichedRecord::header_for(None), &[]).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap().trim_end(),
            EXTRACTED_COLUMNS.join(",")
        );
    }
}
