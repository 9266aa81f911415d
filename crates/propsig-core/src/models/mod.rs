//! Data models for descriptors, extracted fields and configuration.

pub mod config;
pub mod record;

pub use config::{BatchConfig, ColumnNames, FetchConfig, OutputConfig, PropsigConfig, SemanticConfig};
pub use record::{DocumentDescriptor, EnrichedRecord, ExtractedFields, EXTRACTED_COLUMNS};
