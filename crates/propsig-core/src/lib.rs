//! Core library for proposal signature extraction.
//!
//! This crate provides:
//! - Document page slicing (certificate and timeline blocks)
//! - Semantic field extraction through a chat completion service
//! - Pattern-rule field extraction used when the service is unavailable
//! - Per-document resolution and batch enrichment of sheet rows
//! - CSV/Google Sheets descriptor sources and CSV record output

pub mod batch;
pub mod error;
pub mod extract;
pub mod io;
pub mod models;
pub mod page;
pub mod resolver;

pub use batch::{BatchContext, BatchProcessor, BatchResult, BatchSummary, ItemOutcome};
pub use error::{ExtractionUnavailable, FetchError, ItemFailure, PropsigError, Result};
pub use extract::{ExtractionStrategy, PatternStrategy, SemanticStrategy};
pub use models::config::PropsigConfig;
pub use models::record::{DocumentDescriptor, EnrichedRecord, ExtractedFields};
pub use page::{DirectoryPageFetcher, HttpPageFetcher, PageFetcher, RawPageContent};
pub use resolver::{DocumentFieldResolver, ExtractionSource, Resolution};
