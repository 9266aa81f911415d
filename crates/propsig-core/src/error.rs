//! Error types for the propsig-core library.

use thiserror::Error;

/// Main error type for the propsig library.
#[derive(Error, Debug)]
pub enum PropsigError {
    /// Page fetch error.
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Semantic extraction was unavailable.
    #[error("extraction unavailable: {0}")]
    Extraction(#[from] ExtractionUnavailable),

    /// Descriptor source error.
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    /// Record sink error.
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised by a page fetcher.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The page could not be loaded.
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// The page did not load in time.
    #[error("timed out: {0}")]
    Timeout(String),

    /// The session is not allowed to see the page.
    #[error("access denied: {0}")]
    AccessDenied(String),
}

/// Reasons the semantic extraction service could not produce a result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionUnavailable {
    /// No credential configured for the service.
    #[error("no API credential configured")]
    MissingCredential,

    /// The service answered with an error status.
    #[error("service error: {0}")]
    Service(String),

    /// The service could not be reached.
    #[error("transport error: {0}")]
    Http(String),

    /// The service answered with something that is not a field record.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for ExtractionUnavailable {
    fn from(err: reqwest::Error) -> Self {
        ExtractionUnavailable::Http(err.to_string())
    }
}

/// Failure of a single batch item outside the normal fetch/extract path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ItemFailure {
    /// The descriptor cannot be processed (missing or invalid URL).
    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(String),

    /// Processing panicked.
    #[error("processing panicked: {0}")]
    Panicked(String),
}

/// Errors reading the descriptor source.
#[derive(Error, Debug)]
pub enum SourceError {
    /// CSV decoding failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Download of a remote sheet failed.
    #[error("download failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The sheet URL could not be mapped to a CSV export.
    #[error("unrecognised sheet URL: {0}")]
    SheetUrl(String),

    /// Required column missing from the header row.
    #[error("missing column: {0}")]
    MissingColumn(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors writing enriched records.
#[derive(Error, Debug)]
pub enum SinkError {
    /// CSV encoding failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Records in one batch disagree on their columns.
    #[error("record {index} has columns that differ from the header")]
    ColumnMismatch { index: usize },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for the propsig library.
pub type Result<T> = std::result::Result<T, PropsigError>;
