//! Input and output collaborators: descriptor sources and record sinks.

pub mod sink;
pub mod source;

pub use sink::{save_records, write_records};
pub use source::{load_descriptors, read_descriptors, sheet_export_url};
