//! Structural faults raised while turning source files into datasets.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    /// A row has a different number of cells than the header.
    #[error("row {row} has {found} cells but the header has {expected} columns")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),

    #[error("expected a top-level JSON array of records")]
    NotAnArray,

    #[error("record {0} is not a JSON object")]
    RecordNotObject(usize),
}
