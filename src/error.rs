//! Error types for the ingestion pipeline.

use crate::store::StoreError;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Errors that can occur while ingesting a transaction file.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Failed to open or read the input
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The CSV stream itself is malformed
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// The input has no header line to discard
    #[error("Input is empty: expected a header line")]
    MissingHeader,

    /// A field failed validation
    #[error("Invalid {field} '{value}' at line {line}: {reason}")]
    InvalidField {
        line: usize,
        field: &'static str,
        value: String,
        reason: String,
    },

    /// A record does not have the expected number of fields
    #[error("Expected {expected} fields at line {line}, found {found}")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    /// Parsing was cancelled by the caller
    #[error("Parsing cancelled at line {line}")]
    Cancelled { line: usize },

    /// The store rejected a whole batch request
    #[error("Store request for batch {batch} failed: {source}")]
    Store {
        batch: usize,
        #[source]
        source: StoreError,
    },

    /// Items remained unprocessed after the retry budget was spent
    #[error("{unwritten} transactions remain unwritten after retries (failed batches: {failed_batches:?})")]
    Persistence {
        unwritten: usize,
        failed_batches: Vec<usize>,
    },

    /// The store could not be opened
    #[error("Failed to open store: {0}")]
    StoreSetup(#[from] StoreError),

    /// Delivering the summary failed
    #[error("Failed to deliver summary: {0}")]
    Notify(String),
}

impl IngestError {
    /// Returns `true` for errors caused by malformed input, which must never be retried.
    pub fn is_validation(&self) -> bool {
        match self {
            IngestError::InvalidField { .. }
            | IngestError::FieldCount { .. }
            | IngestError::MissingHeader => true,
            IngestError::Csv(e) => !matches!(e.kind(), csv::ErrorKind::Io(_)),
            _ => false,
        }
    }
}
