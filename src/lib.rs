//! # Ledger Ingest
//!
//! Loads an account's transaction CSV, writes every transaction to a keyed
//! store in bounded batches and computes a per-month summary.
//!
//! ## Design Principles
//!
//! - **All or nothing parsing**: the first invalid row aborts the file
//! - **Exact sums**: amounts are `rust_decimal` values, summed in input order
//! - **Bounded writes**: at most 25 items per store request, unprocessed items retried 3 times
//! - **Deterministic output**: summary buckets ordered by year then month
//!
//! ## Example
//!
//! ```
//! use ledger_ingest::{
//!     CancelToken, JsonNotifier, MemoryStore, Pipeline, SourceFile, TransactionParser,
//! };
//! use std::io::Cursor;
//!
//! let csv = "Id,Date,Transaction\n1,1/1,-150\n2,1/3,+900.5\n";
//! let mut pipeline = Pipeline::new(
//!     TransactionParser::new(2024),
//!     MemoryStore::new(),
//!     JsonNotifier::new(Vec::new()),
//! );
//! let report = pipeline
//!     .process(Cursor::new(csv), &SourceFile::new("acc-1", None), &CancelToken::new())
//!     .unwrap();
//! assert_eq!(report.transaction_count, 2);
//! ```

pub mod amount;
pub mod error;
pub mod parser;
pub mod persister;
pub mod pipeline;
pub mod store;
pub mod summary;
pub mod transaction;

pub use amount::Amount;
pub use error::{IngestError, Result};
pub use parser::{CancelToken, TransactionParser};
pub use persister::BatchPersister;
pub use pipeline::{JsonNotifier, Pipeline, ProcessingReport, SourceFile, SummaryNotifier};
pub use store::{BatchStore, JsonLinesStore, MemoryStore, StoreError};
pub use summary::{summarize, BucketRow, MonthlySummary, Summary};
pub use transaction::{Transaction, TransactionItem};
