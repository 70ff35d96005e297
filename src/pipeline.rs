//! Ingestion pipeline for one transaction file.
//!
//! Parse, stamp the account id, persist, summarize, then hand the summary to
//! a [`SummaryNotifier`] when the source carries a delivery address. Nothing
//! reaches the store unless the whole file parsed.

use crate::error::{IngestError, Result};
use crate::parser::{CancelToken, TransactionParser};
use crate::persister::BatchPersister;
use crate::store::BatchStore;
use crate::summary::{summarize, Summary};
use log::info;
use serde::Serialize;
use std::io::{Read, Write};

/// Metadata that accompanies an input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub account_id: String,

    /// Where to deliver the summary. No address, no notification.
    pub email: Option<String>,
}

impl SourceFile {
    pub fn new(account_id: impl Into<String>, email: Option<String>) -> Self {
        SourceFile {
            account_id: account_id.into(),
            email: email.filter(|address| !address.trim().is_empty()),
        }
    }
}

/// Outcome of processing one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingReport {
    pub account_id: String,
    pub email: Option<String>,
    pub transaction_count: usize,
    pub notified: bool,
    pub summary: Summary,
}

/// Receives the summary of a processed file.
pub trait SummaryNotifier {
    fn notify(&mut self, address: &str, account_id: &str, summary: &Summary) -> Result<()>;
}

impl<N: SummaryNotifier + ?Sized> SummaryNotifier for &mut N {
    fn notify(&mut self, address: &str, account_id: &str, summary: &Summary) -> Result<()> {
        (**self).notify(address, account_id, summary)
    }
}

/// Writes each summary as one JSON line.
pub struct JsonNotifier<W> {
    writer: W,
}

#[derive(Serialize)]
struct SummaryMessage<'a> {
    to: &'a str,
    account_id: &'a str,
    summary: &'a Summary,
}

impl<W: Write> JsonNotifier<W> {
    pub fn new(writer: W) -> Self {
        JsonNotifier { writer }
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> SummaryNotifier for JsonNotifier<W> {
    fn notify(&mut self, address: &str, account_id: &str, summary: &Summary) -> Result<()> {
        let message = SummaryMessage {
            to: address,
            account_id,
            summary,
        };
        serde_json::to_writer(&mut self.writer, &message)
            .map_err(|e| IngestError::Notify(e.to_string()))?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Wires parser, persister and notifier together.
///
/// Holds no per-file state, so one instance can process any number of files.
pub struct Pipeline<S, N> {
    parser: TransactionParser,
    persister: BatchPersister<S>,
    notifier: N,
}

impl<S: BatchStore, N: SummaryNotifier> Pipeline<S, N> {
    pub fn new(parser: TransactionParser, store: S, notifier: N) -> Self {
        Pipeline {
            parser,
            persister: BatchPersister::new(store),
            notifier,
        }
    }

    pub fn store(&self) -> &S {
        self.persister.store()
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Runs the full pipeline over one input stream.
    pub fn process<R: Read>(
        &mut self,
        reader: R,
        source: &SourceFile,
        cancel: &CancelToken,
    ) -> Result<ProcessingReport> {
        info!("Parsing transactions for account {}", source.account_id);
        let mut transactions = self.parser.parse(reader, cancel)?;
        for tx in &mut transactions {
            tx.account_id = source.account_id.clone();
        }
        info!("Parsed {} transactions", transactions.len());

        self.persister.save(&transactions)?;
        info!("Persisted {} transactions", transactions.len());

        let summary = summarize(&transactions);
        info!(
            "Summary for account {}: balance {}, {} monthly buckets",
            source.account_id,
            summary.total_balance,
            summary.buckets().len()
        );

        let notified = match &source.email {
            Some(address) => {
                self.notifier.notify(address, &source.account_id, &summary)?;
                info!("Sent summary to {}", address);
                true
            }
            None => {
                info!("No delivery address for account {}, skipping notification", source.account_id);
                false
            }
        };

        Ok(ProcessingReport {
            account_id: source.account_id.clone(),
            email: source.email.clone(),
            transaction_count: transactions.len(),
            notified,
            summary,
        })
    }
}
