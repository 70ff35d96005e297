//! Batched persistence of parsed transactions.
//!
//! Transactions are written in consecutive batches of at most
//! [`MAX_BATCH_ITEMS`]. Items the store reports as unprocessed are
//! resubmitted immediately, up to [`MAX_RETRIES`] times per batch. Batches
//! run strictly one after another and a batch that exhausts its retries
//! does not stop later batches from being attempted.

use crate::error::{IngestError, Result};
use crate::store::{BatchStore, MAX_BATCH_ITEMS};
use crate::transaction::{Transaction, TransactionItem};
use log::{debug, warn};

/// Resubmissions allowed for the unprocessed part of one batch.
pub const MAX_RETRIES: usize = 3;

/// Writes transactions to a [`BatchStore`].
pub struct BatchPersister<S> {
    store: S,
}

impl<S: BatchStore> BatchPersister<S> {
    pub fn new(store: S) -> Self {
        BatchPersister { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Persists every transaction.
    ///
    /// Fails with [`IngestError::Persistence`] if any item is still
    /// unprocessed after retries, counting unwritten items over the whole
    /// call. Batches already acknowledged are not rolled back.
    pub fn save(&mut self, transactions: &[Transaction]) -> Result<()> {
        let mut unwritten = 0;
        let mut failed_batches = Vec::new();

        for (batch, chunk) in transactions.chunks(MAX_BATCH_ITEMS).enumerate() {
            let items: Vec<TransactionItem> = chunk.iter().map(Transaction::to_item).collect();
            let remaining = self.write_batch(batch, items)?;
            if remaining > 0 {
                warn!(
                    "Batch {}: {} items still unprocessed after {} retries",
                    batch, remaining, MAX_RETRIES
                );
                unwritten += remaining;
                failed_batches.push(batch);
            }
        }

        if unwritten > 0 {
            return Err(IngestError::Persistence {
                unwritten,
                failed_batches,
            });
        }

        Ok(())
    }

    /// Submits one batch and retries its unprocessed items.
    ///
    /// Returns how many items were left unprocessed.
    fn write_batch(&mut self, batch: usize, items: Vec<TransactionItem>) -> Result<usize> {
        debug!("Batch {}: writing {} items", batch, items.len());
        let mut pending = self.submit(batch, items)?;

        let mut attempt = 0;
        while !pending.is_empty() && attempt < MAX_RETRIES {
            attempt += 1;
            warn!(
                "Batch {}: retrying {} unprocessed items (attempt {}/{})",
                batch,
                pending.len(),
                attempt,
                MAX_RETRIES
            );
            pending = self.submit(batch, pending)?;
        }

        Ok(pending.len())
    }

    fn submit(&mut self, batch: usize, items: Vec<TransactionItem>) -> Result<Vec<TransactionItem>> {
        self.store
            .batch_write(items)
            .map_err(|source| IngestError::Store { batch, source })
    }
}
