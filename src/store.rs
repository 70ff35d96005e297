//! Keyed store collaborators for persisted transactions.
//!
//! A store accepts batch write requests of at most [`MAX_BATCH_ITEMS`] items
//! and answers with the items it could not commit. Resubmitting those is the
//! caller's job.

use crate::transaction::TransactionItem;
use log::debug;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Hard per-request item ceiling of the store.
pub const MAX_BATCH_ITEMS: usize = 25;

/// Errors raised by a store for a whole request.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode item: {0}")]
    Json(#[from] serde_json::Error),

    /// The request exceeded the per-request item ceiling
    #[error("batch of {0} items exceeds the limit of {max}", max = MAX_BATCH_ITEMS)]
    TooManyItems(usize),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// A keyed store that accepts bounded batch writes.
pub trait BatchStore {
    /// Writes `items` as one request and returns the unprocessed subset.
    ///
    /// An empty result means every item was committed.
    fn batch_write(
        &mut self,
        items: Vec<TransactionItem>,
    ) -> std::result::Result<Vec<TransactionItem>, StoreError>;
}

impl<S: BatchStore + ?Sized> BatchStore for &mut S {
    fn batch_write(
        &mut self,
        items: Vec<TransactionItem>,
    ) -> std::result::Result<Vec<TransactionItem>, StoreError> {
        (**self).batch_write(items)
    }
}

fn check_batch_size(items: &[TransactionItem]) -> std::result::Result<(), StoreError> {
    if items.len() > MAX_BATCH_ITEMS {
        return Err(StoreError::TooManyItems(items.len()));
    }
    Ok(())
}

/// In-memory store keyed by item key.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: HashMap<String, TransactionItem>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&TransactionItem> {
        self.items.get(key)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// All items belonging to `account_id`, ordered by original row id.
    pub fn items_for_account(&self, account_id: &str) -> Vec<&TransactionItem> {
        let mut items: Vec<_> = self
            .items
            .values()
            .filter(|item| item.account_id == account_id)
            .collect();
        items.sort_by_key(|item| item.internal_id);
        items
    }
}

impl BatchStore for MemoryStore {
    fn batch_write(
        &mut self,
        items: Vec<TransactionItem>,
    ) -> std::result::Result<Vec<TransactionItem>, StoreError> {
        check_batch_size(&items)?;
        for item in items {
            self.items.insert(item.key.clone(), item);
        }
        Ok(Vec::new())
    }
}

/// Appends items to a file, one JSON object per line.
pub struct JsonLinesStore {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl JsonLinesStore {
    /// Opens `path` for appending, creating it if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> std::result::Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(JsonLinesStore {
            path,
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BatchStore for JsonLinesStore {
    fn batch_write(
        &mut self,
        items: Vec<TransactionItem>,
    ) -> std::result::Result<Vec<TransactionItem>, StoreError> {
        check_batch_size(&items)?;
        for item in &items {
            serde_json::to_writer(&mut self.writer, item)?;
            self.writer.write_all(b"\n")?;
        }
        self.writer.flush()?;
        debug!("Appended {} items to {}", items.len(), self.path.display());
        Ok(Vec::new())
    }
}
