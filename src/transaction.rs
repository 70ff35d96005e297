//! Transaction model and its persisted representation.

use crate::amount::Amount;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Format of the persisted `date` attribute: the date at UTC midnight.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT00:00:00Z";

/// One parsed ledger entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Row id from the input file. Unique within that file only.
    pub id: u32,

    /// Calendar date of the entry
    pub date: NaiveDate,

    /// Signed amount: negative is a debit, positive a credit
    pub amount: Amount,

    /// Owning account, stamped by the pipeline after parsing
    pub account_id: String,
}

impl Transaction {
    /// Creates a transaction that is not yet attached to an account.
    pub fn new(id: u32, date: NaiveDate, amount: Amount) -> Self {
        Transaction {
            id,
            date,
            amount,
            account_id: String::new(),
        }
    }

    /// Builds the persisted item for this transaction under a fresh random key.
    pub fn to_item(&self) -> TransactionItem {
        TransactionItem {
            key: Uuid::new_v4().to_string(),
            internal_id: self.id,
            date: self.date.format(TIMESTAMP_FORMAT).to_string(),
            amount: self.amount,
            account_id: self.account_id.clone(),
        }
    }
}

/// A transaction as written to the keyed store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionItem {
    /// Generated primary key
    #[serde(rename = "id")]
    pub key: String,

    /// Original row id, kept as a plain attribute
    pub internal_id: u32,

    /// ISO-8601 timestamp
    pub date: String,

    /// Amount as a JSON number
    pub amount: Amount,

    pub account_id: String,
}
