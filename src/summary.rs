//! Per-month transaction statistics.
//!
//! [`summarize`] is a pure reduction over parsed transactions. Buckets are
//! stored in hash maps; anything that exposes them (iteration, serialization)
//! goes through [`Summary::buckets`], which orders by year then month.

use crate::amount::Amount;
use crate::transaction::Transaction;
use chrono::Datelike;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::collections::{BTreeMap, HashMap};

/// Statistics for one (year, month) bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct MonthlySummary {
    /// Every transaction in the bucket, zero amounts included
    pub transaction_count: usize,

    /// Mean of the strictly negative amounts, zero if there are none
    pub average_debit: Amount,

    /// Mean of the strictly positive amounts, zero if there are none
    pub average_credit: Amount,
}

/// Month (1-12) to bucket statistics.
pub type MonthlyData = HashMap<u32, MonthlySummary>;

/// Year to monthly statistics.
pub type YearlyData = HashMap<i32, MonthlyData>;

/// One bucket in (year, month) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketRow {
    pub year: i32,
    pub month: u32,
    pub stats: MonthlySummary,
}

/// Account summary computed from one file's transactions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Summary {
    /// Sum of every amount, in input order
    pub total_balance: Amount,

    pub yearly_data: YearlyData,
}

impl Summary {
    /// Returns every bucket ordered by year, then month.
    pub fn buckets(&self) -> Vec<BucketRow> {
        let mut rows: Vec<BucketRow> = self
            .yearly_data
            .iter()
            .flat_map(|(&year, months)| {
                months.iter().map(move |(&month, &stats)| BucketRow { year, month, stats })
            })
            .collect();
        rows.sort_by_key(|row| (row.year, row.month));
        rows
    }

    /// Looks up a single bucket.
    pub fn bucket(&self, year: i32, month: u32) -> Option<&MonthlySummary> {
        self.yearly_data.get(&year)?.get(&month)
    }

    pub fn is_empty(&self) -> bool {
        self.yearly_data.is_empty()
    }
}

impl Serialize for Summary {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut ordered: BTreeMap<i32, BTreeMap<u32, MonthlySummary>> = BTreeMap::new();
        for row in self.buckets() {
            ordered.entry(row.year).or_default().insert(row.month, row.stats);
        }

        let mut state = serializer.serialize_struct("Summary", 2)?;
        state.serialize_field("total_balance", &self.total_balance)?;
        state.serialize_field("yearly_data", &ordered)?;
        state.end()
    }
}

/// Computes the total balance and per-month statistics for `transactions`.
///
/// Empty input gives a zero balance and no buckets.
pub fn summarize(transactions: &[Transaction]) -> Summary {
    let total_balance: Amount = transactions.iter().map(|tx| tx.amount).sum();

    let mut groups: HashMap<(i32, u32), Vec<Amount>> = HashMap::new();
    for tx in transactions {
        groups
            .entry((tx.date.year(), tx.date.month()))
            .or_default()
            .push(tx.amount);
    }

    let mut yearly_data = YearlyData::new();
    for ((year, month), amounts) in groups {
        yearly_data
            .entry(year)
            .or_default()
            .insert(month, summarize_bucket(&amounts));
    }

    Summary {
        total_balance,
        yearly_data,
    }
}

fn summarize_bucket(amounts: &[Amount]) -> MonthlySummary {
    let (debits, credits): (Vec<Amount>, Vec<Amount>) = amounts
        .iter()
        .filter(|amount| !amount.is_zero())
        .partition(|amount| amount.is_debit());

    MonthlySummary {
        transaction_count: amounts.len(),
        average_debit: Amount::mean(&debits),
        average_credit: Amount::mean(&credits),
    }
}
