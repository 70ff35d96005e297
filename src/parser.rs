//! Streaming CSV transaction parser.
//!
//! Input is one header line followed by `id,date,amount` rows. The header is
//! always discarded. The first invalid row aborts the whole load, so callers
//! either get every transaction or none.

use crate::amount::Amount;
use crate::error::{IngestError, Result};
use crate::transaction::Transaction;
use chrono::{Datelike, NaiveDate, Utc};
use csv::{ReaderBuilder, StringRecord, Trim};
use log::debug;
use rust_decimal::Decimal;
use std::io::Read;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Number of fields in every data row.
pub const FIELDS_PER_RECORD: usize = 3;

/// Cooperative cancellation signal checked between records.
///
/// Clones share the same flag, so one clone can be handed to another thread
/// and cancelled from there.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Parses transaction CSV streams.
///
/// Dates written as `M/D` take the parser's `current_year`, which is fixed
/// when the parser is built.
#[derive(Debug, Clone, Copy)]
pub struct TransactionParser {
    current_year: i32,
}

impl TransactionParser {
    /// Creates a parser that fills in `current_year` for dates without a year.
    pub fn new(current_year: i32) -> Self {
        TransactionParser { current_year }
    }

    /// Creates a parser using the current UTC year.
    pub fn from_clock() -> Self {
        Self::new(Utc::now().year())
    }

    pub fn current_year(&self) -> i32 {
        self.current_year
    }

    /// Reads every transaction from `reader`, in input order.
    ///
    /// `cancel` is checked before each row; once set, parsing stops with
    /// [`IngestError::Cancelled`] carrying the line about to be read.
    pub fn parse<R: Read>(&self, reader: R, cancel: &CancelToken) -> Result<Vec<Transaction>> {
        if cancel.is_cancelled() {
            return Err(IngestError::Cancelled { line: 1 });
        }

        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .flexible(true)
            .from_reader(reader);

        // The header content is never inspected, only its presence.
        let header_fields = csv_reader.headers()?.len();
        if header_fields == 0 {
            return Err(IngestError::MissingHeader);
        }

        let mut transactions = Vec::new();
        let mut record = StringRecord::new();
        let mut balance = Amount::ZERO;
        let mut line = 2; // header is line 1

        loop {
            if cancel.is_cancelled() {
                debug!("Parsing cancelled at line {}", line);
                return Err(IngestError::Cancelled { line });
            }

            if !csv_reader.read_record(&mut record)? {
                break;
            }

            let transaction = self.parse_record(&record, line)?;
            balance = balance.checked_add(transaction.amount).ok_or_else(|| {
                invalid(line, "amount", &record[2], "running balance is out of range")
            })?;
            transactions.push(transaction);
            line += 1;
        }

        debug!("Parsed {} transactions", transactions.len());
        Ok(transactions)
    }

    /// Converts one data row into a transaction.
    fn parse_record(&self, record: &StringRecord, line: usize) -> Result<Transaction> {
        if record.len() != FIELDS_PER_RECORD {
            return Err(IngestError::FieldCount {
                line,
                expected: FIELDS_PER_RECORD,
                found: record.len(),
            });
        }

        let id = parse_id(&record[0]).map_err(|reason| invalid(line, "id", &record[0], reason))?;
        let date = self
            .parse_date(&record[1])
            .map_err(|reason| invalid(line, "date", &record[1], reason))?;
        let amount =
            parse_amount(&record[2]).map_err(|reason| invalid(line, "amount", &record[2], reason))?;

        Ok(Transaction::new(id, date, amount))
    }

    /// Accepts `M/D` (current year) or `M/D/YYYY`.
    fn parse_date(&self, raw: &str) -> std::result::Result<NaiveDate, String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err("date cannot be empty".to_string());
        }

        let parts: Vec<&str> = raw.split('/').collect();
        let (month, day, year) = match parts.as_slice() {
            [month, day] => (*month, *day, None),
            [month, day, year] => (*month, *day, Some(*year)),
            _ => return Err("must be in M/D or M/D/YYYY format".to_string()),
        };

        let month: u32 = parse_digits(month).ok_or("month must be numeric")?;
        let day: u32 = parse_digits(day).ok_or("day must be numeric")?;
        let year: i32 = match year {
            Some(year) if year.len() != 4 => return Err("year must have four digits".to_string()),
            Some(year) => parse_digits(year).ok_or("year must be numeric")?,
            None => self.current_year,
        };

        NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| format!("{}/{}/{} is not a calendar date", month, day, year))
    }
}

impl Default for TransactionParser {
    fn default() -> Self {
        Self::from_clock()
    }
}

fn invalid(line: usize, field: &'static str, value: &str, reason: impl Into<String>) -> IngestError {
    IngestError::InvalidField {
        line,
        field,
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// Parses a non-empty run of ASCII digits. Signs and spaces are rejected.
fn parse_digits<T: FromStr>(raw: &str) -> Option<T> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

fn parse_id(raw: &str) -> std::result::Result<u32, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("id cannot be empty".to_string());
    }
    match parse_digits::<u32>(trimmed) {
        Some(0) => Err("id must be a positive integer".to_string()),
        Some(id) => Ok(id),
        None => Err("id must be a positive integer".to_string()),
    }
}

/// Parses a signed amount. One leading `+` is dropped and an unsigned value is positive.
///
/// Plain and exponent forms (`1.5`, `-2e3`) are accepted.
fn parse_amount(raw: &str) -> std::result::Result<Amount, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("amount cannot be empty".to_string());
    }

    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if unsigned.contains('_') {
        return Err("must be a valid number".to_string());
    }

    Decimal::from_str(unsigned)
        .or_else(|_| Decimal::from_scientific(unsigned))
        .map(Amount::new)
        .map_err(|e| format!("must be a valid number: {}", e))
}
