//! Turning raw ledger rows into typed transactions

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, warn};

use crate::config::ReconcileConfig;
use crate::types::*;

/// One source row as text, before any coercion
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub description: String,
    pub date: String,
    pub voucher_number: String,
    pub voucher: String,
    pub credit: String,
    pub debit: String,
}

impl RawRecord {
    /// Convenience constructor for the fields that drive matching
    pub fn new(date: &str, credit: &str, debit: &str) -> Self {
        Self {
            date: date.to_string(),
            credit: credit.to_string(),
            debit: debit.to_string(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }
}

/// A row excluded from matching because its date could not be read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedRecord {
    pub source: LedgerSide,
    pub origin_index: usize,
    pub raw_date: String,
}

/// A ledger together with the rows that could not be placed on a date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedLedger {
    pub ledger: Ledger,
    pub dropped: Vec<DroppedRecord>,
}

/// Most digits after the decimal point an amount may carry
pub const MAX_AMOUNT_SCALE: i64 = 18;

/// Parse amount text, stripping thousands separators.
///
/// Returns `None` for empty or non-numeric text. Exponent notation and
/// amounts finer than [`MAX_AMOUNT_SCALE`] digits count as non-numeric.
pub fn parse_amount(text: &str) -> Option<BigDecimal> {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() || cleaned.contains(['e', 'E']) {
        return None;
    }
    let amount = BigDecimal::from_str(&cleaned).ok()?;
    let (_, scale) = amount.as_bigint_and_exponent();
    (scale <= MAX_AMOUNT_SCALE).then_some(amount)
}

/// Parse a calendar date with the given chrono format
pub fn parse_date(text: &str, format: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), format).ok()
}

/// Converts raw rows into a [`Ledger`] using one fallback and one date format
#[derive(Debug, Clone)]
pub struct Normalizer {
    fallback_amount: BigDecimal,
    date_format: String,
}

impl Normalizer {
    pub fn new(fallback_amount: BigDecimal, date_format: impl Into<String>) -> Self {
        Self {
            fallback_amount,
            date_format: date_format.into(),
        }
    }

    pub fn from_config(config: &ReconcileConfig) -> Self {
        Self::new(config.fallback_amount.clone(), config.date_format.clone())
    }

    /// Coerce amount text, substituting the configured fallback
    pub fn amount(&self, text: &str) -> BigDecimal {
        parse_amount(text).unwrap_or_else(|| self.fallback_amount.clone())
    }

    /// Normalize every row of one ledger.
    ///
    /// `origin_index` is the row's position in `records`, assigned before
    /// undated rows are dropped so it always points back at the source row.
    pub fn normalize(&self, side: LedgerSide, records: &[RawRecord]) -> NormalizedLedger {
        let mut transactions = Vec::with_capacity(records.len());
        let mut dropped = Vec::new();

        for (origin_index, record) in records.iter().enumerate() {
            let Some(date) = parse_date(&record.date, &self.date_format) else {
                warn!(
                    "Dropping {} ledger row {}: unparsable date '{}'",
                    side, origin_index, record.date
                );
                dropped.push(DroppedRecord {
                    source: side,
                    origin_index,
                    raw_date: record.date.clone(),
                });
                continue;
            };

            transactions.push(Transaction {
                source: side,
                date,
                amount_credit: self.amount(&record.credit),
                amount_debit: self.amount(&record.debit),
                reference: Reference {
                    description: record.description.clone(),
                    voucher_number: record.voucher_number.clone(),
                    voucher: record.voucher.clone(),
                },
                origin_index,
            });
        }

        debug!(
            "Normalized {} ledger: {} rows kept, {} dropped",
            side,
            transactions.len(),
            dropped.len()
        );

        NormalizedLedger {
            ledger: Ledger::new(side, transactions),
            dropped,
        }
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::from_config(&ReconcileConfig::default())
    }
}
