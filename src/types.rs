//! Core types and data structures for the reconciliation system

use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two ledgers being reconciled against each other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LedgerSide {
    /// The first (reference) ledger
    First,
    /// The second (counterparty) ledger
    Second,
}

impl fmt::Display for LedgerSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerSide::First => write!(f, "first"),
            LedgerSide::Second => write!(f, "second"),
        }
    }
}

/// Which column of a record carries the value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Value recorded in the credit column
    Credit,
    /// Value recorded in the debit column
    Debit,
}

impl Direction {
    /// The direction the other ledger records the same transfer in
    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Credit => Direction::Debit,
            Direction::Debit => Direction::Credit,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Credit => write!(f, "credit"),
            Direction::Debit => write!(f, "debit"),
        }
    }
}

/// Free-text identifiers carried through from the source row.
/// Never used for matching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// Narrative of the entry
    pub description: String,
    /// Journal voucher number
    pub voucher_number: String,
    /// Journal voucher
    pub voucher: String,
}

/// A single normalized ledger row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Ledger the row was loaded from
    pub source: LedgerSide,
    /// Calendar date of the transfer
    pub date: NaiveDate,
    /// Amount in the credit column (zero when absent)
    pub amount_credit: BigDecimal,
    /// Amount in the debit column (zero when absent)
    pub amount_debit: BigDecimal,
    /// Descriptive identifiers of the source row
    pub reference: Reference,
    /// Position of the row within its source ledger
    pub origin_index: usize,
}

impl Transaction {
    /// Create a transaction carrying a credit amount
    pub fn credit(
        source: LedgerSide,
        origin_index: usize,
        date: NaiveDate,
        amount: BigDecimal,
    ) -> Self {
        Self {
            source,
            date,
            amount_credit: amount,
            amount_debit: BigDecimal::zero(),
            reference: Reference::default(),
            origin_index,
        }
    }

    /// Create a transaction carrying a debit amount
    pub fn debit(
        source: LedgerSide,
        origin_index: usize,
        date: NaiveDate,
        amount: BigDecimal,
    ) -> Self {
        Self {
            source,
            date,
            amount_credit: BigDecimal::zero(),
            amount_debit: amount,
            reference: Reference::default(),
            origin_index,
        }
    }

    /// Attach source-row identifiers
    pub fn with_reference(mut self, reference: Reference) -> Self {
        self.reference = reference;
        self
    }

    /// Amount recorded in the given direction's column
    pub fn amount(&self, direction: Direction) -> &BigDecimal {
        match direction {
            Direction::Credit => &self.amount_credit,
            Direction::Debit => &self.amount_debit,
        }
    }

    /// Identity of the row across phases: ledger and original position
    pub fn key(&self) -> (LedgerSide, usize) {
        (self.source, self.origin_index)
    }
}

/// An ordered, immutable sequence of transactions from one source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    side: LedgerSide,
    transactions: Vec<Transaction>,
}

impl Ledger {
    /// Build a ledger, ordering its rows by `origin_index`
    pub fn new(side: LedgerSide, mut transactions: Vec<Transaction>) -> Self {
        transactions.sort_by_key(|t| t.origin_index);
        Self { side, transactions }
    }

    /// Ledger with no rows
    pub fn empty(side: LedgerSide) -> Self {
        Self::new(side, Vec::new())
    }

    pub fn side(&self) -> LedgerSide {
        self.side
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Sum of a column over every row
    pub fn total(&self, direction: Direction) -> BigDecimal {
        self.transactions.iter().map(|t| t.amount(direction)).sum()
    }
}

/// The credit subset of one ledger facing the debit subset of the other.
///
/// Matchers always scan `credit` (side A) and look candidates up in `debit`
/// (side B); A's amount is its credit column, B's amount its debit column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrossPair {
    pub credit: Vec<Transaction>,
    pub debit: Vec<Transaction>,
}

impl CrossPair {
    pub fn new(credit: Vec<Transaction>, debit: Vec<Transaction>) -> Self {
        Self { credit, debit }
    }

    /// Total number of transactions on both sides
    pub fn len(&self) -> usize {
        self.credit.len() + self.debit.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credit.is_empty() && self.debit.is_empty()
    }
}

/// How a per-transaction match was found
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchKind {
    /// Same date, same amount
    Exact,
    /// Same amount within the tolerance window
    Window { tolerance_days: u32 },
}

/// A credit-side transaction and the debit-side transactions it consumed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionMatch {
    pub kind: MatchKind,
    pub credit: Transaction,
    /// Exactly one for [`MatchKind::Exact`], one or more for [`MatchKind::Window`]
    pub debits: Vec<Transaction>,
}

impl TransactionMatch {
    /// Number of transactions consumed by this match, both sides
    pub fn consumed(&self) -> usize {
        1 + self.debits.len()
    }
}

/// A whole calendar date removed from both sides because its totals balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateClearing {
    pub date: NaiveDate,
    /// Credit total of side A on that date (`c1`)
    pub credit_side_credit: BigDecimal,
    /// Debit total of side A on that date (`d1`)
    pub credit_side_debit: BigDecimal,
    /// Credit total of side B on that date (`c2`)
    pub debit_side_credit: BigDecimal,
    /// Debit total of side B on that date (`d2`)
    pub debit_side_debit: BigDecimal,
    pub removed_credit: Vec<Transaction>,
    pub removed_debit: Vec<Transaction>,
}

impl DateClearing {
    pub fn consumed(&self) -> usize {
        self.removed_credit.len() + self.removed_debit.len()
    }
}

/// Result of a per-transaction matching phase
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseOutcome {
    pub matches: Vec<TransactionMatch>,
    pub residual: CrossPair,
}

impl PhaseOutcome {
    /// Credit-side transactions consumed by this phase
    pub fn matched_credit(&self) -> usize {
        self.matches.len()
    }

    /// Debit-side transactions consumed by this phase
    pub fn matched_debit(&self) -> usize {
        self.matches.iter().map(|m| m.debits.len()).sum()
    }
}

/// Result of the aggregate balance clearing phase
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClearingOutcome {
    pub clearings: Vec<DateClearing>,
    pub residual: CrossPair,
}

impl ClearingOutcome {
    pub fn matched_credit(&self) -> usize {
        self.clearings.iter().map(|c| c.removed_credit.len()).sum()
    }

    pub fn matched_debit(&self) -> usize {
        self.clearings.iter().map(|c| c.removed_debit.len()).sum()
    }
}

/// Errors that can occur while reconciling
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Failed to load {side} ledger: {reason}")]
    LedgerLoad { side: LedgerSide, reason: String },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type for reconciliation operations
pub type ReconcileResult<T> = Result<T, ReconcileError>;
