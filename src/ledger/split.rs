//! Partitioning a ledger by direction

use bigdecimal::Zero;
use serde::{Deserialize, Serialize};

use crate::types::*;

/// The credit and debit subsets of one ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitLedger {
    pub side: LedgerSide,
    /// Rows with a non-zero credit column
    pub credit: Vec<Transaction>,
    /// Rows with a non-zero debit column
    pub debit: Vec<Transaction>,
}

impl SplitLedger {
    pub fn subset(&self, direction: Direction) -> &[Transaction] {
        match direction {
            Direction::Credit => &self.credit,
            Direction::Debit => &self.debit,
        }
    }
}

/// Split a ledger into its credit and debit subsets.
///
/// Rows with both columns zero carry nothing to match and land in neither
/// subset. A row with both columns set lands in both.
pub fn split_by_direction(ledger: &Ledger) -> SplitLedger {
    let credit = ledger
        .transactions()
        .iter()
        .filter(|t| !t.amount_credit.is_zero())
        .cloned()
        .collect();
    let debit = ledger
        .transactions()
        .iter()
        .filter(|t| !t.amount_debit.is_zero())
        .cloned()
        .collect();

    SplitLedger {
        side: ledger.side(),
        credit,
        debit,
    }
}

/// Pair the credit subset of `credit_ledger` with the subset of `debit_ledger`
/// recorded in the opposite direction
pub fn cross_pair(credit_ledger: &SplitLedger, debit_ledger: &SplitLedger) -> CrossPair {
    CrossPair::new(
        credit_ledger.subset(Direction::Credit).to_vec(),
        debit_ledger.subset(Direction::Credit.opposite()).to_vec(),
    )
}
