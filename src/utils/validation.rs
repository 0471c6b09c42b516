//! Validation utilities

use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::types::*;

/// A row that is usable but not well-formed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerIssue {
    pub source: LedgerSide,
    pub origin_index: usize,
    pub message: String,
}

/// Validate that an amount is not negative
pub fn validate_non_negative_amount(amount: &BigDecimal) -> ReconcileResult<()> {
    if *amount < BigDecimal::zero() {
        Err(ReconcileError::Validation(format!(
            "Amount cannot be negative: {}",
            amount
        )))
    } else {
        Ok(())
    }
}

/// Validate a single row: non-negative columns, at most one of them set
pub fn validate_transaction(transaction: &Transaction) -> ReconcileResult<()> {
    validate_non_negative_amount(&transaction.amount_credit)?;
    validate_non_negative_amount(&transaction.amount_debit)?;

    if !transaction.amount_credit.is_zero() && !transaction.amount_debit.is_zero() {
        return Err(ReconcileError::Validation(format!(
            "Both credit ({}) and debit ({}) are set",
            transaction.amount_credit, transaction.amount_debit
        )));
    }

    Ok(())
}

/// Collect every malformed row of a ledger without rejecting it
pub fn ledger_issues(ledger: &Ledger) -> Vec<LedgerIssue> {
    let mut issues = Vec::new();
    let mut seen = HashSet::new();

    for transaction in ledger.transactions() {
        if transaction.source != ledger.side() {
            issues.push(LedgerIssue {
                source: ledger.side(),
                origin_index: transaction.origin_index,
                message: format!("Row belongs to the {} ledger", transaction.source),
            });
        }

        if !seen.insert(transaction.origin_index) {
            issues.push(LedgerIssue {
                source: ledger.side(),
                origin_index: transaction.origin_index,
                message: "Duplicate origin index".to_string(),
            });
        }

        if let Err(ReconcileError::Validation(message)) = validate_transaction(transaction) {
            issues.push(LedgerIssue {
                source: ledger.side(),
                origin_index: transaction.origin_index,
                message,
            });
        }
    }

    issues
}
