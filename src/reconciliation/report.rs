//! Residual report handed to the output collaborator

use bigdecimal::{BigDecimal, Zero};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use super::aggregate::totals_by_date;
use crate::config::ReconcileConfig;
use crate::ledger::DroppedRecord;
use crate::types::*;
use crate::utils::LedgerIssue;

/// Matching stage a set of counts belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Exact,
    Window,
    Aggregate,
}

/// Input, matched and residual counts of one phase on one cross pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseStats {
    pub phase: Phase,
    pub credit_input: usize,
    pub credit_matched: usize,
    pub credit_residual: usize,
    pub debit_input: usize,
    pub debit_matched: usize,
    pub debit_residual: usize,
}

impl PhaseStats {
    pub fn new(
        phase: Phase,
        input: &CrossPair,
        credit_matched: usize,
        debit_matched: usize,
        residual: &CrossPair,
    ) -> Self {
        Self {
            phase,
            credit_input: input.credit.len(),
            credit_matched,
            credit_residual: residual.credit.len(),
            debit_input: input.debit.len(),
            debit_matched,
            debit_residual: residual.debit.len(),
        }
    }

    /// Every input row is either matched or residual, on both sides
    pub fn is_conserved(&self) -> bool {
        self.credit_input == self.credit_matched + self.credit_residual
            && self.debit_input == self.debit_matched + self.debit_residual
    }
}

/// Per-date gap left between a credit residual and its debit counterpart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateDiscrepancy {
    pub date: NaiveDate,
    pub credit_total: BigDecimal,
    pub debit_total: BigDecimal,
    /// `credit_total - debit_total`
    pub difference: BigDecimal,
}

/// Dates where residual credits and residual debits differ.
///
/// A date present on one side only counts the missing side as zero.
pub fn date_discrepancies(residual: &CrossPair) -> Vec<DateDiscrepancy> {
    let credit_totals = totals_by_date(&residual.credit);
    let debit_totals = totals_by_date(&residual.debit);
    let dates: BTreeSet<NaiveDate> = credit_totals
        .keys()
        .chain(debit_totals.keys())
        .copied()
        .collect();

    dates
        .into_iter()
        .filter_map(|date| {
            let credit_total = credit_totals
                .get(&date)
                .map(|t| t.credit.clone())
                .unwrap_or_else(BigDecimal::zero);
            let debit_total = debit_totals
                .get(&date)
                .map(|t| t.debit.clone())
                .unwrap_or_else(BigDecimal::zero);
            let difference = &credit_total - &debit_total;
            (!difference.is_zero()).then_some(DateDiscrepancy {
                date,
                credit_total,
                debit_total,
                difference,
            })
        })
        .collect()
}

/// Everything that happened to one cross pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairReport {
    /// Ledger whose credit subset was scanned
    pub credit_side: LedgerSide,
    /// Ledger whose debit subset supplied the candidates
    pub debit_side: LedgerSide,
    pub stats: Vec<PhaseStats>,
    pub matches: Vec<TransactionMatch>,
    pub clearings: Vec<DateClearing>,
    pub residual: CrossPair,
    pub discrepancies: Vec<DateDiscrepancy>,
}

impl PairReport {
    pub fn is_conserved(&self) -> bool {
        self.stats.iter().all(PhaseStats::is_conserved)
    }
}

/// Whole-ledger column totals before any matching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalsComparison {
    pub first_credit: BigDecimal,
    pub first_debit: BigDecimal,
    pub second_credit: BigDecimal,
    pub second_debit: BigDecimal,
}

impl TotalsComparison {
    pub fn from_ledgers(first: &Ledger, second: &Ledger) -> Self {
        Self {
            first_credit: first.total(Direction::Credit),
            first_debit: first.total(Direction::Debit),
            second_credit: second.total(Direction::Credit),
            second_debit: second.total(Direction::Debit),
        }
    }

    /// First ledger's credits equal the second ledger's debits
    pub fn credits_balance(&self) -> bool {
        self.first_credit == self.second_debit
    }

    /// First ledger's debits equal the second ledger's credits
    pub fn debits_balance(&self) -> bool {
        self.first_debit == self.second_credit
    }
}

/// The four unmatched sequences, full records
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResidualSet<'a> {
    pub first_credit: &'a [Transaction],
    pub second_debit: &'a [Transaction],
    pub first_debit: &'a [Transaction],
    pub second_credit: &'a [Transaction],
}

impl<'a> ResidualSet<'a> {
    /// Residual rows of one ledger in one direction
    pub fn get(&self, side: LedgerSide, direction: Direction) -> &'a [Transaction] {
        match (side, direction) {
            (LedgerSide::First, Direction::Credit) => self.first_credit,
            (LedgerSide::First, Direction::Debit) => self.first_debit,
            (LedgerSide::Second, Direction::Credit) => self.second_credit,
            (LedgerSide::Second, Direction::Debit) => self.second_debit,
        }
    }

    pub fn len(&self) -> usize {
        self.first_credit.len()
            + self.second_debit.len()
            + self.first_debit.len()
            + self.second_credit.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Outcome of one reconciliation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub run_id: Uuid,
    pub generated_at: NaiveDateTime,
    pub config: ReconcileConfig,
    pub totals: TotalsComparison,
    /// Rows excluded before matching because their date could not be read
    pub dropped: Vec<DroppedRecord>,
    /// Rows kept for matching that are not well-formed
    pub issues: Vec<LedgerIssue>,
    /// First ledger's credits against the second ledger's debits
    pub first_credit_pair: PairReport,
    /// Second ledger's credits against the first ledger's debits
    pub second_credit_pair: PairReport,
}

impl ReconciliationReport {
    pub fn residuals(&self) -> ResidualSet<'_> {
        ResidualSet {
            first_credit: &self.first_credit_pair.residual.credit,
            second_debit: &self.first_credit_pair.residual.debit,
            first_debit: &self.second_credit_pair.residual.debit,
            second_credit: &self.second_credit_pair.residual.credit,
        }
    }

    pub fn pairs(&self) -> [&PairReport; 2] {
        [&self.first_credit_pair, &self.second_credit_pair]
    }

    /// Nothing left for a reviewer and nothing dropped
    pub fn is_fully_reconciled(&self) -> bool {
        self.residuals().is_empty() && self.dropped.is_empty()
    }

    pub fn is_conserved(&self) -> bool {
        self.pairs().iter().all(|pair| pair.is_conserved())
    }
}
